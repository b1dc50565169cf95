//! Rookie mode sub-reducer.
//!
//! Implements the forward-only phase machine:
//!
//! ```text
//! SETUP --begin_match--> MATCH --score_match--> SCORED --end_match--> ENDED
//! ```
//!
//! Scoring accepts entry from `MATCH` or `ENDED`. From `MATCH` it freezes
//! `results` and `tally` and advances to `SCORED`; from `ENDED` the
//! results are already frozen, so re-resolution succeeds without touching
//! them — the phase never moves backwards and frozen fields are never
//! rewritten. From `SCORED` itself (and `SETUP`) scoring fails.

use crate::catalog::CardCatalog;
use crate::events::{Action, ValidationError};
use crate::model::{RewardEligibility, RookiePhase, RookieState, ROOKIE_SEATS, ZONE_COUNT};
use crate::scoring::{score_zones, ScoreError};

use super::ReducerError;

#[allow(clippy::cast_possible_truncation)]
const ZONE_MAX: u8 = ZONE_COUNT as u8;

/// Applies a rookie-namespaced action to the rookie document.
pub(super) fn apply(
    state: &RookieState,
    seats: &[u8],
    action: &Action,
    at: u64,
    catalog: &dyn CardCatalog,
) -> Result<RookieState, ReducerError> {
    match action {
        Action::RookieBeginMatch => Ok(begin_match(state, at)),
        Action::RookiePlace {
            seat,
            zone,
            version_key,
        } => place(state, seats, *seat, *zone, version_key, at),
        Action::RookieReveal { zone } => set_revealed(state, *zone, true),
        Action::RookieHide { zone } => set_revealed(state, *zone, false),
        Action::RookieScoreMatch => score_match(state, seats, at, catalog),
        Action::RookieEndMatch => end_match(state, at),
        Action::RookieRewardClaimed { .. } => Ok(mark_claimed(state, at)),
        // Mode-agnostic actions never reach the sub-reducer.
        _ => Ok(state.clone()),
    }
}

/// `SETUP -> MATCH`; anything else is a no-op.
fn begin_match(state: &RookieState, at: u64) -> RookieState {
    if state.phase != RookiePhase::Setup {
        return state.clone();
    }
    let mut next = state.clone();
    next.phase = RookiePhase::Match;
    next.begun_at = Some(at);
    next
}

/// Records a placement. Accepted in any phase; late placements can never
/// alter frozen results.
fn place(
    state: &RookieState,
    seats: &[u8],
    seat: u8,
    zone: u8,
    version_key: &str,
    at: u64,
) -> Result<RookieState, ReducerError> {
    if !seats.contains(&seat) {
        return Err(ValidationError::UnknownSeat { seat }.into());
    }
    if zone >= ZONE_MAX {
        return Err(ValidationError::ZoneOutOfRange { zone }.into());
    }

    let mut next = state.clone();
    next.placements
        .entry(seat)
        .or_default()
        .insert(zone, version_key.to_string());
    next.last_placed_at.insert(seat, at);
    Ok(next)
}

fn set_revealed(state: &RookieState, zone: u8, revealed: bool) -> Result<RookieState, ReducerError> {
    if zone >= ZONE_MAX {
        return Err(ValidationError::ZoneOutOfRange { zone }.into());
    }
    let mut next = state.clone();
    next.revealed[zone as usize] = revealed;
    Ok(next)
}

/// Resolves the match. See the module docs for the `MATCH`/`ENDED` entry
/// rule.
fn score_match(
    state: &RookieState,
    seats: &[u8],
    at: u64,
    catalog: &dyn CardCatalog,
) -> Result<RookieState, ReducerError> {
    match state.phase {
        RookiePhase::Match | RookiePhase::Ended => {}
        phase => {
            return Err(ScoreError::InvalidPhase {
                phase: phase.as_str().to_string(),
            }
            .into())
        }
    }

    if *seats != ROOKIE_SEATS {
        return Err(ScoreError::InvalidSeats {
            seats: seats.to_vec(),
        }
        .into());
    }

    if let Some(zone) = state.revealed.iter().position(|r| !*r) {
        #[allow(clippy::cast_possible_truncation)]
        return Err(ScoreError::ZoneNotRevealed { zone: zone as u8 }.into());
    }

    // Results freeze exactly once; a re-resolution from ENDED leaves the
    // sealed record untouched.
    if state.phase == RookiePhase::Ended {
        return Ok(state.clone());
    }

    let results = score_zones(&state.placements, catalog)?;

    let mut next = state.clone();
    next.tally = Some(results.zones.iter().map(|z| z.outcome).collect());
    next.results = Some(results);
    next.phase = RookiePhase::Scored;
    next.scored_at = Some(at);
    Ok(next)
}

/// `SCORED -> ENDED`: seals reward eligibility.
fn end_match(state: &RookieState, at: u64) -> Result<RookieState, ReducerError> {
    if state.phase != RookiePhase::Scored {
        return Err(ScoreError::InvalidPhase {
            phase: state.phase.as_str().to_string(),
        }
        .into());
    }

    let winner_seat = state.results.as_ref().and_then(|r| r.winner);

    let mut next = state.clone();
    next.reward_eligible = Some(RewardEligibility {
        winner_seat,
        amount: u64::from(winner_seat.is_some()),
    });
    next.phase = RookiePhase::Ended;
    next.ended_at = Some(at);
    Ok(next)
}

/// Sets the idempotency marker once; later claims observe it unchanged.
fn mark_claimed(state: &RookieState, at: u64) -> RookieState {
    if state.reward_paid_at.is_some() {
        return state.clone();
    }
    let mut next = state.clone();
    next.reward_paid_at = Some(at);
    next
}
