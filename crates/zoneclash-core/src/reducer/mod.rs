//! Pure state transition function.
//!
//! `reduce` maps `(mode, state, seats, action, timestamp)` to the next
//! game document. It never performs I/O besides the injected catalog
//! lookups during scoring, never reads a clock, and never mutates its
//! input — given the same arguments it returns the same document, which
//! is what makes replay certification possible.
//!
//! # Dispatch
//!
//! Lifecycle and `turn.end` actions are mode-agnostic. Mode-namespaced
//! actions reach their sub-reducer only when the game's mode code
//! matches; in every other case the state is returned unchanged. That
//! no-op policy is deliberate: unrecognized actions are recorded in the
//! log and must replay cleanly, so they cannot be errors.

mod rookie;


use thiserror::Error;

use crate::catalog::CardCatalog;
use crate::events::{Action, ValidationError};
use crate::model::{GameState, GameStatus, ModeState, MODE_ROOKIE};
use crate::scoring::ScoreError;

/// Reducer failure. The state is unchanged whenever one of these is
/// returned.
#[derive(Debug, Error)]
pub enum ReducerError {
    /// Malformed action input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Scoring validation or catalog failure.
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Computes the next game document for an action.
///
/// `seats` is the game's fixed seat set in ascending order; `at` is the
/// timestamp of the event record being applied.
///
/// # Errors
///
/// Returns [`ReducerError`] and leaves no partial state behind when the
/// action is invalid for the current document.
pub fn reduce(
    mode: &str,
    state: &GameState,
    seats: &[u8],
    action: &Action,
    at: u64,
    catalog: &dyn CardCatalog,
) -> Result<GameState, ReducerError> {
    match action {
        Action::GameCreated {
            mode: created_mode,
            seats: seat_entries,
        } => {
            validate_seat_entries(seat_entries.iter().map(|s| s.seat))?;
            if created_mode != MODE_ROOKIE {
                return Err(ValidationError::UnknownMode {
                    mode: created_mode.clone(),
                }
                .into());
            }
            Ok(GameState::new_rookie())
        }

        Action::GameStarted => {
            if state.status == GameStatus::Active {
                return Ok(state.clone());
            }
            let mut next = state.clone();
            next.status = GameStatus::Active;
            next.turn = 1;
            next.active_seat = seats.first().copied();
            Ok(next)
        }

        Action::EndTurn => Ok(end_turn(state, seats)),

        _ => {
            let namespaced = action.event_type().starts_with("rookie.");
            if !(namespaced && mode == MODE_ROOKIE) {
                // Wrong mode for a namespaced action: explicit no-op.
                return Ok(state.clone());
            }
            let ModeState::Rookie(current) = &state.mode;
            let next_rookie = rookie::apply(current, seats, action, at, catalog)?;
            let mut next = state.clone();
            next.mode = ModeState::Rookie(next_rookie);
            Ok(next)
        }
    }
}

/// Advances the turn counter and rotates the active seat through the
/// sorted seat list, wrapping after the last seat.
fn end_turn(state: &GameState, seats: &[u8]) -> GameState {
    if state.status != GameStatus::Active || seats.is_empty() {
        return state.clone();
    }

    let next_seat = match state.active_seat {
        Some(current) => seats
            .iter()
            .position(|s| *s == current)
            .map_or(seats[0], |pos| seats[(pos + 1) % seats.len()]),
        None => seats[0],
    };

    let mut next = state.clone();
    next.turn += 1;
    next.active_seat = Some(next_seat);
    next
}

/// Validates a seat set: non-empty, no duplicates.
fn validate_seat_entries(seats: impl Iterator<Item = u8>) -> Result<(), ValidationError> {
    let mut seen = std::collections::BTreeSet::new();
    let mut any = false;
    for seat in seats {
        any = true;
        if !seen.insert(seat) {
            return Err(ValidationError::DuplicateSeat { seat });
        }
    }
    if !any {
        return Err(ValidationError::MissingSeats);
    }
    Ok(())
}
