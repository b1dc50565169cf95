//! Fold/replay and determinism certification.
//!
//! The cached game document is only trustworthy because anyone can
//! rebuild it: [`fold_events`] replays a game's log from event 1 through
//! the reducer and must land on exactly the stored snapshot. The
//! [`ReplayVerifier`] turns that into a certification: N independent
//! folds (reference: 100) with zero structural diffs against the stored
//! run. Any divergence is a fatal correctness defect — it is reported
//! with the complete diff and never retried or sampled away.
//!
//! Timestamps participate in the comparison: every time-derived field in
//! the document is copied from event records, which are stamped once at
//! append time, so a fold can never observe the wall clock.

mod diff;

#[cfg(test)]
mod tests;

pub use diff::{structural_diff, DiffEntry, StructuralDiff};

use thiserror::Error;

use crate::catalog::CardCatalog;
use crate::events::{Action, ValidationError, GAME_CREATED};
use crate::ledger::{EventRecord, GameStore, StoreError};
use crate::model::GameState;
use crate::reducer::{reduce, ReducerError};

/// Reference number of independent runs for certification.
pub const CERTIFICATION_RUNS: usize = 100;

/// Failure while folding an event sequence.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The sequence does not begin with a `game.created` event at seq 1.
    #[error("event sequence for {game_id} has no genesis event")]
    MissingGenesis {
        /// The game whose log is malformed.
        game_id: String,
    },

    /// The sequence has a gap or duplicate.
    #[error("broken event sequence for {game_id}: expected seq {expected}, found {found}")]
    BrokenSequence {
        /// The game whose log is broken.
        game_id: String,
        /// The seq the fold expected next.
        expected: u64,
        /// The seq actually present.
        found: u64,
    },

    /// A logged payload failed to decode.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The reducer rejected a logged action. A valid log can never
    /// contain one, so this indicates corruption.
    #[error(transparent)]
    Reducer(#[from] ReducerError),
}

/// Determinism verification failure. Always fatal, never retried.
#[derive(Debug, Error)]
pub enum DeterminismError {
    /// The fold itself failed.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// Reading the log or snapshot failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A fresh fold does not match the stored snapshot.
    #[error("fold diverged from stored snapshot for {game_id}:\n{diff}")]
    SnapshotDiverged {
        /// The game that failed verification.
        game_id: String,
        /// The complete structural diff.
        diff: StructuralDiff,
    },

    /// An independent run diverged from the reference run.
    #[error("run {run} diverged from reference for {game_id}:\n{diff}")]
    RunDiverged {
        /// The game that failed certification.
        game_id: String,
        /// Index of the diverging run (1-based).
        run: usize,
        /// The complete structural diff.
        diff: StructuralDiff,
    },
}

/// Successful certification summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationReport {
    /// The certified game.
    pub game_id: String,
    /// Number of independent folds performed.
    pub runs: usize,
    /// Number of events in the certified log.
    pub events_folded: usize,
}

/// Replays an ordered event sequence from its genesis event.
///
/// The first event must be `game.created` at seq 1; the mode and seat
/// set are taken from its payload. Sequence numbers must be contiguous.
/// Unknown event types are no-ops, exactly as on the live path.
///
/// # Errors
///
/// Returns [`ReplayError`] for a malformed sequence or a log entry the
/// reducer rejects.
pub fn fold_events(
    events: &[EventRecord],
    catalog: &dyn CardCatalog,
) -> Result<GameState, ReplayError> {
    let Some(genesis) = events.first() else {
        return Err(ReplayError::MissingGenesis {
            game_id: String::new(),
        });
    };
    let game_id = genesis.game_id.clone();

    if genesis.seq.unwrap_or(0) != 1 || genesis.event_type != GAME_CREATED {
        return Err(ReplayError::MissingGenesis { game_id });
    }

    let Some(Action::GameCreated { mode, seats }) =
        Action::decode(&genesis.event_type, &genesis.payload)?
    else {
        return Err(ReplayError::MissingGenesis { game_id });
    };

    let mut seat_numbers: Vec<u8> = seats.iter().map(|s| s.seat).collect();
    seat_numbers.sort_unstable();

    let mut state = reduce(
        &mode,
        &GameState::new_rookie(),
        &seat_numbers,
        &Action::GameCreated {
            mode: mode.clone(),
            seats,
        },
        genesis.created_at_ns,
        catalog,
    )?;

    let mut expected = 2u64;
    for event in &events[1..] {
        let found = event.seq.unwrap_or(0);
        if found != expected {
            return Err(ReplayError::BrokenSequence {
                game_id,
                expected,
                found,
            });
        }
        expected += 1;

        if let Some(action) = Action::decode(&event.event_type, &event.payload)? {
            state = reduce(
                &mode,
                &state,
                &seat_numbers,
                &action,
                event.created_at_ns,
                catalog,
            )?;
        }
    }

    Ok(state)
}

/// Verifies that game documents are pure functions of their event logs.
pub struct ReplayVerifier<'a> {
    store: &'a GameStore,
    catalog: &'a dyn CardCatalog,
}

impl<'a> ReplayVerifier<'a> {
    /// Creates a verifier over a store and the catalog the live path
    /// used.
    #[must_use]
    pub const fn new(store: &'a GameStore, catalog: &'a dyn CardCatalog) -> Self {
        Self { store, catalog }
    }

    /// Folds a game's log and checks deep equality against the stored
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DeterminismError::SnapshotDiverged`] with the complete
    /// diff when the fold and the snapshot differ.
    pub fn verify_snapshot(&self, game_id: &str) -> Result<GameState, DeterminismError> {
        let events = self.store.events_for_game(game_id)?;
        let folded = fold_events(&events, self.catalog)?;
        let row = self.store.game(game_id)?;

        if folded != row.state {
            let diff = structural_diff(
                &serde_json::to_value(&folded).map_err(StoreError::from)?,
                &serde_json::to_value(&row.state).map_err(StoreError::from)?,
            );
            return Err(DeterminismError::SnapshotDiverged {
                game_id: game_id.to_string(),
                diff,
            });
        }

        Ok(folded)
    }

    /// Certifies determinism with `runs` independent folds.
    ///
    /// Run 1 is the snapshot verification; every further run must be
    /// structurally identical to it. The event ordering is validated on
    /// every fold.
    ///
    /// # Errors
    ///
    /// Returns the first divergence as a fatal [`DeterminismError`].
    pub fn certify(
        &self,
        game_id: &str,
        runs: usize,
    ) -> Result<CertificationReport, DeterminismError> {
        let events = self.store.events_for_game(game_id)?;
        let reference = self.verify_snapshot(game_id)?;

        for run in 2..=runs {
            let folded = fold_events(&events, self.catalog)?;
            if folded != reference {
                let diff = structural_diff(
                    &serde_json::to_value(&reference).map_err(StoreError::from)?,
                    &serde_json::to_value(&folded).map_err(StoreError::from)?,
                );
                return Err(DeterminismError::RunDiverged {
                    game_id: game_id.to_string(),
                    run,
                    diff,
                });
            }
        }

        Ok(CertificationReport {
            game_id: game_id.to_string(),
            runs: runs.max(1),
            events_folded: events.len(),
        })
    }
}
