//! Orchestrating game engine service.
//!
//! Ties the store, gate, catalog, and clock together behind the exposed
//! operations: create, pointer binding, start, `apply_action`, and the
//! reward-claim boundary. Every dependency is an injected handle — there
//! is no process-wide persistence client.
//!
//! # Control flow for an action
//!
//! ```text
//! apply_action --> status check --> decode --> reduce --> append + snapshot
//!                                                          (one transaction)
//! ```
//!
//! The engine stamps each event exactly once, through the injected
//! [`Clock`], immediately before the append. The reducer itself never
//! sees a clock.

mod wallet;


pub use wallet::{RecordingWallet, TransactionRecord, Wallet, WalletError};

use thiserror::Error;
use uuid::Uuid;

use crate::catalog::CardCatalog;
use crate::clock::Clock;
use crate::events::{Action, SeatEntry, ValidationError};
use crate::gate::{GateError, Pointer, PointerGate, PointerRef};
use crate::ledger::{EventRecord, GameRow, GameStore, SeatRecord, StoreError};
use crate::model::{GameState, GameStatus, ModeState, RookiePhase};
use crate::reducer::{reduce, ReducerError};

/// Reward-claim failure.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The match has not ended yet.
    #[error("cannot claim reward in phase {phase}")]
    NotEnded {
        /// The current phase string.
        phase: String,
    },

    /// The match ended without a sealed reward record.
    #[error("no reward eligibility sealed for game {game_id}")]
    NotEligible {
        /// The game missing an eligibility record.
        game_id: String,
    },

    /// The winning seat has no seat row (corrupt game).
    #[error("winner seat {seat} has no seat record in game {game_id}")]
    UnknownWinnerSeat {
        /// The game id.
        game_id: String,
        /// The winner seat without a row.
        seat: u8,
    },

    /// The wallet collaborator failed; the claim is left unmarked.
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// Top-level engine failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Pointer gate violation.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// Reducer failure.
    #[error(transparent)]
    Reducer(#[from] ReducerError),

    /// Reward-claim failure.
    #[error(transparent)]
    Claim(#[from] ClaimError),
}

/// Seat requested at game creation.
pub type SeatAssignment = SeatEntry;

/// Outcome of a reward claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The winner's balance was credited and the marker written.
    Credited {
        /// Timestamp recorded in the marker.
        paid_at: u64,
        /// The wallet's transaction record.
        transaction: TransactionRecord,
    },
    /// Drawn match: the marker was written without a wallet call.
    NoReward {
        /// Timestamp recorded in the marker.
        paid_at: u64,
    },
    /// The marker was already set; nothing was credited.
    AlreadyClaimed {
        /// The original marker timestamp.
        paid_at: u64,
    },
}

/// The engine service.
pub struct GameEngine {
    store: GameStore,
    gate: PointerGate,
    catalog: Box<dyn CardCatalog>,
    clock: Box<dyn Clock>,
}

impl GameEngine {
    /// Creates an engine over injected collaborator handles.
    #[must_use]
    pub fn new(
        store: GameStore,
        gate: PointerGate,
        catalog: Box<dyn CardCatalog>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            store,
            gate,
            catalog,
            clock,
        }
    }

    /// Returns the underlying store handle.
    #[must_use]
    pub const fn store(&self) -> &GameStore {
        &self.store
    }

    /// Returns the injected catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn CardCatalog {
        self.catalog.as_ref()
    }

    /// Creates a game in `LOBBY` with a fixed seat set.
    ///
    /// The genesis event is appended at `seq` 1 in the same transaction
    /// that creates the game and seat rows.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown mode or a bad seat set.
    pub fn create_game(
        &self,
        mode: &str,
        seats: Vec<SeatAssignment>,
    ) -> Result<GameRow, EngineError> {
        let game_id = Uuid::new_v4().to_string();
        let at = self.clock.now_ns();

        let seat_numbers = sorted_seat_numbers(&seats);
        let seat_records: Vec<SeatRecord> = seats
            .iter()
            .map(|s| SeatRecord {
                game_id: game_id.clone(),
                seat: s.seat,
                deck_ref: s.deck_ref.clone(),
                user_id: s.user_id.clone(),
            })
            .collect();

        let action = Action::GameCreated {
            mode: mode.to_string(),
            seats,
        };

        // Reducing the genesis action both validates the request and
        // yields the initial document.
        let state = reduce(
            mode,
            &GameState::new_rookie(),
            &seat_numbers,
            &action,
            at,
            self.catalog.as_ref(),
        )?;

        let row = GameRow {
            game_id: game_id.clone(),
            mode: mode.to_string(),
            status: GameStatus::Lobby,
            format_id: None,
            format_version: None,
            game_mode_id: None,
            game_mode_version: None,
            state,
            created_at_ns: at,
        };

        let genesis = EventRecord::new(&game_id, action.event_type(), action.payload(), at);
        self.store.insert_game(&row, &seat_records, &genesis)?;

        tracing::info!(game_id = %row.game_id, mode, "game created");
        Ok(row)
    }

    /// Binds the format half of the pointer.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::PointerFrozen`] once the game has started,
    /// or [`GateError::FormatNotFound`] for an unregistered format.
    pub fn set_format(
        &self,
        game_id: &str,
        format_id: &str,
        format_version: u32,
    ) -> Result<(), EngineError> {
        let row = self.store.game(game_id)?;
        ensure_pointer_mutable(&row)?;
        self.gate.validate_format(format_id, format_version)?;
        self.store.set_format(game_id, format_id, format_version)?;
        Ok(())
    }

    /// Binds the game-mode half of the pointer.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::PointerFrozen`] once the game has started,
    /// or [`GateError::GameModeNotFound`] for an unregistered mode.
    pub fn set_game_mode(
        &self,
        game_id: &str,
        game_mode_id: &str,
        game_mode_version: u32,
    ) -> Result<(), EngineError> {
        let row = self.store.game(game_id)?;
        ensure_pointer_mutable(&row)?;
        self.gate.validate_game_mode(game_mode_id, game_mode_version)?;
        self.store
            .set_game_mode(game_id, game_mode_id, game_mode_version)?;
        Ok(())
    }

    /// Reads the pointer a game is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::GameNotFound`] for an unknown game.
    pub fn get_pointer(&self, game_id: &str) -> Result<Pointer, EngineError> {
        let row = self.store.game(game_id)?;
        Ok(pointer_of(&row))
    }

    /// Starts a game: `LOBBY -> ACTIVE` exactly once, seeding `turn = 1`
    /// and the first active seat, and sealing the pointer.
    ///
    /// # Errors
    ///
    /// Fails when the game already started or its pointer is not fully
    /// bound and registered.
    pub fn start_game(&self, game_id: &str) -> Result<GameState, EngineError> {
        let row = self.store.game(game_id)?;
        if row.status != GameStatus::Lobby {
            return Err(ValidationError::AlreadyStarted.into());
        }
        self.gate.ensure_bound(game_id, &pointer_of(&row))?;

        let seats = self.seat_numbers(game_id)?;
        let at = self.clock.now_ns();
        let action = Action::GameStarted;
        let next = reduce(
            &row.mode,
            &row.state,
            &seats,
            &action,
            at,
            self.catalog.as_ref(),
        )?;

        let event = EventRecord::new(game_id, action.event_type(), action.payload(), at);
        let seq = self.store.append_action(game_id, &event, &next)?;

        tracing::info!(game_id, seq, "game started");
        Ok(next)
    }

    /// Applies a gameplay action: validates status, reduces, and appends
    /// the event atomically with the new snapshot.
    ///
    /// Unrecognized action types are recorded as explicit no-ops; the
    /// state comes back unchanged.
    ///
    /// # Errors
    ///
    /// Returns a typed error and appends nothing when the action is
    /// reserved, malformed, out of phase, or fails scoring validation.
    pub fn apply_action(
        &self,
        game_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<GameState, EngineError> {
        if Action::is_lifecycle(event_type) {
            return Err(ValidationError::ReservedAction {
                event_type: event_type.to_string(),
            }
            .into());
        }

        let row = self.store.game(game_id)?;
        if row.status != GameStatus::Active {
            return Err(ValidationError::GameNotActive {
                status: row.status.as_str().to_string(),
            }
            .into());
        }

        let decoded = Action::decode(event_type, payload)?;
        let seats = self.seat_numbers(game_id)?;
        let at = self.clock.now_ns();

        let next = match &decoded {
            Some(action) => reduce(
                &row.mode,
                &row.state,
                &seats,
                action,
                at,
                self.catalog.as_ref(),
            )?,
            // Unknown type for the active mode: explicit no-op.
            None => row.state.clone(),
        };

        // The event is persisted with the payload as submitted, so a
        // fold decodes exactly what the live path decoded.
        let event = EventRecord::new(game_id, event_type, payload.clone(), at);
        let seq = self.store.append_action(game_id, &event, &next)?;

        tracing::debug!(game_id, seq, event_type, "action applied");
        Ok(next)
    }

    /// Claims the match reward through the wallet collaborator, at most
    /// once per match.
    ///
    /// # Errors
    ///
    /// Fails before `ENDED`, and propagates wallet failures without
    /// writing the marker.
    pub fn claim_reward(
        &self,
        game_id: &str,
        wallet: &dyn Wallet,
    ) -> Result<ClaimOutcome, EngineError> {
        let row = self.store.game(game_id)?;
        let ModeState::Rookie(ref rookie) = row.state.mode;
        let rookie = rookie.clone();

        if rookie.phase != RookiePhase::Ended {
            return Err(ClaimError::NotEnded {
                phase: rookie.phase.as_str().to_string(),
            }
            .into());
        }

        if let Some(paid_at) = rookie.reward_paid_at {
            return Ok(ClaimOutcome::AlreadyClaimed { paid_at });
        }

        let reward = rookie
            .reward_eligible
            .as_ref()
            .ok_or_else(|| ClaimError::NotEligible {
                game_id: game_id.to_string(),
            })?;

        let credited = match reward.winner_seat {
            Some(seat) if reward.amount > 0 => {
                let seats = self.store.seats(game_id)?;
                let user_id = seats
                    .iter()
                    .find(|s| s.seat == seat)
                    .map(|s| s.user_id.clone())
                    .ok_or(ClaimError::UnknownWinnerSeat {
                        game_id: game_id.to_string(),
                        seat,
                    })?;
                let transaction = wallet
                    .credit_earned_balance(&user_id, reward.amount)
                    .map_err(ClaimError::from)?;
                Some((user_id, transaction))
            }
            _ => None,
        };

        let at = self.clock.now_ns();
        let action = Action::RookieRewardClaimed {
            user_id: credited
                .as_ref()
                .map(|(user_id, _)| user_id.clone())
                .unwrap_or_default(),
            amount: reward.amount,
        };

        let seats = self.seat_numbers(game_id)?;
        let next = reduce(
            &row.mode,
            &row.state,
            &seats,
            &action,
            at,
            self.catalog.as_ref(),
        )?;

        let event = EventRecord::new(game_id, action.event_type(), action.payload(), at);
        self.store.append_action(game_id, &event, &next)?;

        tracing::info!(game_id, paid_at = at, "reward claim recorded");
        Ok(match credited {
            Some((_, transaction)) => ClaimOutcome::Credited {
                paid_at: at,
                transaction,
            },
            None => ClaimOutcome::NoReward { paid_at: at },
        })
    }

    fn seat_numbers(&self, game_id: &str) -> Result<Vec<u8>, StoreError> {
        Ok(self
            .store
            .seats(game_id)?
            .iter()
            .map(|s| s.seat)
            .collect())
    }
}

/// The pointer freeze rule: mutable only while the game is in `LOBBY`.
fn ensure_pointer_mutable(row: &GameRow) -> Result<(), GateError> {
    if row.status == GameStatus::Lobby {
        Ok(())
    } else {
        Err(GateError::PointerFrozen {
            game_id: row.game_id.clone(),
        })
    }
}

fn sorted_seat_numbers(seats: &[SeatEntry]) -> Vec<u8> {
    let mut numbers: Vec<u8> = seats.iter().map(|s| s.seat).collect();
    numbers.sort_unstable();
    numbers
}

fn pointer_of(row: &GameRow) -> Pointer {
    Pointer {
        format: match (&row.format_id, row.format_version) {
            (Some(id), Some(version)) => Some(PointerRef {
                id: id.clone(),
                version,
            }),
            _ => None,
        },
        game_mode: match (&row.game_mode_id, row.game_mode_version) {
            (Some(id), Some(version)) => Some(PointerRef {
                id: id.clone(),
                version,
            }),
            _ => None,
        },
    }
}
