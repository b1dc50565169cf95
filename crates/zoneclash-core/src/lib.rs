//! Event-sourced turn-based card-match engine.
//!
//! The authoritative state of every game is an append-only, per-game event
//! log. The cached game document is a projection: it must always be
//! reconstructable by folding the reducer over the log from the first
//! event, and the [`replay`] module certifies that this holds bit-exactly
//! across arbitrary re-runs.
//!
//! # Architecture
//!
//! ```text
//! action request --> engine --> reducer --> next state
//!                      |                        |
//!                      +--- append + snapshot (one transaction) ---> ledger
//!
//! replay: fold(reducer, events[1..=n]) == stored snapshot
//! ```
//!
//! # Modules
//!
//! - [`model`]: closed, versioned state schema (game document, rookie
//!   mode sub-state)
//! - [`events`]: action vocabulary and payload validation
//! - [`ledger`]: SQLite-backed append-only event log and snapshot store
//! - [`reducer`]: pure state transition function and mode dispatch
//! - [`scoring`]: zone-by-zone match resolution
//! - [`catalog`]: card catalog capability interface
//! - [`gate`]: ruleset pointer validation and freezing
//! - [`engine`]: orchestrating service tying the above together
//! - [`replay`]: fold/replay and determinism certification
//! - [`clock`]: injectable time source
//!
//! # Determinism
//!
//! The reducer never reads the wall clock; every timestamp it records is
//! copied from the event record being applied, and event records are
//! stamped exactly once at append time through the injected [`clock::Clock`].
//! Given the same event sequence and the same catalog contents, a fold
//! therefore produces the same state, byte for byte.

pub mod catalog;
pub mod clock;
pub mod engine;
pub mod events;
pub mod gate;
pub mod ledger;
pub mod model;
pub mod reducer;
pub mod replay;
pub mod scoring;

pub use catalog::{CardAttributes, CardCatalog, CatalogError, StaticCatalog, UnavailableCatalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{
    ClaimError, ClaimOutcome, EngineError, GameEngine, RecordingWallet, SeatAssignment,
    TransactionRecord, Wallet, WalletError,
};
pub use events::{Action, SeatEntry, ValidationError};
pub use gate::{GateError, Pointer, PointerGate, PointerRef, Registry};
pub use ledger::{EventRecord, GameRow, GameStore, SeatRecord, StoreError};
pub use model::{GameState, GameStatus, ModeState, RookiePhase, RookieState};
pub use reducer::{reduce, ReducerError};
pub use replay::{
    fold_events, CertificationReport, DeterminismError, ReplayError, ReplayVerifier,
    StructuralDiff, CERTIFICATION_RUNS,
};
pub use scoring::ScoreError;
