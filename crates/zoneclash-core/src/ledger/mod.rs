//! Append-only event log and snapshot store.
//!
//! Backed by SQLite with WAL mode. Events are stored per game with a
//! `seq` that starts at 1, increases strictly, and never gaps or
//! duplicates: the append computes `seq = max(existing) + 1` and inserts
//! the row inside one transaction, which also writes the derived snapshot.
//! Events can only be added, never modified or deleted.
//!
//! # Example
//!
//! ```rust
//! use zoneclash_core::ledger::{EventRecord, GameStore};
//!
//! # fn example() -> Result<(), zoneclash_core::ledger::StoreError> {
//! let store = GameStore::in_memory()?;
//! let events = store.events_for_game("game-123")?;
//! assert!(events.is_empty());
//! # Ok(())
//! # }
//! ```

mod storage;


pub use storage::{EventRecord, GameRow, GameStore, SeatRecord, StoreError};
