//! SQLite-backed game store.
//!
//! One store handle owns the connection; components receive the handle
//! explicitly instead of reaching for process-wide state. The connection
//! lives behind a mutex, which — together with the transactional
//! read-compute-insert in [`GameStore::append_action`] — serializes all
//! writes and keeps per-game `seq` values gapless.

// SQLite returns i64 for row IDs and counts, but they're always non-negative.
// Mutex poisoning indicates a panic in another thread, which is unrecoverable.
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::missing_panics_doc
)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use thiserror::Error;

use crate::model::{GameState, GameStatus};

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error during database operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or payload (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No game exists with the given id.
    #[error("game not found: {game_id}")]
    GameNotFound {
        /// The missing game id.
        game_id: String,
    },

    /// A stored status string was not recognized.
    #[error("corrupt status for game {game_id}: {status}")]
    CorruptStatus {
        /// The game whose row is corrupt.
        game_id: String,
        /// The unparseable status string.
        status: String,
    },
}

/// A single event record in a game's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Sequence number within the game (assigned on append).
    pub seq: Option<u64>,

    /// Game this event belongs to.
    pub game_id: String,

    /// Event type identifier.
    pub event_type: String,

    /// JSON payload.
    pub payload: serde_json::Value,

    /// Timestamp in nanoseconds since the Unix epoch, stamped at append.
    pub created_at_ns: u64,
}

impl EventRecord {
    /// Creates an event record with an explicit timestamp.
    ///
    /// `seq` is assigned when the record is appended.
    #[must_use]
    pub fn new(
        game_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        created_at_ns: u64,
    ) -> Self {
        Self {
            seq: None,
            game_id: game_id.into(),
            event_type: event_type.into(),
            payload,
            created_at_ns,
        }
    }
}

/// A seat row, fixed at game creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatRecord {
    /// Game the seat belongs to.
    pub game_id: String,
    /// Seat number, unique within the game.
    pub seat: u8,
    /// Deck the seat plays.
    pub deck_ref: String,
    /// Wallet account credited if this seat wins.
    pub user_id: String,
}

/// A game row: identity, pointer, and the cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRow {
    /// Game id.
    pub game_id: String,
    /// Mode code.
    pub mode: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Format half of the ruleset pointer.
    pub format_id: Option<String>,
    /// Format version.
    pub format_version: Option<u32>,
    /// Game-mode half of the ruleset pointer.
    pub game_mode_id: Option<String>,
    /// Game-mode version.
    pub game_mode_version: Option<u32>,
    /// Cached snapshot; derived, never authoritative on its own.
    pub state: GameState,
    /// Creation timestamp.
    pub created_at_ns: u64,
}

/// The append-only game store.
pub struct GameStore {
    conn: Arc<Mutex<Connection>>,
    #[allow(dead_code)]
    path: Option<std::path::PathBuf>,
}

impl GameStore {
    /// Opens or creates a store at the given path, enabling WAL mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory store for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Inserts a new game with its seat set, initial snapshot, and genesis
    /// event, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; on error nothing is written.
    pub fn insert_game(
        &self,
        row: &GameRow,
        seats: &[SeatRecord],
        genesis: &EventRecord,
    ) -> Result<(), StoreError> {
        let state_json = serde_json::to_string(&row.state)?;
        let payload_json = serde_json::to_string(&genesis.payload)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO games (game_id, mode, status, format_id, format_version,
                                game_mode_id, game_mode_version, state, created_at_ns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                row.game_id,
                row.mode,
                row.status.as_str(),
                row.format_id,
                row.format_version,
                row.game_mode_id,
                row.game_mode_version,
                state_json,
                row.created_at_ns,
            ],
        )?;

        for seat in seats {
            tx.execute(
                "INSERT INTO seats (game_id, seat, deck_ref, user_id) VALUES (?1, ?2, ?3, ?4)",
                params![row.game_id, seat.seat, seat.deck_ref, seat.user_id],
            )?;
        }

        tx.execute(
            "INSERT INTO events (game_id, seq, event_type, payload, created_at_ns)
             VALUES (?1, 1, ?2, ?3, ?4)",
            params![
                row.game_id,
                genesis.event_type,
                payload_json,
                genesis.created_at_ns,
            ],
        )?;

        tx.commit()?;
        tracing::debug!(game_id = %row.game_id, mode = %row.mode, "game created");
        Ok(())
    }

    /// Appends an action event and writes the new snapshot in one
    /// transaction.
    ///
    /// `seq` is computed as `max(existing) + 1` for the game inside the
    /// transaction; the `UNIQUE (game_id, seq)` constraint backstops the
    /// no-gaps/no-duplicates invariant. A crash can never leave the
    /// snapshot inconsistent with the log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::GameNotFound`] for an unknown game, or a
    /// database error; on error nothing is written.
    pub fn append_action(
        &self,
        game_id: &str,
        event: &EventRecord,
        new_state: &GameState,
    ) -> Result<u64, StoreError> {
        let state_json = serde_json::to_string(new_state)?;
        let payload_json = serde_json::to_string(&event.payload)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM games WHERE game_id = ?1",
                params![game_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::GameNotFound {
                game_id: game_id.to_string(),
            });
        }

        let seq: u64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM events WHERE game_id = ?1",
            params![game_id],
            |row| row.get::<_, i64>(0),
        )? as u64;

        tx.execute(
            "INSERT INTO events (game_id, seq, event_type, payload, created_at_ns)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                game_id,
                seq,
                event.event_type,
                payload_json,
                event.created_at_ns,
            ],
        )?;

        tx.execute(
            "UPDATE games SET state = ?1, status = ?2 WHERE game_id = ?3",
            params![state_json, new_state.status.as_str(), game_id],
        )?;

        tx.commit()?;
        tracing::debug!(game_id, seq, event_type = %event.event_type, "event appended");
        Ok(seq)
    }

    /// Reads a game row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::GameNotFound`] for an unknown game.
    pub fn game(&self, game_id: &str) -> Result<GameRow, StoreError> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                "SELECT game_id, mode, status, format_id, format_version,
                        game_mode_id, game_mode_version, state, created_at_ns
                 FROM games WHERE game_id = ?1",
                params![game_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<u32>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<u32>>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, i64>(8)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            game_id,
            mode,
            status,
            format_id,
            format_version,
            game_mode_id,
            game_mode_version,
            state_json,
            created_at_ns,
        )) = row
        else {
            return Err(StoreError::GameNotFound {
                game_id: game_id.to_string(),
            });
        };

        let status = GameStatus::parse(&status).ok_or_else(|| StoreError::CorruptStatus {
            game_id: game_id.clone(),
            status,
        })?;
        let state: GameState = serde_json::from_str(&state_json)?;

        Ok(GameRow {
            game_id,
            mode,
            status,
            format_id,
            format_version,
            game_mode_id,
            game_mode_version,
            state,
            created_at_ns: created_at_ns as u64,
        })
    }

    /// Reads a game's seats ordered by seat number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn seats(&self, game_id: &str) -> Result<Vec<SeatRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT game_id, seat, deck_ref, user_id FROM seats
             WHERE game_id = ?1 ORDER BY seat ASC",
        )?;

        let seats = stmt
            .query_map(params![game_id], |row| {
                Ok(SeatRecord {
                    game_id: row.get(0)?,
                    seat: row.get::<_, i64>(1)? as u8,
                    deck_ref: row.get(2)?,
                    user_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(seats)
    }

    /// Reads a game's full event log ordered by `seq`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn events_for_game(&self, game_id: &str) -> Result<Vec<EventRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT seq, game_id, event_type, payload, created_at_ns FROM events
             WHERE game_id = ?1 ORDER BY seq ASC",
        )?;

        let rows = stmt
            .query_map(params![game_id], |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)? as u64,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut events = Vec::with_capacity(rows.len());
        for (seq, game_id, event_type, payload_json, created_at_ns) in rows {
            events.push(EventRecord {
                seq: Some(seq),
                game_id,
                event_type,
                payload: serde_json::from_str(&payload_json)?,
                created_at_ns,
            });
        }

        Ok(events)
    }

    /// Returns the highest `seq` for a game, 0 when the log is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn head_seq(&self, game_id: &str) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();

        let head: i64 = conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM events WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;

        Ok(head as u64)
    }

    /// Updates the format half of a game's ruleset pointer.
    ///
    /// The freeze rule lives in the engine; this is the raw write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::GameNotFound`] for an unknown game.
    pub fn set_format(
        &self,
        game_id: &str,
        format_id: &str,
        format_version: u32,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        let updated = conn.execute(
            "UPDATE games SET format_id = ?1, format_version = ?2 WHERE game_id = ?3",
            params![format_id, format_version, game_id],
        )?;
        if updated == 0 {
            return Err(StoreError::GameNotFound {
                game_id: game_id.to_string(),
            });
        }
        Ok(())
    }

    /// Updates the game-mode half of a game's ruleset pointer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::GameNotFound`] for an unknown game.
    pub fn set_game_mode(
        &self,
        game_id: &str,
        game_mode_id: &str,
        game_mode_version: u32,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        let updated = conn.execute(
            "UPDATE games SET game_mode_id = ?1, game_mode_version = ?2 WHERE game_id = ?3",
            params![game_mode_id, game_mode_version, game_id],
        )?;
        if updated == 0 {
            return Err(StoreError::GameNotFound {
                game_id: game_id.to_string(),
            });
        }
        Ok(())
    }
}

impl Clone for GameStore {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            path: self.path.clone(),
        }
    }
}
