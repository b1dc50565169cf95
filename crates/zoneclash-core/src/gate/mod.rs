//! Ruleset pointer validation and freezing.
//!
//! A session is bound to a `(format, gameMode)` pointer before it enters
//! setup. Each half is validated independently against its registry.
//! Once setup has begun — sealed by the engine when the game starts —
//! the pointer is frozen: any further bind attempt fails, even one that
//! proposes the value already stored. A session's reducer rules can
//! therefore never drift mid-game, which deterministic replay depends on.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pointer gate failure.
#[derive(Debug, Error)]
pub enum GateError {
    /// The format half references an unregistered format.
    #[error("format not found: {format_id} v{format_version}")]
    FormatNotFound {
        /// The unknown format id.
        format_id: String,
        /// The requested version.
        format_version: u32,
    },

    /// The game-mode half references an unregistered game mode.
    #[error("game mode not found: {game_mode_id} v{game_mode_version}")]
    GameModeNotFound {
        /// The unknown game-mode id.
        game_mode_id: String,
        /// The requested version.
        game_mode_version: u32,
    },

    /// The pointer is frozen; mutation is forbidden regardless of the
    /// proposed value.
    #[error("pointer is frozen for game {game_id}")]
    PointerFrozen {
        /// The game whose pointer was targeted.
        game_id: String,
    },

    /// The game cannot start before both pointer halves are bound.
    #[error("pointer not fully bound for game {game_id}")]
    PointerUnbound {
        /// The game missing a pointer half.
        game_id: String,
    },
}

/// One half of a ruleset pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerRef {
    /// Registry id.
    pub id: String,
    /// Registered version.
    pub version: u32,
}

/// The `(format, gameMode)` pointer a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    /// Format half, `None` until bound.
    pub format: Option<PointerRef>,
    /// Game-mode half, `None` until bound.
    pub game_mode: Option<PointerRef>,
}

impl Pointer {
    /// Returns `true` once both halves are bound.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.format.is_some() && self.game_mode.is_some()
    }
}

/// Versioned id registry, used for both formats and game modes.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, BTreeSet<u32>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a version of an id (builder form).
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, version: u32) -> Self {
        self.register(id, version);
        self
    }

    /// Registers a version of an id.
    pub fn register(&mut self, id: impl Into<String>, version: u32) {
        self.entries.entry(id.into()).or_default().insert(version);
    }

    /// Returns `true` when the exact id/version pair is registered.
    #[must_use]
    pub fn contains(&self, id: &str, version: u32) -> bool {
        self.entries
            .get(id)
            .is_some_and(|versions| versions.contains(&version))
    }
}

/// Validates pointer halves against the format and game-mode registries.
#[derive(Debug, Clone, Default)]
pub struct PointerGate {
    formats: Registry,
    game_modes: Registry,
}

impl PointerGate {
    /// Creates a gate over the given registries.
    #[must_use]
    pub const fn new(formats: Registry, game_modes: Registry) -> Self {
        Self {
            formats,
            game_modes,
        }
    }

    /// Validates the format half.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::FormatNotFound`] for an unregistered pair.
    pub fn validate_format(&self, format_id: &str, format_version: u32) -> Result<(), GateError> {
        if self.formats.contains(format_id, format_version) {
            Ok(())
        } else {
            Err(GateError::FormatNotFound {
                format_id: format_id.to_string(),
                format_version,
            })
        }
    }

    /// Validates the game-mode half.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::GameModeNotFound`] for an unregistered pair.
    pub fn validate_game_mode(
        &self,
        game_mode_id: &str,
        game_mode_version: u32,
    ) -> Result<(), GateError> {
        if self.game_modes.contains(game_mode_id, game_mode_version) {
            Ok(())
        } else {
            Err(GateError::GameModeNotFound {
                game_mode_id: game_mode_id.to_string(),
                game_mode_version,
            })
        }
    }

    /// Checks a pointer is fully bound and both halves are still
    /// registered; required before a game may start.
    ///
    /// # Errors
    ///
    /// Returns the half-specific error, or [`GateError::PointerUnbound`]
    /// when a half is missing.
    pub fn ensure_bound(&self, game_id: &str, pointer: &Pointer) -> Result<(), GateError> {
        let (Some(format), Some(game_mode)) = (&pointer.format, &pointer.game_mode) else {
            return Err(GateError::PointerUnbound {
                game_id: game_id.to_string(),
            });
        };
        self.validate_format(&format.id, format.version)?;
        self.validate_game_mode(&game_mode.id, game_mode.version)?;
        Ok(())
    }
}
