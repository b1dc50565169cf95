//! Card catalog capability interface.
//!
//! The catalog is an external, read-only collaborator. The engine only
//! needs one lookup from it, expressed as the [`CardCatalog`] trait so
//! callers inject a real client, the in-memory [`StaticCatalog`], or the
//! always-failing [`UnavailableCatalog`] in tests. Scoring treats any
//! catalog failure as fatal for the whole attempt.

use std::collections::BTreeMap;

use thiserror::Error;

/// Concept type a scoreable card must have.
pub const CONCEPT_HERO: &str = "HERO";

/// Catalog lookup failure.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The catalog backend could not be reached.
    #[error("catalog unavailable: {reason}")]
    Unavailable {
        /// Backend error text.
        reason: String,
    },
}

/// Attributes of one card version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAttributes {
    /// Concept type, e.g. `HERO`.
    pub concept_type: String,

    /// Power used for zone comparison. `None` when the catalog entry
    /// carries no power attribute.
    pub power: Option<i64>,
}

impl CardAttributes {
    /// Creates a `HERO` card with the given power.
    #[must_use]
    pub fn hero(power: i64) -> Self {
        Self {
            concept_type: CONCEPT_HERO.to_string(),
            power: Some(power),
        }
    }

    /// Returns `true` when the card is a `HERO`.
    #[must_use]
    pub fn is_hero(&self) -> bool {
        self.concept_type == CONCEPT_HERO
    }
}

/// Read-only card attribute lookup.
pub trait CardCatalog {
    /// Fetches the attributes for a card version key.
    ///
    /// Returns `Ok(None)` when the key is unknown to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the backend is unavailable.
    fn card_attributes(&self, version_key: &str) -> Result<Option<CardAttributes>, CatalogError>;
}

/// In-memory catalog backed by a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    cards: BTreeMap<String, CardAttributes>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a card (builder form).
    #[must_use]
    pub fn with_card(mut self, version_key: impl Into<String>, attrs: CardAttributes) -> Self {
        self.cards.insert(version_key.into(), attrs);
        self
    }

    /// Adds a card.
    pub fn insert(&mut self, version_key: impl Into<String>, attrs: CardAttributes) {
        self.cards.insert(version_key.into(), attrs);
    }
}

impl CardCatalog for StaticCatalog {
    fn card_attributes(&self, version_key: &str) -> Result<Option<CardAttributes>, CatalogError> {
        Ok(self.cards.get(version_key).cloned())
    }
}

/// Catalog stub whose every lookup fails, for exercising the
/// no-partial-commit path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCatalog;

impl CardCatalog for UnavailableCatalog {
    fn card_attributes(&self, _version_key: &str) -> Result<Option<CardAttributes>, CatalogError> {
        Err(CatalogError::Unavailable {
            reason: "catalog stub is always offline".to_string(),
        })
    }
}
