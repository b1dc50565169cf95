//! Zone-by-zone match resolution.
//!
//! One pass over the 7 zones: fetch both placed cards from the catalog,
//! verify they are `HERO`s with a power attribute, compare powers. The
//! pass either completes and yields the full [`MatchResults`], or fails
//! with the first offending seat/zone/version key — callers never see a
//! partially scored match.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::catalog::{CardCatalog, CatalogError};
use crate::model::{MatchResults, ZoneOutcome, ZoneScore, ROOKIE_SEATS, ZONE_COUNT};

/// Scoring validation failure. Each variant carries the context needed to
/// diagnose the offending placement. No partial result accompanies any of
/// these.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Scoring was requested from a phase that does not allow it.
    #[error("cannot score from phase {phase}")]
    InvalidPhase {
        /// The current phase string.
        phase: String,
    },

    /// The game's seat set is not exactly `[1, 2]`.
    #[error("rookie scoring requires seats [1, 2], got {seats:?}")]
    InvalidSeats {
        /// The actual seat set.
        seats: Vec<u8>,
    },

    /// A seat has no placement in a zone.
    #[error("seat {seat} has no placement in zone {zone}")]
    MissingPlacement {
        /// The seat missing a placement.
        seat: u8,
        /// The zone index.
        zone: u8,
    },

    /// A placed card is not in the catalog.
    #[error("card not found for seat {seat}, zone {zone}: {version_key}")]
    CardNotFound {
        /// The seat that placed the card.
        seat: u8,
        /// The zone index.
        zone: u8,
        /// The unknown version key.
        version_key: String,
    },

    /// A placed card is not a `HERO`.
    #[error(
        "seat {seat} placed a non-HERO card in zone {zone}: {version_key} is {concept_type}"
    )]
    NotHero {
        /// The seat that placed the card.
        seat: u8,
        /// The zone index.
        zone: u8,
        /// The offending version key.
        version_key: String,
        /// The card's actual concept type.
        concept_type: String,
    },

    /// A placed card has no power attribute.
    #[error("power lookup failed for seat {seat}, zone {zone}: {version_key}")]
    PowerLookupFailed {
        /// The seat that placed the card.
        seat: u8,
        /// The zone index.
        zone: u8,
        /// The version key without a power.
        version_key: String,
    },

    /// A zone was not revealed.
    #[error("zone {zone} is not revealed")]
    ZoneNotRevealed {
        /// The hidden zone index.
        zone: u8,
    },

    /// The catalog backend failed mid-pass; the whole attempt aborts.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),
}

/// Fetches a seat's card power for a zone, verifying catalog presence,
/// `HERO` concept type, and the power attribute.
fn zone_power(
    catalog: &dyn CardCatalog,
    placements: &BTreeMap<u8, BTreeMap<u8, String>>,
    seat: u8,
    zone: u8,
) -> Result<i64, ScoreError> {
    let version_key = placements
        .get(&seat)
        .and_then(|zones| zones.get(&zone))
        .ok_or(ScoreError::MissingPlacement { seat, zone })?;

    let attrs = catalog
        .card_attributes(version_key)?
        .ok_or_else(|| ScoreError::CardNotFound {
            seat,
            zone,
            version_key: version_key.clone(),
        })?;

    if !attrs.is_hero() {
        return Err(ScoreError::NotHero {
            seat,
            zone,
            version_key: version_key.clone(),
            concept_type: attrs.concept_type,
        });
    }

    attrs.power.ok_or_else(|| ScoreError::PowerLookupFailed {
        seat,
        zone,
        version_key: version_key.clone(),
    })
}

/// Scores all 7 zones in a single pass.
///
/// Higher power wins a zone; equal power is a draw. The match winner is
/// the seat with strictly more zone wins, `None` on a tie.
///
/// # Errors
///
/// Returns a [`ScoreError`] for the first invalid placement or catalog
/// failure; no partial result is produced.
pub fn score_zones(
    placements: &BTreeMap<u8, BTreeMap<u8, String>>,
    catalog: &dyn CardCatalog,
) -> Result<MatchResults, ScoreError> {
    let [seat_one, seat_two] = ROOKIE_SEATS;

    let mut zones = Vec::with_capacity(ZONE_COUNT);
    let mut seat_one_wins: u32 = 0;
    let mut seat_two_wins: u32 = 0;
    let mut draws: u32 = 0;

    #[allow(clippy::cast_possible_truncation)]
    for zone in 0..ZONE_COUNT as u8 {
        let p1 = zone_power(catalog, placements, seat_one, zone)?;
        let p2 = zone_power(catalog, placements, seat_two, zone)?;

        let outcome = match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => {
                seat_one_wins += 1;
                ZoneOutcome::P1
            }
            std::cmp::Ordering::Less => {
                seat_two_wins += 1;
                ZoneOutcome::P2
            }
            std::cmp::Ordering::Equal => {
                draws += 1;
                ZoneOutcome::Draw
            }
        };

        zones.push(ZoneScore {
            zone,
            seat_one_power: p1,
            seat_two_power: p2,
            outcome,
        });
    }

    let winner = match seat_one_wins.cmp(&seat_two_wins) {
        std::cmp::Ordering::Greater => Some(seat_one),
        std::cmp::Ordering::Less => Some(seat_two),
        std::cmp::Ordering::Equal => None,
    };

    Ok(MatchResults {
        zones,
        seat_one_wins,
        seat_two_wins,
        draws,
        winner,
    })
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::catalog::{CardAttributes, StaticCatalog, UnavailableCatalog};

    fn full_placements(keys: impl Fn(u8, u8) -> String) -> BTreeMap<u8, BTreeMap<u8, String>> {
        let mut placements = BTreeMap::new();
        for seat in ROOKIE_SEATS {
            let mut zones = BTreeMap::new();
            for zone in 0..7u8 {
                zones.insert(zone, keys(seat, zone));
            }
            placements.insert(seat, zones);
        }
        placements
    }

    /// Catalog mapping each seat's per-zone card to the given power.
    fn catalog_with_powers(p1: [i64; 7], p2: [i64; 7]) -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        for zone in 0..7usize {
            catalog.insert(format!("s1-z{zone}"), CardAttributes::hero(p1[zone]));
            catalog.insert(format!("s2-z{zone}"), CardAttributes::hero(p2[zone]));
        }
        catalog
    }

    fn keyed_placements() -> BTreeMap<u8, BTreeMap<u8, String>> {
        full_placements(|seat, zone| format!("s{seat}-z{zone}"))
    }

    #[test]
    fn test_higher_power_wins_zone() {
        let catalog = catalog_with_powers([80; 7], [60; 7]);
        let results = score_zones(&keyed_placements(), &catalog).unwrap();

        assert_eq!(results.zones[0].outcome, ZoneOutcome::P1);
        assert_eq!(results.zones[0].seat_one_power, 80);
        assert_eq!(results.zones[0].seat_two_power, 60);
        assert_eq!(results.seat_one_wins, 7);
        assert_eq!(results.seat_two_wins, 0);
        assert_eq!(results.draws, 0);
        assert_eq!(results.winner, Some(1));
    }

    #[test]
    fn test_equal_power_draws_zone() {
        let catalog = catalog_with_powers([50; 7], [50; 7]);
        let results = score_zones(&keyed_placements(), &catalog).unwrap();

        assert!(results.zones.iter().all(|z| z.outcome == ZoneOutcome::Draw));
        assert_eq!(results.draws, 7);
        assert_eq!(results.winner, None);
    }

    #[test]
    fn test_mixed_zones_and_strict_majority_winner() {
        // Seat 2 takes zones 0-3, seat 1 takes 4-6: seat 2 wins 4-3.
        let catalog = catalog_with_powers(
            [10, 10, 10, 10, 90, 90, 90],
            [20, 20, 20, 20, 30, 30, 30],
        );
        let results = score_zones(&keyed_placements(), &catalog).unwrap();

        assert_eq!(results.seat_one_wins, 3);
        assert_eq!(results.seat_two_wins, 4);
        assert_eq!(results.winner, Some(2));
    }

    #[test]
    fn test_equal_wins_is_no_winner() {
        // 3 wins each, one drawn zone.
        let catalog = catalog_with_powers(
            [90, 90, 90, 10, 10, 10, 40],
            [20, 20, 20, 80, 80, 80, 40],
        );
        let results = score_zones(&keyed_placements(), &catalog).unwrap();

        assert_eq!(results.seat_one_wins, 3);
        assert_eq!(results.seat_two_wins, 3);
        assert_eq!(results.draws, 1);
        assert_eq!(results.winner, None);
    }

    #[test]
    fn test_tally_preserves_zone_order() {
        let catalog = catalog_with_powers(
            [90, 10, 40, 90, 10, 40, 90],
            [20, 80, 40, 20, 80, 40, 20],
        );
        let results = score_zones(&keyed_placements(), &catalog).unwrap();

        let outcomes: Vec<ZoneOutcome> = results.zones.iter().map(|z| z.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                ZoneOutcome::P1,
                ZoneOutcome::P2,
                ZoneOutcome::Draw,
                ZoneOutcome::P1,
                ZoneOutcome::P2,
                ZoneOutcome::Draw,
                ZoneOutcome::P1,
            ]
        );
    }

    #[test]
    fn test_missing_placement_carries_context() {
        let mut placements = keyed_placements();
        placements.get_mut(&2).unwrap().remove(&5);
        let catalog = catalog_with_powers([50; 7], [50; 7]);

        let err = score_zones(&placements, &catalog).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::MissingPlacement { seat: 2, zone: 5 }
        ));
    }

    #[test]
    fn test_unknown_card_carries_context() {
        let mut placements = keyed_placements();
        placements
            .get_mut(&1)
            .unwrap()
            .insert(3, "ghost".to_string());
        let catalog = catalog_with_powers([50; 7], [50; 7]);

        let err = score_zones(&placements, &catalog).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::CardNotFound { seat: 1, zone: 3, version_key } if version_key == "ghost"
        ));
    }

    #[test]
    fn test_non_hero_rejected() {
        let mut catalog = catalog_with_powers([50; 7], [50; 7]);
        catalog.insert(
            "s1-z0",
            CardAttributes {
                concept_type: "SPELL".to_string(),
                power: Some(99),
            },
        );

        let err = score_zones(&keyed_placements(), &catalog).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::NotHero { seat: 1, zone: 0, concept_type, .. } if concept_type == "SPELL"
        ));
    }

    #[test]
    fn test_powerless_hero_rejected() {
        let mut catalog = catalog_with_powers([50; 7], [50; 7]);
        catalog.insert(
            "s2-z6",
            CardAttributes {
                concept_type: "HERO".to_string(),
                power: None,
            },
        );

        let err = score_zones(&keyed_placements(), &catalog).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::PowerLookupFailed { seat: 2, zone: 6, .. }
        ));
    }

    #[test]
    fn test_catalog_outage_aborts_whole_pass() {
        let err = score_zones(&keyed_placements(), &UnavailableCatalog).unwrap_err();
        assert!(matches!(err, ScoreError::CatalogUnavailable(_)));
    }
}
