//! Rookie mode sub-state.
//!
//! # Phase machine
//!
//! ```text
//! SETUP --begin_match--> MATCH --score_match--> SCORED --end_match--> ENDED
//! ```
//!
//! No phase is reachable in reverse. `results` and `tally` are written
//! once when the match is scored and are frozen from then on;
//! `reward_eligible` is written once when the match ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Serde helper for `BTreeMap<u8, V>` fields nested under a flattened,
/// internally-tagged enum.
///
/// Such fields are (de)serialized through serde's `Content` buffer, which
/// presents JSON object keys as strings and cannot convert them back into
/// integer map keys on its own. Serialization is unchanged — JSON object
/// keys are strings regardless — so this only teaches the deserializer to
/// parse the string keys back into `u8`, keeping the wire form identical.
mod u8_key_map {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<V, S>(map: &BTreeMap<u8, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        map.serialize(serializer)
    }

    pub(super) fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<u8, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        BTreeMap::<String, V>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| key.parse::<u8>().map(|key| (key, value)).map_err(D::Error::custom))
            .collect()
    }
}

/// Serde helper for `BTreeMap<u8, BTreeMap<u8, String>>`, which needs the
/// string-key parse applied at both nesting levels. See [`u8_key_map`].
mod u8_nested_key_map {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S>(
        map: &BTreeMap<u8, BTreeMap<u8, String>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        map.serialize(serializer)
    }

    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<u8, BTreeMap<u8, String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let outer = BTreeMap::<String, BTreeMap<String, String>>::deserialize(deserializer)?;
        outer
            .into_iter()
            .map(|(seat, zones)| {
                let seat = seat.parse::<u8>().map_err(D::Error::custom)?;
                let zones = zones
                    .into_iter()
                    .map(|(zone, key)| {
                        zone.parse::<u8>().map(|zone| (zone, key)).map_err(D::Error::custom)
                    })
                    .collect::<Result<BTreeMap<u8, String>, D::Error>>()?;
                Ok((seat, zones))
            })
            .collect()
    }
}

/// Number of comparison zones in a rookie match.
pub const ZONE_COUNT: usize = 7;

/// Seats a rookie match is played between.
pub const ROOKIE_SEATS: [u8; 2] = [1, 2];

/// Schema version of [`RookieState`], bumped on incompatible changes.
pub const ROOKIE_STATE_VERSION: u32 = 1;

/// Phase of a rookie match. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RookiePhase {
    /// Pre-match; placements may be staged.
    Setup,
    /// Match in progress.
    Match,
    /// Zones compared, results frozen.
    Scored,
    /// Reward eligibility sealed.
    Ended,
}

impl RookiePhase {
    /// Returns the phase as its persisted string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Match => "MATCH",
            Self::Scored => "SCORED",
            Self::Ended => "ENDED",
        }
    }
}

/// Outcome of comparing one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneOutcome {
    /// Seat 1 played the higher power.
    #[serde(rename = "P1")]
    P1,
    /// Seat 2 played the higher power.
    #[serde(rename = "P2")]
    P2,
    /// Equal power.
    #[serde(rename = "DRAW")]
    Draw,
}

/// Per-zone scoring detail recorded at match resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneScore {
    /// Zone index, `0..7`.
    pub zone: u8,
    /// Power of seat 1's card in this zone.
    pub seat_one_power: i64,
    /// Power of seat 2's card in this zone.
    pub seat_two_power: i64,
    /// Who won the zone.
    pub outcome: ZoneOutcome,
}

/// Frozen match results, written once when the match is scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResults {
    /// Per-zone scores in zone order.
    pub zones: Vec<ZoneScore>,
    /// Zones won by seat 1.
    pub seat_one_wins: u32,
    /// Zones won by seat 2.
    pub seat_two_wins: u32,
    /// Drawn zones.
    pub draws: u32,
    /// Seat with strictly more zone wins, `None` on a tie.
    pub winner: Option<u8>,
}

/// Frozen reward-eligibility record, written once when the match ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEligibility {
    /// Winning seat, `None` when the match was drawn.
    pub winner_seat: Option<u8>,
    /// Reward amount: 1 when there is a winner, 0 otherwise.
    pub amount: u64,
}

/// Rookie mode document nested in the game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RookieState {
    /// Schema version guard; see [`ROOKIE_STATE_VERSION`].
    pub version: u32,

    /// Current phase.
    pub phase: RookiePhase,

    /// `placements[seat][zone] = card version key`. Ordered maps keep the
    /// serialized document canonical.
    #[serde(with = "u8_nested_key_map")]
    pub placements: BTreeMap<u8, BTreeMap<u8, String>>,

    /// Reveal flag per zone.
    pub revealed: [bool; ZONE_COUNT],

    /// Timestamp of the `begin_match` event, once it happened.
    pub begun_at: Option<u64>,

    /// Per-seat timestamp of the seat's most recent placement.
    #[serde(with = "u8_key_map")]
    pub last_placed_at: BTreeMap<u8, u64>,

    /// Frozen results; `Some` from `SCORED` on.
    pub results: Option<MatchResults>,

    /// Frozen ordered list of zone outcomes; `Some` from `SCORED` on.
    pub tally: Option<Vec<ZoneOutcome>>,

    /// Timestamp of the scoring event.
    pub scored_at: Option<u64>,

    /// Frozen reward record; `Some` from `ENDED` on.
    pub reward_eligible: Option<RewardEligibility>,

    /// Timestamp of the `end_match` event.
    pub ended_at: Option<u64>,

    /// Idempotency marker written by the wallet boundary, never by the
    /// phase machine itself.
    pub reward_paid_at: Option<u64>,
}

impl RookieState {
    /// Creates the initial `SETUP` document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: ROOKIE_STATE_VERSION,
            phase: RookiePhase::Setup,
            placements: BTreeMap::new(),
            revealed: [false; ZONE_COUNT],
            begun_at: None,
            last_placed_at: BTreeMap::new(),
            results: None,
            tally: None,
            scored_at: None,
            reward_eligible: None,
            ended_at: None,
            reward_paid_at: None,
        }
    }

    /// Returns the version key the seat placed in the zone, if any.
    #[must_use]
    pub fn placement(&self, seat: u8, zone: u8) -> Option<&str> {
        self.placements
            .get(&seat)
            .and_then(|zones| zones.get(&zone))
            .map(String::as_str)
    }

    /// Returns `true` once every zone has been revealed.
    #[must_use]
    pub fn all_revealed(&self) -> bool {
        self.revealed.iter().all(|r| *r)
    }
}

impl Default for RookieState {
    fn default() -> Self {
        Self::new()
    }
}
