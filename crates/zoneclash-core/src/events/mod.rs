//! Action vocabulary and payload validation.
//!
//! Actions travel as `(event_type, payload)` pairs: a dotted type
//! identifier and a JSON payload. [`Action::decode`] is the single
//! boundary where payloads are validated into the closed [`Action`] enum;
//! everything past that boundary works with typed values only.
//!
//! An unrecognized event type is not an error — it decodes to `None` and
//! the reducer treats it as a no-op. A recognized type with a malformed
//! payload is a [`ValidationError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Game created; carries the mode and the fixed seat set.
pub const GAME_CREATED: &str = "game.created";
/// Game started; seeds turn 1 and the first active seat.
pub const GAME_STARTED: &str = "game.started";
/// Mode-agnostic turn handoff.
pub const TURN_END: &str = "turn.end";
/// Rookie: `SETUP -> MATCH`.
pub const ROOKIE_BEGIN_MATCH: &str = "rookie.begin_match";
/// Rookie: place a card in a zone.
pub const ROOKIE_PLACE: &str = "rookie.place";
/// Rookie: reveal a zone.
pub const ROOKIE_REVEAL: &str = "rookie.reveal";
/// Rookie: hide a zone again.
pub const ROOKIE_HIDE: &str = "rookie.hide";
/// Rookie: resolve the match by comparing zones.
pub const ROOKIE_SCORE_MATCH: &str = "rookie.score_match";
/// Alias for [`ROOKIE_SCORE_MATCH`], kept for older clients.
pub const ROOKIE_RESOLVE_MATCH: &str = "rookie.resolve_match";
/// Rookie: seal reward eligibility, `SCORED -> ENDED`.
pub const ROOKIE_END_MATCH: &str = "rookie.end_match";
/// Rookie: idempotency marker appended by the wallet boundary.
pub const ROOKIE_REWARD_CLAIMED: &str = "rookie.reward_claimed";

/// Malformed action input. No state change results from any of these.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The action type was empty.
    #[error("missing action type")]
    MissingActionType,

    /// The action type is reserved for engine lifecycle operations and
    /// cannot be submitted as a gameplay action.
    #[error("action type is reserved: {event_type}")]
    ReservedAction {
        /// The reserved event type.
        event_type: String,
    },

    /// The payload did not match the schema for its action type.
    #[error("malformed payload for {event_type}: {reason}")]
    MalformedPayload {
        /// The event type whose payload failed to decode.
        event_type: String,
        /// Decoder error text.
        reason: String,
    },

    /// A game was created with no seats.
    #[error("seat list is empty")]
    MissingSeats,

    /// A game was created with the same seat number twice.
    #[error("duplicate seat: {seat}")]
    DuplicateSeat {
        /// The repeated seat number.
        seat: u8,
    },

    /// The requested mode has no sub-reducer.
    #[error("unknown mode: {mode}")]
    UnknownMode {
        /// The unrecognized mode code.
        mode: String,
    },

    /// A gameplay action was submitted while the game was not active.
    #[error("game is not active: status={status}")]
    GameNotActive {
        /// The game's current status string.
        status: String,
    },

    /// `start_game` was called on a game that already started.
    #[error("game already started")]
    AlreadyStarted,

    /// An action referenced a zone outside `0..7`.
    #[error("zone out of range: {zone}")]
    ZoneOutOfRange {
        /// The offending zone index.
        zone: u8,
    },

    /// An action referenced a seat the game does not have.
    #[error("unknown seat: {seat}")]
    UnknownSeat {
        /// The offending seat number.
        seat: u8,
    },
}

/// A seat fixed at game creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatEntry {
    /// Seat number, unique within the game.
    pub seat: u8,
    /// Deck the seat plays.
    pub deck_ref: String,
    /// Wallet account credited if this seat wins.
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CreatedPayload {
    mode: String,
    seats: Vec<SeatEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PlacePayload {
    seat: u8,
    zone: u8,
    version_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ZonePayload {
    zone: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaimPayload {
    user_id: String,
    amount: u64,
}

/// A decoded action. The closed set of everything the reducer can apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Initializes the lobby document.
    GameCreated {
        /// Mode code the game is bound to.
        mode: String,
        /// The fixed seat set.
        seats: Vec<SeatEntry>,
    },
    /// Seeds turn 1 and the first active seat.
    GameStarted,
    /// Advances the turn and rotates the active seat.
    EndTurn,
    /// Rookie: `SETUP -> MATCH`.
    RookieBeginMatch,
    /// Rookie: place a card.
    RookiePlace {
        /// Acting seat.
        seat: u8,
        /// Zone index, `0..7`.
        zone: u8,
        /// Card version key, resolved against the catalog at scoring.
        version_key: String,
    },
    /// Rookie: reveal a zone.
    RookieReveal {
        /// Zone index.
        zone: u8,
    },
    /// Rookie: hide a zone.
    RookieHide {
        /// Zone index.
        zone: u8,
    },
    /// Rookie: resolve the match.
    RookieScoreMatch,
    /// Rookie: seal reward eligibility.
    RookieEndMatch,
    /// Rookie: reward claim marker from the wallet boundary.
    RookieRewardClaimed {
        /// Account that was credited (empty for drawn matches).
        user_id: String,
        /// Amount credited.
        amount: u64,
    },
}

fn decode_payload<T: serde::de::DeserializeOwned>(
    event_type: &str,
    payload: &Value,
) -> Result<T, ValidationError> {
    serde_json::from_value(payload.clone()).map_err(|e| ValidationError::MalformedPayload {
        event_type: event_type.to_string(),
        reason: e.to_string(),
    })
}

impl Action {
    /// Decodes an `(event_type, payload)` pair.
    ///
    /// Returns `Ok(None)` for event types outside the vocabulary: the
    /// caller records them as explicit no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the type is empty or the payload
    /// does not match the type's schema.
    pub fn decode(event_type: &str, payload: &Value) -> Result<Option<Self>, ValidationError> {
        if event_type.is_empty() {
            return Err(ValidationError::MissingActionType);
        }

        let action = match event_type {
            GAME_CREATED => {
                let p: CreatedPayload = decode_payload(event_type, payload)?;
                Self::GameCreated {
                    mode: p.mode,
                    seats: p.seats,
                }
            }
            GAME_STARTED => Self::GameStarted,
            TURN_END => Self::EndTurn,
            ROOKIE_BEGIN_MATCH => Self::RookieBeginMatch,
            ROOKIE_PLACE => {
                let p: PlacePayload = decode_payload(event_type, payload)?;
                Self::RookiePlace {
                    seat: p.seat,
                    zone: p.zone,
                    version_key: p.version_key,
                }
            }
            ROOKIE_REVEAL => {
                let p: ZonePayload = decode_payload(event_type, payload)?;
                Self::RookieReveal { zone: p.zone }
            }
            ROOKIE_HIDE => {
                let p: ZonePayload = decode_payload(event_type, payload)?;
                Self::RookieHide { zone: p.zone }
            }
            ROOKIE_SCORE_MATCH | ROOKIE_RESOLVE_MATCH => Self::RookieScoreMatch,
            ROOKIE_END_MATCH => Self::RookieEndMatch,
            ROOKIE_REWARD_CLAIMED => {
                let p: ClaimPayload = decode_payload(event_type, payload)?;
                Self::RookieRewardClaimed {
                    user_id: p.user_id,
                    amount: p.amount,
                }
            }
            _ => return Ok(None),
        };

        Ok(Some(action))
    }

    /// Returns the canonical event type for this action.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::GameCreated { .. } => GAME_CREATED,
            Self::GameStarted => GAME_STARTED,
            Self::EndTurn => TURN_END,
            Self::RookieBeginMatch => ROOKIE_BEGIN_MATCH,
            Self::RookiePlace { .. } => ROOKIE_PLACE,
            Self::RookieReveal { .. } => ROOKIE_REVEAL,
            Self::RookieHide { .. } => ROOKIE_HIDE,
            Self::RookieScoreMatch => ROOKIE_SCORE_MATCH,
            Self::RookieEndMatch => ROOKIE_END_MATCH,
            Self::RookieRewardClaimed { .. } => ROOKIE_REWARD_CLAIMED,
        }
    }

    /// Encodes this action's payload as it is persisted in the log.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::GameCreated { mode, seats } => serde_json::json!({
                "mode": mode,
                "seats": seats,
            }),
            Self::GameStarted
            | Self::EndTurn
            | Self::RookieBeginMatch
            | Self::RookieScoreMatch
            | Self::RookieEndMatch => Value::Object(serde_json::Map::new()),
            Self::RookiePlace {
                seat,
                zone,
                version_key,
            } => serde_json::json!({
                "seat": seat,
                "zone": zone,
                "version_key": version_key,
            }),
            Self::RookieReveal { zone } | Self::RookieHide { zone } => {
                serde_json::json!({ "zone": zone })
            }
            Self::RookieRewardClaimed { user_id, amount } => serde_json::json!({
                "user_id": user_id,
                "amount": amount,
            }),
        }
    }

    /// Returns `true` for actions only the engine itself may append.
    #[must_use]
    pub fn is_lifecycle(event_type: &str) -> bool {
        matches!(
            event_type,
            GAME_CREATED | GAME_STARTED | ROOKIE_REWARD_CLAIMED
        )
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_decode_place() {
        let payload = serde_json::json!({"seat": 1, "zone": 3, "version_key": "hero-v1"});
        let action = Action::decode(ROOKIE_PLACE, &payload).unwrap().unwrap();
        assert_eq!(
            action,
            Action::RookiePlace {
                seat: 1,
                zone: 3,
                version_key: "hero-v1".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_unknown_type_is_none() {
        let action = Action::decode("rookie.taunt", &serde_json::json!({})).unwrap();
        assert!(action.is_none());
    }

    #[test]
    fn test_decode_empty_type_is_error() {
        let result = Action::decode("", &serde_json::json!({}));
        assert!(matches!(result, Err(ValidationError::MissingActionType)));
    }

    #[test]
    fn test_decode_malformed_payload() {
        let result = Action::decode(ROOKIE_PLACE, &serde_json::json!({"seat": 1}));
        assert!(matches!(
            result,
            Err(ValidationError::MalformedPayload { event_type, .. }) if event_type == ROOKIE_PLACE
        ));
    }

    #[test]
    fn test_resolve_alias_decodes_to_score() {
        let a = Action::decode(ROOKIE_SCORE_MATCH, &serde_json::json!({}))
            .unwrap()
            .unwrap();
        let b = Action::decode(ROOKIE_RESOLVE_MATCH, &serde_json::json!({}))
            .unwrap()
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Action::RookieScoreMatch);
    }

    #[test]
    fn test_payload_round_trip() {
        let action = Action::RookiePlace {
            seat: 2,
            zone: 6,
            version_key: "card-9".to_string(),
        };
        let decoded = Action::decode(action.event_type(), &action.payload())
            .unwrap()
            .unwrap();
        assert_eq!(decoded, action);
    }

    #[test]
    fn test_lifecycle_types() {
        assert!(Action::is_lifecycle(GAME_CREATED));
        assert!(Action::is_lifecycle(GAME_STARTED));
        assert!(Action::is_lifecycle(ROOKIE_REWARD_CLAIMED));
        assert!(!Action::is_lifecycle(TURN_END));
        assert!(!Action::is_lifecycle(ROOKIE_SCORE_MATCH));
    }
}
