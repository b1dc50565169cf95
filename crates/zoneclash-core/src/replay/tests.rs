//! Replay and certification tests.
//!
//! The property tests drive random action scripts through the live
//! engine path, then certify that folding the resulting log reproduces
//! the stored snapshot — the core determinism guarantee.

use proptest::prelude::*;
use serde_json::json;

use super::*;
use crate::catalog::{CardAttributes, StaticCatalog};
use crate::clock::FixedClock;
use crate::engine::{GameEngine, SeatAssignment};
use crate::gate::{PointerGate, Registry};
use crate::model::{GameStatus, RookiePhase, MODE_ROOKIE};

fn hero_catalog() -> StaticCatalog {
    let mut catalog = StaticCatalog::new();
    for zone in 0..7usize {
        catalog.insert(format!("s1-z{zone}"), CardAttributes::hero(80));
        catalog.insert(format!("s2-z{zone}"), CardAttributes::hero(60));
    }
    for (i, power) in [35, 50, 50, 65].into_iter().enumerate() {
        catalog.insert(format!("c{i}"), CardAttributes::hero(power));
    }
    catalog
}

fn engine() -> GameEngine {
    GameEngine::new(
        GameStore::in_memory().unwrap(),
        PointerGate::new(
            Registry::new().with("standard", 1),
            Registry::new().with("rookie", 1),
        ),
        Box::new(hero_catalog()),
        Box::new(FixedClock::new(1_000, 10)),
    )
}

fn two_seats() -> Vec<SeatAssignment> {
    vec![
        SeatAssignment {
            seat: 1,
            deck_ref: "deck-a".to_string(),
            user_id: "user-a".to_string(),
        },
        SeatAssignment {
            seat: 2,
            deck_ref: "deck-b".to_string(),
            user_id: "user-b".to_string(),
        },
    ]
}

fn started_game(engine: &GameEngine) -> String {
    let row = engine.create_game(MODE_ROOKIE, two_seats()).unwrap();
    engine.set_format(&row.game_id, "standard", 1).unwrap();
    engine.set_game_mode(&row.game_id, "rookie", 1).unwrap();
    engine.start_game(&row.game_id).unwrap();
    row.game_id
}

/// Plays a complete match: begin, place, reveal, score, end, plus a few
/// turn handoffs along the way.
fn play_full_match(engine: &GameEngine) -> String {
    let game_id = started_game(engine);

    engine
        .apply_action(&game_id, "rookie.begin_match", &json!({}))
        .unwrap();
    engine
        .apply_action(&game_id, "turn.end", &json!({}))
        .unwrap();
    for seat in [1u8, 2] {
        for zone in 0..7u8 {
            engine
                .apply_action(
                    &game_id,
                    "rookie.place",
                    &json!({"seat": seat, "zone": zone, "version_key": format!("s{seat}-z{zone}")}),
                )
                .unwrap();
        }
        engine
            .apply_action(&game_id, "turn.end", &json!({}))
            .unwrap();
    }
    for zone in 0..7u8 {
        engine
            .apply_action(&game_id, "rookie.reveal", &json!({"zone": zone}))
            .unwrap();
    }
    engine
        .apply_action(&game_id, "rookie.score_match", &json!({}))
        .unwrap();
    engine
        .apply_action(&game_id, "rookie.end_match", &json!({}))
        .unwrap();

    game_id
}

// ============================================================================
// Fold correctness
// ============================================================================

#[test]
fn test_fold_reproduces_live_snapshot() {
    let engine = engine();
    let game_id = play_full_match(&engine);

    let events = engine.store().events_for_game(&game_id).unwrap();
    let folded = fold_events(&events, engine.catalog()).unwrap();

    let row = engine.store().game(&game_id).unwrap();
    assert_eq!(folded, row.state);
    assert_eq!(folded.status, GameStatus::Active);
    assert_eq!(folded.rookie().unwrap().phase, RookiePhase::Ended);
}

#[test]
fn test_fold_twice_is_identical() {
    let engine = engine();
    let game_id = play_full_match(&engine);
    let events = engine.store().events_for_game(&game_id).unwrap();

    let first = fold_events(&events, engine.catalog()).unwrap();
    let second = fold_events(&events, engine.catalog()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_fold_preserves_event_timestamps() {
    let engine = engine();
    let game_id = play_full_match(&engine);
    let events = engine.store().events_for_game(&game_id).unwrap();

    let folded = fold_events(&events, engine.catalog()).unwrap();
    let rookie = folded.rookie().unwrap();

    // Each timestamp equals the created_at_ns of the event that set it.
    let scored_event = events
        .iter()
        .find(|e| e.event_type == "rookie.score_match")
        .unwrap();
    assert_eq!(rookie.scored_at, Some(scored_event.created_at_ns));

    let ended_event = events
        .iter()
        .find(|e| e.event_type == "rookie.end_match")
        .unwrap();
    assert_eq!(rookie.ended_at, Some(ended_event.created_at_ns));
}

#[test]
fn test_fold_rejects_empty_and_headless_sequences() {
    let engine = engine();
    let game_id = play_full_match(&engine);
    let events = engine.store().events_for_game(&game_id).unwrap();

    assert!(matches!(
        fold_events(&[], engine.catalog()),
        Err(ReplayError::MissingGenesis { .. })
    ));

    // Drop the genesis event: the fold must refuse to start mid-log.
    assert!(matches!(
        fold_events(&events[1..], engine.catalog()),
        Err(ReplayError::MissingGenesis { .. })
    ));
}

#[test]
fn test_fold_detects_sequence_gap() {
    let engine = engine();
    let game_id = play_full_match(&engine);
    let mut events = engine.store().events_for_game(&game_id).unwrap();

    // Remove a middle event to forge a gap.
    events.remove(3);

    let err = fold_events(&events, engine.catalog()).unwrap_err();
    assert!(matches!(
        err,
        ReplayError::BrokenSequence {
            expected: 4,
            found: 5,
            ..
        }
    ));
}

// ============================================================================
// Verification and certification
// ============================================================================

#[test]
fn test_verify_snapshot_passes_for_live_game() {
    let engine = engine();
    let game_id = play_full_match(&engine);

    let verifier = ReplayVerifier::new(engine.store(), engine.catalog());
    let state = verifier.verify_snapshot(&game_id).unwrap();
    assert_eq!(state.rookie().unwrap().phase, RookiePhase::Ended);
}

#[test]
fn test_certification_hundred_runs_zero_diffs() {
    let engine = engine();
    let game_id = play_full_match(&engine);

    let verifier = ReplayVerifier::new(engine.store(), engine.catalog());
    let report = verifier.certify(&game_id, CERTIFICATION_RUNS).unwrap();

    assert_eq!(report.runs, 100);
    assert_eq!(
        report.events_folded,
        engine.store().events_for_game(&game_id).unwrap().len()
    );
}

#[test]
fn test_tampered_snapshot_fails_with_full_diff() {
    let engine = engine();
    let game_id = play_full_match(&engine);

    // Forge a snapshot that disagrees with the log: append a no-op event
    // but store a doctored document alongside it.
    let mut doctored = engine.store().game(&game_id).unwrap().state;
    doctored.turn += 5;
    let event = crate::ledger::EventRecord::new(
        &game_id,
        "rookie.emote",
        json!({"n": 1}),
        999_999,
    );
    engine
        .store()
        .append_action(&game_id, &event, &doctored)
        .unwrap();

    let verifier = ReplayVerifier::new(engine.store(), engine.catalog());
    let err = verifier.verify_snapshot(&game_id).unwrap_err();

    let DeterminismError::SnapshotDiverged { diff, .. } = &err else {
        panic!("expected snapshot divergence, got {err:?}");
    };
    assert!(!diff.is_empty());
    assert!(err.to_string().contains("/turn"));
}

// ============================================================================
// Property: the document is a pure function of the log
// ============================================================================

/// One scripted action: `(event_type, payload)`.
fn arb_action() -> impl Strategy<Value = (String, serde_json::Value)> {
    prop_oneof![
        Just(("turn.end".to_string(), json!({}))),
        Just(("rookie.begin_match".to_string(), json!({}))),
        (1..=2u8, 0..7u8, 0..4usize).prop_map(|(seat, zone, card)| {
            (
                "rookie.place".to_string(),
                json!({"seat": seat, "zone": zone, "version_key": format!("c{card}")}),
            )
        }),
        (0..7u8).prop_map(|zone| ("rookie.reveal".to_string(), json!({"zone": zone}))),
        (0..7u8).prop_map(|zone| ("rookie.hide".to_string(), json!({"zone": zone}))),
        Just(("rookie.score_match".to_string(), json!({}))),
        Just(("rookie.end_match".to_string(), json!({}))),
        (0..100u32).prop_map(|n| ("rookie.emote".to_string(), json!({"n": n}))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Property: after any action script, a fresh fold equals the stored
    /// snapshot and repeated folds are identical.
    #[test]
    fn prop_fold_equals_snapshot_after_any_script(
        script in prop::collection::vec(arb_action(), 1..60)
    ) {
        let engine = engine();
        let game_id = started_game(&engine);

        for (event_type, payload) in &script {
            // Out-of-phase and invalid actions are expected; they must
            // append nothing, which the certification below confirms.
            let _ = engine.apply_action(&game_id, event_type, payload);
        }

        let verifier = ReplayVerifier::new(engine.store(), engine.catalog());
        let report = verifier.certify(&game_id, 5).unwrap();
        prop_assert_eq!(report.game_id, game_id);
    }

    /// Property: folding any prefix of a log never fails and stays
    /// deterministic.
    #[test]
    fn prop_every_prefix_folds_deterministically(
        script in prop::collection::vec(arb_action(), 1..30)
    ) {
        let engine = engine();
        let game_id = started_game(&engine);
        for (event_type, payload) in &script {
            let _ = engine.apply_action(&game_id, event_type, payload);
        }

        let events = engine.store().events_for_game(&game_id).unwrap();
        for end in 1..=events.len() {
            let a = fold_events(&events[..end], engine.catalog()).unwrap();
            let b = fold_events(&events[..end], engine.catalog()).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
