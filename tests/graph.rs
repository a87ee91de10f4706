use homey_flow::graph::optimize_positions;
use homey_flow::{FlowError, normalize_and_validate_advanced_flow, sanitize_flow_patch};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn trigger(id: &str) -> Value {
    json!({"type": "trigger", "id": id, "ownerUri": "homey:app:com.athom.logic"})
}

fn condition(id: &str) -> Value {
    json!({"type": "condition", "id": id, "ownerUri": "homey:app:com.athom.time"})
}

fn action(id: &str) -> Value {
    json!({"type": "action", "id": id, "ownerUri": "homey:device:light1"})
}

#[test]
fn sequence_gets_distinct_ids_and_forward_edges() {
    let flow = normalize_and_validate_advanced_flow(json!({
        "name": "Chain",
        "cards": [trigger("t"), action("a1"), action("a2"), action("a3")]
    }))
    .unwrap();

    assert_eq!(flow.cards.len(), 4, "every card should survive");
    let total_edges: usize = flow
        .cards
        .values()
        .map(|c| c.edge_targets().count())
        .sum();
    assert_eq!(total_edges, 3, "N cards wire into N-1 forward edges");
    for (i, id) in flow.cards.keys().enumerate() {
        let prefix = if i == 0 { format!("trigger_{i}_") } else { format!("action_{i}_") };
        assert!(id.starts_with(&prefix), "unexpected generated id {id}");
    }
}

#[test]
fn trigger_condition_action_scenario() {
    let flow = normalize_and_validate_advanced_flow(json!({
        "name": "Scenario",
        "cards": [trigger("t"), condition("c"), action("a")]
    }))
    .unwrap();

    assert_eq!(flow.cards.len(), 3);
    let ids: Vec<&String> = flow.cards.keys().collect();
    let trigger_card = &flow.cards[0];
    let condition_card = &flow.cards[1];
    let action_card = &flow.cards[2];

    assert_eq!(trigger_card.output_success, vec![ids[1].clone()]);
    assert!(trigger_card.output_true.is_empty());
    assert_eq!(condition_card.output_true, vec![ids[2].clone()]);
    assert!(condition_card.output_success.is_empty());
    assert_eq!(action_card.edge_targets().count(), 0);
}

#[test]
fn auto_positions_are_deterministic_left_to_right() {
    let flow = normalize_and_validate_advanced_flow(json!({
        "name": "Layout",
        "cards": [trigger("t"), action("a1"), action("a2")]
    }))
    .unwrap();
    for (i, card) in flow.cards.values().enumerate() {
        assert_eq!(card.x, 50.0 + i as f64 * 200.0);
        assert_eq!(card.y, 100.0);
    }
}

#[test]
fn explicit_positions_are_kept() {
    let mut card = action("a");
    card.as_object_mut().unwrap().insert("x".into(), json!(10));
    card.as_object_mut().unwrap().insert("y".into(), json!(20));
    let flow = normalize_and_validate_advanced_flow(json!({
        "name": "Layout",
        "cards": [trigger("t"), card]
    }))
    .unwrap();
    let placed = &flow.cards[1];
    assert_eq!((placed.x, placed.y), (10.0, 20.0));
}

#[test]
fn author_declared_wiring_suppresses_auto_wiring() {
    let mut first = trigger("t");
    first
        .as_object_mut()
        .unwrap()
        .insert("outputSuccess".into(), json!([]));
    let flow = normalize_and_validate_advanced_flow(json!({
        "name": "Authored",
        "cards": [first, action("a1"), action("a2")]
    }))
    .unwrap();

    let trigger_card = &flow.cards[0];
    assert_eq!(
        trigger_card.edge_targets().count(),
        0,
        "author-declared outputSuccess must win over auto-wiring"
    );
    let middle = &flow.cards[1];
    assert_eq!(middle.output_success.len(), 1, "rest of the chain still wires");
}

#[test]
fn note_cards_are_terminal() {
    let flow = normalize_and_validate_advanced_flow(json!({
        "name": "Documented",
        "cards": [trigger("t"), {"type": "note", "value": "docs"}, action("a")]
    }))
    .unwrap();
    let note = &flow.cards[1];
    assert_eq!(note.edge_targets().count(), 0, "note must not auto-wire forward");
    // The trigger still wires into the note itself.
    assert_eq!(flow.cards[0].output_success.len(), 1);
}

#[test]
fn map_input_is_idempotent() {
    let keyed = json!({
        "name": "Stable",
        "enabled": true,
        "cards": {
            "t1": {"type": "trigger", "id": "sunset", "ownerUri": "homey:app:com.athom.sun",
                   "x": 50, "y": 100, "outputSuccess": ["a1"]},
            "a1": {"type": "action", "id": "dim", "ownerUri": "homey:device:light1",
                   "x": 250, "y": 100}
        }
    });
    let once = normalize_and_validate_advanced_flow(keyed).unwrap();
    let round_tripped = serde_json::to_value(&once).unwrap();
    let twice = normalize_and_validate_advanced_flow(round_tripped).unwrap();
    assert_eq!(
        serde_json::to_value(&once).unwrap(),
        serde_json::to_value(&twice).unwrap()
    );
}

#[test]
fn missing_or_malformed_cards_is_structural() {
    for (raw, expect_fragment) in [
        (json!({"name": "x"}), "cards"),
        (json!({"name": "x", "cards": "nope"}), "object or array"),
        (json!({"name": "x", "cards": []}), "at least one card"),
        (json!("not even a map"), "must be an object"),
    ] {
        let err = normalize_and_validate_advanced_flow(raw).expect_err("must fail");
        match err {
            FlowError::Structural { message, .. } => assert!(
                message.contains(expect_fragment),
                "expected '{expect_fragment}' in '{message}'"
            ),
            other => panic!("expected structural error, got {other:?}"),
        }
    }
}

#[test]
fn all_invalid_cards_escalates_to_structural() {
    let err = normalize_and_validate_advanced_flow(json!({
        "name": "Broken",
        "cards": [{"type": "action"}, {"type": "sparkle", "x": 0, "y": 0}]
    }))
    .expect_err("no valid card must fail");
    match err {
        FlowError::Structural { field, message } => {
            assert_eq!(field, "cards");
            assert!(message.contains("valid card"), "got '{message}'");
        }
        other => panic!("expected structural error, got {other:?}"),
    }
}

#[test]
fn invalid_card_is_excluded_and_its_edges_pruned() {
    let flow = normalize_and_validate_advanced_flow(json!({
        "name": "Partial",
        "cards": {
            "t1": {"type": "trigger", "id": "motion", "ownerUri": "homey:device:sensor1",
                   "x": 50, "y": 100, "outputSuccess": ["broken"]},
            "broken": {"type": "action", "x": 250, "y": 100}
        }
    }))
    .unwrap();
    assert_eq!(flow.cards.len(), 1);
    assert_eq!(
        flow.cards["t1"].edge_targets().count(),
        0,
        "edge to the excluded card must be pruned"
    );
}

#[test]
fn generated_name_when_missing() {
    let flow = normalize_and_validate_advanced_flow(json!({
        "cards": [trigger("t"), action("a")]
    }))
    .unwrap();
    assert!(flow.name.starts_with("Flow "), "got '{}'", flow.name);
}

#[test]
fn empty_patch_serializes_to_empty_object() {
    let patch = sanitize_flow_patch(json!({})).unwrap();
    assert_eq!(patch.into_payload().unwrap(), json!({}));
}

#[test]
fn patch_rejects_blank_name_but_validates_cards() {
    let err = sanitize_flow_patch(json!({"name": "  "})).expect_err("blank name must fail");
    assert!(matches!(err, FlowError::Structural { field: "name", .. }));

    let patch = sanitize_flow_patch(json!({
        "enabled": false,
        "cards": [trigger("t"), action("a")]
    }))
    .unwrap();
    assert_eq!(patch.enabled, Some(false));
    assert_eq!(patch.name, None);
    assert_eq!(patch.cards.as_ref().map(|c| c.len()), Some(2));
}

#[test]
fn optimize_positions_lays_types_into_columns() {
    let mut flow = normalize_and_validate_advanced_flow(json!({
        "name": "Columns",
        "cards": [trigger("t"), condition("c"), action("a1"), action("a2"),
                  {"type": "delay", "args": {"delay": "5"}}]
    }))
    .unwrap();
    optimize_positions(&mut flow);

    let xs: Vec<f64> = flow.cards.values().map(|c| c.x).collect();
    assert_eq!(xs, vec![50.0, 400.0, 800.0, 800.0, 600.0]);
    let action_ys: Vec<f64> = flow
        .cards
        .values()
        .filter(|c| c.x == 800.0)
        .map(|c| c.y)
        .collect();
    assert_eq!(action_ys, vec![40.0, 140.0], "actions stack within their column");
}
