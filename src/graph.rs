//! Conversion of author-supplied card sequences into the keyed graph the
//! hub stores, and assembly of validated advanced flows. Conversion itself
//! never fails; malformed entries are carried through for the card
//! validator to reject.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    card,
    error::{FlowError, Result},
    model::{Card, CardType, FlowGraph, FlowPatch},
    util,
};

const AUTO_X_ORIGIN: f64 = 50.0;
const AUTO_X_SPACING: f64 = 200.0;
const AUTO_Y: f64 = 100.0;

/// Columnar layout used by [`optimize_positions`]: triggers left,
/// conditions centre, actions right, control flow in between.
const COLUMN_X: [f64; 4] = [50.0, 400.0, 800.0, 600.0];
const COLUMN_Y_ORIGIN: f64 = 40.0;
const COLUMN_Y_SPACING: f64 = 100.0;

/// The `normalizeAndValidateAdvancedFlow` operation: structural checks on
/// the top-level object, logged name fallback, sequence→graph conversion,
/// per-card validation with invalid-card exclusion, and edge pruning.
pub fn normalize_and_validate(raw: Value) -> Result<FlowGraph> {
    let Value::Object(map) = raw else {
        return Err(FlowError::Structural {
            field: "flow",
            message: "Advanced flow must be an object".to_string(),
        });
    };

    let name = util::sanitize_flow_name(map.get("name"));
    let enabled = map.get("enabled").and_then(Value::as_bool).unwrap_or(true);
    let triggerable = map
        .get("triggerable")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let broken = map.get("broken").and_then(Value::as_bool).unwrap_or(false);
    let folder = util::string_field(&map, "folder");

    let cards_raw = map.get("cards").ok_or_else(|| FlowError::Structural {
        field: "cards",
        message: "Advanced flow must declare cards".to_string(),
    })?;
    let cards = validate_cards_value(cards_raw)?;

    Ok(FlowGraph {
        name,
        enabled,
        triggerable,
        broken,
        folder,
        cards,
    })
}

/// Sanitize a partial flow update: any subset of `name`, `enabled`,
/// `folder`, `triggerable` and `cards`, each validated with the creation
/// rules when present.
pub fn sanitize_patch(raw: Value) -> Result<FlowPatch> {
    let Value::Object(map) = raw else {
        return Err(FlowError::Structural {
            field: "flow",
            message: "Flow update must be an object".to_string(),
        });
    };

    let name = match map.get("name") {
        None => None,
        Some(value) => Some(
            value
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| FlowError::Structural {
                    field: "name",
                    message: "Flow name must be a non-empty string".to_string(),
                })?
                .to_string(),
        ),
    };

    let cards = match map.get("cards") {
        None => None,
        Some(value) => Some(validate_cards_value(value)?),
    };

    Ok(FlowPatch {
        name,
        enabled: map.get("enabled").and_then(Value::as_bool),
        folder: util::string_field(&map, "folder"),
        triggerable: map.get("triggerable").and_then(Value::as_bool),
        cards,
    })
}

/// Shared card pipeline: accept either shape, validate every entry,
/// exclude invalid cards, escalate when none survive, prune dangling
/// output edges.
fn validate_cards_value(raw: &Value) -> Result<IndexMap<String, Card>> {
    let keyed: IndexMap<String, Value> = match raw {
        Value::Array(entries) => sequence_to_graph(entries),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => {
            return Err(FlowError::Structural {
                field: "cards",
                message: "Flow cards must be an object or array".to_string(),
            });
        }
    };
    if keyed.is_empty() {
        return Err(FlowError::Structural {
            field: "cards",
            message: "Flow must contain at least one card".to_string(),
        });
    }

    let mut cards: IndexMap<String, Card> = IndexMap::new();
    for (id, value) in &keyed {
        match card::validate_card(id, value) {
            Ok(card) => {
                cards.insert(id.clone(), card);
            }
            Err(err) => warn!(card_id = %id, error = %err, "dropping invalid card"),
        }
    }
    if cards.is_empty() {
        return Err(FlowError::Structural {
            field: "cards",
            message: "Flow must contain at least one valid card".to_string(),
        });
    }

    prune_dangling_edges(&mut cards);
    Ok(cards)
}

/// Convert an ordered card sequence into a keyed graph: generated ids,
/// deterministic left-to-right positions for missing coordinates, and a
/// forward edge per consecutive pair. Author-declared wiring on the
/// original entry always wins over auto-wiring. Already-keyed input never
/// reaches this function.
pub fn sequence_to_graph(entries: &[Value]) -> IndexMap<String, Value> {
    let mut used: HashSet<String> = HashSet::new();
    let mut ids: Vec<String> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let ty = entry.get("type").and_then(Value::as_str).unwrap_or("card");
        let base = format!("{ty}_{i}_{}", util::short_hex(6));
        let mut candidate = base.clone();
        let mut n = 2usize;
        while used.contains(&candidate) {
            candidate = format!("{base}__{n}");
            n += 1;
        }
        used.insert(candidate.clone());
        ids.push(candidate);
    }

    let mut graph = IndexMap::new();
    for (i, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            // Left as-is for the validator to reject.
            graph.insert(ids[i].clone(), entry.clone());
            continue;
        };
        let mut card = obj.clone();
        if !card.contains_key("x") {
            card.insert(
                "x".to_string(),
                Value::from(AUTO_X_ORIGIN + i as f64 * AUTO_X_SPACING),
            );
        }
        if !card.contains_key("y") {
            card.insert("y".to_string(), Value::from(AUTO_Y));
        }
        if i + 1 < entries.len() {
            auto_wire(obj, &mut card, &ids[i + 1]);
        }
        graph.insert(ids[i].clone(), Value::Object(card));
    }
    graph
}

/// Add the forward edge from `card` to `next_id` unless the source is a
/// terminal type or the original entry already declares that edge field.
fn auto_wire(original: &Map<String, Value>, card: &mut Map<String, Value>, next_id: &str) {
    let ty = original.get("type").and_then(Value::as_str).unwrap_or("");
    if is_terminal_type(ty) {
        return;
    }
    let field = forward_edge_field(ty);
    if original.contains_key(field) {
        return;
    }
    card.insert(
        field.to_string(),
        Value::Array(vec![Value::String(next_id.to_string())]),
    );
}

/// Terminal types never get an auto-wired outgoing edge. Judged on the raw
/// type string because conversion runs before validation, so an explicit
/// `end` marker is honored here even though the validator rejects it later.
fn is_terminal_type(ty: &str) -> bool {
    matches!(ty, "note" | "end")
}

/// Condition nodes wire forward via `outputTrue`; everything else via
/// `outputSuccess`.
fn forward_edge_field(ty: &str) -> &'static str {
    if ty == "condition" {
        "outputTrue"
    } else {
        "outputSuccess"
    }
}

/// Output edges may only reference ids present in the graph. Excluding an
/// invalid card can orphan edges pointing at it; those references are
/// pruned rather than failing the whole flow.
fn prune_dangling_edges(cards: &mut IndexMap<String, Card>) {
    let known: HashSet<String> = cards.keys().cloned().collect();
    for (id, card) in cards.iter_mut() {
        for (field, list) in card.edge_lists_mut() {
            list.retain(|target| {
                let keep = known.contains(target);
                if !keep {
                    warn!(card_id = %id, field, target = %target, "pruning edge to unknown card");
                }
                keep
            });
        }
    }
}

/// Columnar re-layout by card type, as the gateway's assisted-creation
/// path does before persisting: triggers at x=50, conditions at x=400,
/// actions at x=800, everything else at x=600, stacked top to bottom.
pub fn optimize_positions(graph: &mut FlowGraph) {
    let mut rows = [0usize; 4];
    for card in graph.cards.values_mut() {
        let column = match card.card_type {
            CardType::Trigger => 0,
            CardType::Condition => 1,
            CardType::Action => 2,
            _ => 3,
        };
        card.x = COLUMN_X[column];
        card.y = COLUMN_Y_ORIGIN + rows[column] as f64 * COLUMN_Y_SPACING;
        rows[column] += 1;
    }
}
