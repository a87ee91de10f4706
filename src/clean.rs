//! Recursive null/empty scrubbing, plus the repair pass applied to every
//! record the hub returns. Stored flows can carry null names and half-deleted
//! cards; consumers doing string comparisons on those fields crash, so the
//! repair here is unconditional and never surfaces as an error.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Fallback injected when a stored record has lost its name.
pub const FALLBACK_RECORD_NAME: &str = "Unnamed Flow";

/// Optional card fields the repair pass is allowed to carry through.
const CARD_REPAIR_KEEP: [&str; 6] = [
    "x",
    "y",
    "outputSuccess",
    "outputTrue",
    "outputFalse",
    "outputError",
];

/// Recursively remove null, blank strings and empty containers. A cleaned
/// map is never null: an all-filtered map comes back as `{}`, which is
/// distinct from absent.
pub fn deep_clean(value: Value) -> Value {
    clean_value(value).unwrap_or(Value::Null)
}

fn clean_value(value: Value) -> Option<Value> {
    match value {
        Value::Object(map) => Some(Value::Object(clean_map(map))),
        Value::Array(items) => Some(Value::Array(clean_list(items))),
        other => is_kept(&other).then_some(other),
    }
}

fn clean_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::new();
    for (key, value) in map {
        if key.trim().is_empty() {
            continue;
        }
        if let Some(v) = clean_value(value)
            && is_kept(&v)
        {
            cleaned.insert(key, v);
        }
    }
    cleaned
}

fn clean_list(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .filter_map(clean_value)
        .filter(is_kept)
        .collect()
}

/// Valid as a map entry or list element: non-null, non-blank, non-empty.
fn is_kept(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        _ => true,
    }
}

/// Deep-clean a flow record read back from the hub and repair the critical
/// fields a consumer assumes are present: a non-empty `name`, a `cards`
/// map, and per-card `type`/`id`/`ownerUri`. Applied to every returned
/// record whether or not it was ever validated on the way in.
pub fn repair_flow_record(value: Value) -> Value {
    let cleaned = deep_clean(value);
    let Value::Object(mut map) = cleaned else {
        return cleaned;
    };

    if !map.get("name").is_some_and(Value::is_string) {
        warn!(
            fallback = FALLBACK_RECORD_NAME,
            "flow record has no usable name, substituting fallback"
        );
        map.insert(
            "name".to_string(),
            Value::String(FALLBACK_RECORD_NAME.to_string()),
        );
    }

    let cards = match map.remove("cards") {
        Some(Value::Object(cards)) => cards,
        _ => Map::new(),
    };
    let mut repaired = Map::new();
    for (card_id, card) in cards {
        let Value::Object(card) = card else {
            warn!(card_id = %card_id, "dropping non-object card from stored flow");
            continue;
        };
        repaired.insert(card_id, Value::Object(repair_card(card)));
    }
    map.insert("cards".to_string(), Value::Object(repaired));

    Value::Object(map)
}

fn repair_card(card: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert(
        "type".to_string(),
        card.get("type")
            .cloned()
            .unwrap_or_else(|| Value::String("action".to_string())),
    );
    out.insert(
        "id".to_string(),
        card.get("id")
            .cloned()
            .unwrap_or_else(|| Value::String("unknown".to_string())),
    );
    out.insert(
        "ownerUri".to_string(),
        card.get("ownerUri")
            .cloned()
            .unwrap_or_else(|| Value::String("homey:app:unknown".to_string())),
    );
    for field in CARD_REPAIR_KEEP {
        // Deep-clean already ran, so anything still present is valid.
        if let Some(v) = card.get(field) {
            out.insert(field.to_string(), v.clone());
        }
    }
    out
}

/// Repair every entry of an id→flow map returned by the hub, skipping null
/// entries outright. Non-map input passes through unchanged.
pub fn repair_flow_collection(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };
    let mut cleaned = Map::new();
    for (flow_id, flow) in map {
        if flow.is_null() {
            warn!(flow_id = %flow_id, "dropping null flow record");
            continue;
        }
        let repaired = repair_flow_record(flow);
        if is_kept(&repaired) {
            cleaned.insert(flow_id, repaired);
        }
    }
    debug!(count = cleaned.len(), "repaired flow collection");
    Value::Object(cleaned)
}
