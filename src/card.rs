//! Per-card validation: a permissive whitelist/coercion pass over optional
//! fields, then a hard required-field pass driven by the card variant. The
//! two passes stay separate so each is testable on its own.

use serde_json::{Map, Value};

use crate::{
    clean,
    error::{FlowError, Result},
    model::{BasicCard, Card, CardType},
    util,
};

/// Role a basic-flow card plays, used for error messages only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicCardRole {
    Trigger,
    Condition,
    Action,
}

impl BasicCardRole {
    pub fn as_str(self) -> &'static str {
        match self {
            BasicCardRole::Trigger => "trigger",
            BasicCardRole::Condition => "condition",
            BasicCardRole::Action => "action",
        }
    }
}

/// Pass 1: keep only whitelisted optional fields, each coerced to its
/// declared shape. Unknown fields and fields failing their type check are
/// silently dropped; required fields are not this pass's concern.
pub fn filter_optional_fields(raw: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in raw {
        let kept = match key.as_str() {
            "outputSuccess" | "outputTrue" | "outputFalse" | "outputError" | "input" => {
                coerce_edge_list(value)
            }
            "args" => coerce_args(value),
            "droptoken" | "value" | "color" => coerce_text(value),
            "inverted" => value.as_bool().map(Value::Bool),
            "width" | "height" => value.as_f64().map(Value::from),
            _ => None,
        };
        if let Some(v) = kept {
            out.insert(key.clone(), v);
        }
    }
    out
}

/// Edge lists must be arrays; non-null entries are stringified, nulls dropped.
fn coerce_edge_list(value: &Value) -> Option<Value> {
    let items = value.as_array()?;
    let coerced = items
        .iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(s) => Some(Value::String(s.clone())),
            other => Some(Value::String(other.to_string())),
        })
        .collect();
    Some(Value::Array(coerced))
}

/// Args must be a map; its contents are deep-cleaned and an all-filtered
/// map is dropped like any other empty value.
fn coerce_args(value: &Value) -> Option<Value> {
    let map = value.as_object()?;
    let cleaned = clean::deep_clean(Value::Object(map.clone()));
    match &cleaned {
        Value::Object(m) if !m.is_empty() => Some(cleaned),
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<Value> {
    let trimmed = value.as_str()?.trim();
    (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
}

/// Pass 2 plus assembly: hard checks on `type`, coordinates and the
/// variant's required fields, then a typed [`Card`] built from the
/// filtered optional fields. Pure; advisory catalog checks live in
/// [`crate::lint`].
pub fn validate_card(card_id: &str, raw: &Value) -> Result<Card> {
    let map = raw.as_object().ok_or_else(|| FlowError::Card {
        card_id: card_id.to_string(),
        field: "card",
        message: "card must be an object".to_string(),
    })?;

    let type_raw = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| FlowError::Card {
            card_id: card_id.to_string(),
            field: "type",
            message: "card is missing required field 'type'".to_string(),
        })?;
    let card_type = CardType::parse(type_raw).ok_or_else(|| FlowError::Card {
        card_id: card_id.to_string(),
        field: "type",
        message: format!("unknown card type '{type_raw}'"),
    })?;

    let x = require_coordinate(card_id, map, "x")?;
    let y = require_coordinate(card_id, map, "y")?;

    for &field in card_type.required_fields() {
        if util::string_field(map, field).is_none() {
            return Err(FlowError::Card {
                card_id: card_id.to_string(),
                field,
                message: format!(
                    "card type '{}' is missing required field '{field}'",
                    card_type.as_str()
                ),
            });
        }
    }
    // Builtin variants carry owner/capability only when actually present.
    let owner_uri = util::string_field(map, "ownerUri");
    let capability_id = util::string_field(map, "id");

    let filtered = filter_optional_fields(map);
    let edge_list = |field: &str| -> Vec<String> {
        filtered
            .get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    };
    let text = |field: &str| -> Option<String> {
        filtered
            .get(field)
            .and_then(Value::as_str)
            .map(String::from)
    };

    Ok(Card {
        card_type,
        owner_uri,
        capability_id,
        x,
        y,
        args: filtered
            .get("args")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        output_success: edge_list("outputSuccess"),
        output_true: edge_list("outputTrue"),
        output_false: edge_list("outputFalse"),
        output_error: edge_list("outputError"),
        input: edge_list("input"),
        droptoken: text("droptoken"),
        inverted: filtered.get("inverted").and_then(Value::as_bool),
        value: text("value"),
        color: text("color"),
        width: filtered.get("width").and_then(Value::as_f64),
        height: filtered.get("height").and_then(Value::as_f64),
    })
}

fn require_coordinate(card_id: &str, map: &Map<String, Value>, field: &'static str) -> Result<f64> {
    map.get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| FlowError::Card {
            card_id: card_id.to_string(),
            field,
            message: format!("card requires a numeric '{field}' coordinate"),
        })
}

/// Validate the simpler card shape basic flows carry: a non-empty object
/// with a non-blank `id`; `uri`, `args`, `droptoken` and `inverted` are
/// whitelisted through.
pub fn validate_basic_card(role: BasicCardRole, raw: &Value) -> Result<BasicCard> {
    let map = raw
        .as_object()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| FlowError::Card {
            card_id: role.as_str().to_string(),
            field: "card",
            message: format!("flow {} must be a non-empty object", role.as_str()),
        })?;

    let id = util::string_field(map, "id").ok_or_else(|| FlowError::Card {
        card_id: role.as_str().to_string(),
        field: "id",
        message: format!("flow {} is missing required field 'id'", role.as_str()),
    })?;

    Ok(BasicCard {
        id,
        uri: util::string_field(map, "uri"),
        args: map
            .get("args")
            .and_then(|v| coerce_args(v))
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default(),
        droptoken: util::string_field(map, "droptoken"),
        inverted: map.get("inverted").and_then(Value::as_bool),
    })
}
