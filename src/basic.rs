//! Sanitization of the basic flow shape: one trigger, an ordered action
//! list, an optional condition list. No required field is ever returned as
//! null; each is either present and valid or the whole sanitization fails.

use serde_json::Value;
use tracing::warn;

use crate::{
    card::{self, BasicCardRole},
    error::{FlowError, Result},
    model::BasicFlow,
    util,
};

pub fn sanitize(raw: Value) -> Result<BasicFlow> {
    let Value::Object(map) = raw else {
        return Err(FlowError::Structural {
            field: "flow",
            message: "Flow must be an object".to_string(),
        });
    };

    let name = util::sanitize_flow_name(map.get("name"));
    let enabled = map.get("enabled").and_then(Value::as_bool).unwrap_or(true);

    let trigger_raw = map
        .get("trigger")
        .filter(|v| v.as_object().is_some_and(|m| !m.is_empty()))
        .ok_or_else(|| FlowError::Structural {
            field: "trigger",
            message: "Flow trigger must be a valid object".to_string(),
        })?;
    let trigger = card::validate_basic_card(BasicCardRole::Trigger, trigger_raw)?;

    let actions_raw = map
        .get("actions")
        .and_then(Value::as_array)
        .ok_or_else(|| FlowError::Structural {
            field: "actions",
            message: "Flow must have at least one valid action".to_string(),
        })?;
    let mut actions = Vec::with_capacity(actions_raw.len());
    for (index, entry) in actions_raw.iter().enumerate() {
        match card::validate_basic_card(BasicCardRole::Action, entry) {
            Ok(action) => actions.push(action),
            Err(err) => warn!(index, error = %err, "dropping invalid action"),
        }
    }
    if actions.is_empty() {
        return Err(FlowError::Structural {
            field: "actions",
            message: "Flow must have at least one valid action".to_string(),
        });
    }

    // Conditions are optional and never fatal; invalid entries are dropped.
    let mut conditions = Vec::new();
    if let Some(entries) = map.get("conditions").and_then(Value::as_array) {
        for (index, entry) in entries.iter().enumerate() {
            match card::validate_basic_card(BasicCardRole::Condition, entry) {
                Ok(condition) => conditions.push(condition),
                Err(err) => warn!(index, error = %err, "dropping invalid condition"),
            }
        }
    }

    Ok(BasicFlow {
        name,
        enabled,
        trigger,
        actions,
        conditions,
        folder: util::string_field(&map, "folder"),
    })
}
