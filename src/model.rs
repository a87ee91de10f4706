use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FlowError, Result};

fn default_true() -> bool {
    true
}

/// The eight node variants an advanced flow may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Trigger,
    Condition,
    Action,
    Delay,
    Any,
    All,
    Note,
    Start,
}

impl CardType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "trigger" => Some(CardType::Trigger),
            "condition" => Some(CardType::Condition),
            "action" => Some(CardType::Action),
            "delay" => Some(CardType::Delay),
            "any" => Some(CardType::Any),
            "all" => Some(CardType::All),
            "note" => Some(CardType::Note),
            "start" => Some(CardType::Start),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Trigger => "trigger",
            CardType::Condition => "condition",
            CardType::Action => "action",
            CardType::Delay => "delay",
            CardType::Any => "any",
            CardType::All => "all",
            CardType::Note => "note",
            CardType::Start => "start",
        }
    }

    /// Control-flow variants that live on the hub itself and carry no
    /// external capability owner.
    pub fn is_builtin(self) -> bool {
        matches!(
            self,
            CardType::Delay | CardType::Any | CardType::All | CardType::Note | CardType::Start
        )
    }

    /// Wire-format fields this variant must carry, encoded as data so the
    /// required-field check stays a table lookup rather than branching.
    pub fn required_fields(self) -> &'static [&'static str] {
        if self.is_builtin() {
            &[]
        } else {
            &["ownerUri", "id"]
        }
    }
}

/// One node of an advanced flow graph. Optional fields never serialize as
/// explicit nulls; absent means absent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub card_type: CardType,
    #[serde(rename = "ownerUri", default, skip_serializing_if = "Option::is_none")]
    pub owner_uri: Option<String>,
    /// Capability id; `id` on the wire.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub capability_id: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    #[serde(rename = "outputSuccess", default, skip_serializing_if = "Vec::is_empty")]
    pub output_success: Vec<String>,
    #[serde(rename = "outputTrue", default, skip_serializing_if = "Vec::is_empty")]
    pub output_true: Vec<String>,
    #[serde(rename = "outputFalse", default, skip_serializing_if = "Vec::is_empty")]
    pub output_false: Vec<String>,
    #[serde(rename = "outputError", default, skip_serializing_if = "Vec::is_empty")]
    pub output_error: Vec<String>,
    /// Incoming references in `card-id::outputType` form; not an output edge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub droptoken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Card {
    /// Every card id referenced by an output edge of this card.
    pub fn edge_targets(&self) -> impl Iterator<Item = &str> {
        self.output_success
            .iter()
            .chain(&self.output_true)
            .chain(&self.output_false)
            .chain(&self.output_error)
            .map(String::as_str)
    }

    pub(crate) fn edge_lists_mut(&mut self) -> [(&'static str, &mut Vec<String>); 4] {
        [
            ("outputSuccess", &mut self.output_success),
            ("outputTrue", &mut self.output_true),
            ("outputFalse", &mut self.output_false),
            ("outputError", &mut self.output_error),
        ]
    }
}

/// A validated advanced flow: a named, keyed graph of cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowGraph {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub triggerable: bool,
    #[serde(default)]
    pub broken: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub cards: IndexMap<String, Card>,
}

impl FlowGraph {
    /// Serialize for the hub, with a final defensive clean pass so no null
    /// or empty value ever reaches stored state.
    pub fn into_payload(self) -> Result<Value> {
        clean_payload(&self)
    }
}

/// The simpler card shape basic flows carry: a capability id, an optional
/// owner uri and arguments. No positions, no wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicCard {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub droptoken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverted: Option<bool>,
}

/// A validated basic flow: one trigger, ordered actions, optional conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicFlow {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub trigger: BasicCard,
    pub actions: Vec<BasicCard>,
    #[serde(default)]
    pub conditions: Vec<BasicCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl BasicFlow {
    pub fn into_payload(self) -> Result<Value> {
        clean_payload(&self)
    }
}

/// A partial flow update. Absent fields stay absent in the serialized
/// patch so the hub leaves them untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggerable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<IndexMap<String, Card>>,
}

impl FlowPatch {
    pub fn into_payload(self) -> Result<Value> {
        clean_payload(&self)
    }
}

/// A flow-folder creation payload. `parent` is omitted entirely when not
/// set, never serialized as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

fn clean_payload<T: Serialize>(value: &T) -> Result<Value> {
    let raw = serde_json::to_value(value)
        .map_err(|e| FlowError::Internal(format!("serialize flow payload: {e}")))?;
    Ok(crate::clean::deep_clean(raw))
}
