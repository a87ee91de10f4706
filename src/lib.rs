//! Normalization and validation for Homey flow definitions.
//!
//! Tool-call arguments arrive as loosely structured JSON: cards sometimes
//! an ordered list, sometimes a keyed graph, with optional fields absent or
//! null. This crate deterministically converts those shapes into validated
//! flows, enforces per-variant required fields, auto-wires implicit
//! connections, and scrubs nulls both outbound and on records read back
//! from the hub. The HTTP client, device listing and response formatting
//! live in the gateway, not here.
#![forbid(unsafe_code)]

pub mod basic;
pub mod card;
pub mod catalog;
pub mod clean;
pub mod error;
pub mod folder;
pub mod graph;
pub mod lint;
pub mod model;
pub mod util;

pub use catalog::{
    CapabilityCatalog, CapabilityDescriptor, CapabilitySource, CatalogCache, MemorySource,
};
pub use error::{FlowError, Result};
pub use lint::{Advisory, lint_graph};
pub use model::{BasicCard, BasicFlow, Card, CardType, FlowGraph, FlowPatch, Folder};

use serde_json::Value;

/// Sanitize a basic flow payload: one trigger, an ordered action list, an
/// optional condition list.
pub fn sanitize_basic_flow(raw: Value) -> Result<BasicFlow> {
    basic::sanitize(raw)
}

/// Convert and validate an advanced flow payload into a keyed card graph.
pub fn normalize_and_validate_advanced_flow(raw: Value) -> Result<FlowGraph> {
    graph::normalize_and_validate(raw)
}

/// Sanitize a partial flow update; absent fields stay absent.
pub fn sanitize_flow_patch(raw: Value) -> Result<FlowPatch> {
    graph::sanitize_patch(raw)
}

/// Sanitize a flow-folder creation payload.
pub fn sanitize_folder(name: &Value, parent: &Value) -> Result<Folder> {
    folder::sanitize(name, parent)
}

/// Recursively remove nulls, blank strings and empty containers. Applied
/// as a final defensive pass in both directions: before handing a payload
/// to the hub and on every record read back from it.
pub fn deep_clean(value: Value) -> Value {
    clean::deep_clean(value)
}

/// Deep-clean a hub-returned flow record and repair its critical fields.
pub fn repair_flow_record(value: Value) -> Value {
    clean::repair_flow_record(value)
}

/// Repair every record of an id→flow map returned by the hub.
pub fn repair_flow_collection(value: Value) -> Value {
    clean::repair_flow_collection(value)
}
