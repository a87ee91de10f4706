//! Advisory checks over a validated flow graph. Nothing here ever blocks
//! creation: an unknown capability id may still be valid on the hub, which
//! is a different situation from a structurally invalid card.

use tracing::warn;

use crate::{catalog::CapabilityCatalog, model::CardType, model::FlowGraph, util::OWNER_URI_RE};

/// A non-fatal finding about an otherwise valid flow.
#[derive(Debug, Clone)]
pub struct Advisory {
    pub code: &'static str,
    pub message: String,
    pub card_id: Option<String>,
}

/// Advisory checks that need no external data.
pub fn lint_builtin_rules(flow: &FlowGraph) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if !flow
        .cards
        .values()
        .any(|c| matches!(c.card_type, CardType::Trigger | CardType::Start))
    {
        advisories.push(Advisory {
            code: "FLOW_NO_TRIGGER",
            message: "flow has no trigger or start card".to_string(),
            card_id: None,
        });
    }
    for (id, card) in &flow.cards {
        if let Some(uri) = &card.owner_uri
            && !OWNER_URI_RE.is_match(uri)
        {
            advisories.push(Advisory {
                code: "OWNER_URI_SUSPECT",
                message: format!("ownerUri '{uri}' does not look like a hub uri"),
                card_id: Some(id.clone()),
            });
        }
    }
    advisories
}

/// All advisory checks, including capability lookups against a catalog
/// snapshot. Every finding is logged at WARN and returned to the caller.
pub fn lint_graph(flow: &FlowGraph, catalog: &CapabilityCatalog) -> Vec<Advisory> {
    let mut advisories = lint_builtin_rules(flow);
    for (id, card) in &flow.cards {
        if card.card_type.is_builtin() {
            continue;
        }
        if let Some(capability_id) = &card.capability_id
            && !catalog.contains(card.card_type, capability_id)
        {
            advisories.push(Advisory {
                code: "CAPABILITY_UNKNOWN",
                message: format!(
                    "capability '{capability_id}' not found in available {}s",
                    card.card_type.as_str()
                ),
                card_id: Some(id.clone()),
            });
        }
    }
    for advisory in &advisories {
        warn!(
            code = advisory.code,
            card_id = advisory.card_id.as_deref().unwrap_or("-"),
            "{}",
            advisory.message
        );
    }
    advisories
}
