//! Capability catalog: the hub's known trigger/condition/action
//! descriptors, fetched lazily once per session and shared as an immutable
//! snapshot. Catalog lookups are advisory only and never block creation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::model::CardType;

/// One hub-exposed flow capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "titleFormatted",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub title_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

/// Where descriptors come from; in production the hub API client, in tests
/// a [`MemorySource`].
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    async fn list_triggers(&self) -> anyhow::Result<Vec<CapabilityDescriptor>>;
    async fn list_conditions(&self) -> anyhow::Result<Vec<CapabilityDescriptor>>;
    async fn list_actions(&self) -> anyhow::Result<Vec<CapabilityDescriptor>>;
}

/// Immutable snapshot of the hub's known flow capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCatalog {
    pub triggers: Vec<CapabilityDescriptor>,
    pub conditions: Vec<CapabilityDescriptor>,
    pub actions: Vec<CapabilityDescriptor>,
}

impl CapabilityCatalog {
    fn slice_for(&self, card_type: CardType) -> Option<&[CapabilityDescriptor]> {
        match card_type {
            CardType::Trigger => Some(&self.triggers),
            CardType::Condition => Some(&self.conditions),
            CardType::Action => Some(&self.actions),
            _ => None,
        }
    }

    /// Whether the capability id is known for this card type. Builtin
    /// variants own no capability and always count as known.
    pub fn contains(&self, card_type: CardType, capability_id: &str) -> bool {
        match self.slice_for(card_type) {
            Some(descriptors) => descriptors.iter().any(|d| d.id == capability_id),
            None => true,
        }
    }

    /// All descriptors owned by one uri, e.g. a single device.
    pub fn for_owner(&self, owner_uri: &str) -> Vec<&CapabilityDescriptor> {
        self.triggers
            .iter()
            .chain(&self.conditions)
            .chain(&self.actions)
            .filter(|d| d.uri.as_deref() == Some(owner_uri))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty() && self.conditions.is_empty() && self.actions.is_empty()
    }
}

/// Session-scoped cache around a [`CapabilitySource`]. Concurrent first
/// callers are serialized through the cell, so the source is hit at most
/// once per session, not once per caller.
pub struct CatalogCache {
    source: Arc<dyn CapabilitySource>,
    cell: OnceCell<CapabilityCatalog>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CapabilitySource>) -> Self {
        CatalogCache {
            source,
            cell: OnceCell::new(),
        }
    }

    /// The cached snapshot, fetching it on first use.
    pub async fn snapshot(&self) -> anyhow::Result<&CapabilityCatalog> {
        self.cell
            .get_or_try_init(|| async {
                let triggers = self.source.list_triggers().await?;
                let conditions = self.source.list_conditions().await?;
                let actions = self.source.list_actions().await?;
                debug!(
                    triggers = triggers.len(),
                    conditions = conditions.len(),
                    actions = actions.len(),
                    "capability catalog fetched"
                );
                Ok(CapabilityCatalog {
                    triggers,
                    conditions,
                    actions,
                })
            })
            .await
    }
}

/// Source seeded programmatically for tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    pub triggers: Vec<CapabilityDescriptor>,
    pub conditions: Vec<CapabilityDescriptor>,
    pub actions: Vec<CapabilityDescriptor>,
}

#[async_trait]
impl CapabilitySource for MemorySource {
    async fn list_triggers(&self) -> anyhow::Result<Vec<CapabilityDescriptor>> {
        Ok(self.triggers.clone())
    }

    async fn list_conditions(&self) -> anyhow::Result<Vec<CapabilityDescriptor>> {
        Ok(self.conditions.clone())
    }

    async fn list_actions(&self) -> anyhow::Result<Vec<CapabilityDescriptor>> {
        Ok(self.actions.clone())
    }
}
