use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use homey_flow::model::CardType;
use homey_flow::{CapabilityDescriptor, CapabilitySource, CatalogCache, MemorySource};

fn descriptor(id: &str, uri: &str) -> CapabilityDescriptor {
    CapabilityDescriptor {
        id: id.to_string(),
        uri: Some(uri.to_string()),
        title: Some(id.replace('_', " ")),
        title_formatted: None,
        args: Vec::new(),
    }
}

/// Source that counts how often it is actually hit.
struct CountingSource {
    inner: MemorySource,
    fetches: AtomicUsize,
}

#[async_trait]
impl CapabilitySource for CountingSource {
    async fn list_triggers(&self) -> anyhow::Result<Vec<CapabilityDescriptor>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.list_triggers().await
    }

    async fn list_conditions(&self) -> anyhow::Result<Vec<CapabilityDescriptor>> {
        self.inner.list_conditions().await
    }

    async fn list_actions(&self) -> anyhow::Result<Vec<CapabilityDescriptor>> {
        self.inner.list_actions().await
    }
}

#[tokio::test]
async fn concurrent_first_callers_share_a_single_fetch() {
    let source = Arc::new(CountingSource {
        inner: MemorySource {
            triggers: vec![descriptor("time_schedule", "homey:app:com.athom.scheduler")],
            conditions: vec![descriptor("time_between", "homey:app:com.athom.time")],
            actions: vec![descriptor("turn_on_device", "homey:manager:device")],
        },
        fetches: AtomicUsize::new(0),
    });
    let cache = CatalogCache::new(source.clone());

    let (a, b, c) = tokio::join!(cache.snapshot(), cache.snapshot(), cache.snapshot());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(
        source.fetches.load(Ordering::SeqCst),
        1,
        "single-flight cache must hit the source exactly once"
    );

    let again = cache.snapshot().await.unwrap();
    assert_eq!(again.triggers.len(), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn snapshot_lookups_answer_contains_and_owner_queries() {
    let cache = CatalogCache::new(Arc::new(MemorySource {
        triggers: vec![descriptor("motion_detected", "homey:device:sensor1")],
        conditions: Vec::new(),
        actions: vec![
            descriptor("turn_on_device", "homey:manager:device"),
            descriptor("send_notification", "homey:app:com.athom.notifications"),
        ],
    }));
    let catalog = cache.snapshot().await.unwrap();

    assert!(catalog.contains(CardType::Trigger, "motion_detected"));
    assert!(!catalog.contains(CardType::Trigger, "nope"));
    assert!(!catalog.contains(CardType::Condition, "motion_detected"));
    assert!(
        catalog.contains(CardType::Delay, "anything"),
        "builtin variants own no capability and always count as known"
    );

    let owned = catalog.for_owner("homey:manager:device");
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].id, "turn_on_device");
    assert!(!catalog.is_empty());
}
