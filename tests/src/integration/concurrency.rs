//! # Concurrent Access Flows
//!
//! Subscription syncs race against delivery-time reads. Every read must see
//! one complete filter set, never a batch half applied.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::{json, Value};
    use wh_event_filters::{
        compare, flatten, FilterConfiguration, FilterRegistryApi, FilterSchema,
    };

    use crate::integration::fixtures::{doc, Harness};

    const SYNC_ROUNDS: usize = 200;
    const READERS: usize = 4;

    fn set_a() -> FilterConfiguration {
        FilterConfiguration::new(
            ["a", "b"],
            FilterSchema {
                raw_body: doc(json!({"tier": "gold"})),
                ..Default::default()
            },
        )
    }

    fn set_b() -> FilterConfiguration {
        FilterConfiguration::new(
            ["b", "c"],
            FilterSchema {
                raw_body: doc(json!({"tier": "gold", "region": "eu"})),
                ..Default::default()
            },
        )
    }

    /// Event types and body of a snapshot, if it is one whole set.
    fn classify(snapshot: &[wh_event_filters::EventTypeFilter]) -> Option<&'static str> {
        let mut event_types: Vec<_> = snapshot.iter().map(|f| f.event_type.as_str()).collect();
        event_types.sort_unstable();

        let all_bodies = |body: Value| snapshot.iter().all(|f| f.body == doc(body.clone()));
        match event_types.as_slice() {
            ["a", "b"] if all_bodies(json!({"tier": "gold"})) => Some("a"),
            ["b", "c"] if all_bodies(json!({"tier": "gold", "region": "eu"})) => Some("b"),
            _ => None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_only_see_whole_filter_sets() {
        let harness = Harness::new();
        let registry = Arc::new(harness.registry);
        registry
            .sync_subscription_filters("sub-1", &set_a())
            .await
            .unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let reads = Arc::new(AtomicUsize::new(0));

        let mut readers = Vec::with_capacity(READERS);
        for _ in 0..READERS {
            let registry = registry.clone();
            let done = done.clone();
            let reads = reads.clone();
            readers.push(tokio::spawn(async move {
                let passing = json!({"tier": "gold", "region": "eu"});
                let failing = json!({"tier": "silver", "region": "eu"});
                while !done.load(Ordering::SeqCst) {
                    let snapshot = registry
                        .find_filters_by_subscription_id("sub-1")
                        .await
                        .unwrap();
                    assert!(
                        classify(&snapshot).is_some(),
                        "torn snapshot: {:?}",
                        snapshot.iter().map(|f| &f.event_type).collect::<Vec<_>>()
                    );

                    // "b" is declared in both sets, so its verdict never changes.
                    assert!(registry.test_filter("sub-1", "b", &passing).await.unwrap());
                    assert!(!registry.test_filter("sub-1", "b", &failing).await.unwrap());

                    reads.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            }));
        }

        let writer = {
            let registry = registry.clone();
            tokio::spawn(async move {
                for round in 0..SYNC_ROUNDS {
                    let config = if round % 2 == 0 { set_b() } else { set_a() };
                    registry
                        .sync_subscription_filters("sub-1", &config)
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        done.store(true, Ordering::SeqCst);
        for reader in readers {
            reader.await.unwrap();
        }

        assert!(reads.load(Ordering::SeqCst) > 0);
        let last = registry
            .find_filters_by_subscription_id("sub-1")
            .await
            .unwrap();
        // SYNC_ROUNDS is even, so the last round applied set A.
        assert_eq!(classify(&last), Some("a"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_flatten_and_compare_are_shareable_across_threads() {
        let filter = Arc::new(
            flatten(&json!({
                "data": {"amount": {"$gte": 100}, "currency": {"$in": ["NGN", "GHS"]}},
                "$or": [{"data": {"tier": "gold"}}, {"data": {"vip": true}}]
            }))
            .unwrap(),
        );
        let payloads: Vec<(Value, bool)> = vec![
            (json!({"data": {"amount": 150, "currency": "NGN", "tier": "gold"}}), true),
            (json!({"data": {"amount": 50, "currency": "NGN", "tier": "gold"}}), false),
            (json!({"data": {"amount": 150, "currency": "USD", "vip": true}}), false),
            (json!({"data": {"amount": 150, "currency": "GHS", "vip": true}}), true),
        ];
        let payloads = Arc::new(payloads);

        let mut workers = Vec::new();
        for worker in 0..8 {
            let filter = filter.clone();
            let payloads = payloads.clone();
            workers.push(tokio::task::spawn_blocking(move || {
                for i in 0..500 {
                    let (payload, expected) = &payloads[(worker + i) % payloads.len()];
                    let flat = flatten(payload).unwrap();
                    assert_eq!(compare(&flat, &filter), *expected, "payload {payload}");
                }
            }));
        }
        for worker in workers {
            worker.await.unwrap();
        }
    }
}
