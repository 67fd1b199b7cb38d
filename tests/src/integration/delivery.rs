//! # Delivery Matching Flows
//!
//! The delivery pipeline asks, per event and subscription, whether the
//! payload passes the subscription's filter.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use wh_event_filters::{
        compare, dry_run, flatten, FilterApiHandler, FilterEngineConfig, FilterRegistryApi,
        FilterSpec,
    };

    use crate::integration::fixtures::{doc, Harness};

    async fn with_body_filter(harness: &Harness, event_type: &str, body: Value) {
        harness
            .registry
            .create_filter(FilterSpec::new("sub-1", event_type).with_body(doc(body)))
            .await
            .unwrap();
    }

    async fn delivers(harness: &Harness, event_type: &str, payload: Value) -> bool {
        harness
            .registry
            .test_filter("sub-1", event_type, &payload)
            .await
            .unwrap()
    }

    // =========================================================================
    // VACUOUS MATCHES
    // =========================================================================

    #[tokio::test]
    async fn test_subscription_without_filters_gets_everything() {
        let harness = Harness::new();
        assert!(delivers(&harness, "invoice.paid", json!({"any": "thing"})).await);
        assert!(delivers(&harness, "user.created", Value::Null).await);
    }

    #[tokio::test]
    async fn test_empty_filter_gets_everything() {
        let harness = Harness::new();
        with_body_filter(&harness, "invoice.paid", json!({})).await;
        assert!(delivers(&harness, "invoice.paid", json!({"amount": 1})).await);
    }

    // =========================================================================
    // OPERATORS END TO END
    // =========================================================================

    #[tokio::test]
    async fn test_range_filter() {
        let harness = Harness::new();
        with_body_filter(
            &harness,
            "invoice.paid",
            json!({"data": {"amount": {"$gte": 100, "$lt": 1000}}}),
        )
        .await;

        assert!(delivers(&harness, "invoice.paid", json!({"data": {"amount": 100}})).await);
        assert!(delivers(&harness, "invoice.paid", json!({"data": {"amount": 999.5}})).await);
        assert!(!delivers(&harness, "invoice.paid", json!({"data": {"amount": 1000}})).await);
        assert!(!delivers(&harness, "invoice.paid", json!({"data": {"amount": "500"}})).await);
        // Missing key does not reject.
        assert!(delivers(&harness, "invoice.paid", json!({"data": {}})).await);
    }

    #[tokio::test]
    async fn test_membership_filter() {
        let harness = Harness::new();
        with_body_filter(
            &harness,
            "order.shipped",
            json!({"region": {"$in": ["eu", "uk"]}, "tags": {"$nin": ["test"]}}),
        )
        .await;

        assert!(delivers(&harness, "order.shipped", json!({"region": "eu", "tags": ["gift"]})).await);
        assert!(!delivers(&harness, "order.shipped", json!({"region": "us"})).await);
        assert!(!delivers(&harness, "order.shipped", json!({"region": "uk", "tags": ["test", "gift"]})).await);
    }

    #[tokio::test]
    async fn test_composition_over_array_payload() {
        let harness = Harness::new();
        with_body_filter(
            &harness,
            "*",
            json!({"$or": [{"type": "daily"}, {"cities": "lagos"}]}),
        )
        .await;

        assert!(delivers(&harness, "report", json!({"type": "weekly", "cities": ["lagos"]})).await);
        assert!(delivers(&harness, "report", json!({"type": "daily"})).await);
        assert!(!delivers(&harness, "report", json!({"type": "weekly", "cities": ["abuja"]})).await);
        // Absent keys satisfy every branch.
        assert!(delivers(&harness, "report", json!({})).await);
    }

    #[tokio::test]
    async fn test_exist_filter_on_nested_payload() {
        let harness = Harness::new();
        with_body_filter(
            &harness,
            "user.updated",
            json!({"profile": {"$exist": true}, "deleted_at": {"$exist": false}}),
        )
        .await;

        assert!(delivers(&harness, "user.updated", json!({"profile": {"name": "ada"}})).await);
        assert!(!delivers(&harness, "user.updated", json!({"name": "ada"})).await);
        assert!(
            !delivers(
                &harness,
                "user.updated",
                json!({"profile": {"name": "ada"}, "deleted_at": 1700000000})
            )
            .await
        );
    }

    #[tokio::test]
    async fn test_indexed_array_paths() {
        let harness = Harness::new();
        with_body_filter(
            &harness,
            "batch",
            json!({"items": [{"sku": "A-1"}]}),
        )
        .await;

        assert!(delivers(&harness, "batch", json!({"items": [{"sku": "A-1"}, {"sku": "B-2"}]})).await);
        assert!(!delivers(&harness, "batch", json!({"items": [{"sku": "B-2"}, {"sku": "A-1"}]})).await);
    }

    // =========================================================================
    // WILDCARD
    // =========================================================================

    #[tokio::test]
    async fn test_wildcard_covers_undeclared_event_types() {
        let harness = Harness::new();
        with_body_filter(&harness, "*", json!({"tier": "gold"})).await;
        with_body_filter(&harness, "invoice.paid", json!({"tier": "silver"})).await;

        assert!(delivers(&harness, "user.created", json!({"tier": "gold"})).await);
        assert!(!delivers(&harness, "user.created", json!({"tier": "silver"})).await);
        assert!(delivers(&harness, "invoice.paid", json!({"tier": "silver"})).await);
        assert_eq!(harness.metrics.snapshot().wildcard_fallbacks, 2);
    }

    #[tokio::test]
    async fn test_wildcard_fallback_disabled() {
        let harness =
            Harness::with_config(FilterEngineConfig::default().with_wildcard_fallback(false));
        with_body_filter(&harness, "*", json!({"tier": "gold"})).await;
        assert!(delivers(&harness, "user.created", json!({"tier": "silver"})).await);
        assert!(!delivers(&harness, "*", json!({"tier": "silver"})).await);
    }

    // =========================================================================
    // HEADERS, DRY RUN, API
    // =========================================================================

    #[tokio::test]
    async fn test_request_headers_and_body_both_apply() {
        let harness = Harness::new();
        harness
            .registry
            .create_filter(
                FilterSpec::new("sub-1", "*")
                    .with_headers(doc(json!({"x-env": "live"})))
                    .with_body(doc(json!({"amount": {"$gt": 0}}))),
            )
            .await
            .unwrap();

        let test = |headers: Value, body: Value| {
            let registry = &harness.registry;
            async move {
                registry
                    .test_request("sub-1", "charge", &headers, &body)
                    .await
                    .unwrap()
            }
        };
        assert!(test(json!({"x-env": "live"}), json!({"amount": 5})).await);
        assert!(!test(json!({"x-env": "sandbox"}), json!({"amount": 5})).await);
        assert!(!test(json!({"x-env": "live"}), json!({"amount": 0})).await);
    }

    #[tokio::test]
    async fn test_dry_run_agrees_with_registry() {
        let harness = Harness::new();
        let filter = json!({"person": {"age": {"$gt": 5}}, "$and": [{"kind": "adult"}]});
        with_body_filter(&harness, "*", filter.clone()).await;

        for payload in [
            json!({"person": {"age": 11}, "kind": "adult"}),
            json!({"person": {"age": 3}, "kind": "adult"}),
            json!({"person": {"age": 11}, "kind": "child"}),
            json!({"person": {"age": 11}}),
        ] {
            let expected = dry_run(&payload, &filter).unwrap();
            assert_eq!(delivers(&harness, "e", payload.clone()).await, expected);
            assert_eq!(
                compare(&flatten(&payload).unwrap(), &flatten(&filter).unwrap()),
                expected
            );
        }
    }

    #[tokio::test]
    async fn test_api_handler_over_registry() {
        let harness = Harness::new();
        let handler = FilterApiHandler::new(Arc::new(harness.registry));

        let created = handler
            .handle_query(
                "create_filter",
                json!({
                    "filter": {
                        "subscription_id": "sub-1",
                        "event_type": "invoice.paid",
                        "raw_body": {"data": {"status": {"$eq": "paid"}}}
                    }
                }),
            )
            .await;
        assert!(created.get("result").is_some());

        let tested = handler
            .handle_query(
                "test_filter",
                json!({
                    "subscription_id": "sub-1",
                    "event_type": "invoice.paid",
                    "payload": {"data": {"status": "void"}}
                }),
            )
            .await;
        assert_eq!(tested["result"]["is_match"], json!(false));

        let nil = handler
            .handle_query("create_filter", json!({"filter": null}))
            .await;
        assert_eq!(nil["error"]["code"], json!(-32602));
    }
}
