use sqlx::sqlite::SqlitePoolOptions;

use crate::config::Config;
use crate::db::{
    self, courier_store::CourierStore, order_store::OrderStore, zone_store::ZoneStore, DbPool,
};
use crate::models::order::NewOrder;
use crate::models::zone::{DeliveryDays, NewZone, ZoneType};

// Helper function to set up an in-memory test database with the full
// schema and seed data. One connection, so every query sees the same
// in-memory database.
async fn setup_test_db() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    db::setup_database(&pool)
        .await
        .expect("Failed to set up database schema");

    pool
}

// Helper function to build a country-type zone input
fn test_zone(name: &str, countries: &[&str]) -> NewZone {
    NewZone {
        name: name.to_string(),
        zone_type: ZoneType::Country,
        countries: countries.iter().map(|c| c.to_string()).collect(),
        states: Vec::new(),
        cities: Vec::new(),
        delivery_days: DeliveryDays { min: 2, max: 4 },
        processing_days: 1,
        delivery_cost: 7.5,
        is_active: true,
    }
}

// Helper function to build an order input
fn test_order(status: Option<&str>) -> NewOrder {
    NewOrder {
        order_id: "SO-1001".to_string(),
        customer_name: "Ada Lovelace".to_string(),
        customer_email: "ada@example.com".to_string(),
        location: "10 Downing St, London, GB".to_string(),
        status: status.map(|s| s.to_string()),
        carrier: Some("ups".to_string()),
        real_tracking_id: None,
    }
}

#[cfg(test)]
mod zone_store_tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_get_update_delete_zone() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);

        let created = store
            .create_zone(test_zone("Benelux", &["NL", "BE", "LU"]))
            .await
            .expect("Failed to create zone");
        assert_eq!(created.name, "Benelux");
        assert_eq!(created.countries.len(), 3);
        assert_eq!(created.delivery_days, DeliveryDays { min: 2, max: 4 });

        let mut update = test_zone("Benelux", &["NL", "BE"]);
        update.delivery_days = DeliveryDays { min: 1, max: 2 };
        let updated = store
            .update_zone(created.id, update)
            .await
            .expect("Failed to update zone");
        assert_eq!(updated.countries.len(), 2);
        assert_eq!(updated.delivery_days.max, 2);

        store.delete_zone(created.id).await.expect("Failed to delete");
        assert!(matches!(
            store.get_zone_by_id(created.id).await,
            Err(AppError::ZoneNotFound)
        ));
    }

    #[tokio::test]
    async fn test_state_zone_without_states_is_rejected() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);

        let mut zone = test_zone("US South", &["US"]);
        zone.zone_type = ZoneType::State;

        match store.create_zone(zone).await {
            Err(AppError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("states")));
            }
            other => panic!("Expected validation error, got {:?}", other.map(|z| z.name)),
        }
    }

    #[tokio::test]
    async fn test_inverted_delivery_range_is_rejected() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);

        let mut zone = test_zone("Backwards", &["US"]);
        zone.delivery_days = DeliveryDays { min: 5, max: 2 };

        assert!(matches!(
            store.create_zone(zone).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_zone_name_is_rejected() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);

        store
            .create_zone(test_zone("Europe", &["FR"]))
            .await
            .expect("Failed to create zone");
        assert!(matches!(
            store.create_zone(test_zone("Europe", &["DE"])).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_install_default_zones_is_idempotent() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);

        let first = store.install_default_zones().await.expect("install failed");
        assert_eq!(first.installed, 5);
        assert_eq!(first.skipped, 0);

        let second = store.install_default_zones().await.expect("install failed");
        assert_eq!(second.installed, 0);
        assert_eq!(second.skipped, 5);

        assert_eq!(store.get_all_zones().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_export_import_round_trip_is_idempotent() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);
        store.install_default_zones().await.expect("install failed");

        let exported = store.export_zones().await.expect("export failed");
        assert_eq!(exported.len(), 5);

        let records: Vec<serde_json::Value> = exported
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect();

        for _ in 0..2 {
            let report = store
                .import_zones(records.clone())
                .await
                .expect("import failed");
            assert_eq!(report.imported, 0);
            assert_eq!(report.skipped, 5);
            assert!(report.errors.is_empty());
        }

        assert_eq!(store.get_all_zones().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_import_accumulates_per_record_errors() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);

        let records = vec![
            // Missing name
            json!({ "delivery_days": { "min": 1, "max": 3 } }),
            // Missing delivery_days
            json!({ "name": "No Range" }),
            // Valid
            json!({
                "name": "Oceania",
                "zone_type": "country",
                "countries": ["AU", "NZ"],
                "delivery_days": { "min": 4, "max": 6 }
            }),
        ];

        let report = store.import_zones(records).await.expect("import failed");
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("record 1:"));
        assert!(report.errors[1].starts_with("record 2:"));

        let zones = store.get_all_zones().await.unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name, "Oceania");
    }
}

#[cfg(test)]
mod zone_resolution_tests {
    use super::*;
    use crate::services::zone_resolver::ZoneResolver;

    #[tokio::test]
    async fn test_default_zones_resolve_a_french_address() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);
        store.install_default_zones().await.expect("install failed");

        let zones = store.get_active_zones().await.unwrap();
        let resolver = ZoneResolver::new(&Config::default());

        let resolved = resolver.resolve("123 Main St, Paris, France", &zones);
        assert_eq!(resolved.zone_name.as_deref(), Some("Europe"));
        assert_eq!(resolved.delivery_days, DeliveryDays { min: 3, max: 5 });
    }

    #[tokio::test]
    async fn test_store_iteration_order_is_ascending_id() {
        let pool = setup_test_db().await;
        let store = ZoneStore::new(pool);

        store
            .create_zone(test_zone("First", &["XX"]))
            .await
            .expect("create failed");
        store
            .create_zone(test_zone("Second", &["XX"]))
            .await
            .expect("create failed");

        let zones = store.get_active_zones().await.unwrap();
        let resolver = ZoneResolver::new(&Config::default());
        let resolved = resolver.resolve("Somewhere in XX", &zones);
        assert_eq!(resolved.zone_name.as_deref(), Some("First"));
    }
}

#[cfg(test)]
mod courier_store_tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::courier::NewCourier;
    use crate::services::courier_registry::{Confidence, CourierRegistry};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_stock_couriers_are_seeded_once() {
        let pool = setup_test_db().await;
        db::setup_database(&pool).await.expect("second setup failed");

        let store = CourierStore::new(pool);
        let couriers = store.get_all_couriers().await.unwrap();
        assert_eq!(couriers.len(), 8);
        assert_eq!(couriers[0].slug, "ups");
        assert!(couriers.iter().all(|c| c.is_active));
    }

    #[tokio::test]
    async fn test_detection_over_stored_couriers() {
        let pool = setup_test_db().await;
        let store = CourierStore::new(pool);

        let couriers = store.get_active_couriers().await.unwrap();
        let registry = CourierRegistry::from_couriers(&couriers);

        let found = registry.detect("1Z999AA10123456784", &couriers).unwrap();
        assert_eq!(found.courier.slug, "ups");
        assert_eq!(found.confidence, Confidence::Exact);

        let fallback = registry.detect("not-a-tracking-id", &couriers).unwrap();
        assert_eq!(fallback.confidence, Confidence::Fallback);
        // First active courier alphabetically by name.
        assert_eq!(fallback.courier.name, "Canada Post");
    }

    #[tokio::test]
    async fn test_create_update_delete_courier() {
        let pool = setup_test_db().await;
        let store = CourierStore::new(pool);

        let new_courier = NewCourier {
            slug: "gls".to_string(),
            name: "GLS".to_string(),
            url_pattern: "https://gls-group.eu/track/{tracking_id}".to_string(),
            tracking_format: r"^[0-9]{11}$".to_string(),
            settings: BTreeMap::from([("country".to_string(), "NL".to_string())]),
            is_active: true,
        };

        let created = store
            .create_courier(new_courier.clone())
            .await
            .expect("create failed");
        assert_eq!(created.slug, "gls");

        // Duplicate slug is a validation error
        assert!(matches!(
            store.create_courier(new_courier.clone()).await,
            Err(AppError::Validation(_))
        ));

        let mut update = new_courier;
        update.is_active = false;
        let updated = store.update_courier("gls", update).await.expect("update failed");
        assert!(!updated.is_active);

        store.delete_courier("gls").await.expect("delete failed");
        assert!(matches!(
            store.get_courier_by_slug("gls").await,
            Err(AppError::CourierNotFound)
        ));
    }

    #[tokio::test]
    async fn test_courier_without_placeholder_is_rejected() {
        let pool = setup_test_db().await;
        let store = CourierStore::new(pool);

        let courier = NewCourier {
            slug: "broken".to_string(),
            name: "Broken".to_string(),
            url_pattern: "https://example.com/track".to_string(),
            tracking_format: "(unclosed".to_string(),
            settings: BTreeMap::new(),
            is_active: true,
        };

        match store.create_courier(courier).await {
            Err(AppError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("Expected validation error, got {:?}", other.map(|c| c.slug)),
        }
    }
}

#[cfg(test)]
mod order_store_tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_create_order_synthesizes_history() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let order = store
            .create_order(test_order(Some("packed")))
            .await
            .expect("create failed");

        assert!(order.tracking_id.starts_with("DT"));
        assert_eq!(order.tracking_id.len(), 12);
        assert_eq!(order.status, "packed");
        assert_eq!(order.progress, 35);

        let events = store.get_events(&order.tracking_id).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_status, "processing");
        assert_eq!(events[2].event_status, "packed");
        assert!(events[0].timestamp < events[1].timestamp);
        assert!(events[1].timestamp < events[2].timestamp);
    }

    #[tokio::test]
    async fn test_create_order_with_unknown_status_falls_back() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let order = store
            .create_order(test_order(Some("teleported")))
            .await
            .expect("create failed");
        assert_eq!(order.status, "processing");
        assert_eq!(order.progress, 10);
        assert_eq!(store.get_events(&order.tracking_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_forward_jump_fills_skipped_stages() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let order = store
            .create_order(test_order(Some("confirmed")))
            .await
            .expect("create failed");

        let updated = store
            .update_status(&order.tracking_id, "in_transit")
            .await
            .expect("update failed");
        assert_eq!(updated.status, "in_transit");
        assert_eq!(updated.progress, 70);

        // Ordered by timestamp, the filled stages must extend the
        // existing history rather than sorting ahead of it.
        let events = store.get_events(&order.tracking_id).await.unwrap();
        let statuses: Vec<&str> = events.iter().map(|e| e.event_status.as_str()).collect();
        assert_eq!(
            statuses,
            vec!["processing", "confirmed", "packed", "shipped", "in_transit"]
        );
        assert!(events.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[tokio::test]
    async fn test_unknown_status_update_is_rejected() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let order = store
            .create_order(test_order(Some("shipped")))
            .await
            .expect("create failed");

        match store.update_status(&order.tracking_id, "shiped").await {
            Err(AppError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("shiped")));
            }
            other => panic!(
                "Expected validation error, got {:?}",
                other.map(|o| o.status)
            ),
        }

        // The typo must not have regressed the order.
        let unchanged = store
            .get_order_by_tracking_id(&order.tracking_id)
            .await
            .unwrap();
        assert_eq!(unchanged.status, "shipped");
        assert_eq!(unchanged.progress, 50);
    }

    #[tokio::test]
    async fn test_failed_order_gets_single_failure_event() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let order = store
            .create_order(test_order(Some("failed")))
            .await
            .expect("create failed");
        assert_eq!(order.progress, 0);

        let events = store.get_events(&order.tracking_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_status, "failed");
    }

    #[tokio::test]
    async fn test_auto_update_respects_the_interval() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let order = store
            .create_order(test_order(Some("shipped")))
            .await
            .expect("create failed");

        // Freshly created, nothing is due yet.
        let unchanged = store
            .auto_update_status(&order.tracking_id, 24)
            .await
            .expect("auto update failed");
        assert_eq!(unchanged.status, "shipped");

        // A zero-hour interval makes the order immediately due; it
        // advances exactly one stage per call.
        let advanced = store
            .auto_update_status(&order.tracking_id, 0)
            .await
            .expect("auto update failed");
        assert_eq!(advanced.status, "in_transit");
        assert_eq!(advanced.progress, 70);

        let events = store.get_events(&order.tracking_id).await.unwrap();
        assert_eq!(events.last().unwrap().event_status, "in_transit");
    }

    #[tokio::test]
    async fn test_auto_update_never_touches_terminal_orders() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        for terminal in ["delivered", "failed", "returned"] {
            let order = store
                .create_order(test_order(Some(terminal)))
                .await
                .expect("create failed");
            let after = store
                .auto_update_status(&order.tracking_id, 0)
                .await
                .expect("auto update failed");
            assert_eq!(after.status, terminal);
        }
    }

    #[tokio::test]
    async fn test_delete_order_cascades_to_events() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let order = store
            .create_order(test_order(Some("delivered")))
            .await
            .expect("create failed");
        assert_eq!(store.get_events(&order.tracking_id).await.unwrap().len(), 7);

        store
            .delete_order(&order.tracking_id)
            .await
            .expect("delete failed");

        assert!(matches!(
            store.get_order_by_tracking_id(&order.tracking_id).await,
            Err(AppError::OrderNotFound)
        ));
        assert!(store.get_events(&order.tracking_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_fields_are_rejected() {
        let pool = setup_test_db().await;
        let store = OrderStore::new(pool);

        let mut order = test_order(None);
        order.customer_name = "  ".to_string();

        match store.create_order(order).await {
            Err(AppError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("customer_name")));
            }
            other => panic!(
                "Expected validation error, got {:?}",
                other.map(|o| o.tracking_id)
            ),
        }
    }
}
