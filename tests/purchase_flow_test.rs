use chrono::{TimeZone, Utc};
use pacotes::{
    CatalogPackage, EngineError, EntitlementEngine, EntitlementStore, JsonStore,
    PackageServiceSpec, PackageStatus, Service,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use uuid::Uuid;

struct FixedClock(chrono::DateTime<Utc>);

impl pacotes::Clock for FixedClock {
    fn now(&self) -> chrono::DateTime<Utc> {
        self.0
    }
}

async fn seed_studio(store: &JsonStore, tenant: Uuid) -> (Uuid, Uuid, Uuid) {
    let massage = Uuid::new_v4();
    let customer = Uuid::new_v4();
    let package = Uuid::new_v4();

    store
        .seed_service(
            tenant,
            Service {
                id: massage,
                name: "Massage".to_string(),
                price: dec!(80),
                duration_minutes: 60,
                active: true,
            },
        )
        .await
        .unwrap();
    store
        .seed_package(
            tenant,
            CatalogPackage {
                id: package,
                name: "10 sessions".to_string(),
                price: dec!(500),
                expires_after_days: Some(30),
                services: vec![PackageServiceSpec {
                    service_id: massage,
                    quantity: 10,
                }],
                active: true,
            },
        )
        .await
        .unwrap();
    store.seed_customer(tenant, customer).await.unwrap();

    (customer, package, massage)
}

#[tokio::test]
async fn test_end_to_end_purchase_and_load() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let tenant = Uuid::new_v4();
    let (customer, package, massage) = seed_studio(&store, tenant).await;

    let jan1 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let engine =
        EntitlementEngine::with_clock(store.clone(), store.clone(), FixedClock(jan1));

    let purchase = engine.purchase(tenant, customer, package).await.unwrap();
    assert_eq!(
        purchase.expiration_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap())
    );

    let loaded = engine.load_entitlements(tenant, &[customer]).await.unwrap();
    assert_eq!(loaded.len(), 1);
    let view = &loaded[0].entitlements[0];

    let summary = view.package.as_ref().unwrap();
    assert_eq!(summary.name, "10 sessions");
    assert_eq!(summary.price, dec!(500));
    assert_eq!(summary.expires_after_days, Some(30));

    assert_eq!(view.services.len(), 1);
    assert_eq!(view.services[0].service_id, massage);
    assert_eq!(view.services[0].service_name, "Massage");
    assert_eq!(view.services[0].sessions_remaining, 10);
    assert_eq!(view.status, PackageStatus::Active);
}

#[tokio::test]
async fn test_batch_purchase_reports_partial_success() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let tenant = Uuid::new_v4();
    let (customer, package, _) = seed_studio(&store, tenant).await;

    let engine = EntitlementEngine::new(store.clone(), store.clone());
    let missing = Uuid::new_v4();

    let results = engine
        .purchase_many(tenant, customer, &[package, missing])
        .await;

    assert!(results[0].1.is_ok());
    assert!(matches!(
        results[1].1.as_ref().unwrap_err(),
        EngineError::NotFound { .. }
    ));

    // The failed item did not take the successful one down with it
    let loaded = engine.load_entitlements(tenant, &[customer]).await.unwrap();
    assert_eq!(loaded[0].entitlements.len(), 1);
}

#[tokio::test]
async fn test_intent_id_makes_retries_safe() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let tenant = Uuid::new_v4();
    let (customer, package, _) = seed_studio(&store, tenant).await;

    let engine = EntitlementEngine::new(store.clone(), store.clone());
    let intent = Uuid::new_v4();

    engine
        .purchase_with_intent(tenant, customer, package, intent)
        .await
        .unwrap();

    // A caller re-submitting after an ambiguous failure gets a clean signal
    // instead of duplicate rows
    let err = engine
        .purchase_with_intent(tenant, customer, package, intent)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists { .. }));

    let balances = store.balances(tenant, intent).await.unwrap();
    assert_eq!(balances.len(), 1);
}

#[tokio::test]
async fn test_purchases_for_different_customers_are_independent() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let tenant = Uuid::new_v4();
    let (customer, package, _) = seed_studio(&store, tenant).await;

    let other = Uuid::new_v4();
    store.seed_customer(tenant, other).await.unwrap();

    let engine = EntitlementEngine::new(store.clone(), store.clone());
    engine.purchase(tenant, customer, package).await.unwrap();
    engine.purchase(tenant, other, package).await.unwrap();

    let loaded = engine
        .load_entitlements(tenant, &[customer, other])
        .await
        .unwrap();
    assert_eq!(loaded[0].entitlements.len(), 1);
    assert_eq!(loaded[1].entitlements.len(), 1);
    assert_ne!(
        loaded[0].entitlements[0].purchase.id,
        loaded[1].entitlements[0].purchase.id
    );
}
