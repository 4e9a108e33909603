use pacotes::{
    CatalogPackage, EngineError, EntitlementEngine, EntitlementStore, JsonStore,
    PackageServiceSpec, Service,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use uuid::Uuid;

async fn seed_studio(store: &JsonStore, tenant: Uuid) -> (Uuid, Uuid) {
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

    (customer, package)
}

#[tokio::test]
async fn test_delete_package_removes_balances_and_parent() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let tenant = Uuid::new_v4();
    let (customer, package) = seed_studio(&store, tenant).await;

    let engine = EntitlementEngine::new(store.clone(), store.clone());
    let purchase = engine.purchase(tenant, customer, package).await.unwrap();

    engine.delete_package(tenant, purchase.id).await.unwrap();

    assert!(store.balances(tenant, purchase.id).await.unwrap().is_empty());
    let loaded = engine.load_entitlements(tenant, &[customer]).await.unwrap();
    assert!(loaded[0].entitlements.is_empty());
}

#[tokio::test]
async fn test_second_delete_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let tenant = Uuid::new_v4();
    let (customer, package) = seed_studio(&store, tenant).await;

    let engine = EntitlementEngine::new(store.clone(), store.clone());
    let purchase = engine.purchase(tenant, customer, package).await.unwrap();

    engine.delete_package(tenant, purchase.id).await.unwrap();
    let err = engine.delete_package(tenant, purchase.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_of_unknown_purchase_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let engine = EntitlementEngine::new(store.clone(), store.clone());

    let err = engine
        .delete_package(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn test_customer_removal_cascades_all_purchases() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let tenant = Uuid::new_v4();
    let (customer, package) = seed_studio(&store, tenant).await;

    let engine = EntitlementEngine::new(store.clone(), store.clone());
    let p1 = engine.purchase(tenant, customer, package).await.unwrap();
    let p2 = engine.purchase(tenant, customer, package).await.unwrap();

    engine
        .delete_customer_entitlements(tenant, customer)
        .await
        .unwrap();

    assert!(store.balances(tenant, p1.id).await.unwrap().is_empty());
    assert!(store.balances(tenant, p2.id).await.unwrap().is_empty());
    let loaded = engine.load_entitlements(tenant, &[customer]).await.unwrap();
    assert!(loaded[0].entitlements.is_empty());
}

#[tokio::test]
async fn test_customer_removal_requires_existing_customer() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    let engine = EntitlementEngine::new(store.clone(), store.clone());

    let err = engine
        .delete_customer_entitlements(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound {
            entity: "customer",
            ..
        }
    ));
}
