use crate::domain::model::{
    CatalogPackage, CustomerId, CustomerPackage, CustomerPackageId, PackageId, Service,
    ServiceBalance, ServiceId, TenantId,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to the catalog store. The engine never writes catalog data.
///
/// Every call carries the tenant explicitly; there is no ambient auth
/// context. Implementations are expected to scope all lookups to the tenant.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn get_package(&self, tenant: TenantId, id: PackageId)
        -> Result<Option<CatalogPackage>>;

    /// Exact-name lookup among *active* catalog packages. Renewal resolves
    /// through this; inactive or renamed packages must not match.
    async fn get_package_by_name(
        &self,
        tenant: TenantId,
        name: &str,
    ) -> Result<Option<CatalogPackage>>;

    async fn list_active_packages(&self, tenant: TenantId) -> Result<Vec<CatalogPackage>>;

    async fn get_service(&self, tenant: TenantId, id: ServiceId) -> Result<Option<Service>>;
}

/// CRUD access to purchases and their balance rows.
///
/// The store is not expected to provide cross-call transactions; the engine
/// defines each public operation as its own boundary and performs
/// compensating deletes when a multi-row write fails halfway.
///
/// `insert_customer_package` must reject a duplicate purchase id with
/// `EngineError::AlreadyExists` so that callers can retry an ambiguous
/// failure with the same purchase intent id without creating duplicates.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn customer_exists(&self, tenant: TenantId, customer: CustomerId) -> Result<bool>;

    /// Paid, non-deleted purchases for one customer, expired ones included.
    async fn paid_packages(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> Result<Vec<CustomerPackage>>;

    async fn balances(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
    ) -> Result<Vec<ServiceBalance>>;

    async fn insert_customer_package(
        &self,
        tenant: TenantId,
        purchase: &CustomerPackage,
    ) -> Result<()>;

    async fn insert_balances(&self, tenant: TenantId, balances: &[ServiceBalance]) -> Result<()>;

    async fn delete_balances(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
    ) -> Result<()>;

    /// Returns `EngineError::NotFound` when the purchase does not exist, so
    /// that re-deleting an already-deleted purchase reports cleanly.
    async fn delete_customer_package(
        &self,
        tenant: TenantId,
        id: CustomerPackageId,
    ) -> Result<()>;
}

/// Time source for purchase/expiration computation and status evaluation.
/// Injected so tests can pin the evaluation instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Configuration surface shared by the CLI flags and the TOML file.
pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn verbose(&self) -> bool;
}
