use crate::domain::model::{
    CatalogPackage, CustomerId, CustomerPackage, CustomerPackageId, PackageId, Service,
    ServiceBalance, ServiceId, TenantId,
};
use crate::domain::ports::{CatalogReader, EntitlementStore};
use crate::utils::error::{EngineError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct TenantData {
    services: HashMap<ServiceId, Service>,
    packages: HashMap<PackageId, CatalogPackage>,
    customers: HashSet<CustomerId>,
    purchases: HashMap<CustomerPackageId, CustomerPackage>,
    balances: Vec<ServiceBalance>,
}

/// In-memory catalog + entitlement store for tests and demos.
///
/// Clones share state, so an engine can hold one clone as its catalog and
/// another as its store. One-shot failure injection lets tests drive the
/// engine's rollback paths deterministically.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tenants: Arc<Mutex<HashMap<TenantId, TenantData>>>,
    fail_insert_balances: Arc<AtomicBool>,
    fail_delete_balances: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_service(&self, tenant: TenantId, service: Service) {
        let mut tenants = self.lock_for_seed();
        tenants
            .entry(tenant)
            .or_default()
            .services
            .insert(service.id, service);
    }

    /// Insert or replace a catalog package (replacement models staff editing
    /// the catalog between a purchase and its renewal).
    pub fn seed_package(&self, tenant: TenantId, package: CatalogPackage) {
        let mut tenants = self.lock_for_seed();
        tenants
            .entry(tenant)
            .or_default()
            .packages
            .insert(package.id, package);
    }

    pub fn seed_customer(&self, tenant: TenantId, customer: CustomerId) {
        let mut tenants = self.lock_for_seed();
        tenants.entry(tenant).or_default().customers.insert(customer);
    }

    /// Fail the next `insert_balances` call with a transient error.
    pub fn fail_next_insert_balances(&self) {
        self.fail_insert_balances.store(true, Ordering::SeqCst);
    }

    /// Fail the next `delete_balances` call with a transient error.
    pub fn fail_next_delete_balances(&self) {
        self.fail_delete_balances.store(true, Ordering::SeqCst);
    }

    /// Drop one balance row, simulating a prior partial write.
    pub fn remove_balance(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
        service: ServiceId,
    ) {
        let mut tenants = self.lock_for_seed();
        if let Some(data) = tenants.get_mut(&tenant) {
            data.balances
                .retain(|b| !(b.customer_package_id == customer_package && b.service_id == service));
        }
    }

    /// Overwrite a balance, simulating appointment-fulfillment consumption.
    pub fn set_balance(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
        service: ServiceId,
        sessions_remaining: u32,
    ) {
        let mut tenants = self.lock_for_seed();
        if let Some(data) = tenants.get_mut(&tenant) {
            for balance in &mut data.balances {
                if balance.customer_package_id == customer_package
                    && balance.service_id == service
                {
                    balance.sessions_remaining = sessions_remaining;
                }
            }
        }
    }

    /// Remove a catalog package entirely, simulating catalog deletion after
    /// a purchase was made against it.
    pub fn remove_catalog_package(&self, tenant: TenantId, package: PackageId) {
        let mut tenants = self.lock_for_seed();
        if let Some(data) = tenants.get_mut(&tenant) {
            data.packages.remove(&package);
        }
    }

    // Seeding happens in test setup where a poisoned lock is already fatal.
    fn lock_for_seed(&self) -> MutexGuard<'_, HashMap<TenantId, TenantData>> {
        self.tenants.lock().expect("store lock poisoned")
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<TenantId, TenantData>>> {
        self.tenants
            .lock()
            .map_err(|_| EngineError::Repository("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogReader for InMemoryStore {
    async fn get_package(
        &self,
        tenant: TenantId,
        id: PackageId,
    ) -> Result<Option<CatalogPackage>> {
        let tenants = self.lock()?;
        Ok(tenants
            .get(&tenant)
            .and_then(|d| d.packages.get(&id))
            .cloned())
    }

    async fn get_package_by_name(
        &self,
        tenant: TenantId,
        name: &str,
    ) -> Result<Option<CatalogPackage>> {
        let tenants = self.lock()?;
        Ok(tenants.get(&tenant).and_then(|d| {
            d.packages
                .values()
                .find(|p| p.active && p.name == name)
                .cloned()
        }))
    }

    async fn list_active_packages(&self, tenant: TenantId) -> Result<Vec<CatalogPackage>> {
        let tenants = self.lock()?;
        Ok(tenants
            .get(&tenant)
            .map(|d| d.packages.values().filter(|p| p.active).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_service(&self, tenant: TenantId, id: ServiceId) -> Result<Option<Service>> {
        let tenants = self.lock()?;
        Ok(tenants
            .get(&tenant)
            .and_then(|d| d.services.get(&id))
            .cloned())
    }
}

#[async_trait]
impl EntitlementStore for InMemoryStore {
    async fn customer_exists(&self, tenant: TenantId, customer: CustomerId) -> Result<bool> {
        let tenants = self.lock()?;
        Ok(tenants
            .get(&tenant)
            .map(|d| d.customers.contains(&customer))
            .unwrap_or(false))
    }

    async fn paid_packages(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> Result<Vec<CustomerPackage>> {
        let tenants = self.lock()?;
        let mut purchases: Vec<CustomerPackage> = tenants
            .get(&tenant)
            .map(|d| {
                d.purchases
                    .values()
                    .filter(|p| p.customer_id == customer && p.paid)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        purchases.sort_by_key(|p| p.purchase_date);
        Ok(purchases)
    }

    async fn balances(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
    ) -> Result<Vec<ServiceBalance>> {
        let tenants = self.lock()?;
        Ok(tenants
            .get(&tenant)
            .map(|d| {
                d.balances
                    .iter()
                    .filter(|b| b.customer_package_id == customer_package)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_customer_package(
        &self,
        tenant: TenantId,
        purchase: &CustomerPackage,
    ) -> Result<()> {
        let mut tenants = self.lock()?;
        let data = tenants.entry(tenant).or_default();
        if data.purchases.contains_key(&purchase.id) {
            return Err(EngineError::AlreadyExists {
                id: purchase.id.to_string(),
            });
        }
        data.purchases.insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn insert_balances(&self, tenant: TenantId, balances: &[ServiceBalance]) -> Result<()> {
        if self.fail_insert_balances.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Transient(
                "injected balance insert failure".to_string(),
            ));
        }
        let mut tenants = self.lock()?;
        let data = tenants.entry(tenant).or_default();
        data.balances.extend_from_slice(balances);
        Ok(())
    }

    async fn delete_balances(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
    ) -> Result<()> {
        if self.fail_delete_balances.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Transient(
                "injected balance delete failure".to_string(),
            ));
        }
        let mut tenants = self.lock()?;
        if let Some(data) = tenants.get_mut(&tenant) {
            data.balances
                .retain(|b| b.customer_package_id != customer_package);
        }
        Ok(())
    }

    async fn delete_customer_package(
        &self,
        tenant: TenantId,
        id: CustomerPackageId,
    ) -> Result<()> {
        let mut tenants = self.lock()?;
        let removed = tenants
            .get_mut(&tenant)
            .and_then(|d| d.purchases.remove(&id));
        match removed {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound {
                entity: "customer package",
                id: id.to_string(),
            }),
        }
    }
}
