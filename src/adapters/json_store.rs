use crate::domain::model::{
    CatalogPackage, CustomerId, CustomerPackage, CustomerPackageId, PackageId, Service,
    ServiceBalance, ServiceId, TenantId,
};
use crate::domain::ports::{CatalogReader, EntitlementStore};
use crate::utils::error::{EngineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TenantDocument {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    packages: Vec<CatalogPackage>,
    #[serde(default)]
    customers: Vec<CustomerId>,
    #[serde(default)]
    purchases: Vec<CustomerPackage>,
    #[serde(default)]
    balances: Vec<ServiceBalance>,
}

/// File-backed catalog + entitlement store: one JSON document per tenant
/// under the data directory.
///
/// Every operation loads the document, mutates it and writes it back through
/// a temp-file-then-rename, so a crash mid-write leaves the previous
/// document intact — each public engine operation lands atomically. An
/// internal lock serializes operations from concurrent tasks in the same
/// process.
#[derive(Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn seed_service(&self, tenant: TenantId, service: Service) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load(tenant)?;
        doc.services.retain(|s| s.id != service.id);
        doc.services.push(service);
        self.save(tenant, &doc)
    }

    pub async fn seed_package(&self, tenant: TenantId, package: CatalogPackage) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load(tenant)?;
        doc.packages.retain(|p| p.id != package.id);
        doc.packages.push(package);
        self.save(tenant, &doc)
    }

    pub async fn seed_customer(&self, tenant: TenantId, customer: CustomerId) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load(tenant)?;
        if !doc.customers.contains(&customer) {
            doc.customers.push(customer);
        }
        self.save(tenant, &doc)
    }

    fn document_path(&self, tenant: TenantId) -> PathBuf {
        self.data_dir.join(format!("{}.json", tenant))
    }

    fn load(&self, tenant: TenantId) -> Result<TenantDocument> {
        let path = self.document_path(tenant);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(TenantDocument::default())
            }
            Err(err) => Err(EngineError::IoError(err)),
        }
    }

    fn save(&self, tenant: TenantId, doc: &TenantDocument) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.document_path(tenant);
        let tmp_path = self.data_dir.join(format!("{}.json.tmp", tenant));

        let content = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;

        tracing::debug!("Wrote tenant document {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl CatalogReader for JsonStore {
    async fn get_package(
        &self,
        tenant: TenantId,
        id: PackageId,
    ) -> Result<Option<CatalogPackage>> {
        let _guard = self.lock.lock().await;
        let doc = self.load(tenant)?;
        Ok(doc.packages.into_iter().find(|p| p.id == id))
    }

    async fn get_package_by_name(
        &self,
        tenant: TenantId,
        name: &str,
    ) -> Result<Option<CatalogPackage>> {
        let _guard = self.lock.lock().await;
        let doc = self.load(tenant)?;
        Ok(doc
            .packages
            .into_iter()
            .find(|p| p.active && p.name == name))
    }

    async fn list_active_packages(&self, tenant: TenantId) -> Result<Vec<CatalogPackage>> {
        let _guard = self.lock.lock().await;
        let doc = self.load(tenant)?;
        Ok(doc.packages.into_iter().filter(|p| p.active).collect())
    }

    async fn get_service(&self, tenant: TenantId, id: ServiceId) -> Result<Option<Service>> {
        let _guard = self.lock.lock().await;
        let doc = self.load(tenant)?;
        Ok(doc.services.into_iter().find(|s| s.id == id))
    }
}

#[async_trait]
impl EntitlementStore for JsonStore {
    async fn customer_exists(&self, tenant: TenantId, customer: CustomerId) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let doc = self.load(tenant)?;
        Ok(doc.customers.contains(&customer))
    }

    async fn paid_packages(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> Result<Vec<CustomerPackage>> {
        let _guard = self.lock.lock().await;
        let doc = self.load(tenant)?;
        let mut purchases: Vec<CustomerPackage> = doc
            .purchases
            .into_iter()
            .filter(|p| p.customer_id == customer && p.paid)
            .collect();
        purchases.sort_by_key(|p| p.purchase_date);
        Ok(purchases)
    }

    async fn balances(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
    ) -> Result<Vec<ServiceBalance>> {
        let _guard = self.lock.lock().await;
        let doc = self.load(tenant)?;
        Ok(doc
            .balances
            .into_iter()
            .filter(|b| b.customer_package_id == customer_package)
            .collect())
    }

    async fn insert_customer_package(
        &self,
        tenant: TenantId,
        purchase: &CustomerPackage,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load(tenant)?;
        if doc.purchases.iter().any(|p| p.id == purchase.id) {
            return Err(EngineError::AlreadyExists {
                id: purchase.id.to_string(),
            });
        }
        doc.purchases.push(purchase.clone());
        self.save(tenant, &doc)
    }

    async fn insert_balances(&self, tenant: TenantId, balances: &[ServiceBalance]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load(tenant)?;
        doc.balances.extend_from_slice(balances);
        self.save(tenant, &doc)
    }

    async fn delete_balances(
        &self,
        tenant: TenantId,
        customer_package: CustomerPackageId,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load(tenant)?;
        doc.balances
            .retain(|b| b.customer_package_id != customer_package);
        self.save(tenant, &doc)
    }

    async fn delete_customer_package(
        &self,
        tenant: TenantId,
        id: CustomerPackageId,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load(tenant)?;
        let before = doc.purchases.len();
        doc.purchases.retain(|p| p.id != id);
        if doc.purchases.len() == before {
            return Err(EngineError::NotFound {
                entity: "customer package",
                id: id.to_string(),
            });
        }
        self.save(tenant, &doc)
    }
}
