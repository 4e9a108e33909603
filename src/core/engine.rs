use crate::core::status::{derive_status, expiration_for};
use crate::domain::model::{
    CatalogPackage, CustomerEntitlements, CustomerId, CustomerPackage, CustomerPackageId,
    EntitlementView, PackageId, PackageSummary, ServiceBalance, ServiceBalanceView, ServiceId,
    TenantId,
};
use crate::domain::ports::{CatalogReader, Clock, EntitlementStore, SystemClock};
use crate::utils::error::{EngineError, Result};
use std::collections::HashSet;
use uuid::Uuid;

/// Purchase, renewal, status and deletion of pre-paid service packages.
///
/// Every operation is a one-shot request: the engine keeps no session state
/// and each write defines its own transaction boundary against the store.
/// The store is not assumed to provide cross-call transactions, so the
/// parent-then-balances insert pair is protected by a compensating delete
/// instead.
pub struct EntitlementEngine<C, S, K = SystemClock>
where
    C: CatalogReader,
    S: EntitlementStore,
    K: Clock,
{
    catalog: C,
    store: S,
    clock: K,
}

impl<C: CatalogReader, S: EntitlementStore> EntitlementEngine<C, S, SystemClock> {
    pub fn new(catalog: C, store: S) -> Self {
        Self {
            catalog,
            store,
            clock: SystemClock,
        }
    }
}

impl<C: CatalogReader, S: EntitlementStore, K: Clock> EntitlementEngine<C, S, K> {
    pub fn with_clock(catalog: C, store: S, clock: K) -> Self {
        Self {
            catalog,
            store,
            clock,
        }
    }

    /// Load the full entitlement history for each customer: paid purchases
    /// joined with catalog summary, per-service balances and derived status.
    ///
    /// Read-only and tolerant of two degraded states: a missing balance row
    /// renders as zero remaining sessions, and a purchase whose catalog
    /// package was deleted is still listed with `package: None`.
    pub async fn load_entitlements(
        &self,
        tenant: TenantId,
        customers: &[CustomerId],
    ) -> Result<Vec<CustomerEntitlements>> {
        let now = self.clock.now();
        let mut out = Vec::with_capacity(customers.len());

        for &customer in customers {
            let purchases = self.store.paid_packages(tenant, customer).await?;
            let mut entitlements = Vec::with_capacity(purchases.len());

            for purchase in purchases {
                let balances = self.store.balances(tenant, purchase.id).await?;
                let package = self.catalog.get_package(tenant, purchase.package_id).await?;

                if package.is_none() {
                    tracing::warn!(
                        "Catalog package {} for purchase {} is gone; showing as unavailable",
                        purchase.package_id,
                        purchase.id
                    );
                }

                let services = self
                    .service_lines(tenant, package.as_ref(), &balances)
                    .await?;
                let status = derive_status(purchase.expiration_date, &balances, now);

                entitlements.push(EntitlementView {
                    purchase,
                    package: package.map(|p| PackageSummary {
                        name: p.name,
                        price: p.price,
                        expires_after_days: p.expires_after_days,
                    }),
                    services,
                    status,
                });
            }

            out.push(CustomerEntitlements {
                customer_id: customer,
                entitlements,
            });
        }

        Ok(out)
    }

    /// Purchase a catalog package with an engine-generated purchase id.
    pub async fn purchase(
        &self,
        tenant: TenantId,
        customer: CustomerId,
        package_id: PackageId,
    ) -> Result<CustomerPackage> {
        self.purchase_with_intent(tenant, customer, package_id, Uuid::new_v4())
            .await
    }

    /// Purchase with a caller-supplied intent id. Re-submitting the same
    /// intent after an ambiguous failure cannot create duplicate rows: the
    /// store rejects the duplicate id with `AlreadyExists`.
    pub async fn purchase_with_intent(
        &self,
        tenant: TenantId,
        customer: CustomerId,
        package_id: PackageId,
        intent: CustomerPackageId,
    ) -> Result<CustomerPackage> {
        if !self.store.customer_exists(tenant, customer).await? {
            return Err(EngineError::NotFound {
                entity: "customer",
                id: customer.to_string(),
            });
        }

        let package = self
            .catalog
            .get_package(tenant, package_id)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| EngineError::NotFound {
                entity: "catalog package",
                id: package_id.to_string(),
            })?;

        self.execute_purchase(tenant, customer, &package, intent)
            .await
    }

    /// Purchase several packages in one staff action. Each purchase is its
    /// own atomic unit; partial success is reported per package, never as a
    /// single all-or-nothing failure.
    pub async fn purchase_many(
        &self,
        tenant: TenantId,
        customer: CustomerId,
        package_ids: &[PackageId],
    ) -> Vec<(PackageId, Result<CustomerPackage>)> {
        let mut results = Vec::with_capacity(package_ids.len());
        for &package_id in package_ids {
            let result = self.purchase(tenant, customer, package_id).await;
            results.push((package_id, result));
        }
        results
    }

    /// Re-purchase a package the customer previously held, resolved by exact
    /// name among currently active catalog packages (the stored purchase
    /// carries no durable catalog reference). The renewal uses the package's
    /// *current* price, contents and expiry policy; if the catalog changed
    /// since the original purchase, the new purchase follows the catalog as
    /// it is today. A renamed or deleted package yields `CatalogMismatch`
    /// and no writes.
    pub async fn renew(
        &self,
        tenant: TenantId,
        customer: CustomerId,
        package_name: &str,
    ) -> Result<CustomerPackage> {
        self.renew_with_intent(tenant, customer, package_name, Uuid::new_v4())
            .await
    }

    pub async fn renew_with_intent(
        &self,
        tenant: TenantId,
        customer: CustomerId,
        package_name: &str,
        intent: CustomerPackageId,
    ) -> Result<CustomerPackage> {
        if !self.store.customer_exists(tenant, customer).await? {
            return Err(EngineError::NotFound {
                entity: "customer",
                id: customer.to_string(),
            });
        }

        let package = self
            .catalog
            .get_package_by_name(tenant, package_name)
            .await?
            .ok_or_else(|| EngineError::CatalogMismatch {
                name: package_name.to_string(),
            })?;

        tracing::info!(
            "Renewing '{}' for customer {} from current catalog contents",
            package.name,
            customer
        );
        self.execute_purchase(tenant, customer, &package, intent)
            .await
    }

    /// Delete a purchase: balance rows first, then the parent. A repeated
    /// invocation after success reports `NotFound`. If the parent delete
    /// fails after the balances are gone, the orphaned parent classifies as
    /// exhausted on the read path, which is the documented degraded state.
    pub async fn delete_package(&self, tenant: TenantId, id: CustomerPackageId) -> Result<()> {
        self.store.delete_balances(tenant, id).await?;
        self.store.delete_customer_package(tenant, id).await?;
        tracing::info!("Deleted customer package {}", id);
        Ok(())
    }

    /// Cascade-delete every purchase of a customer through the same
    /// balances-first path, so a customer removal leaves no orphaned rows.
    pub async fn delete_customer_entitlements(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> Result<()> {
        if !self.store.customer_exists(tenant, customer).await? {
            return Err(EngineError::NotFound {
                entity: "customer",
                id: customer.to_string(),
            });
        }

        let purchases = self.store.paid_packages(tenant, customer).await?;
        let count = purchases.len();
        for purchase in purchases {
            self.delete_package(tenant, purchase.id).await?;
        }

        tracing::info!("Deleted {} packages for customer {}", count, customer);
        Ok(())
    }

    async fn execute_purchase(
        &self,
        tenant: TenantId,
        customer: CustomerId,
        package: &CatalogPackage,
        intent: CustomerPackageId,
    ) -> Result<CustomerPackage> {
        let purchase_date = self.clock.now();
        let purchase = CustomerPackage {
            id: intent,
            customer_id: customer,
            package_id: package.id,
            purchase_date,
            expiration_date: expiration_for(purchase_date, package.expires_after_days),
            paid: true,
        };

        self.store.insert_customer_package(tenant, &purchase).await?;

        let balances: Vec<ServiceBalance> = package
            .services
            .iter()
            .map(|spec| ServiceBalance {
                customer_package_id: intent,
                service_id: spec.service_id,
                sessions_remaining: spec.quantity,
            })
            .collect();

        if let Err(cause) = self.store.insert_balances(tenant, &balances).await {
            tracing::error!(
                "Balance insert failed for purchase {}, rolling back: {}",
                intent,
                cause
            );
            return Err(self.compensate(tenant, intent, cause).await);
        }

        tracing::info!(
            "Purchased '{}' for customer {} ({} service balances)",
            package.name,
            customer,
            balances.len()
        );
        Ok(purchase)
    }

    /// Roll back a half-written purchase. A purchase with zero balances must
    /// never be visible as active, so the parent row is removed; if that
    /// cleanup itself fails, the error escalates to `Inconsistent` so
    /// operators know manual reconciliation is needed.
    async fn compensate(
        &self,
        tenant: TenantId,
        intent: CustomerPackageId,
        cause: EngineError,
    ) -> EngineError {
        let cleanup: Result<()> = async {
            self.store.delete_balances(tenant, intent).await?;
            self.store.delete_customer_package(tenant, intent).await?;
            Ok(())
        }
        .await;

        match cleanup {
            Ok(()) => EngineError::PartialWrite {
                id: intent.to_string(),
                reason: cause.to_string(),
            },
            Err(rollback_err) => {
                tracing::error!(
                    "Rollback of purchase {} failed: {} (original cause: {})",
                    intent,
                    rollback_err,
                    cause
                );
                EngineError::Inconsistent {
                    id: intent.to_string(),
                    reason: format!("{}; rollback failed: {}", cause, rollback_err),
                }
            }
        }
    }

    async fn service_lines(
        &self,
        tenant: TenantId,
        package: Option<&CatalogPackage>,
        balances: &[ServiceBalance],
    ) -> Result<Vec<ServiceBalanceView>> {
        let mut lines = Vec::new();
        let mut seen: HashSet<ServiceId> = HashSet::new();

        if let Some(package) = package {
            for spec in &package.services {
                seen.insert(spec.service_id);
                let sessions_remaining = balances
                    .iter()
                    .find(|b| b.service_id == spec.service_id)
                    .map(|b| b.sessions_remaining)
                    .unwrap_or(0);
                lines.push(ServiceBalanceView {
                    service_id: spec.service_id,
                    service_name: self.service_name(tenant, spec.service_id).await?,
                    sessions_remaining,
                });
            }
        }

        // Frozen balance rows for services the catalog package no longer
        // lists (or the whole package being gone) still belong to the view.
        for balance in balances {
            if seen.insert(balance.service_id) {
                lines.push(ServiceBalanceView {
                    service_id: balance.service_id,
                    service_name: self.service_name(tenant, balance.service_id).await?,
                    sessions_remaining: balance.sessions_remaining,
                });
            }
        }

        Ok(lines)
    }

    async fn service_name(&self, tenant: TenantId, id: ServiceId) -> Result<String> {
        Ok(self
            .catalog
            .get_service(tenant, id)
            .await?
            .map(|s| s.name)
            .unwrap_or_else(|| format!("unknown service {}", id)))
    }
}
