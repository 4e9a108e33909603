use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TenantId = Uuid;
pub type ServiceId = Uuid;
pub type PackageId = Uuid;
pub type CustomerId = Uuid;
pub type CustomerPackageId = Uuid;

/// Catalog service item. Owned by the catalog; read-only for this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    pub active: bool,
}

/// One service line inside a catalog package: which service, how many sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageServiceSpec {
    pub service_id: ServiceId,
    pub quantity: u32,
}

/// Sellable bundle definition. `expires_after_days = None` means the bundle
/// never expires. Referenced, never mutated, by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPackage {
    pub id: PackageId,
    pub name: String,
    pub price: Decimal,
    pub expires_after_days: Option<u32>,
    pub services: Vec<PackageServiceSpec>,
    pub active: bool,
}

/// One purchase of a catalog package by a customer.
///
/// `expiration_date` is computed once at purchase time and never recomputed.
/// `package_id` may point at a catalog entry that was deleted afterwards;
/// the read path degrades to "package unavailable" rather than dropping the
/// purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPackage {
    pub id: CustomerPackageId,
    pub customer_id: CustomerId,
    pub package_id: PackageId,
    pub purchase_date: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub paid: bool,
}

/// Remaining sessions of one service within one purchase. The set of balance
/// rows is frozen at purchase time even if the catalog package is edited
/// later. Consumption is decremented by appointment fulfillment, outside this
/// crate; here the value is only read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBalance {
    pub customer_package_id: CustomerPackageId,
    pub service_id: ServiceId,
    pub sessions_remaining: u32,
}

/// Derived classification of a purchase. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Active,
    Expired,
    Exhausted,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Active => "active",
            PackageStatus::Expired => "expired",
            PackageStatus::Exhausted => "exhausted",
        }
    }
}

/// Catalog fields echoed into the entitlement view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSummary {
    pub name: String,
    pub price: Decimal,
    pub expires_after_days: Option<u32>,
}

/// Per-service line of an entitlement view. A missing balance row (prior
/// partial write) renders as zero remaining sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBalanceView {
    pub service_id: ServiceId,
    pub service_name: String,
    pub sessions_remaining: u32,
}

/// One purchase joined with its catalog summary, per-service balances and
/// derived status. `package` is `None` when the catalog entry was deleted
/// after purchase ("package unavailable").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementView {
    pub purchase: CustomerPackage,
    pub package: Option<PackageSummary>,
    pub services: Vec<ServiceBalanceView>,
    pub status: PackageStatus,
}

/// Full entitlement history for one customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerEntitlements {
    pub customer_id: CustomerId,
    pub entitlements: Vec<EntitlementView>,
}

impl CustomerEntitlements {
    /// Entitlements usable for booking new appointments: everything except
    /// purchases whose expiration has already passed. Exhausted purchases
    /// stay visible so staff can see why no sessions remain.
    pub fn active(&self) -> Vec<&EntitlementView> {
        self.entitlements
            .iter()
            .filter(|e| e.status != PackageStatus::Expired)
            .collect()
    }
}

/// Fixed rendering offset for human-readable dates (São Paulo, UTC-3).
/// Stored values stay timezone-neutral instants.
const DISPLAY_OFFSET_SECONDS: i32 = -3 * 3600;

/// Render an instant as ISO-8601 in the fixed display timezone.
pub fn display_date(instant: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(DISPLAY_OFFSET_SECONDS).expect("offset within bounds");
    instant
        .with_timezone(&offset)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a monetary value with two-place rounding.
pub fn display_price(price: Decimal) -> String {
    format!("{:.2}", price.round_dp(2))
}
