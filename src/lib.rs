pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};
pub use crate::config::TomlConfig;

pub use crate::adapters::json_store::JsonStore;
pub use crate::adapters::memory::InMemoryStore;
pub use crate::core::engine::EntitlementEngine;
pub use crate::core::status::{derive_status, expiration_for};
pub use crate::domain::model::{
    CatalogPackage, CustomerEntitlements, CustomerId, CustomerPackage, CustomerPackageId,
    EntitlementView, PackageId, PackageServiceSpec, PackageStatus, PackageSummary, Service,
    ServiceBalance, ServiceBalanceView, ServiceId, TenantId,
};
pub use crate::domain::ports::{CatalogReader, Clock, EntitlementStore, SystemClock};
pub use crate::utils::error::{EngineError, ErrorSeverity, Result};
