pub mod engine;
pub mod status;

pub use crate::domain::model::{
    CatalogPackage, CustomerEntitlements, CustomerPackage, EntitlementView, PackageStatus,
    ServiceBalance,
};
pub use crate::domain::ports::{CatalogReader, Clock, EntitlementStore, SystemClock};
pub use crate::utils::error::Result;
