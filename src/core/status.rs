use crate::domain::model::{PackageStatus, ServiceBalance};
use chrono::{DateTime, Duration, Utc};

/// Expiration instant for a purchase made at `purchase_date` under the
/// catalog package's current expiry policy. `None` when the package never
/// expires. Computed once at purchase/renewal time and stored; never
/// recomputed afterwards.
pub fn expiration_for(
    purchase_date: DateTime<Utc>,
    expires_after_days: Option<u32>,
) -> Option<DateTime<Utc>> {
    expires_after_days.map(|days| purchase_date + Duration::days(i64::from(days)))
}

/// Classify a purchase at evaluation time `now`.
///
/// Expiration is checked first: a purchase that is both past its expiration
/// and drained of sessions reports `Expired`. A purchase with no balance
/// rows at all (the degraded state a half-finished delete leaves behind)
/// reports `Exhausted`. "Passed" is strict, so a purchase evaluated exactly
/// at its expiration instant is still active.
pub fn derive_status(
    expiration_date: Option<DateTime<Utc>>,
    balances: &[ServiceBalance],
    now: DateTime<Utc>,
) -> PackageStatus {
    if let Some(expiration) = expiration_date {
        if now > expiration {
            return PackageStatus::Expired;
        }
    }

    if balances.iter().all(|b| b.sessions_remaining == 0) {
        return PackageStatus::Exhausted;
    }

    PackageStatus::Active
}
