// Domain layer: entitlement models and ports (interfaces).
// No dependencies on adapters or config; serde/chrono/decimal only.

pub mod model;
pub mod ports;
