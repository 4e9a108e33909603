// Adapters layer: concrete stores behind the domain ports.

pub mod json_store;
pub mod memory;
