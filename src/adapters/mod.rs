// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod cache;
pub mod earth_engine;
