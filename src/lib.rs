pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::cache::CachedRemote;
pub use adapters::earth_engine::{EarthEngineClient, EarthEngineSettings};
pub use app::http::{create_router, AppState};
pub use config::ServiceConfig;
pub use core::engine::{AnalysisEngine, NdviQuery};
pub use utils::error::{GatewayError, Result};
