//! HTTP surface: request bodies, handlers and the router.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::AppError;
pub use router::create_router;
pub use state::AppState;
