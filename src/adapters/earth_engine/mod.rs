pub mod client;
pub mod credentials;
pub mod expr;

pub use client::{EarthEngineClient, EarthEngineSettings};
pub use credentials::{CredentialSource, Credentials};
