//! Rooftop solar potential estimates for Swiss buildings.
//!
//! [`Orchestrator`] is the entry point: it resolves a building, picks the
//! best available data through a chain of fallback tiers and caches the
//! finished result.

pub mod config;
pub mod error;
pub mod models;
pub mod result_cache;
pub mod services;

pub use config::{Config, Mode};
pub use error::{ConfigError, EstimateError, ExternalServiceError};
pub use models::building::{BuildingAttributes, Coordinate, EstimateRequest};
pub use models::solar::{SolarPotentialResponse, SolarPotentialResult};
pub use services::orchestrator::Orchestrator;
