//! Contracts of the external collaborators the orchestrator depends on.
//!
//! Implementations live in `geoadmin`, `pvgis` and `simulation`; tests
//! substitute their own.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExternalServiceError;
use crate::models::building::{BuildingAttributes, Coordinate};
use crate::models::solar::IrradianceProfile;

pub mod service {
    pub const BUILDING_REGISTRY: &str = "building registry";
    pub const SOLAR_CADASTRE: &str = "solar cadastre";
    pub const IRRADIANCE: &str = "satellite irradiance";
    pub const YIELD_MODEL: &str = "pv yield model";
}

/// Output of the building registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBuilding {
    pub coordinate: Coordinate,
    pub attributes: BuildingAttributes,
}

/// Solar cadastre record for a roof.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficialRoofRecord {
    /// m².
    pub roof_area: f64,
    /// 1 (best) to 5.
    pub suitability_class: u8,
    /// kWh/year, as published by the cadastre.
    pub annual_yield: Option<f64>,
    /// kWh/m²/year on the roof surface.
    pub annual_irradiation: Option<f64>,
}

/// Location-calibrated specific yield, system losses included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldFigure {
    /// kWh/kWp/year.
    pub specific_yield: f64,
}

#[async_trait]
pub trait BuildingResolver: Send + Sync {
    /// `NotFound` when the registry has no such building.
    async fn resolve_building(&self, building_id: &str) -> Result<ResolvedBuilding, ExternalServiceError>;
}

#[async_trait]
pub trait OfficialRoofSource: Send + Sync {
    /// `NotFound` when the building is not in the cadastre.
    async fn fetch_official_roof(&self, coordinate: &Coordinate) -> Result<OfficialRoofRecord, ExternalServiceError>;
}

#[async_trait]
pub trait IrradianceSource: Send + Sync {
    async fn fetch_irradiance(&self, coordinate: &Coordinate) -> Result<IrradianceProfile, ExternalServiceError>;
}

#[async_trait]
pub trait YieldModelSource: Send + Sync {
    async fn fetch_yield_model(&self, coordinate: &Coordinate) -> Result<YieldFigure, ExternalServiceError>;
}

/// The four collaborators, injected into the orchestrator together.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn BuildingResolver>,
    pub official: Arc<dyn OfficialRoofSource>,
    pub irradiance: Arc<dyn IrradianceSource>,
    pub yield_model: Arc<dyn YieldModelSource>,
}

/// Bound a collaborator call; an elapsed deadline becomes `Timeout`.
pub async fn bounded<T, F>(service: &'static str, timeout: Duration, fut: F) -> Result<T, ExternalServiceError>
where
    F: Future<Output = Result<T, ExternalServiceError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ExternalServiceError::Timeout { service, timeout }),
    }
}
