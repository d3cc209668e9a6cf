/// ============================================================
///  Simulation mode collaborators
///
///  Deterministic stand-ins for the four external services. Each
///  answer is drawn from a StdRng seeded with the configured seed
///  mixed with a hash of the request key (building id or rounded
///  coordinate), so the same seed and input always yield the same
///  data, and different buildings still differ.
///
///  Irradiance comes from the offline clear-sky model; a share of
///  locations is deliberately missing from the cadastre or has a
///  failing satellite service so every fallback tier is exercised.
/// ============================================================

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ExternalServiceError;
use crate::models::building::{BuildingAttributes, Coordinate};
use crate::models::solar::{IrradianceProfile, SourceQuality};
use crate::services::clear_sky;
use crate::services::collaborators::{
    BuildingResolver, IrradianceSource, OfficialRoofRecord, OfficialRoofSource, ResolvedBuilding,
    YieldFigure, YieldModelSource, service,
};

/// Share of simulated locations present in the solar cadastre.
pub const CADASTRE_COVERAGE: f64 = 0.6;
/// Share of simulated locations whose satellite/yield lookups fail.
pub const SATELLITE_FAILURE_RATE: f64 = 0.1;

const BUILDING_TYPES: [&str; 8] = [
    "1110", "1121", "1122", "1220", "1251", "1252", "1263", "1271",
];

#[derive(Debug, Clone, Copy)]
pub struct SimulatedCollaborators {
    seed: u64,
}

impl SimulatedCollaborators {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, salt: &str, key: &str) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ fnv1a(salt.as_bytes()) ^ fnv1a(key.as_bytes()).rotate_left(17))
    }

    /// Satellite and yield lookups share one outage decision per location.
    fn satellite_available(&self, coordinate: &Coordinate) -> bool {
        let mut rng = self.rng_for("satellite-outage", &coordinate.cache_fragment());
        !rng.gen_bool(SATELLITE_FAILURE_RATE)
    }
}

/// 64-bit FNV-1a; stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

#[async_trait]
impl BuildingResolver for SimulatedCollaborators {
    async fn resolve_building(&self, building_id: &str) -> Result<ResolvedBuilding, ExternalServiceError> {
        let mut rng = self.rng_for("registry", building_id);
        let floors: u32 = rng.gen_range(1..=8);
        let footprint: f64 = rng.gen_range(60.0..900.0);
        let kind = BUILDING_TYPES[rng.gen_range(0..BUILDING_TYPES.len())];
        Ok(ResolvedBuilding {
            // Swiss plateau, between Geneva and St. Gallen
            coordinate: Coordinate::new(rng.gen_range(6.3..9.4), rng.gen_range(46.3..47.6)),
            attributes: BuildingAttributes {
                floor_area: Some(footprint * f64::from(floors)),
                floors: Some(floors),
                construction_year: Some(rng.gen_range(1880..=2023)),
                building_type_code: Some(kind.to_string()),
            },
        })
    }
}

#[async_trait]
impl OfficialRoofSource for SimulatedCollaborators {
    async fn fetch_official_roof(&self, coordinate: &Coordinate) -> Result<OfficialRoofRecord, ExternalServiceError> {
        let mut rng = self.rng_for("cadastre", &coordinate.cache_fragment());
        if !rng.gen_bool(CADASTRE_COVERAGE) {
            return Err(ExternalServiceError::NotFound {
                service: service::SOLAR_CADASTRE,
            });
        }
        let roof_area: f64 = rng.gen_range(40.0..600.0);
        let suitability_class: u8 = rng.gen_range(1..=5);
        let annual_irradiation: f64 = rng.gen_range(900.0..1400.0);
        Ok(OfficialRoofRecord {
            roof_area,
            suitability_class,
            annual_yield: Some(roof_area * annual_irradiation * 0.17 * 0.8),
            annual_irradiation: Some(annual_irradiation),
        })
    }
}

#[async_trait]
impl IrradianceSource for SimulatedCollaborators {
    async fn fetch_irradiance(&self, coordinate: &Coordinate) -> Result<IrradianceProfile, ExternalServiceError> {
        if !self.satellite_available(coordinate) {
            return Err(ExternalServiceError::Status {
                service: service::IRRADIANCE,
                status: 503,
            });
        }
        let mut rng = self.rng_for("irradiance", &coordinate.cache_fragment());
        let base = clear_sky::monthly_horizontal_irradiation(coordinate.latitude);
        let monthly = base.map(|m| m * rng.gen_range(0.92..1.08));
        Ok(IrradianceProfile::from_monthly(monthly, SourceQuality::Satellite))
    }
}

#[async_trait]
impl YieldModelSource for SimulatedCollaborators {
    async fn fetch_yield_model(&self, coordinate: &Coordinate) -> Result<YieldFigure, ExternalServiceError> {
        if !self.satellite_available(coordinate) {
            return Err(ExternalServiceError::Status {
                service: service::YIELD_MODEL,
                status: 503,
            });
        }
        let mut rng = self.rng_for("yield", &coordinate.cache_fragment());
        let horizontal: f64 = clear_sky::monthly_horizontal_irradiation(coordinate.latitude)
            .iter()
            .sum();
        // Tilted-plane gain minus system losses
        let specific_yield = horizontal * 1.12 * 0.86 * rng.gen_range(0.95..1.05);
        Ok(YieldFigure { specific_yield })
    }
}
