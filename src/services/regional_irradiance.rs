//! Fixed annual irradiation by coarse geographic zone.
//!
//! Values are long-term horizontal means in kWh/m²/year. Zones are checked in
//! order; the first whose box contains the point wins, so the narrow alpine
//! and southern zones come before the broad plateau.

use crate::models::building::Coordinate;
use crate::models::solar::{IrradianceProfile, SourceQuality};
use crate::services::coordinates::GeoBounds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionalZone {
    pub name: &'static str,
    pub bounds: GeoBounds,
    pub annual_irradiation: f64,
}

/// Used when no zone matches, including points abroad.
pub const FALLBACK_IRRADIATION: f64 = 1100.0;

pub const ZONES: [RegionalZone; 6] = [
    RegionalZone {
        name: "ticino",
        bounds: GeoBounds { lon_min: 8.35, lon_max: 9.30, lat_min: 45.81, lat_max: 46.45 },
        annual_irradiation: 1350.0,
    },
    RegionalZone {
        name: "engadin-grisons-south",
        bounds: GeoBounds { lon_min: 9.30, lon_max: 10.50, lat_min: 46.15, lat_max: 46.70 },
        annual_irradiation: 1330.0,
    },
    RegionalZone {
        name: "valais",
        bounds: GeoBounds { lon_min: 6.75, lon_max: 8.35, lat_min: 45.85, lat_max: 46.45 },
        annual_irradiation: 1320.0,
    },
    RegionalZone {
        name: "alps-north",
        bounds: GeoBounds { lon_min: 6.75, lon_max: 10.50, lat_min: 46.45, lat_max: 46.85 },
        annual_irradiation: 1200.0,
    },
    RegionalZone {
        name: "lake-geneva-jura",
        bounds: GeoBounds { lon_min: 5.95, lon_max: 7.20, lat_min: 46.10, lat_max: 47.55 },
        annual_irradiation: 1180.0,
    },
    RegionalZone {
        name: "plateau-northeast",
        bounds: GeoBounds { lon_min: 7.20, lon_max: 10.50, lat_min: 46.85, lat_max: 47.81 },
        annual_irradiation: 1120.0,
    },
];

pub fn zone_for(coordinate: &Coordinate) -> Option<&'static RegionalZone> {
    ZONES
        .iter()
        .find(|z| z.bounds.contains(coordinate.longitude, coordinate.latitude))
}

pub fn lookup(coordinate: &Coordinate) -> IrradianceProfile {
    let annual = zone_for(coordinate)
        .map(|z| z.annual_irradiation)
        .unwrap_or(FALLBACK_IRRADIATION);
    IrradianceProfile::annual(annual, SourceQuality::RegionalTable)
}
