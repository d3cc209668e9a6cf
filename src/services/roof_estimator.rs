/// ============================================================
///  Roof Characteristics Estimator
///
///  Heuristic roof model from building attributes alone:
///   1. Ground-floor area   – floor area / storeys
///   2. Roof area           – ground floor × type multiplier, clamped
///   3. Suitability score   – base + age + type + height adjustments,
///                            clamped to [10, 100]
///   4. Class & usable ratio – fixed score thresholds
///
///  Never fails: missing attributes fall back to nominal values and
///  the substituted field names are reported to the caller.
/// ============================================================

use tracing::debug;

use crate::models::building::{BuildingAttributes, BuildingCategory};
use crate::models::solar::{RoofAnalysis, SuitabilityClass};

// ─── Nominal defaults ────────────────────────────────────────
/// Floor area assumed when none is known (m², all storeys).
pub const DEFAULT_FLOOR_AREA_M2: f64 = 200.0;
pub const DEFAULT_FLOORS: u32 = 2;

pub const MIN_ROOF_AREA_M2: f64 = 30.0;
pub const MAX_ROOF_AREA_M2: f64 = 5000.0;

pub const BASE_SCORE: i32 = 70;
pub const MIN_SCORE: i32 = 10;
pub const MAX_SCORE: i32 = 100;

/// Score thresholds, highest first: (minimum score, class, usable ratio).
pub const SUITABILITY_THRESHOLDS: [(i32, SuitabilityClass, f64); 5] = [
    (85, SuitabilityClass::Excellent, 0.85),
    (70, SuitabilityClass::Good, 0.70),
    (50, SuitabilityClass::Moderate, 0.50),
    (30, SuitabilityClass::Limited, 0.25),
    (i32::MIN, SuitabilityClass::Poor, 0.10),
];

/// Solar cadastre classes 1 (best) to 5: (class, score, usable ratio).
/// Ratios follow the cadastre's classes and are separate from `SUITABILITY_THRESHOLDS`.
const OFFICIAL_CLASSES: [(SuitabilityClass, u8, f64); 5] = [
    (SuitabilityClass::Excellent, 95, 0.80),
    (SuitabilityClass::Good, 80, 0.65),
    (SuitabilityClass::Moderate, 60, 0.50),
    (SuitabilityClass::Limited, 40, 0.30),
    (SuitabilityClass::Poor, 20, 0.15),
];

/// Attribute names reported when a default was substituted.
pub mod defaulted {
    pub const FLOOR_AREA: &str = "floorArea";
    pub const FLOORS: &str = "floors";
    pub const CONSTRUCTION_YEAR: &str = "constructionYear";
    pub const BUILDING_TYPE: &str = "buildingTypeCode";
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoofEstimate {
    pub analysis: RoofAnalysis,
    pub defaults_applied: Vec<&'static str>,
}

/// Roof-area multiplier applied to the ground-floor footprint.
pub fn type_multiplier(category: BuildingCategory) -> f64 {
    match category {
        BuildingCategory::Residential => 0.85,
        BuildingCategory::Apartment => 0.80,
        BuildingCategory::Commercial => 0.90,
        BuildingCategory::Industrial => 1.00,
        BuildingCategory::Warehouse => 1.05,
        BuildingCategory::Educational | BuildingCategory::Public => 0.75,
        BuildingCategory::Agricultural => 0.95,
        BuildingCategory::Historical => 0.75,
        BuildingCategory::Unknown => 0.85,
    }
}

/// Newer construction tends to have sound, unobstructed roofs.
pub fn age_adjustment(construction_year: Option<i32>) -> i32 {
    match construction_year {
        Some(y) if y >= 2010 => 15,
        Some(y) if y >= 2000 => 10,
        Some(y) if y >= 1980 => 5,
        Some(y) if y >= 1960 => 0,
        Some(_) => -10,
        None => 0,
    }
}

pub fn type_adjustment(category: BuildingCategory) -> i32 {
    match category {
        BuildingCategory::Industrial | BuildingCategory::Warehouse => 10,
        BuildingCategory::Educational | BuildingCategory::Public => -5,
        BuildingCategory::Historical => -20,
        _ => 0,
    }
}

/// Tall buildings see less shading; single-storey roofs see more.
pub fn height_adjustment(floors: u32) -> i32 {
    if floors >= 8 {
        5
    } else if floors <= 1 {
        -5
    } else {
        0
    }
}

/// Map a score to its class and usable ratio.
pub fn classify(score: i32) -> (SuitabilityClass, f64) {
    SUITABILITY_THRESHOLDS
        .iter()
        .find(|(min, _, _)| score >= *min)
        .map(|(_, class, ratio)| (*class, *ratio))
        .unwrap_or((SuitabilityClass::Poor, 0.10))
}

/// Heuristic estimate from attributes alone.
pub fn estimate(attrs: &BuildingAttributes) -> RoofEstimate {
    let mut defaults_applied = Vec::new();

    let floor_area = match attrs.floor_area {
        Some(a) if a > 0.0 => a,
        _ => {
            defaults_applied.push(defaulted::FLOOR_AREA);
            DEFAULT_FLOOR_AREA_M2
        }
    };
    let floors = attrs.floors.unwrap_or_else(|| {
        defaults_applied.push(defaulted::FLOORS);
        DEFAULT_FLOORS
    });
    if attrs.construction_year.is_none() {
        defaults_applied.push(defaulted::CONSTRUCTION_YEAR);
    }
    let category = attrs.category();
    if attrs.building_type_code.is_none() {
        defaults_applied.push(defaulted::BUILDING_TYPE);
    }

    let ground_floor_area = floor_area / floors.max(1) as f64;
    let roof_area =
        (ground_floor_area * type_multiplier(category)).clamp(MIN_ROOF_AREA_M2, MAX_ROOF_AREA_M2);

    let score = (BASE_SCORE
        + age_adjustment(attrs.construction_year)
        + type_adjustment(category)
        + height_adjustment(floors))
    .clamp(MIN_SCORE, MAX_SCORE);
    let (suitability_class, usable_ratio) = classify(score);

    if !defaults_applied.is_empty() {
        debug!(defaults = ?defaults_applied, "roof estimate used nominal attribute values");
    }
    debug!(
        ?category,
        roof_area,
        score,
        class = suitability_class.as_str(),
        "heuristic roof estimate"
    );

    RoofEstimate {
        analysis: RoofAnalysis {
            roof_area,
            suitability_score: score as u8,
            suitability_class,
            usable_ratio,
        },
        defaults_applied,
    }
}

/// Everything defaulted: the roof assumed for a building we know nothing about.
pub fn minimal() -> RoofEstimate {
    estimate(&BuildingAttributes::default())
}

/// Roof analysis for a solar cadastre record. Returns `None` for a class
/// outside 1..=5 or a non-positive area.
pub fn from_official(roof_area: f64, official_class: u8) -> Option<RoofAnalysis> {
    if !(roof_area.is_finite() && roof_area > 0.0) {
        return None;
    }
    let idx = usize::from(official_class).checked_sub(1)?;
    let (suitability_class, suitability_score, usable_ratio) = *OFFICIAL_CLASSES.get(idx)?;
    Some(RoofAnalysis {
        roof_area,
        suitability_score,
        suitability_class,
        usable_ratio,
    })
}
