use serde::{Deserialize, Serialize};

use crate::error::EstimateError;

/// Geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    pub fn validate(&self) -> Result<(), EstimateError> {
        if !self.longitude.is_finite() || !self.latitude.is_finite() {
            return Err(EstimateError::validation("coordinate must be finite"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(EstimateError::validation(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(EstimateError::validation(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        Ok(())
    }

    /// Stable key fragment, rounded to roughly one metre.
    pub fn cache_fragment(&self) -> String {
        format!("{:.5},{:.5}", self.longitude, self.latitude)
    }
}

/// Attributes of a building as known to the registry or the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingAttributes {
    /// Total floor area across all storeys (m²).
    pub floor_area: Option<f64>,
    pub floors: Option<u32>,
    pub construction_year: Option<i32>,
    /// Registry class code (e.g. "1110") or a free-text type ("warehouse").
    pub building_type_code: Option<String>,
}

impl BuildingAttributes {
    pub fn validate(&self) -> Result<(), EstimateError> {
        if let Some(area) = self.floor_area {
            if !area.is_finite() || area < 0.0 {
                return Err(EstimateError::validation(format!(
                    "floorArea must be a non-negative number, got {area}"
                )));
            }
        }
        if self.floors == Some(0) {
            return Err(EstimateError::validation("floors must be at least 1"));
        }
        Ok(())
    }

    /// Enough data for the roof heuristic to be meaningful.
    ///
    /// Without a positive floor area every downstream number would be a
    /// default, which is what the minimal-fallback tier is for.
    pub fn is_usable(&self) -> bool {
        matches!(self.floor_area, Some(a) if a > 0.0)
    }

    /// Fill fields that `self` lacks from `other`.
    pub fn merged_with(self, other: &BuildingAttributes) -> BuildingAttributes {
        BuildingAttributes {
            floor_area: self.floor_area.or(other.floor_area),
            floors: self.floors.or(other.floors),
            construction_year: self.construction_year.or(other.construction_year),
            building_type_code: self
                .building_type_code
                .or_else(|| other.building_type_code.clone()),
        }
    }

    pub fn category(&self) -> BuildingCategory {
        self.building_type_code
            .as_deref()
            .map(BuildingCategory::normalize)
            .unwrap_or(BuildingCategory::Unknown)
    }

    pub(crate) fn cache_fragment(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.floor_area.map(|a| format!("{a:.2}")).unwrap_or_default(),
            self.floors.map(|f| f.to_string()).unwrap_or_default(),
            self.construction_year.map(|y| y.to_string()).unwrap_or_default(),
            self.building_type_code.as_deref().unwrap_or_default(),
        )
    }
}

/// Incoming request: a building identifier or a coordinate, optionally with
/// attributes the caller already knows.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub building_id: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    #[serde(flatten)]
    pub attributes: BuildingAttributes,
}

const MAX_BUILDING_ID_LEN: usize = 64;

impl EstimateRequest {
    pub fn for_building(id: impl Into<String>) -> Self {
        Self {
            building_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn for_coordinate(coordinate: Coordinate) -> Self {
        Self {
            longitude: Some(coordinate.longitude),
            latitude: Some(coordinate.latitude),
            ..Default::default()
        }
    }

    pub fn with_attributes(mut self, attributes: BuildingAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => Some(Coordinate::new(lon, lat)),
            _ => None,
        }
    }

    /// Reject malformed input before any tier runs.
    pub fn validate(&self) -> Result<(), EstimateError> {
        if let Some(id) = &self.building_id {
            let id = id.trim();
            if id.is_empty() {
                return Err(EstimateError::validation("buildingId is empty"));
            }
            if id.len() > MAX_BUILDING_ID_LEN {
                return Err(EstimateError::validation("buildingId is too long"));
            }
            if !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            {
                return Err(EstimateError::validation(format!(
                    "buildingId '{id}' contains invalid characters"
                )));
            }
        }
        match (self.longitude, self.latitude) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(EstimateError::validation(
                    "longitude and latitude must be given together",
                ));
            }
            (Some(lon), Some(lat)) => Coordinate::new(lon, lat).validate()?,
            (None, None) if self.building_id.is_none() => {
                return Err(EstimateError::validation(
                    "either buildingId or longitude/latitude is required",
                ));
            }
            (None, None) => {}
        }
        self.attributes.validate()
    }

    /// Key under which the finished result is cached.
    pub fn cache_key(&self) -> String {
        let base = match (&self.building_id, self.coordinate()) {
            (Some(id), Some(c)) => format!("building:{}@{}", id.trim(), c.cache_fragment()),
            (Some(id), None) => format!("building:{}", id.trim()),
            (None, Some(c)) => format!("coord:{}", c.cache_fragment()),
            (None, None) => "invalid".to_string(),
        };
        if self.attributes == BuildingAttributes::default() {
            base
        } else {
            format!("{base}|{}", self.attributes.cache_fragment())
        }
    }
}

/// A building after resolution: always located, attributes possibly sparse.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingReference {
    pub identifier: String,
    pub coordinate: Coordinate,
    pub attributes: BuildingAttributes,
}

/// Normalized building-type category driving the roof heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingCategory {
    Residential,
    Apartment,
    Commercial,
    Industrial,
    Warehouse,
    Educational,
    Public,
    Agricultural,
    Historical,
    Unknown,
}

impl BuildingCategory {
    /// Accepts federal registry class codes (`gklas`, four digits) as well as
    /// free-text type names.
    pub fn normalize(code: &str) -> Self {
        let code = code.trim().to_ascii_lowercase();
        if let Ok(n) = code.parse::<u32>() {
            return Self::from_registry_class(n);
        }
        const KEYWORDS: &[(&str, BuildingCategory)] = &[
            ("apartment", BuildingCategory::Apartment),
            ("multi", BuildingCategory::Apartment),
            ("flat", BuildingCategory::Apartment),
            ("residential", BuildingCategory::Residential),
            ("house", BuildingCategory::Residential),
            ("single", BuildingCategory::Residential),
            ("office", BuildingCategory::Commercial),
            ("commercial", BuildingCategory::Commercial),
            ("retail", BuildingCategory::Commercial),
            ("hotel", BuildingCategory::Commercial),
            ("industrial", BuildingCategory::Industrial),
            ("factory", BuildingCategory::Industrial),
            ("warehouse", BuildingCategory::Warehouse),
            ("storage", BuildingCategory::Warehouse),
            ("logistics", BuildingCategory::Warehouse),
            ("school", BuildingCategory::Educational),
            ("education", BuildingCategory::Educational),
            ("university", BuildingCategory::Educational),
            ("public", BuildingCategory::Public),
            ("hospital", BuildingCategory::Public),
            ("government", BuildingCategory::Public),
            ("agri", BuildingCategory::Agricultural),
            ("farm", BuildingCategory::Agricultural),
            ("barn", BuildingCategory::Agricultural),
            ("histor", BuildingCategory::Historical),
            ("heritage", BuildingCategory::Historical),
            ("church", BuildingCategory::Historical),
            ("monument", BuildingCategory::Historical),
        ];
        // Keywords match the start of a word, so "warehouse" is not a "house".
        let words: Vec<&str> = code
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        KEYWORDS
            .iter()
            .find(|(kw, _)| words.iter().any(|w| w.starts_with(kw)))
            .map(|(_, cat)| *cat)
            .unwrap_or(BuildingCategory::Unknown)
    }

    fn from_registry_class(code: u32) -> Self {
        match code {
            1110 | 1121 => BuildingCategory::Residential,
            1122 | 1130 => BuildingCategory::Apartment,
            1211 | 1212 | 1220 | 1230 | 1231 => BuildingCategory::Commercial,
            1251 => BuildingCategory::Industrial,
            1242 | 1252 => BuildingCategory::Warehouse,
            1263 => BuildingCategory::Educational,
            1241 | 1261 | 1262 | 1264 | 1265 => BuildingCategory::Public,
            1271 => BuildingCategory::Agricultural,
            1272 | 1273 => BuildingCategory::Historical,
            _ => BuildingCategory::Unknown,
        }
    }
}
