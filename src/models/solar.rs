use chrono::{DateTime, Utc};
use serde::Serialize;

// ─── Roof ────────────────────────────────────────────────────────────────────

/// Discrete roof-quality tier driving the usable-area ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuitabilityClass {
    Poor,
    Limited,
    Moderate,
    Good,
    Excellent,
}

impl SuitabilityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuitabilityClass::Excellent => "excellent",
            SuitabilityClass::Good => "good",
            SuitabilityClass::Moderate => "moderate",
            SuitabilityClass::Limited => "limited",
            SuitabilityClass::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoofAnalysis {
    /// Gross roof area (m²).
    pub roof_area: f64,
    /// Score in [10, 100].
    pub suitability_score: u8,
    pub suitability_class: SuitabilityClass,
    /// Fraction of the roof usable for panels, in (0, 1].
    pub usable_ratio: f64,
}

// ─── Irradiance ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceQuality {
    Official,
    Satellite,
    RegionalTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceProfile {
    /// kWh/m²/year.
    pub annual_irradiation: f64,
    /// kWh/m² per calendar month, January first.
    pub monthly: Option<[f64; 12]>,
    pub source_quality: SourceQuality,
}

/// Allowed relative gap between the sum of a monthly profile and the annual figure.
pub const MONTHLY_SUM_TOLERANCE: f64 = 0.05;

impl IrradianceProfile {
    pub fn annual(annual_irradiation: f64, source_quality: SourceQuality) -> Self {
        Self {
            annual_irradiation,
            monthly: None,
            source_quality,
        }
    }

    /// Build from a monthly profile; the annual figure is its sum.
    pub fn from_monthly(monthly: [f64; 12], source_quality: SourceQuality) -> Self {
        Self {
            annual_irradiation: monthly.iter().sum(),
            monthly: Some(monthly),
            source_quality,
        }
    }

    /// True when there is no monthly profile, or it sums to the annual figure.
    pub fn is_consistent(&self) -> bool {
        match &self.monthly {
            None => true,
            Some(m) => {
                let sum: f64 = m.iter().sum();
                self.annual_irradiation > 0.0
                    && ((sum - self.annual_irradiation) / self.annual_irradiation).abs()
                        <= MONTHLY_SUM_TOLERANCE
            }
        }
    }
}

// ─── Yield & economics ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct YieldEstimate {
    /// m², never above the roof area.
    pub suitable_area: f64,
    /// kWp.
    pub potential_capacity: f64,
    /// kWh/kWp/year actually applied.
    pub specific_yield: f64,
    /// kWh/year.
    pub annual_production: f64,
    /// kWh per month, when a monthly irradiance profile was available.
    pub monthly_production: Option<[f64; 12]>,
    /// kg CO2/year.
    pub co2_savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViabilityClass {
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl ViabilityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViabilityClass::Excellent => "excellent",
            ViabilityClass::Good => "good",
            ViabilityClass::Moderate => "moderate",
            ViabilityClass::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EconomicAssessment {
    /// Gross installation cost (CHF).
    pub installation_cost: f64,
    /// Cost after the tax benefit (CHF).
    pub effective_cost: f64,
    pub self_consumed_energy: f64,
    /// CHF/year.
    pub annual_savings: f64,
    /// Years, capped at 99 for systems that never pay back.
    pub payback_period: f64,
    pub viability: ViabilityClass,
}

// ─── Provenance & result ─────────────────────────────────────────────────────

/// Strategy in the fallback chain, highest fidelity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    OfficialHybrid,
    SatelliteEstimated,
    RegionalTable,
    MinimalFallback,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::OfficialHybrid => "official-hybrid",
            Tier::SatelliteEstimated => "satellite-estimated",
            Tier::RegionalTable => "regional-table",
            Tier::MinimalFallback => "minimal-fallback",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod data_sources {
    pub const OFFICIAL_SATELLITE: &str = "official roof + satellite irradiance";
    pub const OFFICIAL_CADASTRE: &str = "official roof + cadastre irradiance";
    pub const OFFICIAL_REGIONAL: &str = "official roof + regional irradiance table";
    pub const SATELLITE_HEURISTIC: &str = "satellite irradiance + heuristic roof model";
    pub const REGIONAL_TABLE: &str = "regional irradiance table";
    pub const DEFAULT_HEURISTIC: &str = "default heuristic, no building data";
}

#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub is_estimated: bool,
    pub tier: Tier,
    pub data_source: &'static str,
    /// Attribute names the roof estimator filled with defaults.
    pub defaults_applied: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolarPotentialResult {
    pub building_id: String,
    pub roof: RoofAnalysis,
    pub irradiance: IrradianceProfile,
    pub yield_estimate: YieldEstimate,
    pub economics: EconomicAssessment,
    pub provenance: Provenance,
    /// Cadastre's own annual electricity estimate (kWh), when tier 1 had one.
    pub official_annual_yield: Option<f64>,
    pub out_of_coverage: bool,
    pub computed_at: DateTime<Utc>,
}

// ─── Wire response ───────────────────────────────────────────────────────────

/// Flattened response shape returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarPotentialResponse {
    pub building_id: String,
    pub roof_area: f64,
    pub suitable_area: f64,
    pub potential_kwp: f64,
    pub annual_production: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_production: Option<[f64; 12]>,
    pub co2_savings: f64,
    pub economic_viability: ViabilityClass,
    pub irradiation: f64,
    pub irradiation_source: SourceQuality,
    pub suitability_class: String,
    pub suitability_score: u8,
    pub installation_cost: f64,
    pub effective_cost: f64,
    pub annual_savings: f64,
    pub payback_period: f64,
    pub is_estimated: bool,
    pub estimation_method: String,
    pub data_source: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defaults_applied: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_annual_yield: Option<f64>,
    pub out_of_coverage: bool,
    pub computed_at: DateTime<Utc>,
}

impl From<&SolarPotentialResult> for SolarPotentialResponse {
    fn from(r: &SolarPotentialResult) -> Self {
        Self {
            building_id: r.building_id.clone(),
            roof_area: r.roof.roof_area,
            suitable_area: r.yield_estimate.suitable_area,
            potential_kwp: r.yield_estimate.potential_capacity,
            annual_production: r.yield_estimate.annual_production,
            monthly_production: r.yield_estimate.monthly_production,
            co2_savings: r.yield_estimate.co2_savings,
            economic_viability: r.economics.viability,
            irradiation: r.irradiance.annual_irradiation,
            irradiation_source: r.irradiance.source_quality,
            suitability_class: r.roof.suitability_class.as_str().to_string(),
            suitability_score: r.roof.suitability_score,
            installation_cost: r.economics.installation_cost,
            effective_cost: r.economics.effective_cost,
            annual_savings: r.economics.annual_savings,
            payback_period: r.economics.payback_period,
            is_estimated: r.provenance.is_estimated,
            estimation_method: r.provenance.tier.as_str().to_string(),
            data_source: r.provenance.data_source.to_string(),
            defaults_applied: r
                .provenance
                .defaults_applied
                .iter()
                .map(|s| s.to_string())
                .collect(),
            official_annual_yield: r.official_annual_yield,
            out_of_coverage: r.out_of_coverage,
            computed_at: r.computed_at,
        }
    }
}
