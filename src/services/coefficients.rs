//! Named, versioned coefficient sets for the yield and economic model.
//!
//! Two economic models exist in the field: a legacy flat-rate model and the
//! current tiered model with tax deduction. Both are kept so the choice is a
//! config value rather than a code edit.

/// Installation cost band: systems up to `max_kwp` pay `chf_per_kwp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBand {
    pub max_kwp: f64,
    pub chf_per_kwp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSet {
    pub name: &'static str,
    /// Installed kWp per m² of suitable roof.
    pub areal_power_density: f64,
    /// Fraction of irradiation turned into AC energy when no yield model is available.
    pub performance_ratio: f64,
    /// kg CO2 avoided per kWh produced.
    pub grid_emission_factor: f64,
    /// Ascending by `max_kwp`; the last band must be unbounded.
    pub cost_bands: &'static [CostBand],
    /// Fraction of the gross cost recovered through tax deduction.
    pub tax_benefit_fraction: f64,
    pub self_consumption_rate: f64,
    /// CHF/kWh avoided on self-consumed energy.
    pub electricity_price: f64,
    /// CHF/kWh paid for exported energy.
    pub feed_in_tariff: f64,
}

pub static TIERED_2024: CoefficientSet = CoefficientSet {
    name: "tiered-2024",
    areal_power_density: 0.20,
    performance_ratio: 0.80,
    grid_emission_factor: 0.128,
    cost_bands: &[
        CostBand { max_kwp: 10.0, chf_per_kwp: 2500.0 },
        CostBand { max_kwp: 30.0, chf_per_kwp: 2000.0 },
        CostBand { max_kwp: 100.0, chf_per_kwp: 1600.0 },
        CostBand { max_kwp: f64::INFINITY, chf_per_kwp: 1300.0 },
    ],
    tax_benefit_fraction: 0.20,
    self_consumption_rate: 0.65,
    electricity_price: 0.27,
    feed_in_tariff: 0.10,
};

pub static FLAT_LEGACY: CoefficientSet = CoefficientSet {
    name: "flat-legacy",
    areal_power_density: 0.15,
    performance_ratio: 0.80,
    grid_emission_factor: 0.128,
    cost_bands: &[CostBand { max_kwp: f64::INFINITY, chf_per_kwp: 1800.0 }],
    tax_benefit_fraction: 0.0,
    self_consumption_rate: 0.30,
    electricity_price: 0.25,
    feed_in_tariff: 0.08,
};

pub static ALL: [&CoefficientSet; 2] = [&TIERED_2024, &FLAT_LEGACY];

impl CoefficientSet {
    pub const DEFAULT_NAME: &'static str = "tiered-2024";

    pub fn by_name(name: &str) -> Option<&'static CoefficientSet> {
        ALL.iter().copied().find(|c| c.name == name)
    }

    /// CHF per kWp for a system of the given size.
    pub fn cost_rate(&self, capacity_kwp: f64) -> f64 {
        self.cost_bands
            .iter()
            .find(|b| capacity_kwp <= b.max_kwp)
            .or(self.cost_bands.last())
            .map(|b| b.chf_per_kwp)
            .unwrap_or(0.0)
    }
}
