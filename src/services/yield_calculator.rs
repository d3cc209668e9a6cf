/// ============================================================
///  Yield & Economics Calculator
///
///   1. Suitable area      – roof area × usable ratio
///   2. Capacity           – suitable area × areal power density
///   3. Annual production  – capacity × specific yield
///                           (yield model, else irradiation × PR)
///   4. CO2 savings        – production × grid emission factor
///   5. Economics          – tiered cost, tax benefit, self-consumption
///                           split, payback and viability class
/// ============================================================

use tracing::debug;

use crate::models::solar::{
    EconomicAssessment, IrradianceProfile, RoofAnalysis, ViabilityClass, YieldEstimate,
};
use crate::services::coefficients::CoefficientSet;

/// Floor on annual savings (CHF) before dividing.
pub const SAVINGS_EPSILON: f64 = 1e-6;

/// Payback reported for systems that never pay back.
pub const PAYBACK_CAP_YEARS: f64 = 99.0;

/// Payback upper bounds (inclusive), best class first. Anything above the
/// last bound is `Poor`.
pub const VIABILITY_THRESHOLDS: [(f64, ViabilityClass); 3] = [
    (6.0, ViabilityClass::Excellent),
    (10.0, ViabilityClass::Good),
    (15.0, ViabilityClass::Moderate),
];

pub fn classify_viability(payback_years: f64) -> ViabilityClass {
    VIABILITY_THRESHOLDS
        .iter()
        .find(|(max, _)| payback_years <= *max)
        .map(|(_, class)| *class)
        .unwrap_or(ViabilityClass::Poor)
}

/// Specific yield (kWh/kWp/year) to apply: the yield model's figure when
/// present, else irradiation scaled by the performance ratio.
pub fn effective_specific_yield(
    irradiance: &IrradianceProfile,
    model_yield: Option<f64>,
    coeffs: &CoefficientSet,
) -> f64 {
    match model_yield {
        Some(y) if y.is_finite() && y > 0.0 => y,
        _ => irradiance.annual_irradiation * coeffs.performance_ratio,
    }
}

pub fn calculate_yield(
    roof: &RoofAnalysis,
    irradiance: &IrradianceProfile,
    model_yield: Option<f64>,
    coeffs: &CoefficientSet,
) -> YieldEstimate {
    let suitable_area = roof.roof_area * roof.usable_ratio;
    let potential_capacity = suitable_area * coeffs.areal_power_density;
    let specific_yield = effective_specific_yield(irradiance, model_yield, coeffs);
    let annual_production = potential_capacity * specific_yield;
    let co2_savings = annual_production * coeffs.grid_emission_factor;

    let monthly_production = irradiance.monthly.and_then(|months| {
        if irradiance.annual_irradiation <= 0.0 {
            return None;
        }
        Some(months.map(|m| annual_production * m / irradiance.annual_irradiation))
    });

    YieldEstimate {
        suitable_area,
        potential_capacity,
        specific_yield,
        annual_production,
        monthly_production,
        co2_savings,
    }
}

pub fn assess_economics(yield_estimate: &YieldEstimate, coeffs: &CoefficientSet) -> EconomicAssessment {
    let capacity = yield_estimate.potential_capacity;
    if !(capacity.is_finite() && capacity > 0.0) {
        debug!(capacity, "no usable capacity, reporting not viable");
        return not_viable();
    }

    let installation_cost = capacity * coeffs.cost_rate(capacity);
    let effective_cost = installation_cost * (1.0 - coeffs.tax_benefit_fraction);

    let production = yield_estimate.annual_production;
    let self_consumed_energy = production * coeffs.self_consumption_rate;
    let fed_in_energy = production - self_consumed_energy;
    let annual_savings =
        self_consumed_energy * coeffs.electricity_price + fed_in_energy * coeffs.feed_in_tariff;

    let payback_period = (effective_cost / annual_savings.max(SAVINGS_EPSILON)).min(PAYBACK_CAP_YEARS);
    let viability = classify_viability(payback_period);

    EconomicAssessment {
        installation_cost,
        effective_cost,
        self_consumed_energy,
        annual_savings,
        payback_period,
        viability,
    }
}

fn not_viable() -> EconomicAssessment {
    EconomicAssessment {
        installation_cost: 0.0,
        effective_cost: 0.0,
        self_consumed_energy: 0.0,
        annual_savings: 0.0,
        payback_period: PAYBACK_CAP_YEARS,
        viability: ViabilityClass::Poor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::solar::{SourceQuality, SuitabilityClass};
    use crate::services::coefficients::{FLAT_LEGACY, TIERED_2024};
    use approx::assert_relative_eq;

    fn roof(area: f64, ratio: f64) -> RoofAnalysis {
        RoofAnalysis {
            roof_area: area,
            suitability_score: 85,
            suitability_class: SuitabilityClass::Excellent,
            usable_ratio: ratio,
        }
    }

    fn irradiance(annual: f64) -> IrradianceProfile {
        IrradianceProfile::annual(annual, SourceQuality::Satellite)
    }

    #[test]
    fn yield_chain_uses_model_figure() {
        let y = calculate_yield(&roof(63.75, 0.85), &irradiance(1200.0), Some(1050.0), &TIERED_2024);
        assert_relative_eq!(y.suitable_area, 54.1875, max_relative = 1e-9);
        assert_relative_eq!(y.potential_capacity, 10.8375, max_relative = 1e-9);
        assert_eq!(y.specific_yield, 1050.0);
        assert_relative_eq!(y.annual_production, 10.8375 * 1050.0, max_relative = 1e-9);
        assert_eq!(y.co2_savings, y.annual_production * TIERED_2024.grid_emission_factor);
        assert!(y.suitable_area <= 63.75);
    }

    #[test]
    fn falls_back_to_performance_ratio() {
        let y = calculate_yield(&roof(100.0, 0.5), &irradiance(1100.0), None, &TIERED_2024);
        assert_relative_eq!(y.specific_yield, 880.0, max_relative = 1e-9);
        let y2 = calculate_yield(&roof(100.0, 0.5), &irradiance(1100.0), Some(0.0), &TIERED_2024);
        assert_eq!(y.specific_yield, y2.specific_yield);
    }

    #[test]
    fn monthly_production_sums_to_annual() {
        let mut months = [0.0; 12];
        for (i, m) in months.iter_mut().enumerate() {
            *m = 40.0 + 10.0 * i as f64;
        }
        let profile = IrradianceProfile::from_monthly(months, SourceQuality::Satellite);
        let y = calculate_yield(&roof(100.0, 0.7), &profile, Some(1000.0), &TIERED_2024);
        let monthly = y.monthly_production.unwrap();
        assert_relative_eq!(monthly.iter().sum::<f64>(), y.annual_production, max_relative = 1e-12);
        assert!(monthly[11] > monthly[0]);
    }

    #[test]
    fn economics_for_small_system() {
        let y = calculate_yield(&roof(63.75, 0.85), &irradiance(1200.0), Some(1000.0), &TIERED_2024);
        let e = assess_economics(&y, &TIERED_2024);
        // 10.8375 kWp falls in the second band
        assert_relative_eq!(e.installation_cost, 10.8375 * 2000.0, max_relative = 1e-9);
        assert_relative_eq!(e.effective_cost, e.installation_cost * 0.8, max_relative = 1e-9);
        let production = 10_837.5;
        let savings = production * 0.65 * 0.27 + production * 0.35 * 0.10;
        assert_relative_eq!(e.annual_savings, savings, max_relative = 1e-12);
        assert_relative_eq!(e.payback_period, e.effective_cost / savings, max_relative = 1e-12);
        assert_eq!(e.viability, classify_viability(e.payback_period));
    }

    #[test]
    fn legacy_model_differs() {
        let y = calculate_yield(&roof(100.0, 0.7), &irradiance(1100.0), Some(1000.0), &FLAT_LEGACY);
        let e = assess_economics(&y, &FLAT_LEGACY);
        assert_relative_eq!(e.installation_cost, y.potential_capacity * 1800.0, max_relative = 1e-9);
        assert_eq!(e.installation_cost, e.effective_cost);
    }

    #[test]
    fn zero_capacity_is_not_viable() {
        let y = calculate_yield(&roof(0.0, 0.85), &irradiance(1100.0), Some(1000.0), &TIERED_2024);
        let e = assess_economics(&y, &TIERED_2024);
        assert_eq!(e.viability, ViabilityClass::Poor);
        assert_eq!(e.payback_period, PAYBACK_CAP_YEARS);
        assert_eq!(e.installation_cost, 0.0);
    }

    #[test]
    fn viability_thresholds_are_inclusive() {
        assert_eq!(classify_viability(0.0), ViabilityClass::Excellent);
        assert_eq!(classify_viability(6.0), ViabilityClass::Excellent);
        assert_eq!(classify_viability(6.000_001), ViabilityClass::Good);
        assert_eq!(classify_viability(10.0), ViabilityClass::Good);
        assert_eq!(classify_viability(15.0), ViabilityClass::Moderate);
        assert_eq!(classify_viability(15.01), ViabilityClass::Poor);
        assert_eq!(classify_viability(f64::INFINITY), ViabilityClass::Poor);
    }

    #[test]
    fn viability_is_monotonic() {
        let mut prev = ViabilityClass::Excellent;
        for tenth in 0..300 {
            let class = classify_viability(tenth as f64 / 10.0);
            assert!(class <= prev);
            prev = class;
        }
    }
}
