//! Payload shapes of the upstream geodata and PV services.
//!
//! Every field the upstream may omit is an `Option`; normalization into the
//! internal types happens in the adapters, never here.

use serde::Deserialize;

// ─── geo.admin MapServer (find / identify) ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MapServerResponse<A> {
    #[serde(default = "Vec::new")]
    pub results: Vec<MapServerFeature<A>>,
}

#[derive(Debug, Deserialize)]
pub struct MapServerFeature<A> {
    pub attributes: A,
}

/// Federal building and dwelling register entry.
#[derive(Debug, Deserialize)]
pub struct RegistryAttributes {
    /// LV95 easting (m).
    pub gkode: Option<f64>,
    /// LV95 northing (m).
    pub gkodn: Option<f64>,
    /// Building footprint area (m²).
    pub garea: Option<f64>,
    /// Number of storeys.
    pub gastw: Option<u32>,
    /// Construction year.
    pub gbauj: Option<i32>,
    /// Building class code.
    pub gklas: Option<u32>,
}

/// Solar cadastre roof surface.
#[derive(Debug, Deserialize)]
pub struct RoofSurfaceAttributes {
    /// Roof surface area (m²).
    pub flaeche: Option<f64>,
    /// Suitability class, 1 (best) to 5.
    pub klasse: Option<u8>,
    /// Expected annual electricity yield (kWh).
    pub stromertrag: Option<f64>,
    /// Mean annual irradiation on the surface (kWh/m²).
    pub mstrahlung: Option<f64>,
}

// ─── PVGIS ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MonthlyRadiationResponse {
    pub outputs: MonthlyRadiationOutputs,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyRadiationOutputs {
    #[serde(default = "Vec::new")]
    pub monthly: Vec<MonthlyRadiationRow>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyRadiationRow {
    pub year: Option<i32>,
    pub month: Option<u8>,
    /// Horizontal irradiation for the month (kWh/m²).
    #[serde(rename = "H(h)_m")]
    pub horizontal_irradiation: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PvCalcResponse {
    pub outputs: PvCalcOutputs,
}

#[derive(Debug, Deserialize)]
pub struct PvCalcOutputs {
    pub totals: PvCalcTotals,
}

#[derive(Debug, Deserialize)]
pub struct PvCalcTotals {
    pub fixed: Option<PvCalcFixedTotals>,
}

#[derive(Debug, Deserialize)]
pub struct PvCalcFixedTotals {
    /// Annual production of the requested system (kWh/year).
    #[serde(rename = "E_y")]
    pub annual_energy: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_monthly_radiation() {
        let body = r#"{"inputs":{},"outputs":{"monthly":[
            {"year":2019,"month":1,"H(h)_m":31.5},
            {"year":2019,"month":2,"H(h)_m":null}
        ]},"meta":{}}"#;
        let parsed: MonthlyRadiationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.outputs.monthly.len(), 2);
        assert_eq!(parsed.outputs.monthly[0].horizontal_irradiation, Some(31.5));
        assert_eq!(parsed.outputs.monthly[1].horizontal_irradiation, None);
    }

    #[test]
    fn parses_identify_with_missing_fields() {
        let body = r#"{"results":[{"layerBodId":"x","attributes":{"flaeche":120.5,"klasse":2}}]}"#;
        let parsed: MapServerResponse<RoofSurfaceAttributes> = serde_json::from_str(body).unwrap();
        let a = &parsed.results[0].attributes;
        assert_eq!(a.flaeche, Some(120.5));
        assert_eq!(a.klasse, Some(2));
        assert_eq!(a.stromertrag, None);
    }

    #[test]
    fn missing_results_is_empty() {
        let parsed: MapServerResponse<RegistryAttributes> = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
