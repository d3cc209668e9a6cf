//! PVGIS adapters: satellite monthly irradiation and PV specific yield.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ExternalServiceError;
use crate::models::building::Coordinate;
use crate::models::solar::{IrradianceProfile, SourceQuality};
use crate::models::wire::{MonthlyRadiationResponse, MonthlyRadiationRow, PvCalcResponse};
use crate::services::collaborators::{IrradianceSource, YieldFigure, YieldModelSource, service};

#[derive(Debug, Clone)]
pub struct PvgisClient {
    client: reqwest::Client,
    base_url: String,
    system_loss_percent: f64,
}

impl PvgisClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, system_loss_percent: f64) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            system_loss_percent,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &'static str,
        tool: &str,
        query: &[(&str, String)],
    ) -> Result<T, ExternalServiceError> {
        let url = format!("{}/{}", self.base_url, tool);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExternalServiceError::from_reqwest(service, e))?;
        response
            .json::<T>()
            .await
            .map_err(|e| ExternalServiceError::malformed(service, e.to_string()))
    }
}

/// Multi-year rows → 12 monthly means. Every month needs at least one value.
pub fn average_monthly(rows: &[MonthlyRadiationRow]) -> Result<[f64; 12], ExternalServiceError> {
    let mut sums = [0.0; 12];
    let mut counts = [0u32; 12];
    for row in rows {
        let (Some(month), Some(value)) = (row.month, row.horizontal_irradiation) else {
            continue;
        };
        if !(1..=12).contains(&month) || !value.is_finite() || value < 0.0 {
            continue;
        }
        let i = usize::from(month - 1);
        sums[i] += value;
        counts[i] += 1;
    }
    let mut monthly = [0.0; 12];
    for i in 0..12 {
        if counts[i] == 0 {
            return Err(ExternalServiceError::malformed(
                service::IRRADIANCE,
                format!("no values for month {}", i + 1),
            ));
        }
        monthly[i] = sums[i] / f64::from(counts[i]);
    }
    Ok(monthly)
}

fn coordinate_query(coordinate: &Coordinate) -> Vec<(&'static str, String)> {
    vec![
        ("lat", format!("{:.5}", coordinate.latitude)),
        ("lon", format!("{:.5}", coordinate.longitude)),
        ("outputformat", "json".to_string()),
    ]
}

#[async_trait]
impl IrradianceSource for PvgisClient {
    async fn fetch_irradiance(&self, coordinate: &Coordinate) -> Result<IrradianceProfile, ExternalServiceError> {
        let mut query = coordinate_query(coordinate);
        query.push(("horirrad", "1".to_string()));
        let resp: MonthlyRadiationResponse = self.get_json(service::IRRADIANCE, "MRcalc", &query).await?;

        let monthly = average_monthly(&resp.outputs.monthly)?;
        let profile = IrradianceProfile::from_monthly(monthly, SourceQuality::Satellite);
        if profile.annual_irradiation <= 0.0 {
            return Err(ExternalServiceError::malformed(service::IRRADIANCE, "zero annual irradiation"));
        }
        debug!(rows = resp.outputs.monthly.len(), annual = profile.annual_irradiation, "satellite irradiance fetched");
        Ok(profile)
    }
}

#[async_trait]
impl YieldModelSource for PvgisClient {
    async fn fetch_yield_model(&self, coordinate: &Coordinate) -> Result<YieldFigure, ExternalServiceError> {
        let mut query = coordinate_query(coordinate);
        query.push(("peakpower", "1".to_string()));
        query.push(("loss", format!("{}", self.system_loss_percent)));
        query.push(("optimalangles", "1".to_string()));
        let resp: PvCalcResponse = self.get_json(service::YIELD_MODEL, "PVcalc", &query).await?;

        // With 1 kWp installed the annual energy is the specific yield.
        let specific_yield = resp
            .outputs
            .totals
            .fixed
            .and_then(|f| f.annual_energy)
            .filter(|e| e.is_finite() && *e > 0.0)
            .ok_or_else(|| ExternalServiceError::malformed(service::YIELD_MODEL, "missing E_y"))?;
        debug!(specific_yield, "yield model fetched");
        Ok(YieldFigure { specific_yield })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, month: u8, value: Option<f64>) -> MonthlyRadiationRow {
        MonthlyRadiationRow {
            year: Some(year),
            month: Some(month),
            horizontal_irradiation: value,
        }
    }

    #[test]
    fn averages_across_years() {
        let mut rows = Vec::new();
        for month in 1..=12u8 {
            rows.push(row(2019, month, Some(90.0)));
            rows.push(row(2020, month, Some(110.0)));
        }
        let monthly = average_monthly(&rows).unwrap();
        assert!(monthly.iter().all(|m| *m == 100.0));
    }

    #[test]
    fn skips_nulls_and_requires_every_month() {
        let mut rows: Vec<_> = (1..=12u8).map(|m| row(2019, m, Some(50.0))).collect();
        rows.push(row(2020, 3, None));
        assert!(average_monthly(&rows).is_ok());

        rows.retain(|r| r.month != Some(7));
        assert!(matches!(
            average_monthly(&rows),
            Err(ExternalServiceError::Malformed { .. })
        ));
    }

    #[test]
    fn parses_pvcalc_payload() {
        let body = r#"{"outputs":{"totals":{"fixed":{"E_d":3.1,"E_y":1123.4}}}}"#;
        let parsed: PvCalcResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.outputs.totals.fixed.and_then(|f| f.annual_energy), Some(1123.4));
    }
}
