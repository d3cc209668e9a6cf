/// ============================================================
///  Tiered estimation orchestrator
///
///  The only component callers invoke. A request is validated,
///  looked up in the result cache, and on a miss runs through
///  four strategies of decreasing fidelity:
///
///    1. official-hybrid      cadastre roof + satellite data
///    2. satellite-estimated  heuristic roof + satellite data
///    3. regional-table       heuristic roof + zone irradiance
///    4. minimal-fallback     default roof  + zone irradiance
///
///  Collaborator failures stay inside the tier that saw them and
///  are logged at warn; only validation and resolution errors
///  reach the caller.
/// ============================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::{Config, Mode};
use crate::error::{ConfigError, EstimateError, ExternalServiceError};
use crate::models::building::{BuildingReference, Coordinate, EstimateRequest};
use crate::models::solar::{
    IrradianceProfile, Provenance, RoofAnalysis, SolarPotentialResult, SourceQuality, Tier,
    data_sources,
};
use crate::result_cache::{CacheStats, ResultCache};
use crate::services::coefficients::CoefficientSet;
use crate::services::collaborators::{
    Collaborators, OfficialRoofRecord, YieldFigure, bounded, service,
};
use crate::services::coordinates::NATIONAL_BOUNDS;
use crate::services::geoadmin::GeoAdminClient;
use crate::services::pvgis::PvgisClient;
use crate::services::simulation::SimulatedCollaborators;
use crate::services::{regional_irradiance, roof_estimator, yield_calculator};

type SatelliteFetch = (
    Result<IrradianceProfile, ExternalServiceError>,
    Result<YieldFigure, ExternalServiceError>,
);

/// Inputs chosen by whichever tier succeeded.
#[derive(Debug)]
struct TierOutcome {
    tier: Tier,
    data_source: &'static str,
    roof: RoofAnalysis,
    irradiance: IrradianceProfile,
    /// Specific yield from the yield model; `None` derives it from irradiation.
    model_yield: Option<f64>,
    defaults_applied: Vec<&'static str>,
    official_annual_yield: Option<f64>,
}

#[derive(Clone)]
pub struct Orchestrator {
    collaborators: Collaborators,
    cache: ResultCache,
    coefficients: &'static CoefficientSet,
    fetch_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        collaborators: Collaborators,
        coefficients: &'static CoefficientSet,
        fetch_timeout: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            collaborators,
            cache: ResultCache::new(cache_ttl),
            coefficients,
            fetch_timeout,
        }
    }

    /// Wire up live HTTP adapters or seeded simulated ones, per `config.mode`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let coefficients = config.coefficient_set()?;
        let collaborators = match config.mode {
            Mode::Live => {
                let client = reqwest::Client::builder()
                    .timeout(config.fetch_timeout())
                    .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                    .build()?;
                let geoadmin = Arc::new(GeoAdminClient::new(
                    client.clone(),
                    &config.endpoints.geoadmin_base,
                ));
                let pvgis = Arc::new(PvgisClient::new(
                    client,
                    &config.endpoints.pvgis_base,
                    config.pv_system_loss_percent,
                ));
                Collaborators {
                    resolver: geoadmin.clone(),
                    official: geoadmin,
                    irradiance: pvgis.clone(),
                    yield_model: pvgis,
                }
            }
            Mode::Simulation => {
                let sim = Arc::new(SimulatedCollaborators::new(config.simulation_seed));
                Collaborators {
                    resolver: sim.clone(),
                    official: sim.clone(),
                    irradiance: sim.clone(),
                    yield_model: sim,
                }
            }
        };
        info!(
            mode = ?config.mode,
            coefficients = coefficients.name,
            fetch_timeout_secs = config.fetch_timeout_secs,
            cache_ttl_secs = config.cache_ttl_secs,
            "orchestrator ready"
        );
        Ok(Self::new(
            collaborators,
            coefficients,
            config.fetch_timeout(),
            config.cache_ttl(),
        ))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Estimate the rooftop solar potential for one building or coordinate.
    pub async fn estimate(&self, request: &EstimateRequest) -> Result<SolarPotentialResult, EstimateError> {
        request.validate()?;
        let key = request.cache_key();
        let span = info_span!("estimate", request_id = %Uuid::new_v4(), key = %key);

        async {
            let result = self.cache.get_or_compute(&key, || self.run(request)).await;
            match &result {
                Ok(r) => info!(
                    tier = %r.provenance.tier,
                    annual_production = r.yield_estimate.annual_production,
                    viability = r.economics.viability.as_str(),
                    "estimate ready"
                ),
                Err(e) => warn!(error = %e, "estimate failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &EstimateRequest) -> Result<SolarPotentialResult, EstimateError> {
        let building = self.resolve(request).await?;
        let coordinate = building.coordinate;
        let out_of_coverage = !NATIONAL_BOUNDS.contains(coordinate.longitude, coordinate.latitude);
        if out_of_coverage {
            warn!(
                lon = coordinate.longitude,
                lat = coordinate.latitude,
                "coordinate outside national coverage, estimating anyway"
            );
        }

        let official = bounded(
            service::SOLAR_CADASTRE,
            self.fetch_timeout,
            self.collaborators.official.fetch_official_roof(&coordinate),
        )
        .await
        .and_then(|record| {
            let roof = roof_estimator::from_official(record.roof_area, record.suitability_class)
                .ok_or_else(|| {
                    ExternalServiceError::malformed(
                        service::SOLAR_CADASTRE,
                        format!(
                            "unusable roof record (area {}, class {})",
                            record.roof_area, record.suitability_class
                        ),
                    )
                })?;
            Ok((record, roof))
        });

        let outcome = match official {
            Ok((record, roof)) => {
                let satellite = self.fetch_satellite(&coordinate).await;
                official_hybrid(&coordinate, record, roof, satellite)
            }
            Err(e) => {
                warn!(tier = %Tier::OfficialHybrid, error = %e, "tier failed, falling through");
                if building.attributes.is_usable() {
                    let satellite = self.fetch_satellite(&coordinate).await;
                    match satellite_estimated(&building, satellite) {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            warn!(tier = %Tier::SatelliteEstimated, error = %e, "tier failed, falling through");
                            regional_table(&building)
                        }
                    }
                } else {
                    warn!(
                        tier = %Tier::SatelliteEstimated,
                        "no usable building attributes, using minimal fallback"
                    );
                    minimal_fallback(&coordinate)
                }
            }
        };

        self.finish(building, outcome, out_of_coverage)
    }

    /// Locate the building. Caller-supplied coordinate and attributes win
    /// over registry data.
    async fn resolve(&self, request: &EstimateRequest) -> Result<BuildingReference, EstimateError> {
        let requested = request.coordinate();
        let Some(id) = request.building_id.as_deref().map(str::trim) else {
            let coordinate = requested.ok_or_else(|| {
                EstimateError::validation("either buildingId or longitude/latitude is required")
            })?;
            return Ok(BuildingReference {
                identifier: format!("coord:{}", coordinate.cache_fragment()),
                coordinate,
                attributes: request.attributes.clone(),
            });
        };

        let resolved = bounded(
            service::BUILDING_REGISTRY,
            self.fetch_timeout,
            self.collaborators.resolver.resolve_building(id),
        )
        .await;

        match (resolved, requested) {
            (Ok(resolved), requested) => {
                let coordinate = requested.unwrap_or(resolved.coordinate);
                coordinate.validate().map_err(|e| {
                    EstimateError::resolution(id, format!("registry returned an unusable coordinate: {e}"))
                })?;
                let registry_attributes = match resolved.attributes.validate() {
                    Ok(()) => resolved.attributes,
                    Err(e) => {
                        warn!(building_id = id, error = %e, "ignoring invalid registry attributes");
                        Default::default()
                    }
                };
                debug!(
                    building_id = id,
                    lon = coordinate.longitude,
                    lat = coordinate.latitude,
                    "building resolved"
                );
                Ok(BuildingReference {
                    identifier: id.to_string(),
                    coordinate,
                    attributes: request.attributes.clone().merged_with(&registry_attributes),
                })
            }
            (Err(e), Some(coordinate)) => {
                warn!(building_id = id, error = %e, "registry lookup failed, using the supplied coordinate");
                Ok(BuildingReference {
                    identifier: id.to_string(),
                    coordinate,
                    attributes: request.attributes.clone(),
                })
            }
            (Err(e), None) => {
                warn!(building_id = id, error = %e, "building could not be resolved");
                let reason = match e {
                    ExternalServiceError::NotFound { .. } => "building not found in the registry".to_string(),
                    other => other.to_string(),
                };
                Err(EstimateError::resolution(id, reason))
            }
        }
    }

    /// Irradiance and yield model are independent, so they run concurrently.
    async fn fetch_satellite(&self, coordinate: &Coordinate) -> SatelliteFetch {
        let (irradiance, model) = join(
            bounded(
                service::IRRADIANCE,
                self.fetch_timeout,
                self.collaborators.irradiance.fetch_irradiance(coordinate),
            ),
            bounded(
                service::YIELD_MODEL,
                self.fetch_timeout,
                self.collaborators.yield_model.fetch_yield_model(coordinate),
            ),
        )
        .await;

        let irradiance = irradiance.and_then(|profile| {
            if !(profile.annual_irradiation.is_finite() && profile.annual_irradiation > 0.0) {
                Err(ExternalServiceError::malformed(service::IRRADIANCE, "non-positive annual irradiation"))
            } else if !profile.is_consistent() {
                Err(ExternalServiceError::malformed(
                    service::IRRADIANCE,
                    "monthly profile does not sum to the annual figure",
                ))
            } else {
                Ok(profile)
            }
        });
        (irradiance, model)
    }

    fn finish(
        &self,
        building: BuildingReference,
        outcome: TierOutcome,
        out_of_coverage: bool,
    ) -> Result<SolarPotentialResult, EstimateError> {
        let yield_estimate = yield_calculator::calculate_yield(
            &outcome.roof,
            &outcome.irradiance,
            outcome.model_yield,
            self.coefficients,
        );
        if !(yield_estimate.annual_production.is_finite() && yield_estimate.annual_production >= 0.0) {
            return Err(EstimateError::Internal {
                reason: format!("{} tier produced no finite production figure", outcome.tier),
            });
        }
        let economics = yield_calculator::assess_economics(&yield_estimate, self.coefficients);

        debug!(
            tier = %outcome.tier,
            roof_area = outcome.roof.roof_area,
            suitable_area = yield_estimate.suitable_area,
            specific_yield = yield_estimate.specific_yield,
            payback = economics.payback_period,
            "pipeline finished"
        );

        Ok(SolarPotentialResult {
            building_id: building.identifier,
            roof: outcome.roof,
            irradiance: outcome.irradiance,
            yield_estimate,
            economics,
            provenance: Provenance {
                is_estimated: outcome.tier != Tier::OfficialHybrid,
                tier: outcome.tier,
                data_source: outcome.data_source,
                defaults_applied: outcome.defaults_applied,
            },
            official_annual_yield: outcome.official_annual_yield,
            out_of_coverage,
            computed_at: Utc::now(),
        })
    }
}

// ─── Tiers ───────────────────────────────────────────────────────────────────

/// Cadastre roof with the best irradiance available: satellite, then the
/// cadastre's own figure, then the regional table.
fn official_hybrid(
    coordinate: &Coordinate,
    record: OfficialRoofRecord,
    roof: RoofAnalysis,
    (irradiance, model): SatelliteFetch,
) -> TierOutcome {
    let (irradiance, data_source) = match irradiance {
        Ok(profile) => (profile, data_sources::OFFICIAL_SATELLITE),
        Err(e) => {
            warn!(tier = %Tier::OfficialHybrid, error = %e, "satellite irradiance unavailable");
            match record.annual_irradiation.filter(|v| v.is_finite() && *v > 0.0) {
                Some(v) => (
                    IrradianceProfile::annual(v, SourceQuality::Official),
                    data_sources::OFFICIAL_CADASTRE,
                ),
                None => (
                    regional_irradiance::lookup(coordinate),
                    data_sources::OFFICIAL_REGIONAL,
                ),
            }
        }
    };
    let model_yield = match model {
        Ok(figure) => Some(figure.specific_yield),
        Err(e) => {
            warn!(tier = %Tier::OfficialHybrid, error = %e, "yield model unavailable, deriving from irradiation");
            None
        }
    };

    TierOutcome {
        tier: Tier::OfficialHybrid,
        data_source,
        roof,
        irradiance,
        model_yield,
        defaults_applied: Vec::new(),
        official_annual_yield: record.annual_yield.filter(|v| v.is_finite() && *v > 0.0),
    }
}

/// Needs both satellite fetches; either failing sends the request to tier 3.
fn satellite_estimated(
    building: &BuildingReference,
    (irradiance, model): SatelliteFetch,
) -> Result<TierOutcome, ExternalServiceError> {
    let irradiance = irradiance?;
    let model = model?;
    let estimate = roof_estimator::estimate(&building.attributes);
    Ok(TierOutcome {
        tier: Tier::SatelliteEstimated,
        data_source: data_sources::SATELLITE_HEURISTIC,
        roof: estimate.analysis,
        irradiance,
        model_yield: Some(model.specific_yield),
        defaults_applied: estimate.defaults_applied,
        official_annual_yield: None,
    })
}

fn regional_table(building: &BuildingReference) -> TierOutcome {
    let estimate = roof_estimator::estimate(&building.attributes);
    TierOutcome {
        tier: Tier::RegionalTable,
        data_source: data_sources::REGIONAL_TABLE,
        roof: estimate.analysis,
        irradiance: regional_irradiance::lookup(&building.coordinate),
        model_yield: None,
        defaults_applied: estimate.defaults_applied,
        official_annual_yield: None,
    }
}

fn minimal_fallback(coordinate: &Coordinate) -> TierOutcome {
    let estimate = roof_estimator::minimal();
    TierOutcome {
        tier: Tier::MinimalFallback,
        data_source: data_sources::DEFAULT_HEURISTIC,
        roof: estimate.analysis,
        irradiance: regional_irradiance::lookup(coordinate),
        model_yield: None,
        defaults_applied: estimate.defaults_applied,
        official_annual_yield: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::building::BuildingAttributes;
    use crate::models::solar::{SolarPotentialResponse, SuitabilityClass};
    use crate::services::coefficients::TIERED_2024;
    use crate::services::collaborators::{
        BuildingResolver, IrradianceSource, OfficialRoofSource, ResolvedBuilding, YieldModelSource,
    };
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MONTHLY: [f64; 12] = [
        30.0, 50.0, 90.0, 120.0, 150.0, 160.0, 165.0, 145.0, 105.0, 65.0, 35.0, 25.0,
    ];

    #[derive(Clone)]
    struct Stub {
        building: Result<ResolvedBuilding, ExternalServiceError>,
        official: Result<OfficialRoofRecord, ExternalServiceError>,
        irradiance: Result<IrradianceProfile, ExternalServiceError>,
        yield_figure: Result<YieldFigure, ExternalServiceError>,
        official_delay: Duration,
        irradiance_delay: Duration,
        resolves: Arc<AtomicUsize>,
        fetches: Arc<AtomicUsize>,
    }

    fn scenario_a_attributes() -> BuildingAttributes {
        BuildingAttributes {
            floor_area: Some(150.0),
            floors: Some(2),
            construction_year: Some(2015),
            building_type_code: Some("residential".to_string()),
        }
    }

    fn bern() -> Coordinate {
        Coordinate::new(7.44, 46.95)
    }

    fn down(service: &'static str) -> ExternalServiceError {
        ExternalServiceError::Status { service, status: 503 }
    }

    impl Default for Stub {
        fn default() -> Self {
            Self {
                building: Ok(ResolvedBuilding {
                    coordinate: bern(),
                    attributes: scenario_a_attributes(),
                }),
                official: Err(ExternalServiceError::NotFound {
                    service: service::SOLAR_CADASTRE,
                }),
                irradiance: Ok(IrradianceProfile::from_monthly(MONTHLY, SourceQuality::Satellite)),
                yield_figure: Ok(YieldFigure { specific_yield: 1050.0 }),
                official_delay: Duration::ZERO,
                irradiance_delay: Duration::ZERO,
                resolves: Arc::new(AtomicUsize::new(0)),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl BuildingResolver for Stub {
        async fn resolve_building(&self, _id: &str) -> Result<ResolvedBuilding, ExternalServiceError> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            self.building.clone()
        }
    }

    #[async_trait]
    impl OfficialRoofSource for Stub {
        async fn fetch_official_roof(&self, _c: &Coordinate) -> Result<OfficialRoofRecord, ExternalServiceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.official_delay.is_zero() {
                tokio::time::sleep(self.official_delay).await;
            }
            self.official.clone()
        }
    }

    #[async_trait]
    impl IrradianceSource for Stub {
        async fn fetch_irradiance(&self, _c: &Coordinate) -> Result<IrradianceProfile, ExternalServiceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.irradiance_delay.is_zero() {
                tokio::time::sleep(self.irradiance_delay).await;
            }
            self.irradiance.clone()
        }
    }

    #[async_trait]
    impl YieldModelSource for Stub {
        async fn fetch_yield_model(&self, _c: &Coordinate) -> Result<YieldFigure, ExternalServiceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.yield_figure.clone()
        }
    }

    fn orchestrator(stub: Stub) -> Orchestrator {
        let stub = Arc::new(stub);
        Orchestrator::new(
            Collaborators {
                resolver: stub.clone(),
                official: stub.clone(),
                irradiance: stub.clone(),
                yield_model: stub,
            },
            &TIERED_2024,
            Duration::from_secs(12),
            Duration::from_secs(3600),
        )
    }

    fn official_record() -> OfficialRoofRecord {
        OfficialRoofRecord {
            roof_area: 200.0,
            suitability_class: 1,
            annual_yield: Some(30_000.0),
            annual_irradiation: Some(1150.0),
        }
    }

    #[tokio::test]
    async fn heuristic_roof_with_satellite_data() {
        let orch = orchestrator(Stub::default());
        let request = EstimateRequest::for_coordinate(bern()).with_attributes(scenario_a_attributes());
        let r = orch.estimate(&request).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::SatelliteEstimated);
        assert!(r.provenance.is_estimated);
        assert_eq!(r.provenance.data_source, data_sources::SATELLITE_HEURISTIC);
        assert!(r.provenance.defaults_applied.is_empty());
        assert_relative_eq!(r.roof.roof_area, 63.75, max_relative = 1e-9);
        assert_eq!(r.roof.suitability_score, 85);
        assert_eq!(r.roof.suitability_class, SuitabilityClass::Excellent);
        assert_relative_eq!(r.yield_estimate.suitable_area, 54.1875, max_relative = 1e-9);
        assert_eq!(r.yield_estimate.specific_yield, 1050.0);
        assert_eq!(r.irradiance.source_quality, SourceQuality::Satellite);
        assert!(r.yield_estimate.monthly_production.is_some());
        assert!(!r.out_of_coverage);
        assert!(r.building_id.starts_with("coord:"));
    }

    #[tokio::test]
    async fn unresolvable_building_is_a_resolution_error() {
        let orch = orchestrator(Stub {
            building: Err(ExternalServiceError::NotFound {
                service: service::BUILDING_REGISTRY,
            }),
            official: Err(down(service::SOLAR_CADASTRE)),
            irradiance: Err(down(service::IRRADIANCE)),
            yield_figure: Err(down(service::YIELD_MODEL)),
            ..Default::default()
        });
        let err = orch
            .estimate(&EstimateRequest::for_building("999999999"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EstimateError::Resolution { ref building_id, .. } if building_id == "999999999"
        ));
    }

    #[tokio::test]
    async fn official_roof_record_is_not_estimated() {
        let orch = orchestrator(Stub {
            official: Ok(official_record()),
            ..Default::default()
        });
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::OfficialHybrid);
        assert!(!r.provenance.is_estimated);
        assert_eq!(r.provenance.data_source, data_sources::OFFICIAL_SATELLITE);
        assert_eq!(r.roof.roof_area, 200.0);
        assert_relative_eq!(r.yield_estimate.suitable_area, 160.0, max_relative = 1e-9);
        assert_eq!(r.official_annual_yield, Some(30_000.0));
        assert_eq!(r.building_id, "190365");
    }

    #[tokio::test]
    async fn official_roof_falls_back_to_cadastre_irradiance() {
        let orch = orchestrator(Stub {
            official: Ok(official_record()),
            irradiance: Err(down(service::IRRADIANCE)),
            yield_figure: Err(down(service::YIELD_MODEL)),
            ..Default::default()
        });
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::OfficialHybrid);
        assert_eq!(r.provenance.data_source, data_sources::OFFICIAL_CADASTRE);
        assert_eq!(r.irradiance.source_quality, SourceQuality::Official);
        assert_relative_eq!(
            r.yield_estimate.specific_yield,
            1150.0 * TIERED_2024.performance_ratio,
            max_relative = 1e-9
        );
    }

    #[tokio::test]
    async fn official_roof_without_any_irradiance_uses_regional_table() {
        let orch = orchestrator(Stub {
            official: Ok(OfficialRoofRecord {
                annual_irradiation: None,
                ..official_record()
            }),
            irradiance: Err(down(service::IRRADIANCE)),
            ..Default::default()
        });
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::OfficialHybrid);
        assert_eq!(r.provenance.data_source, data_sources::OFFICIAL_REGIONAL);
        assert_eq!(r.irradiance, regional_irradiance::lookup(&bern()));
        // Yield model still answered.
        assert_eq!(r.yield_estimate.specific_yield, 1050.0);
    }

    #[tokio::test]
    async fn failed_fetches_fall_through_to_regional_table() {
        let orch = orchestrator(Stub {
            official: Err(ExternalServiceError::Transport {
                service: service::SOLAR_CADASTRE,
                reason: "connection reset".to_string(),
            }),
            irradiance: Err(down(service::IRRADIANCE)),
            yield_figure: Err(down(service::YIELD_MODEL)),
            ..Default::default()
        });
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::RegionalTable);
        assert!(r.provenance.is_estimated);
        assert_eq!(r.provenance.data_source, data_sources::REGIONAL_TABLE);
        assert_eq!(r.irradiance.source_quality, SourceQuality::RegionalTable);
        assert_relative_eq!(
            r.yield_estimate.specific_yield,
            r.irradiance.annual_irradiation * TIERED_2024.performance_ratio,
            max_relative = 1e-9
        );
        assert_relative_eq!(r.roof.roof_area, 63.75, max_relative = 1e-9);
    }

    #[tokio::test]
    async fn yield_model_failure_alone_skips_satellite_tier() {
        let orch = orchestrator(Stub {
            yield_figure: Err(ExternalServiceError::malformed(service::YIELD_MODEL, "missing E_y")),
            ..Default::default()
        });
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();
        assert_eq!(r.provenance.tier, Tier::RegionalTable);
    }

    #[tokio::test]
    async fn inconsistent_monthly_profile_is_rejected() {
        let orch = orchestrator(Stub {
            irradiance: Ok(IrradianceProfile {
                annual_irradiation: 2000.0,
                monthly: Some(MONTHLY),
                source_quality: SourceQuality::Satellite,
            }),
            ..Default::default()
        });
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();
        assert_eq!(r.provenance.tier, Tier::RegionalTable);
    }

    #[tokio::test]
    async fn missing_attributes_use_minimal_fallback() {
        let orch = orchestrator(Stub {
            building: Ok(ResolvedBuilding {
                coordinate: bern(),
                attributes: BuildingAttributes::default(),
            }),
            ..Default::default()
        });
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::MinimalFallback);
        assert_eq!(r.provenance.data_source, data_sources::DEFAULT_HEURISTIC);
        assert_eq!(r.provenance.defaults_applied.len(), 4);
        assert_eq!(r.roof, roof_estimator::minimal().analysis);
        assert_eq!(r.irradiance, regional_irradiance::lookup(&bern()));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_collaborator_times_out_and_falls_through() {
        let orch = orchestrator(Stub {
            irradiance_delay: Duration::from_secs(600),
            ..Default::default()
        });
        let started = tokio::time::Instant::now();
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::RegionalTable);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cadastre_falls_through_to_satellite_tier() {
        let orch = orchestrator(Stub {
            official: Ok(official_record()),
            official_delay: Duration::from_secs(600),
            ..Default::default()
        });
        let request = EstimateRequest::for_coordinate(bern()).with_attributes(scenario_a_attributes());
        let started = tokio::time::Instant::now();
        let r = orch.estimate(&request).await.unwrap();

        assert_eq!(r.provenance.tier, Tier::SatelliteEstimated);
        assert!(r.provenance.is_estimated);
        assert_eq!(r.provenance.data_source, data_sources::SATELLITE_HEURISTIC);
        assert_eq!(r.official_annual_yield, None);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn supplied_coordinate_is_part_of_the_cache_key() {
        let orch = orchestrator(Stub {
            building: Err(down(service::BUILDING_REGISTRY)),
            irradiance: Err(down(service::IRRADIANCE)),
            ..Default::default()
        });
        let at = |lon: f64, lat: f64| EstimateRequest {
            building_id: Some("X1".to_string()),
            longitude: Some(lon),
            latitude: Some(lat),
            attributes: scenario_a_attributes(),
        };

        let lugano = orch.estimate(&at(8.95, 46.0)).await.unwrap();
        assert_eq!(lugano.provenance.tier, Tier::RegionalTable);
        assert_eq!(lugano.irradiance.annual_irradiation, 1350.0);

        let zurich = orch.estimate(&at(8.54, 47.37)).await.unwrap();
        assert_eq!(zurich.irradiance.annual_irradiation, 1120.0);
        assert_eq!(orch.cache_stats().hits, 0);

        // Without a coordinate the registry outage is still fatal.
        let id_only = EstimateRequest::for_building("X1").with_attributes(scenario_a_attributes());
        let err = orch.estimate(&id_only).await.unwrap_err();
        assert!(matches!(err, EstimateError::Resolution { .. }));
    }

    #[tokio::test]
    async fn repeated_requests_within_ttl_are_identical() {
        let stub = Stub::default();
        let resolves = stub.resolves.clone();
        let fetches = stub.fetches.clone();
        let orch = orchestrator(stub);
        let request = EstimateRequest::for_building("190365");

        let first = orch.estimate(&request).await.unwrap();
        let fetched = fetches.load(Ordering::SeqCst);
        let second = orch.estimate(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(resolves.load(Ordering::SeqCst), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), fetched);
        assert_eq!(orch.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_fetch() {
        let stub = Stub::default();
        let resolves = stub.resolves.clone();
        let fetches = stub.fetches.clone();
        let orch = orchestrator(stub);

        let bad_id = orch.estimate(&EstimateRequest::for_building("12 34; drop")).await;
        assert!(matches!(bad_id, Err(EstimateError::Validation { .. })));

        let half_coordinate = EstimateRequest {
            longitude: Some(7.4),
            ..Default::default()
        };
        let err = orch.estimate(&half_coordinate).await;
        assert!(matches!(err, Err(EstimateError::Validation { .. })));

        assert_eq!(resolves.load(Ordering::SeqCst), 0);
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn co2_savings_follow_production() {
        let orch = orchestrator(Stub::default());
        let r = orch.estimate(&EstimateRequest::for_building("190365")).await.unwrap();
        assert_eq!(
            r.yield_estimate.co2_savings,
            r.yield_estimate.annual_production * TIERED_2024.grid_emission_factor
        );
        assert!(r.yield_estimate.suitable_area <= r.roof.roof_area);
    }

    #[tokio::test]
    async fn points_abroad_are_flagged_not_rejected() {
        let orch = orchestrator(Stub::default());
        let paris = EstimateRequest::for_coordinate(Coordinate::new(2.35, 48.85))
            .with_attributes(scenario_a_attributes());
        let r = orch.estimate(&paris).await.unwrap();
        assert!(r.out_of_coverage);
    }

    #[tokio::test]
    async fn supplied_coordinate_survives_registry_outage() {
        let orch = orchestrator(Stub {
            building: Err(down(service::BUILDING_REGISTRY)),
            ..Default::default()
        });
        let request = EstimateRequest {
            building_id: Some("190365".to_string()),
            longitude: Some(7.44),
            latitude: Some(46.95),
            attributes: scenario_a_attributes(),
        };
        let r = orch.estimate(&request).await.unwrap();
        assert_eq!(r.building_id, "190365");
        assert_eq!(r.provenance.tier, Tier::SatelliteEstimated);
    }

    #[tokio::test]
    async fn caller_attributes_override_registry() {
        let orch = orchestrator(Stub::default());
        let request = EstimateRequest::for_building("190365").with_attributes(BuildingAttributes {
            floor_area: Some(1000.0),
            floors: Some(1),
            ..Default::default()
        });
        let r = orch.estimate(&request).await.unwrap();
        // 1000 m² on one floor, residential multiplier from the registry type.
        assert_relative_eq!(r.roof.roof_area, 850.0, max_relative = 1e-9);
    }

    #[tokio::test]
    async fn simulation_mode_is_reproducible() {
        let config = Config {
            mode: Mode::Simulation,
            simulation_seed: 7,
            ..Config::default()
        };
        let a = Orchestrator::from_config(&config).unwrap();
        let b = Orchestrator::from_config(&config).unwrap();

        for id in ["190365", "1000", "2027881"] {
            let request = EstimateRequest::for_building(id);
            let mut ra = SolarPotentialResponse::from(&a.estimate(&request).await.unwrap());
            let rb = SolarPotentialResponse::from(&b.estimate(&request).await.unwrap());
            ra.computed_at = rb.computed_at;
            assert_eq!(ra, rb);
            assert!(ra.suitable_area <= ra.roof_area);
        }
    }
}
