//! geo.admin MapServer adapters: building registry lookup and solar cadastre.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ExternalServiceError;
use crate::models::building::{BuildingAttributes, Coordinate};
use crate::models::wire::{MapServerResponse, RegistryAttributes, RoofSurfaceAttributes};
use crate::services::collaborators::{
    BuildingResolver, OfficialRoofRecord, OfficialRoofSource, ResolvedBuilding, service,
};
use crate::services::coordinates;
use crate::services::roof_estimator::DEFAULT_FLOORS;

const REGISTRY_LAYER: &str = "ch.bfs.gebaeude_wohnungs_register";
const ROOF_LAYER: &str = "ch.bfe.solarenergie-eignung-daecher";
/// Half-width of the identify map extent around the point (m).
const IDENTIFY_EXTENT_M: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct GeoAdminClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeoAdminClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &'static str,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ExternalServiceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
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

/// Registry entry → located building. Coordinates are mandatory.
pub fn normalize_registry(attrs: &RegistryAttributes) -> Result<ResolvedBuilding, ExternalServiceError> {
    let (Some(easting), Some(northing)) = (attrs.gkode, attrs.gkodn) else {
        return Err(ExternalServiceError::malformed(
            service::BUILDING_REGISTRY,
            "entry has no coordinates",
        ));
    };
    let (longitude, latitude) = coordinates::to_geographic(easting, northing);

    // The register stores the footprint; the roof model wants total floor area.
    let footprint = attrs.garea.filter(|a| a.is_finite() && *a > 0.0);
    let floors = attrs.gastw.filter(|f| *f >= 1);
    let floor_area = footprint.map(|a| a * f64::from(floors.unwrap_or(DEFAULT_FLOORS)));

    Ok(ResolvedBuilding {
        coordinate: Coordinate::new(longitude, latitude),
        attributes: BuildingAttributes {
            floor_area,
            floors,
            construction_year: attrs.gbauj,
            building_type_code: attrs.gklas.map(|c| c.to_string()),
        },
    })
}

/// Roof surfaces → one record for the largest valid surface.
pub fn normalize_roof_surfaces(
    surfaces: &[RoofSurfaceAttributes],
) -> Result<OfficialRoofRecord, ExternalServiceError> {
    if surfaces.is_empty() {
        return Err(ExternalServiceError::NotFound {
            service: service::SOLAR_CADASTRE,
        });
    }
    surfaces
        .iter()
        .filter_map(|s| match (s.flaeche, s.klasse) {
            (Some(area), Some(class)) if area.is_finite() && area > 0.0 && (1..=5).contains(&class) => {
                Some(OfficialRoofRecord {
                    roof_area: area,
                    suitability_class: class,
                    annual_yield: s.stromertrag.filter(|y| *y > 0.0),
                    annual_irradiation: s.mstrahlung.filter(|i| *i > 0.0),
                })
            }
            _ => None,
        })
        .max_by(|a, b| a.roof_area.total_cmp(&b.roof_area))
        .ok_or_else(|| {
            ExternalServiceError::malformed(
                service::SOLAR_CADASTRE,
                "no roof surface with a valid area and class",
            )
        })
}

#[async_trait]
impl BuildingResolver for GeoAdminClient {
    async fn resolve_building(&self, building_id: &str) -> Result<ResolvedBuilding, ExternalServiceError> {
        let query = [
            ("layer", REGISTRY_LAYER.to_string()),
            ("searchText", building_id.to_string()),
            ("searchField", "egid".to_string()),
            ("contains", "false".to_string()),
            ("returnGeometry", "false".to_string()),
        ];
        let resp: MapServerResponse<RegistryAttributes> = self
            .get_json(service::BUILDING_REGISTRY, "find", &query)
            .await?;
        let first = resp.results.first().ok_or(ExternalServiceError::NotFound {
            service: service::BUILDING_REGISTRY,
        })?;
        let resolved = normalize_registry(&first.attributes)?;
        debug!(building_id, ?resolved, "building resolved");
        Ok(resolved)
    }
}

#[async_trait]
impl OfficialRoofSource for GeoAdminClient {
    async fn fetch_official_roof(&self, coordinate: &Coordinate) -> Result<OfficialRoofRecord, ExternalServiceError> {
        let p = coordinates::to_projected(coordinate.longitude, coordinate.latitude);
        let query = [
            ("geometry", format!("{:.1},{:.1}", p.easting, p.northing)),
            ("geometryType", "esriGeometryPoint".to_string()),
            ("layers", format!("all:{ROOF_LAYER}")),
            (
                "mapExtent",
                format!(
                    "{:.1},{:.1},{:.1},{:.1}",
                    p.easting - IDENTIFY_EXTENT_M,
                    p.northing - IDENTIFY_EXTENT_M,
                    p.easting + IDENTIFY_EXTENT_M,
                    p.northing + IDENTIFY_EXTENT_M
                ),
            ),
            ("imageDisplay", "100,100,96".to_string()),
            ("tolerance", "10".to_string()),
            ("returnGeometry", "false".to_string()),
            ("sr", "2056".to_string()),
            ("lang", "en".to_string()),
        ];
        let resp: MapServerResponse<RoofSurfaceAttributes> = self
            .get_json(service::SOLAR_CADASTRE, "identify", &query)
            .await?;
        let surfaces: Vec<RoofSurfaceAttributes> =
            resp.results.into_iter().map(|f| f.attributes).collect();
        normalize_roof_surfaces(&surfaces)
    }
}
