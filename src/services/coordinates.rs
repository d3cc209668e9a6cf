//! WGS84 ⇄ Swiss LV95 (EPSG:2056) conversion.
//!
//! Uses the swisstopo approximate polynomial around the Bern reference point
//! (7°26'22.5" E, 46°57'08.66" N). Accuracy is about one metre inside
//! Switzerland, which is plenty for locating a roof but not survey grade.
//! No validation happens here; points outside the country are transformed
//! like any other and callers decide what to do with them.

/// Projected LV95 point in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub easting: f64,
    pub northing: f64,
}

/// Longitude/latitude box of the national territory, with a small margin.
pub const NATIONAL_BOUNDS: GeoBounds = GeoBounds {
    lon_min: 5.95,
    lon_max: 10.50,
    lat_min: 45.81,
    lat_max: 47.81,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl GeoBounds {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.lon_min..=self.lon_max).contains(&lon) && (self.lat_min..=self.lat_max).contains(&lat)
    }
}

// Reference point in arc-seconds.
const REF_LAT_SEC: f64 = 169_028.66;
const REF_LON_SEC: f64 = 26_782.5;

pub fn to_projected(lon: f64, lat: f64) -> Projected {
    let phi = (lat * 3600.0 - REF_LAT_SEC) / 10_000.0;
    let lambda = (lon * 3600.0 - REF_LON_SEC) / 10_000.0;

    let easting = 2_600_072.37 + 211_455.93 * lambda
        - 10_938.51 * lambda * phi
        - 0.36 * lambda * phi.powi(2)
        - 44.54 * lambda.powi(3);

    let northing = 1_200_147.07 + 308_807.95 * phi
        + 3_745.25 * lambda.powi(2)
        + 76.63 * phi.powi(2)
        - 194.56 * lambda.powi(2) * phi
        + 119.79 * phi.powi(3);

    Projected { easting, northing }
}

/// Returns `(lon, lat)` in degrees.
pub fn to_geographic(easting: f64, northing: f64) -> (f64, f64) {
    let y = (easting - 2_600_000.0) / 1_000_000.0;
    let x = (northing - 1_200_000.0) / 1_000_000.0;

    let lambda = 2.677_909_4 + 4.728_982 * y + 0.791_484 * y * x + 0.1306 * y * x.powi(2)
        - 0.0436 * y.powi(3);

    let phi = 16.902_389_2 + 3.238_272 * x
        - 0.270_978 * y.powi(2)
        - 0.002_528 * x.powi(2)
        - 0.0447 * y.powi(2) * x
        - 0.0140 * x.powi(3);

    (lambda * 100.0 / 36.0, phi * 100.0 / 36.0)
}
