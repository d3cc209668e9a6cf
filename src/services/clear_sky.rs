/// ============================================================
///  Offline Climatological Irradiance Model
///
///  Used by simulation mode in place of the satellite service.
///  Algorithm pipeline, evaluated hourly over a reference year:
///   1. Solar geometry  – declination (Spencer 1971), hour angle,
///                        elevation angle in local solar time
///   2. Extraterrestrial irradiance – eccentricity-corrected solar constant
///   3. Clear-sky model  – Bird & Hulstrom simplified:
///                         DNI, DHI, GHI on horizontal plane
///   4. Climatological clearness – latitude band × season
///   5. Integration      – hourly GHI summed into monthly kWh/m²
/// ============================================================

use std::f64::consts::PI;

// ─── Physical constants ──────────────────────────────────────
const SC: f64 = 1361.0; // Solar constant W/m²
const DEG: f64 = PI / 180.0;

/// Days per month of the (non-leap) reference year.
pub const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Solar elevation (rad) for a day of year and local solar hour.
pub fn solar_elevation(lat_deg: f64, doy: f64, solar_hour: f64) -> f64 {
    let b = day_angle(doy);
    // Declination (Spencer 1971, radians)
    let decl = 0.006918 - 0.399912 * b.cos() + 0.070257 * b.sin()
        - 0.006758 * (2.0 * b).cos()
        + 0.000907 * (2.0 * b).sin()
        - 0.002697 * (3.0 * b).cos()
        + 0.00148 * (3.0 * b).sin();

    // Hour angle: negative in the morning
    let omega = 15.0 * (solar_hour - 12.0) * DEG;
    let lat = lat_deg * DEG;
    let sin_alpha = lat.sin() * decl.sin() + lat.cos() * decl.cos() * omega.cos();
    sin_alpha.clamp(-1.0, 1.0).asin()
}

/// Eccentricity-corrected extraterrestrial irradiance (W/m²).
pub fn extraterrestrial(doy: f64) -> f64 {
    let b = day_angle(doy);
    SC * (1.00011
        + 0.034221 * b.cos()
        + 0.00128 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin())
}

/// Clear-sky global horizontal irradiance (W/m²) for a solar elevation.
pub fn clear_sky_ghi(alpha_rad: f64, doy: f64) -> f64 {
    let alpha_deg = alpha_rad / DEG;
    if alpha_deg <= 0.1 {
        return 0.0;
    }
    let sin_alpha = alpha_rad.sin();
    let e0 = extraterrestrial(doy);

    // Air mass – Kasten & Young (1989)
    let am = (1.0 / (sin_alpha + 0.50572 * (alpha_deg + 6.07995_f64).powf(-1.6364))).max(1.0);

    // Rayleigh
    let tr = (-0.0903 * am.powf(0.84) * (1.0 + am - am.powf(1.01))).exp();
    // Ozone (standard column 0.3 atm-cm)
    let to = 1.0 - 0.0013 * am;
    // Aerosol (Linke turbidity 3.0 – typical continental)
    let tk = 3.0_f64;
    let ta = (-0.09 * tk.powf(0.978) * am.powf(0.9455)).exp();
    // Water vapour (moderate precipitable water 1.5 cm)
    let tw = 1.0 - 0.0075 * am.powf(0.65);

    let total_t = tr * to * ta * tw;
    let dni = 0.9762 * e0 * total_t;
    let dhi = 0.79 * e0 * sin_alpha * (1.0 - total_t) * (0.5 * (1.0 - tr) + ba_scatter_coeff(ta))
        / (1.0 - am + am.powf(1.02));
    (dni * sin_alpha + dhi).max(0.0)
}

// ─── Helper: back-scatter term for Bird diffuse ──────────────
#[inline]
fn ba_scatter_coeff(ta: f64) -> f64 {
    // Approximated from Bird (1981) Table 2
    0.5 * (0.92 - ta.ln().abs() / 10.0).clamp(0.2, 0.5)
}

#[inline]
fn day_angle(doy: f64) -> f64 {
    2.0 * PI * (doy - 1.0) / 365.0
}

/// Long-term fraction of clear-sky GHI reaching the ground, by latitude band
/// and season. Northern summer is clearest; the southern hemisphere is phase
/// shifted by half a year.
pub fn clearness_index(lat_deg: f64, doy: f64) -> f64 {
    let season_phase = if lat_deg >= 0.0 {
        (2.0 * PI * (doy - 180.0) / 365.0).cos()
    } else {
        (2.0 * PI * (doy - 365.0) / 365.0).cos()
    };

    let abs_lat = lat_deg.abs();
    if abs_lat < 15.0 {
        // Tropical band: consistently cloudy/humid
        0.55 + 0.05 * season_phase
    } else if abs_lat < 35.0 {
        // Subtropical
        0.70 + 0.10 * season_phase
    } else if abs_lat < 55.0 {
        // Mid-latitude temperate
        0.62 + 0.12 * season_phase
    } else if abs_lat < 65.0 {
        0.52 + 0.10 * season_phase
    } else {
        0.45 + 0.10 * season_phase
    }
}

/// Monthly horizontal irradiation (kWh/m²), January first.
pub fn monthly_horizontal_irradiation(lat_deg: f64) -> [f64; 12] {
    let mut monthly = [0.0; 12];
    let mut doy = 1.0;
    for (month, days) in DAYS_IN_MONTH.iter().enumerate() {
        let mut wh = 0.0;
        for _ in 0..*days {
            let kt = clearness_index(lat_deg, doy);
            for hour in 0..24 {
                let alpha = solar_elevation(lat_deg, doy, hour as f64 + 0.5);
                wh += clear_sky_ghi(alpha, doy) * kt;
            }
            doy += 1.0;
        }
        monthly[month] = wh / 1000.0;
    }
    monthly
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swiss_plateau_annual_total() {
        let m = monthly_horizontal_irradiation(47.0);
        let annual: f64 = m.iter().sum();
        assert!(annual > 1000.0 && annual < 1200.0, "annual {annual:.0} kWh/m²");
        // June beats December by a wide margin
        assert!(m[5] > 5.0 * m[11]);
    }

    #[test]
    fn lower_latitudes_receive_more() {
        let south: f64 = monthly_horizontal_irradiation(46.0).iter().sum();
        let north: f64 = monthly_horizontal_irradiation(60.0).iter().sum();
        assert!(south > north);
    }

    #[test]
    fn night_is_dark() {
        let alpha = solar_elevation(47.0, 172.0, 0.5);
        assert!(alpha < 0.0);
        assert_eq!(clear_sky_ghi(alpha, 172.0), 0.0);
    }

    #[test]
    fn summer_noon_elevation() {
        let alpha = solar_elevation(47.0, 172.0, 12.0) / DEG;
        assert!(alpha > 65.0 && alpha < 67.5, "elevation {alpha:.1}°");
    }
}
