//! WGS-84 helpers for placing the tileset root transform.

use glam::DVec3;

pub mod wgs84 {
    /// Semi-major axis (equatorial radius) in meters.
    pub const A: f64 = 6_378_137.0;

    /// Flattening factor (1 / 298.257223563).
    pub const F: f64 = 1.0 / 298.257_223_563;

    /// First eccentricity squared.
    pub const E2: f64 = F * (2.0 - F);
}

/// Geodetic lon/lat (degrees) + ellipsoidal height (meters) → ECEF meters.
pub fn geodetic_to_ecef(lon_deg: f64, lat_deg: f64, h_m: f64) -> DVec3 {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    // Radius of curvature in the prime vertical.
    let n = wgs84::A / (1.0 - wgs84::E2 * sin_lat * sin_lat).sqrt();

    DVec3::new(
        (n + h_m) * cos_lat * cos_lon,
        (n + h_m) * cos_lat * sin_lon,
        (n * (1.0 - wgs84::E2) + h_m) * sin_lat,
    )
}

/// WGS-84 lon/lat (degrees) → spherical Mercator meters (EPSG:3857).
pub fn wgs84_to_spherical_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let x = lon_deg.to_radians() * wgs84::A;
    let y = ((lat_deg.to_radians() * 0.5 + std::f64::consts::FRAC_PI_4).tan()).ln() * wgs84::A;
    (x, y)
}

/// ECEF srid used by sources that store geometry in earth-centered
/// coordinates; everything else is treated as planar.
pub const SRID_ECEF: i32 = 4978;

/// Translation applied to the tileset root: ECEF of the dataset center
/// for earth-centered sources, spherical-Mercator planar offset otherwise.
pub fn root_translation(center_lon: f64, center_lat: f64, srid: i32) -> DVec3 {
    if srid == SRID_ECEF {
        geodetic_to_ecef(center_lon, center_lat, 0.0)
    } else {
        let (x, y) = wgs84_to_spherical_mercator(center_lon, center_lat);
        DVec3::new(x, y, 0.0)
    }
}
