//! Projection Web Mercator (EPSG:3857)

use super::ellipsoid::WGS84;
use super::Geographic;

/// Latitude limite de la projection
const MAX_LAT_DEG: f64 = 85.06;

/// Convertit coordonnées géographiques WGS84 vers Web Mercator
pub fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    // Modèle sphérique de rayon équatorial
    let r = WGS84::A;
    let lat = geo
        .lat
        .clamp(-MAX_LAT_DEG.to_radians(), MAX_LAT_DEG.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amersfoort_to_web_mercator() {
        let geo = Geographic::from_degrees(5.387203508863084, 52.15517229965293);
        let (x, y) = geographic_to_web_mercator(geo);
        assert!((x - 599700.7514).abs() < 0.01, "x={}", x);
        assert!((y - 6828231.3724).abs() < 0.01, "y={}", y);
    }

    #[test]
    fn test_latitude_clamped() {
        let (_, y) = geographic_to_web_mercator(Geographic::from_degrees(0.0, 89.9));
        assert!(y.is_finite());
    }
}
