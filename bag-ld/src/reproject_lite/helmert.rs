//! Changement de datum Amersfoort → WGS84 par transformation de Helmert à 7 paramètres
//!
//! Convention "position vector" (EPSG:9606), rotations en secondes d'arc.

use super::ellipsoid::{Bessel1841, WGS84};
use super::Geographic;

/// Paramètres de Helmert Amersfoort → WGS84
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    rx: f64,
    ry: f64,
    rz: f64,
    /// Facteur d'échelle en ppm
    ds: f64,
}

const AMERSFOORT_TO_WGS84: Helmert = Helmert {
    tx: 565.417,
    ty: 50.3319,
    tz: 465.552,
    rx: -0.398957,
    ry: 0.343988,
    rz: -1.8774,
    ds: 4.0725,
};

const ARCSEC: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Coordonnées géographiques → géocentriques (hauteur ellipsoïdale nulle)
fn to_geocentric(geo: Geographic, a: f64, e2: f64) -> (f64, f64, f64) {
    let sin_lat = geo.lat.sin();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    (
        n * geo.lat.cos() * geo.lon.cos(),
        n * geo.lat.cos() * geo.lon.sin(),
        n * (1.0 - e2) * sin_lat,
    )
}

/// Coordonnées géocentriques → géographiques (itératif)
fn from_geocentric(x: f64, y: f64, z: f64, a: f64, e2: f64) -> Geographic {
    let p = x.hypot(y);
    let lon = y.atan2(x);
    let mut lat = z.atan2(p * (1.0 - e2));

    for _ in 0..20 {
        let sin_lat = lat.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h = p / lat.cos() - n;
        let new_lat = z.atan2(p * (1.0 - e2 * n / (n + h)));
        if (new_lat - lat).abs() < 1e-14 {
            lat = new_lat;
            break;
        }
        lat = new_lat;
    }
    Geographic::new(lon, lat)
}

/// Convertit des coordonnées géographiques Amersfoort (Bessel) en WGS84
pub fn amersfoort_to_wgs84(geo: Geographic) -> Geographic {
    let t = &AMERSFOORT_TO_WGS84;
    let (x, y, z) = to_geocentric(geo, Bessel1841::A, Bessel1841::E2);

    let (rx, ry, rz) = (t.rx * ARCSEC, t.ry * ARCSEC, t.rz * ARCSEC);
    let scale = 1.0 + t.ds * 1e-6;

    let xw = t.tx + scale * (x - rz * y + ry * z);
    let yw = t.ty + scale * (rz * x + y - rx * z);
    let zw = t.tz + scale * (-ry * x + rx * y + z);

    from_geocentric(xw, yw, zw, WGS84::A, WGS84::E2)
}
