//! Projection stéréographique oblique (EPSG:9809), grille RD New (EPSG:28992)
//!
//! Méthode de double projection: ellipsoïde → sphère conforme → plan.

use std::f64::consts::FRAC_PI_4;

use super::ellipsoid::Bessel1841;
use super::Geographic;
use crate::error::CrsError;

/// Paramètres RD New (Amersfoort)
struct RdNew {
    /// Latitude d'origine (52°09'22.178"N)
    lat0: f64,
    /// Longitude d'origine (5°23'15.500"E)
    lon0: f64,
    /// Facteur d'échelle à l'origine
    k0: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
}

impl Default for RdNew {
    fn default() -> Self {
        Self {
            lat0: 52.156_160_555_555_55_f64.to_radians(),
            lon0: 5.387_638_888_888_89_f64.to_radians(),
            k0: 0.9999079,
            x0: 155000.0,
            y0: 463000.0,
        }
    }
}

/// Écart maximal (m) à l'origine de la grille accepté en entrée
pub const MAX_OFFSET: f64 = 1_000_000.0;

/// Constantes de la sphère conforme, dérivées des paramètres
struct ConformalSphere {
    /// Rayon de la sphère
    r: f64,
    n: f64,
    c: f64,
    /// Latitude conforme de l'origine
    chi0: f64,
}

impl ConformalSphere {
    fn new(params: &RdNew) -> Self {
        let e = Bessel1841::E;
        let e2 = Bessel1841::E2;
        let a = Bessel1841::A;
        let sin0 = params.lat0.sin();

        let rho0 = a * (1.0 - e2) / (1.0 - e2 * sin0 * sin0).powf(1.5);
        let nu0 = a / (1.0 - e2 * sin0 * sin0).sqrt();
        let r = (rho0 * nu0).sqrt();
        let n = (1.0 + e2 * params.lat0.cos().powi(4) / (1.0 - e2)).sqrt();

        let s1 = (1.0 + sin0) / (1.0 - sin0);
        let s2 = (1.0 - e * sin0) / (1.0 + e * sin0);
        let w1 = (s1 * s2.powf(e)).powf(n);
        let sin_chi0 = (w1 - 1.0) / (w1 + 1.0);
        let c = (n + sin0) * (1.0 - sin_chi0) / ((n - sin0) * (1.0 + sin_chi0));
        let w2 = c * w1;
        let chi0 = ((w2 - 1.0) / (w2 + 1.0)).asin();

        Self { r, n, c, chi0 }
    }
}

/// Latitude géodésique depuis la latitude isométrique (itératif)
fn latitude_from_isometric(psi: f64) -> f64 {
    let e = Bessel1841::E;
    let e2 = Bessel1841::E2;
    let mut lat = 2.0 * psi.exp().atan() - std::f64::consts::FRAC_PI_2;

    for _ in 0..20 {
        let sin_lat = lat.sin();
        let psi_i = ((lat / 2.0 + FRAC_PI_4).tan()
            * ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0))
        .ln();
        let new_lat =
            lat - (psi_i - psi) * lat.cos() * (1.0 - e2 * sin_lat * sin_lat) / (1.0 - e2);

        if (new_lat - lat).abs() < 1e-14 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}

/// Convertit RD New vers coordonnées géographiques sur Bessel 1841 (datum Amersfoort)
pub fn rd_to_geographic(x: f64, y: f64) -> Result<Geographic, CrsError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(CrsError::TransformFailed(format!(
            "non-finite RD coordinate ({}, {})",
            x, y
        )));
    }

    let params = RdNew::default();
    if (x - params.x0).abs() > MAX_OFFSET || (y - params.y0).abs() > MAX_OFFSET {
        return Err(CrsError::TransformFailed(format!(
            "RD coordinate ({}, {}) is outside the projection domain",
            x, y
        )));
    }
    let sphere = ConformalSphere::new(&params);
    let rk = sphere.r * params.k0;

    let dx = x - params.x0;
    let dy = y - params.y0;

    let g = 2.0 * rk * (FRAC_PI_4 - sphere.chi0 / 2.0).tan();
    let h = 4.0 * rk * sphere.chi0.tan() + g;
    let i = (dx / (h + dy)).atan();
    let j = (dx / (g - dy)).atan() - i;

    let chi = sphere.chi0 + 2.0 * ((dy - dx * (j / 2.0).tan()) / (2.0 * rk)).atan();
    let lambda = j + 2.0 * i + params.lon0;
    let lon = (lambda - params.lon0) / sphere.n + params.lon0;

    let sin_chi = chi.sin();
    let psi = 0.5 * ((1.0 + sin_chi) / (sphere.c * (1.0 - sin_chi))).ln() / sphere.n;
    let lat = latitude_from_isometric(psi);

    if !lat.is_finite() || !lon.is_finite() || lat.abs() > std::f64::consts::FRAC_PI_2 {
        return Err(CrsError::TransformFailed(format!(
            "RD coordinate ({}, {}) is outside the projection domain",
            x, y
        )));
    }

    Ok(Geographic::new(lon, lat))
}
