//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Source supportée :
//! - RD New (EPSG:28992) - Amersfoort, stéréographique oblique
//!
//! Cibles supportées :
//! - WGS84 (EPSG:4326), ordre longitude/latitude
//! - Web Mercator (EPSG:3857)
//!
//! L'altitude est recopiée sans changement.

mod ellipsoid;
mod helmert;
mod mercator;
mod smart;
mod stereographic;

pub use smart::Transformation;

use vectordata::{Coord, Geometry};

use crate::crs::CrsCode;
use crate::error::CrsError;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Reprojection légère RD New → WGS84 / Web Mercator
#[derive(Debug, Clone)]
pub struct ReprojectorLite {
    source: CrsCode,
    target: CrsCode,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source: CrsCode, target: CrsCode) -> Result<Self, CrsError> {
        if !Self::is_supported(source, target) {
            return Err(CrsError::TransformUnavailable {
                from: source.to_string(),
                to: target.to_string(),
            });
        }
        Ok(Self { source, target })
    }

    /// Codes connus de la reprojection légère
    pub fn is_known(code: CrsCode) -> bool {
        Self::is_supported_source(code) || Self::is_supported_target(code)
    }

    pub fn is_supported_source(code: CrsCode) -> bool {
        code == CrsCode::RD_NEW
    }

    pub fn is_supported_target(code: CrsCode) -> bool {
        code == CrsCode::WGS84 || code == CrsCode::WEB_MERCATOR
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: CrsCode, target: CrsCode) -> bool {
        Self::is_supported_source(source) && Self::is_supported_target(target)
    }

    pub fn source(&self) -> CrsCode {
        self.source
    }

    pub fn target(&self) -> CrsCode {
        self.target
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError> {
        // Étape 1: RD → géographique Amersfoort
        let bessel = stereographic::rd_to_geographic(x, y)?;

        // Étape 2: Amersfoort → WGS84
        let geo = helmert::amersfoort_to_wgs84(bessel);

        // Étape 3: géographique → cible
        let (tx, ty) = if self.target == CrsCode::WEB_MERCATOR {
            mercator::geographic_to_web_mercator(geo)
        } else {
            geo.to_degrees()
        };

        if !tx.is_finite() || !ty.is_finite() {
            return Err(CrsError::TransformFailed(format!(
                "({}, {}) has no finite image in {}",
                x, y, self.target
            )));
        }
        Ok((tx, ty))
    }

    fn transform_coord(&self, c: Coord) -> Result<Coord, CrsError> {
        let (x, y) = self.transform_point(c.x, c.y)?;
        Ok(Coord { x, y, z: c.z })
    }

    /// Transforme une géométrie (nouvelle valeur, même structure)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, CrsError> {
        geom.try_map_coords(|c| self.transform_coord(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vectordata::Polygon;

    #[test]
    fn test_rd_origin_to_wgs84() {
        let reproj = ReprojectorLite::new(CrsCode::RD_NEW, CrsCode::WGS84).unwrap();
        let (lon, lat) = reproj.transform_point(155000.0, 463000.0).unwrap();
        assert!((lon - 5.387203508863084).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 52.15517229965293).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_amsterdam_to_wgs84() {
        let reproj = ReprojectorLite::new(CrsCode::RD_NEW, CrsCode::WGS84).unwrap();
        let (lon, lat) = reproj.transform_point(121000.0, 487000.0).unwrap();
        assert!((lon - 4.8879707652683635).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 52.369826208306065).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_rd_to_web_mercator() {
        let reproj = ReprojectorLite::new(CrsCode::RD_NEW, CrsCode::WEB_MERCATOR).unwrap();
        let (x, y) = reproj.transform_point(155000.0, 463000.0).unwrap();
        assert!((x - 599700.7514).abs() < 0.01, "x={}", x);
        assert!((y - 6828231.3724).abs() < 0.01, "y={}", y);
    }

    #[test]
    fn test_polygon_keeps_z_and_structure() {
        let reproj = ReprojectorLite::new(CrsCode::RD_NEW, CrsCode::WGS84).unwrap();
        let ring = vec![
            Coord::xyz(155000.0, 463000.0, 1.5),
            Coord::xyz(155010.0, 463000.0, 1.5),
            Coord::xyz(155010.0, 463010.0, 1.5),
            Coord::xyz(155000.0, 463000.0, 1.5),
        ];
        let geom = Geometry::Polygon(Polygon::new(ring, vec![]));
        match reproj.transform_geometry(&geom).unwrap() {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior.len(), 4);
                assert!(p.exterior.iter().all(|c| c.z == Some(1.5)));
                assert_eq!(p.exterior[0], p.exterior[3]);
                assert!(p.exterior[1].x > p.exterior[0].x);
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_pair() {
        assert!(matches!(
            ReprojectorLite::new(CrsCode::WGS84, CrsCode::RD_NEW),
            Err(CrsError::TransformUnavailable { .. })
        ));
    }
}
