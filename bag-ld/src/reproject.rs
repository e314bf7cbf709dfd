//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

use proj::Proj;
use vectordata::{Coord, Geometry};

use crate::crs::CrsCode;
use crate::error::CrsError;

/// Reprojection entre deux systèmes de coordonnées quelconques
pub struct Reprojector {
    proj: Proj,
    source: CrsCode,
    target: CrsCode,
}

impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source: CrsCode, target: CrsCode) -> Result<Self, CrsError> {
        for code in [source, target] {
            Proj::new(&code.srs_name()).map_err(|_| CrsError::UnknownCrs(code.to_string()))?;
        }

        let proj = Proj::new_known_crs(&source.srs_name(), &target.srs_name(), None).map_err(
            |_| CrsError::TransformUnavailable {
                from: source.to_string(),
                to: target.to_string(),
            },
        )?;

        Ok(Self {
            proj,
            source,
            target,
        })
    }

    pub fn source(&self) -> CrsCode {
        self.source
    }

    pub fn target(&self) -> CrsCode {
        self.target
    }

    /// Transforme une géométrie (l'altitude est recopiée)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, CrsError> {
        geom.try_map_coords(|c| self.transform_coord(c))
    }

    fn transform_coord(&self, c: Coord) -> Result<Coord, CrsError> {
        let (x, y) = self
            .proj
            .convert((c.x, c.y))
            .map_err(|e| CrsError::TransformFailed(e.to_string()))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(CrsError::TransformFailed(format!(
                "({}, {}) has no finite image in {}",
                c.x, c.y, self.target
            )));
        }
        Ok(Coord { x, y, z: c.z })
    }
}
