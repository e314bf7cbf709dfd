//! Transformation source → cible : reproject_lite en priorité, fallback sur proj
//!
//! Construite une fois par conversion, appliquée à chaque géométrie.

use tracing::debug;
use vectordata::Geometry;

use super::ReprojectorLite;
use crate::crs::CrsCode;
use crate::error::CrsError;

/// Transformation entre deux CRS
pub enum Transformation {
    /// Pas de reprojection (source == cible)
    Identity,
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::reproject::Reprojector),
}

impl Transformation {
    /// Construit la transformation entre deux codes
    pub fn build(source: CrsCode, target: CrsCode) -> Result<Self, CrsError> {
        let transformation = Self::select(source, target)?;
        debug!(
            source = %source,
            target = %target,
            method = transformation.description(),
            "Transformation built"
        );
        Ok(transformation)
    }

    fn select(source: CrsCode, target: CrsCode) -> Result<Self, CrsError> {
        if source == target {
            return Ok(Self::Identity);
        }

        if ReprojectorLite::is_supported(source, target) {
            return Ok(Self::Lite(ReprojectorLite::new(source, target)?));
        }

        #[cfg(feature = "reproject")]
        {
            let proj = crate::reproject::Reprojector::new(source, target)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        {
            for code in [source, target] {
                if !ReprojectorLite::is_known(code) {
                    return Err(CrsError::UnknownCrs(code.to_string()));
                }
            }
            return Err(CrsError::TransformUnavailable {
                from: source.to_string(),
                to: target.to_string(),
            });
        }
    }

    /// Applique la transformation et retourne une nouvelle géométrie
    pub fn apply(&self, geom: &Geometry) -> Result<Geometry, CrsError> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Retourne une description de la méthode utilisée
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}
