//! Jeu de données ouvert et sa couche unique

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::driver::geojson::GeoJsonSource;
use crate::driver::gml::GmlSource;
use crate::srs::parse_epsg;
use crate::types::{Feature, FieldSchema};
use crate::VectorError;

/// Jeu de données vectoriel ouvert
///
/// Le handle est libéré exactement une fois: par `close()` ou au drop.
pub struct Dataset {
    path: PathBuf,
    driver: &'static str,
    layer: Layer,
}

impl Dataset {
    pub(crate) fn new(path: &Path, driver: &'static str, layer: Layer) -> Self {
        Self {
            path: path.to_path_buf(),
            driver,
            layer,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Nom court du driver qui a ouvert le fichier
    pub fn driver_name(&self) -> &'static str {
        self.driver
    }

    pub fn layer_count(&self) -> usize {
        1
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }

    /// Ferme explicitement le jeu de données
    pub fn close(self) {}
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("driver", &self.driver)
            .field("layer", &self.layer)
            .finish()
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), driver = self.driver, "Dataset closed");
    }
}

/// Source de features propre à chaque driver
pub(crate) enum FeatureSource {
    Gml(GmlSource),
    GeoJson(GeoJsonSource),
}

/// Couche: schéma figé + curseur de lecture en flux
pub struct Layer {
    name: String,
    schema: FieldSchema,
    srs_name: Option<String>,
    source: FeatureSource,
    next_fid: u64,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("srs_name", &self.srs_name)
            .field("next_fid", &self.next_fid)
            .finish_non_exhaustive()
    }
}

impl Layer {
    pub(crate) fn new(
        name: String,
        schema: FieldSchema,
        srs_name: Option<String>,
        source: FeatureSource,
    ) -> Self {
        Self {
            name,
            schema,
            srs_name,
            source,
            next_fid: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schéma attributaire (identique pour toutes les features)
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// SRS déclaré par le fichier, tel qu'écrit
    pub fn srs_name(&self) -> Option<&str> {
        self.srs_name.as_deref()
    }

    /// Code EPSG du SRS déclaré
    pub fn epsg(&self) -> Option<u32> {
        self.srs_name.as_deref().and_then(parse_epsg)
    }

    /// Lit la feature suivante, dans l'ordre du fichier
    pub fn next_feature(&mut self) -> Result<Option<Feature>, VectorError> {
        let fid = self.next_fid;
        let feature = match &mut self.source {
            FeatureSource::Gml(source) => source.next_feature(&self.schema, fid)?,
            FeatureSource::GeoJson(source) => source.next_feature(&self.schema, fid)?,
        };
        if feature.is_some() {
            self.next_fid += 1;
        }
        Ok(feature)
    }

    /// Replace le curseur avant la première feature
    pub fn reset_reading(&mut self) -> Result<(), VectorError> {
        match &mut self.source {
            FeatureSource::Gml(source) => source.reset()?,
            FeatureSource::GeoJson(source) => source.reset(),
        }
        self.next_fid = 0;
        Ok(())
    }

    /// Itérateur sur les features restantes
    pub fn features(&mut self) -> Features<'_> {
        Features { layer: self }
    }
}

/// Itérateur de features (s'arrête après la première erreur)
pub struct Features<'a> {
    layer: &'a mut Layer,
}

impl Iterator for Features<'_> {
    type Item = Result<Feature, VectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.layer.next_feature().transpose()
    }
}
