//! # vectordata
//!
//! Lecture de jeux de données vectoriels et encodage de leurs géométries.
//!
//! ## Features
//!
//! - Registre de drivers initialisé une fois par processus (GML, GeoJSON)
//! - Détection du format par extension ou par les premiers octets du fichier
//! - Lecture en flux des features, schéma attributaire figé à l'ouverture
//! - Géométries 2D/3D exposées à `geozero`, encodage WKT et GML 2
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! let mut dataset = vectordata::open(Path::new("bag.gml"))?;
//! let layer = dataset.layer_mut();
//! println!("{} ({:?})", layer.name(), layer.srs_name());
//!
//! for feature in layer.features() {
//!     let feature = feature?;
//!     if let Some(geom) = feature.geometry() {
//!         println!("{}", vectordata::encode::to_wkt(geom)?);
//!     }
//! }
//! ```

pub mod dataset;
pub mod driver;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod srs;
pub mod types;

pub use dataset::{Dataset, Features, Layer};
pub use driver::{register_all, Driver, DriverRegistry};
pub use error::VectorError;
pub use geometry::{Coord, Geometry, Polygon};
pub use types::{Feature, FieldDefn, FieldSchema, FieldType, FieldValue};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

/// Nombre d'octets lus pour identifier le format
const PROBE_SIZE: u64 = 1024;

/// Ouvre un jeu de données en lecture seule
///
/// Les drivers sont enregistrés au premier appel.
pub fn open(path: &Path) -> Result<Dataset, VectorError> {
    let registry = register_all();

    let mut head = Vec::with_capacity(PROBE_SIZE as usize);
    File::open(path)?.take(PROBE_SIZE).read_to_end(&mut head)?;

    let driver = registry
        .identify(path, &head)
        .ok_or_else(|| VectorError::UnrecognizedFormat(path.display().to_string()))?;
    debug!(path = %path.display(), driver = driver.short_name(), "Driver identified");

    let layer = driver.open(path)?;
    info!(
        path = %path.display(),
        driver = driver.short_name(),
        layer = layer.name(),
        "Dataset opened"
    );
    Ok(Dataset::new(path, driver.short_name(), layer))
}
