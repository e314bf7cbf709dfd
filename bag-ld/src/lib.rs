//! # bag-ld
//!
//! Conversion des bâtiments (panden) de la BAG en Linked Data GeoSPARQL.
//!
//! ## Features
//!
//! - Lecture en flux du GML (ou GeoJSON) via le crate `vectordata`
//! - Deux blocs par pand: RD New (EPSG:28992) puis WGS84 (EPSG:4326)
//! - Littéraux `geo:asGML` et `geo:asWKT` pour chaque bloc
//! - Reprojection en Rust pur, PROJ en option (feature `reproject`)
//! - Arrêt à la première erreur, sans reprise ni saut de feature
//!
//! ## Usage CLI
//!
//! ```bash
//! # Conversion vers un fichier Turtle
//! gml2wkt bag-panden.gml panden.ttl
//!
//! # Vers la sortie standard
//! gml2wkt bag-panden.gml -
//!
//! # Formats lisibles
//! drivers -p
//! ```

pub mod cli;
pub mod config;
pub mod crs;
pub mod encode;
pub mod error;
pub mod escape;
pub mod identifier;
pub mod pipeline;
pub mod report;
#[cfg(feature = "reproject")]
pub mod reproject;
pub mod reproject_lite;
pub mod sink;

pub use config::Config;
pub use crs::CrsCode;
pub use encode::GeometryEncoder;
pub use error::{ConvertError, CrsError, GeometryError, IoError, SchemaError};
pub use escape::escape;
pub use identifier::{resolve_field, resolve_id};
pub use pipeline::{convert, Pipeline, State};
pub use report::ConversionReport;
pub use reproject_lite::Transformation;
pub use sink::OutputSink;
