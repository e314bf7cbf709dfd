//! Écriture des blocs GeoSPARQL (Turtle)
//!
//! Un bloc par couple (feature, CRS):
//!
//! ```text
//! pand:<ID>
//!   geo:hasGeometry [
//!     def:crs <CRS-URI>;
//!     geo:asGML "<gml échappé>"^^geo:gmlLiteral;
//!     geo:asWKT "[<CRS-URI> ]<wkt>"^^geo:wktLiteral;
//!     geo:dimension 3 ].
//! ```

use std::fmt::Write as _;
use std::io::Write;

use tracing::trace;
use vectordata::encode::{to_gml, to_wkt};
use vectordata::Geometry;

use crate::config::Prefix;
use crate::crs::CrsCode;
use crate::error::{ConvertError, GeometryError, IoError};
use crate::escape::escape;

/// Encodeur de blocs pour un CRS ambiant donné
///
/// Le CRS ambiant est celui dont le WKT n'a pas besoin d'être préfixé par son URI.
#[derive(Debug, Clone)]
pub struct GeometryEncoder {
    subject_prefix: String,
    ambient: CrsCode,
}

impl GeometryEncoder {
    pub fn new(subject_prefix: impl Into<String>, ambient: CrsCode) -> Self {
        Self {
            subject_prefix: subject_prefix.into(),
            ambient,
        }
    }

    pub fn ambient(&self) -> CrsCode {
        self.ambient
    }

    /// Écrit les déclarations de préfixes suivies d'une ligne vide
    pub fn write_prologue<W: Write>(
        &self,
        sink: &mut W,
        prefixes: &[Prefix],
    ) -> Result<usize, IoError> {
        let mut out = String::new();
        for prefix in prefixes {
            let _ = writeln!(out, "prefix {}: <{}>", prefix.name, prefix.iri);
        }
        out.push('\n');
        sink.write_all(out.as_bytes())?;
        Ok(out.len())
    }

    /// Écrit le bloc d'une géométrie exprimée dans `crs`
    ///
    /// Les deux encodages sont produits avant toute écriture: en cas d'échec
    /// rien n'est écrit pour ce bloc. Retourne le nombre d'octets écrits.
    pub fn encode<W: Write>(
        &self,
        sink: &mut W,
        id: &str,
        geometry: Option<&Geometry>,
        crs: &CrsCode,
    ) -> Result<usize, ConvertError> {
        let block = self.render(id, geometry, crs)?;
        sink.write_all(block.as_bytes()).map_err(IoError::Write)?;
        trace!(id, crs = %crs, bytes = block.len(), "Block written");
        Ok(block.len())
    }

    /// Construit le texte d'un bloc sans l'écrire
    pub fn render(
        &self,
        id: &str,
        geometry: Option<&Geometry>,
        crs: &CrsCode,
    ) -> Result<String, GeometryError> {
        let geometry = geometry.ok_or_else(|| GeometryError::NullGeometry { id: id.to_string() })?;

        let srs_name = crs.srs_name();
        let gml = to_gml(geometry, Some(&srs_name)).map_err(|e| GeometryError::EncodingFailed {
            id: id.to_string(),
            format: "GML",
            reason: e.to_string(),
        })?;
        let wkt = to_wkt(geometry).map_err(|e| GeometryError::EncodingFailed {
            id: id.to_string(),
            format: "WKT",
            reason: e.to_string(),
        })?;

        let uri = crs.uri();
        let mut block = String::with_capacity(gml.len() + wkt.len() + 2 * uri.len() + 160);
        let _ = writeln!(block, "{}:{}", self.subject_prefix, id);
        block.push_str("  geo:hasGeometry [\n");
        let _ = writeln!(block, "    def:crs <{}>;", uri);
        let _ = writeln!(block, "    geo:asGML \"{}\"^^geo:gmlLiteral;", escape(&gml));
        block.push_str("    geo:asWKT \"");
        if *crs != self.ambient {
            let _ = write!(block, "<{}> ", uri);
        }
        let _ = writeln!(block, "{}\"^^geo:wktLiteral;", wkt);
        block.push_str("    geo:dimension 3 ].\n");
        Ok(block)
    }
}
