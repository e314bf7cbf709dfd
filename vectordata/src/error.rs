//! Types d'erreurs pour le crate vectordata

use thiserror::Error;

/// Erreurs pouvant survenir lors de l'ouverture ou de la lecture d'un jeu de données
#[derive(Debug, Error)]
pub enum VectorError {
    /// Erreur d'I/O lors de la lecture du fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Aucun driver enregistré ne reconnaît le fichier
    #[error("Unrecognized vector format: {0}")]
    UnrecognizedFormat(String),

    /// Erreur de parsing d'un fichier
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// XML mal formé
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// GeoJSON mal formé
    #[error("GeoJSON error: {0}")]
    Json(#[from] geojson::Error),

    /// Géométrie invalide
    #[error("Invalid geometry for feature {fid}: {reason}")]
    InvalidGeometry { fid: u64, reason: String },

    /// Erreur d'encodage (WKT, GML)
    #[error("Encoding error: {0}")]
    Encoding(#[from] geozero::error::GeozeroError),
}

impl VectorError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(fid: u64, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            fid,
            reason: reason.into(),
        }
    }
}
