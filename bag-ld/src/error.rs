//! Types d'erreurs de la conversion
//!
//! Toutes les erreurs sont fatales: la conversion s'arrête à la première.

use thiserror::Error;
use vectordata::{FieldType, VectorError};

use crate::pipeline::State;

/// Erreurs d'entrée/sortie
#[derive(Debug, Error)]
pub enum IoError {
    /// Le fichier ne peut pas être ouvert (illisible ou format non reconnu)
    #[error("Opening {path} failed: {reason}")]
    OpenFailed { path: String, reason: String },

    /// Erreur de lecture d'une feature
    #[error("Read error: {0}")]
    Read(#[from] VectorError),

    /// Erreur d'écriture dans la sortie
    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),
}

impl IoError {
    pub fn open_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::OpenFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Erreurs de schéma attributaire
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Could not find field {0}")]
    FieldNotFound(String),

    #[error("Unexpected type {found} for field {name}, expected String")]
    UnexpectedFieldType { name: String, found: FieldType },
}

/// Erreurs de géométrie
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Feature {id} has no geometry")]
    NullGeometry { id: String },

    #[error("Could not encode geometry of feature {id} as {format}: {reason}")]
    EncodingFailed {
        id: String,
        format: &'static str,
        reason: String,
    },
}

/// Erreurs de système de coordonnées
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrsError {
    #[error("Unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("No transformation available from {from} to {to}")]
    TransformUnavailable { from: String, to: String },

    #[error("Transformation failed: {0}")]
    TransformFailed(String),
}

/// Erreur d'une conversion complète
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Crs(#[from] CrsError),

    /// Étape appelée hors de l'ordre Unopened → Open → Iterating
    #[error("Pipeline is {actual:?}, expected {expected:?}")]
    InvalidState { expected: State, actual: State },
}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Write(err))
    }
}

impl From<VectorError> for ConvertError {
    fn from(err: VectorError) -> Self {
        Self::Io(IoError::Read(err))
    }
}
