//! Destination du document: fichier ou sortie standard

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::IoError;

/// Chemin désignant la sortie standard
pub const STDOUT_PATH: &str = "-";

/// Flux d'octets en ajout seul
#[derive(Debug)]
pub enum OutputSink {
    File { path: PathBuf, writer: BufWriter<File> },
    Stdout(BufWriter<Stdout>),
}

impl OutputSink {
    /// Crée (ou tronque) le fichier de sortie; `-` désigne la sortie standard
    pub fn create(path: &Path) -> Result<Self, IoError> {
        if path.as_os_str() == STDOUT_PATH {
            return Ok(Self::stdout());
        }
        let file = File::create(path).map_err(|e| IoError::open_failed(path.display().to_string(), e))?;
        debug!(path = %path.display(), "Output file created");
        Ok(Self::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn stdout() -> Self {
        Self::Stdout(BufWriter::new(io::stdout()))
    }

    /// Description de la destination pour les logs
    pub fn describe(&self) -> String {
        match self {
            Self::File { path, .. } => path.display().to_string(),
            Self::Stdout(_) => "<stdout>".to_string(),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::File { writer, .. } => writer.write(buf),
            Self::Stdout(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File { writer, .. } => writer.flush(),
            Self::Stdout(writer) => writer.flush(),
        }
    }
}
