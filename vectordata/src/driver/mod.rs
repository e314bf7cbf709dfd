//! Registre des drivers de formats vectoriels
//!
//! L'enregistrement est fait une seule fois par processus (`register_all`),
//! à la manière du `GDALAllRegister` d'OGR, puis le registre est immuable.

pub mod geojson;
pub mod gml;

use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

use crate::dataset::Layer;
use crate::VectorError;

/// Un format vectoriel lisible
pub trait Driver: Send + Sync {
    /// Nom court (ex: `"GML"`)
    fn short_name(&self) -> &'static str;

    /// Nom descriptif
    fn long_name(&self) -> &'static str;

    /// Le driver reconnaît-il ce fichier ? (extension ou premiers octets)
    fn probe(&self, path: &Path, head: &[u8]) -> bool;

    /// Ouvre l'unique couche du fichier
    fn open(&self, path: &Path) -> Result<Layer, VectorError>;
}

/// Ensemble des drivers disponibles dans le processus
pub struct DriverRegistry {
    drivers: Vec<Box<dyn Driver>>,
}

impl DriverRegistry {
    fn builtin() -> Self {
        Self {
            drivers: vec![Box::new(gml::GmlDriver), Box::new(geojson::GeoJsonDriver)],
        }
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn drivers(&self) -> impl Iterator<Item = &dyn Driver> {
        self.drivers.iter().map(|d| d.as_ref())
    }

    /// Noms courts triés
    pub fn names_sorted(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.drivers.iter().map(|d| d.short_name()).collect();
        names.sort_unstable();
        names
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn Driver> {
        self.drivers()
            .find(|d| d.short_name().eq_ignore_ascii_case(name))
    }

    /// Premier driver qui reconnaît le fichier
    pub fn identify(&self, path: &Path, head: &[u8]) -> Option<&dyn Driver> {
        self.drivers().find(|d| d.probe(path, head))
    }
}

static REGISTRY: OnceLock<DriverRegistry> = OnceLock::new();

/// Enregistre les drivers intégrés (idempotent) et retourne le registre
pub fn register_all() -> &'static DriverRegistry {
    REGISTRY.get_or_init(|| {
        let registry = DriverRegistry::builtin();
        debug!(drivers = registry.len(), "Drivers registered");
        registry
    })
}

/// Le registre a-t-il déjà été initialisé ?
pub fn is_registered() -> bool {
    REGISTRY.get().is_some()
}

/// Vérifie l'extension d'un chemin (insensible à la casse)
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            extensions.iter().any(|e| ext.eq_ignore_ascii_case(e))
        })
}

/// Premiers octets significatifs (sans BOM ni espaces)
pub(crate) fn trim_head(head: &[u8]) -> &[u8] {
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    &head[start..]
}
