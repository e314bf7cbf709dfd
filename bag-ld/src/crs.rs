//! Codes de systèmes de référence

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrsError;

/// Préfixe des URI de CRS EPSG (registre OGC)
pub const EPSG_URI_BASE: &str = "http://www.opengis.net/def/crs/EPSG/0/";

/// Code EPSG d'un système de référence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CrsCode(u32);

impl CrsCode {
    /// Amersfoort / RD New
    pub const RD_NEW: CrsCode = CrsCode(28992);
    /// WGS84 géographique
    pub const WGS84: CrsCode = CrsCode(4326);
    /// WGS84 / Pseudo-Mercator
    pub const WEB_MERCATOR: CrsCode = CrsCode(3857);

    pub const fn new(epsg: u32) -> Self {
        Self(epsg)
    }

    pub fn epsg(&self) -> u32 {
        self.0
    }

    /// URI OGC, ex: `http://www.opengis.net/def/crs/EPSG/0/28992`
    pub fn uri(&self) -> String {
        format!("{}{}", EPSG_URI_BASE, self.0)
    }

    /// Valeur de `srsName` pour le GML, ex: `EPSG:28992`
    pub fn srs_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for CrsCode {
    type Err = CrsError;

    /// Accepte un code nu (`28992`) ou toute forme reconnue par `vectordata::srs`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return Ok(Self(code));
        }
        vectordata::srs::parse_epsg(s)
            .map(Self)
            .ok_or_else(|| CrsError::UnknownCrs(s.to_string()))
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}
