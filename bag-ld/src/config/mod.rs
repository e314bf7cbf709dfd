//! Configuration de la conversion

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::crs::CrsCode;

/// Variable d'environnement désignant un fichier de configuration JSON
pub const CONFIG_ENV: &str = "BAG_LD_CONFIG";

/// Variable d'environnement désignant le fichier du rapport JSON
pub const REPORT_ENV: &str = "BAG_LD_REPORT";

/// Configuration principale
///
/// Le CRS cible est le CRS ambiant: son WKT n'est pas préfixé par son URI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// CRS natif du jeu de données
    pub source: CrsCode,

    /// CRS de la seconde représentation
    pub target: CrsCode,

    /// Champ portant l'identifiant du sujet
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Préfixe des sujets (`pand:<ID>`)
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// Déclarations de préfixes du prologue, dans l'ordre
    pub prefixes: Vec<Prefix>,

    /// Fichier où écrire le rapport JSON en fin de conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

/// Déclaration `prefix <name>: <iri>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Prefix {
    pub name: String,
    pub iri: String,
}

impl Prefix {
    pub fn new(name: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iri: iri.into(),
        }
    }
}

fn default_id_field() -> String {
    crate::identifier::PAND_ID_FIELD.to_string()
}

fn default_subject_prefix() -> String {
    "pand".to_string()
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "bag" => Self::load_embedded(include_str!("presets/bag.json")),
            _ => bail!("Unknown preset: {}. Use: bag", preset),
        }
    }

    /// Fichier désigné par `BAG_LD_CONFIG`, sinon le preset `bag`.
    /// `BAG_LD_REPORT` remplace le chemin du rapport.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path))?,
            _ => Self::from_preset("bag")?,
        };
        if let Some(path) = std::env::var_os(REPORT_ENV).filter(|p| !p.is_empty()) {
            config.report = Some(PathBuf::from(path));
        }
        Ok(config)
    }

    fn load_embedded(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse embedded config")?;
        config.validate()?;
        Ok(config)
    }

    /// Vérifie la cohérence de la configuration
    pub fn validate(&self) -> Result<()> {
        if self.id_field.is_empty() {
            bail!("id_field must not be empty");
        }
        for required in ["geo", "def", self.subject_prefix.as_str()] {
            if !self.prefixes.iter().any(|p| p.name == required) {
                bail!("Prefix '{}' is used but not declared", required);
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: CrsCode::RD_NEW,
            target: CrsCode::WGS84,
            id_field: default_id_field(),
            subject_prefix: default_subject_prefix(),
            prefixes: vec![
                Prefix::new("geo", "http://www.opengis.net/ont/geosparql#"),
                Prefix::new("def", "https://data.labs.pdok.nl/bag/def/"),
                Prefix::new("pand", "http://bag.basisregistraties.overheid.nl/bag/id/pand/"),
            ],
            report: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bag_preset() {
        let config = Config::from_preset("bag").unwrap();
        assert_eq!(config.source, CrsCode::RD_NEW);
        assert_eq!(config.target, CrsCode::WGS84);
        assert_eq!(config.id_field, "gml_id");
        assert_eq!(config.prefixes, Config::default().prefixes);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_preset() {
        assert!(Config::from_preset("brk").is_err());
    }

    #[test]
    fn test_embedded_config_is_validated() {
        let json = r#"{"source": "EPSG:28992", "target": "EPSG:4326",
            "prefixes": [{"name": "geo", "iri": "http://www.opengis.net/ont/geosparql#"}]}"#;
        let err = Config::load_embedded(json).unwrap_err();
        assert!(err.to_string().contains("not declared"), "{}", err);
    }

    #[test]
    fn test_report_path_from_json() {
        let mut json: serde_json::Value =
            serde_json::from_str(include_str!("presets/bag.json")).unwrap();
        assert!(Config::load_embedded(&json.to_string()).unwrap().report.is_none());

        json["report"] = serde_json::Value::from("/tmp/bag-ld-report.json");
        let config = Config::load_embedded(&json.to_string()).unwrap();
        assert_eq!(config.report, Some(PathBuf::from("/tmp/bag-ld-report.json")));
    }

    #[test]
    fn test_load_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
  "source": "urn:ogc:def:crs:EPSG::28992",
  "target": "EPSG:3857",
  "prefixes": [
    {{ "name": "geo", "iri": "http://www.opengis.net/ont/geosparql#" }},
    {{ "name": "def", "iri": "https://data.labs.pdok.nl/bag/def/" }},
    {{ "name": "pand", "iri": "http://bag.basisregistraties.overheid.nl/bag/id/pand/" }}
  ]
}}"#
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.target, CrsCode::WEB_MERCATOR);
        assert_eq!(config.subject_prefix, "pand");
        assert_eq!(config.id_field, "gml_id");
    }

    #[test]
    fn test_undeclared_subject_prefix() {
        let config = Config {
            subject_prefix: "vbo".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_crs_rejected() {
        let json = r#"{"source": "RD", "target": "EPSG:4326", "prefixes": []}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }
}
