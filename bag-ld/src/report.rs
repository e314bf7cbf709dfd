//! Rapport de conversion
//!
//! Collecte les compteurs d'une conversion pour le log de fin et l'export JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

/// Statut global de la conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionStatus {
    /// Conversion en cours
    Running,
    /// Toutes les features ont été écrites
    Success,
    /// Conversion interrompue: la sortie est partielle
    Aborted,
}

/// Rapport d'une conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Fichier d'entrée
    pub input: String,
    /// Destination
    pub output: String,
    /// Driver ayant ouvert l'entrée
    pub driver: Option<String>,
    /// Couche lue
    pub layer: Option<String>,
    /// CRS source
    pub source_crs: String,
    /// CRS cible
    pub target_crs: String,
    /// Statut global
    pub status: ConversionStatus,
    /// Nombre de features converties
    pub features: usize,
    /// Nombre de blocs écrits (deux par feature)
    pub blocks: usize,
    /// Octets écrits
    pub bytes_written: usize,
    /// Durée de la conversion
    pub duration_secs: f64,
    /// Message de l'erreur ayant interrompu la conversion
    pub error: Option<String>,
}

impl ConversionReport {
    pub fn new(input: &str, output: &str, source_crs: &str, target_crs: &str) -> Self {
        Self {
            input: input.to_string(),
            output: output.to_string(),
            driver: None,
            layer: None,
            source_crs: source_crs.to_string(),
            target_crs: target_crs.to_string(),
            status: ConversionStatus::Running,
            features: 0,
            blocks: 0,
            bytes_written: 0,
            duration_secs: 0.0,
            error: None,
        }
    }

    /// Enregistre la source ouverte
    pub fn record_open(&mut self, driver: &str, layer: &str) {
        self.driver = Some(driver.to_string());
        self.layer = Some(layer.to_string());
    }

    /// Enregistre un bloc écrit
    pub fn record_block(&mut self, bytes: usize) {
        self.blocks += 1;
        self.bytes_written += bytes;
    }

    /// Enregistre une feature complète (ses deux blocs)
    pub fn record_feature(&mut self) {
        self.features += 1;
    }

    pub fn record_bytes(&mut self, bytes: usize) {
        self.bytes_written += bytes;
    }

    /// Définit la durée de la conversion
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    pub fn finish(&mut self) {
        self.status = ConversionStatus::Success;
    }

    pub fn abort(&mut self, message: impl Into<String>) {
        self.status = ConversionStatus::Aborted;
        self.error = Some(message.into());
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} features, {} blocks, {} bytes in {:.2}s ({:?})",
            self.input,
            self.features,
            self.blocks,
            self.bytes_written,
            self.duration_secs,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counters() {
        let mut report = ConversionReport::new("bag.gml", "bag.ttl", "EPSG:28992", "EPSG:4326");
        report.record_open("GML", "pand");
        report.record_block(100);
        report.record_block(120);
        report.record_feature();
        report.finish();

        assert_eq!(report.features, 1);
        assert_eq!(report.blocks, 2);
        assert_eq!(report.bytes_written, 220);
        assert_eq!(report.status, ConversionStatus::Success);
    }

    #[test]
    fn test_abort_keeps_message() {
        let mut report = ConversionReport::new("bag.gml", "-", "EPSG:28992", "EPSG:4326");
        report.abort("Could not find field gml_id");
        assert_eq!(report.status, ConversionStatus::Aborted);
        assert!(report.summary().contains("Aborted"));
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = ConversionReport::new("bag.gml", "bag.ttl", "EPSG:28992", "EPSG:4326");
        report.save_to_file(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["status"], "Running");
        assert_eq!(json["source_crs"], "EPSG:28992");
    }
}
