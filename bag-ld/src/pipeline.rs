//! Pipeline de conversion
//!
//! ```text
//! Unopened ──open──▶ Open ──run──▶ Iterating ──▶ Closed
//!     │               │              │
//!     └───────────────┴──────────────┴──▶ Aborted
//! ```
//!
//! La première erreur interrompt la conversion: le jeu de données est libéré,
//! ce qui a déjà été écrit dans la sortie reste en place.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};
use vectordata::Dataset;

use crate::config::Config;
use crate::encode::GeometryEncoder;
use crate::error::{ConvertError, IoError};
use crate::identifier::resolve_field;
use crate::report::ConversionReport;
use crate::reproject_lite::Transformation;
use crate::sink::OutputSink;

/// État du pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unopened,
    Open,
    Iterating,
    Closed,
    Aborted,
}

/// Conversion d'un jeu de données en document GeoSPARQL
pub struct Pipeline {
    config: Config,
    encoder: GeometryEncoder,
    state: State,
    dataset: Option<Dataset>,
    report: ConversionReport,
    started: Instant,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let encoder = GeometryEncoder::new(config.subject_prefix.clone(), config.target);
        let report = ConversionReport::new(
            "",
            "",
            &config.source.to_string(),
            &config.target.to_string(),
        );
        Self {
            config,
            encoder,
            state: State::Unopened,
            dataset: None,
            report,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    pub fn into_report(self) -> ConversionReport {
        self.report
    }

    fn expect_state(&self, expected: State) -> Result<(), ConvertError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ConvertError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Passe en Aborted et libère le jeu de données
    fn abort(&mut self, err: ConvertError) -> ConvertError {
        if let Some(dataset) = self.dataset.take() {
            dataset.close();
        }
        self.state = State::Aborted;
        self.report.set_duration(self.started.elapsed());
        self.report.abort(err.to_string());
        warn!(error = %err, features = self.report.features, "Conversion aborted");
        err
    }

    /// Unopened → Open: ouvre le jeu de données
    pub fn open(&mut self, input: &Path) -> Result<(), ConvertError> {
        self.expect_state(State::Unopened)?;
        self.started = Instant::now();
        self.report.input = input.display().to_string();

        let dataset = match vectordata::open(input) {
            Ok(dataset) => dataset,
            Err(e) => {
                let err = IoError::open_failed(input.display().to_string(), e).into();
                return Err(self.abort(err));
            }
        };

        let layer = dataset.layer();
        match layer.epsg() {
            Some(epsg) if epsg != self.config.source.epsg() => warn!(
                layer = layer.name(),
                declared = layer.srs_name().unwrap_or_default(),
                configured = %self.config.source,
                "Declared SRS differs from the configured source CRS, coordinates are read as-is"
            ),
            Some(_) => {}
            None => debug!(
                layer = layer.name(),
                source = %self.config.source,
                "No declared SRS, assuming the configured source CRS"
            ),
        }
        self.report.record_open(dataset.driver_name(), layer.name());
        info!(
            input = %input.display(),
            driver = dataset.driver_name(),
            layer = layer.name(),
            "Dataset open"
        );

        self.dataset = Some(dataset);
        self.state = State::Open;
        Ok(())
    }

    /// Open → Iterating → Closed: écrit le document complet dans `sink`
    pub fn run<W: Write>(&mut self, sink: &mut W) -> Result<(), ConvertError> {
        self.expect_state(State::Open)?;
        match self.write_document(sink) {
            Ok(()) => {
                if let Some(dataset) = self.dataset.take() {
                    dataset.close();
                }
                self.state = State::Closed;
                self.report.set_duration(self.started.elapsed());
                self.report.finish();
                info!(summary = %self.report.summary(), "Conversion done");
                Ok(())
            }
            Err(err) => Err(self.abort(err)),
        }
    }

    fn write_document<W: Write>(&mut self, sink: &mut W) -> Result<(), ConvertError> {
        let bytes = self.encoder.write_prologue(sink, &self.config.prefixes)?;
        self.report.record_bytes(bytes);

        let Some(dataset) = self.dataset.as_mut() else {
            return Err(ConvertError::InvalidState {
                expected: State::Open,
                actual: self.state,
            });
        };
        let layer = dataset.layer_mut();
        layer.reset_reading()?;
        let transformation = Transformation::build(self.config.source, self.config.target)?;
        self.state = State::Iterating;
        debug!(method = transformation.description(), "Iterating features");

        let (source, target) = (self.config.source, self.config.target);
        while let Some(feature) = layer.next_feature()? {
            let id = resolve_field(layer.schema(), &feature, &self.config.id_field)?;
            debug!(fid = feature.fid, id = id.as_str(), "Converting feature");

            let bytes = self.encoder.encode(sink, &id, feature.geometry(), &source)?;
            self.report.record_block(bytes);

            let transformed = feature
                .geometry()
                .map(|g| transformation.apply(g))
                .transpose()?;
            let bytes = self.encoder.encode(sink, &id, transformed.as_ref(), &target)?;
            self.report.record_block(bytes);
            self.report.record_feature();
        }

        sink.flush().map_err(IoError::Write)?;
        Ok(())
    }
}

/// Convertit `input` vers `output` (`-` pour la sortie standard)
///
/// L'entrée est ouverte avant la création du fichier de sortie: une entrée
/// illisible ne laisse aucun fichier de sortie.
///
/// Si `config.report` est défini, le rapport JSON y est écrit, que la
/// conversion aboutisse ou non.
pub fn convert(input: &Path, output: &Path, config: &Config) -> Result<ConversionReport, ConvertError> {
    let mut pipeline = Pipeline::new(config.clone());
    let result = convert_with(&mut pipeline, input, output);

    if let Some(path) = &config.report {
        match pipeline.report().save_to_file(path) {
            Ok(()) => debug!(path = %path.display(), "Report saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to save report"),
        }
    }

    result.map(|()| pipeline.into_report())
}

fn convert_with(pipeline: &mut Pipeline, input: &Path, output: &Path) -> Result<(), ConvertError> {
    pipeline.open(input)?;

    let mut sink = match OutputSink::create(output) {
        Ok(sink) => sink,
        Err(e) => return Err(pipeline.abort(e.into())),
    };
    pipeline.report.output = sink.describe();

    pipeline.run(&mut sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrsError;

    const ONE_POINT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:bag="http://bag.basisregistraties.overheid.nl/bag">
  <wfs:member>
    <bag:pand gml:id="0001">
      <bag:geometrie><gml:Point srsName="urn:ogc:def:crs:EPSG::28992"><gml:pos>155000 463000 0</gml:pos></gml:Point></bag:geometrie>
    </bag:pand>
  </wfs:member>
</wfs:FeatureCollection>
"#;

    fn fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".gml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_states_on_success() {
        let input = fixture(ONE_POINT);
        let mut pipeline = Pipeline::new(Config::default());
        assert_eq!(pipeline.state(), State::Unopened);

        pipeline.open(input.path()).unwrap();
        assert_eq!(pipeline.state(), State::Open);

        let mut out = Vec::new();
        pipeline.run(&mut out).unwrap();
        assert_eq!(pipeline.state(), State::Closed);
        assert_eq!(pipeline.report().features, 1);
        assert_eq!(pipeline.report().blocks, 2);
        assert_eq!(pipeline.report().bytes_written, out.len());
    }

    #[test]
    fn test_open_failure_aborts() {
        let mut pipeline = Pipeline::new(Config::default());
        let err = pipeline.open(Path::new("/nonexistent/bag.gml")).unwrap_err();
        assert!(matches!(err, ConvertError::Io(IoError::OpenFailed { .. })));
        assert_eq!(pipeline.state(), State::Aborted);
    }

    #[test]
    fn test_run_before_open() {
        let mut pipeline = Pipeline::new(Config::default());
        let err = pipeline.run(&mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidState {
                expected: State::Open,
                actual: State::Unopened
            }
        ));
    }

    #[test]
    fn test_missing_id_field_aborts_after_prologue() {
        let input = fixture(ONE_POINT);
        let config = Config {
            id_field: "identificatie".to_string(),
            ..Config::default()
        };
        let mut pipeline = Pipeline::new(config);
        pipeline.open(input.path()).unwrap();

        let mut out = Vec::new();
        let err = pipeline.run(&mut out).unwrap_err();
        assert!(matches!(err, ConvertError::Schema(_)));
        assert_eq!(pipeline.state(), State::Aborted);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("prefix geo:"));
        assert!(!text.contains("pand:0001"));
    }

    #[test]
    fn test_null_geometry_aborts() {
        let input = fixture(
            r#"<c xmlns:gml="http://www.opengis.net/gml"><gml:featureMember><pand gml:id="0001"><status>x</status></pand></gml:featureMember></c>"#,
        );
        let mut pipeline = Pipeline::new(Config::default());
        pipeline.open(input.path()).unwrap();
        let err = pipeline.run(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, ConvertError::Geometry(_)));
        assert_eq!(pipeline.report().features, 0);
    }

    #[test]
    fn test_transform_failure_aborts_after_source_block() {
        let input = fixture(
            r#"<c xmlns:gml="http://www.opengis.net/gml"><gml:featureMember><pand fid="0001"><g><gml:Point><gml:coordinates>155000,463000,0</gml:coordinates></gml:Point></g></pand></gml:featureMember>
<gml:featureMember><pand fid="0002"><g><gml:Point><gml:coordinates>155000,1000000000,0</gml:coordinates></gml:Point></g></pand></gml:featureMember>
<gml:featureMember><pand fid="0003"><g><gml:Point><gml:coordinates>155010,463000,0</gml:coordinates></gml:Point></g></pand></gml:featureMember></c>"#,
        );
        let mut pipeline = Pipeline::new(Config::default());
        pipeline.open(input.path()).unwrap();

        let mut out = Vec::new();
        let err = pipeline.run(&mut out).unwrap_err();
        assert!(
            matches!(err, ConvertError::Crs(CrsError::TransformFailed(_))),
            "{:?}",
            err
        );
        assert_eq!(pipeline.state(), State::Aborted);
        assert_eq!(pipeline.report().features, 1);
        assert_eq!(pipeline.report().blocks, 3);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("pand:0001\n").count(), 2);
        assert_eq!(text.matches("pand:0002\n").count(), 1);
        assert!(text.contains("155000,1000000000,0"));
        assert!(!text.contains("pand:0003"));
    }
}
