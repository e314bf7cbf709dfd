//! Tests de bout en bout des binaires `gml2wkt` et `drivers`

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

const ONE_POINT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:bag="http://bag.basisregistraties.overheid.nl/bag">
  <wfs:member>
    <bag:pand gml:id="0001">
      <bag:bouwjaar>1900</bag:bouwjaar>
      <bag:geometrie>
        <gml:Point srsName="urn:ogc:def:crs:EPSG::28992" srsDimension="3"><gml:pos>155000 463000 0</gml:pos></gml:Point>
      </bag:geometrie>
    </bag:pand>
  </wfs:member>
</wfs:FeatureCollection>
"#;

fn gml2wkt() -> Command {
    let mut cmd = Command::cargo_bin("gml2wkt").unwrap();
    cmd.env_remove("BAG_LD_CONFIG")
        .env_remove("BAG_LD_REPORT")
        .env("RUST_LOG", "off");
    cmd
}

fn drivers() -> Command {
    let mut cmd = Command::cargo_bin("drivers").unwrap();
    cmd.env("RUST_LOG", "off");
    cmd
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Blocs du document (séparés par leur ligne sujet)
fn blocks(doc: &str) -> Vec<Vec<&str>> {
    let body: Vec<&str> = doc.lines().skip(4).collect();
    body.chunks(6).map(|c| c.to_vec()).collect()
}

fn unescaped_quotes(line: &str) -> usize {
    let bytes = line.as_bytes();
    (0..bytes.len())
        .filter(|&i| bytes[i] == b'"' && (i == 0 || bytes[i - 1] != b'\\'))
        .count()
}

#[test]
fn test_one_point_two_blocks() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "pand.gml", ONE_POINT);
    let output = dir.path().join("pand.ttl");

    gml2wkt().arg(&input).arg(&output).assert().success();

    let doc = fs::read_to_string(&output).unwrap();
    assert!(doc.starts_with(
        "prefix geo: <http://www.opengis.net/ont/geosparql#>\n\
         prefix def: <https://data.labs.pdok.nl/bag/def/>\n\
         prefix pand: <http://bag.basisregistraties.overheid.nl/bag/id/pand/>\n\n"
    ));

    let blocks = blocks(&doc);
    assert_eq!(blocks.len(), 2, "{}", doc);

    let rd = &blocks[0];
    assert_eq!(rd[0], "pand:0001");
    assert_eq!(rd[2], "    def:crs <http://www.opengis.net/def/crs/EPSG/0/28992>;");
    assert!(rd[3].contains(r#"srsName=\"EPSG:28992\""#), "{}", rd[3]);
    assert!(rd[3].contains("155000,463000,0"), "{}", rd[3]);
    assert_eq!(
        rd[4],
        r#"    geo:asWKT "<http://www.opengis.net/def/crs/EPSG/0/28992> POINT Z (155000 463000 0)"^^geo:wktLiteral;"#
    );

    let wgs = &blocks[1];
    assert_eq!(wgs[0], "pand:0001");
    assert_eq!(wgs[2], "    def:crs <http://www.opengis.net/def/crs/EPSG/0/4326>;");
    assert!(wgs[4].starts_with(r#"    geo:asWKT "POINT Z (5.38720"#), "{}", wgs[4]);
    assert!(wgs[4].ends_with(r#" 0)"^^geo:wktLiteral;"#), "{}", wgs[4]);
    assert!(wgs[4].contains("5.38720"), "{}", wgs[4]);
    assert!(wgs[4].contains("52.15517"), "{}", wgs[4]);
    assert_eq!(wgs[5], "    geo:dimension 3 ].");
}

#[test]
fn test_gml_literal_quotes_are_escaped() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "pand.gml", ONE_POINT);
    let output = dir.path().join("pand.ttl");

    gml2wkt().arg(&input).arg(&output).assert().success();

    let doc = fs::read_to_string(&output).unwrap();
    for line in doc.lines().filter(|l| l.contains("geo:asGML")) {
        assert!(line.contains(r#"\""#), "{}", line);
        assert_eq!(unescaped_quotes(line), 2, "{}", line);
    }
}

#[test]
fn test_deterministic_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "pand.gml", ONE_POINT);
    let first = dir.path().join("first.ttl");
    let second = dir.path().join("second.ttl");

    gml2wkt().arg(&input).arg(&first).assert().success();
    gml2wkt().arg(&input).arg(&second).assert().success();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_stdout_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "pand.gml", ONE_POINT);

    let assert = gml2wkt().arg(&input).arg("-").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.matches("pand:0001\n").count(), 2);
}

#[test]
fn test_missing_input_exit_3_without_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.ttl");

    let assert = gml2wkt()
        .arg(dir.path().join("missing.gml"))
        .arg(&output)
        .assert()
        .code(3);
    assert!(!assert.get_output().stderr.is_empty());
    assert!(!Path::new(&output).exists());
}

#[test]
fn test_missing_gml_id_exit_3() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "pand.geojson",
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"identificatie": "0001"},
             "geometry": {"type": "Point", "coordinates": [155000, 463000, 0]}}
        ]}"#,
    );
    let output = dir.path().join("out.ttl");

    let assert = gml2wkt().arg(&input).arg(&output).assert().code(3);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("gml_id"), "{}", stderr);
}

#[test]
fn test_report_written_from_env() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "pand.gml", ONE_POINT);
    let output = dir.path().join("pand.ttl");
    let report = dir.path().join("report.json");

    gml2wkt()
        .env("BAG_LD_REPORT", &report)
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let saved = fs::read_to_string(&report).unwrap();
    assert!(saved.contains("\"status\": \"Success\""), "{}", saved);
    assert!(saved.contains("\"blocks\": 2"), "{}", saved);
}

#[test]
fn test_gml2wkt_argument_errors() {
    gml2wkt().arg("-h").assert().code(0);
    gml2wkt().arg("-x").arg("a.gml").arg("b.ttl").assert().code(1);
    gml2wkt().arg("only-input.gml").assert().code(2);
    gml2wkt().assert().code(2);
}

#[test]
fn test_drivers_print() {
    let assert = drivers().arg("-p").assert().success();
    assert_eq!(assert.get_output().stdout, b"GML\nGeoJSON\n");

    let assert = drivers().assert().success();
    assert_eq!(assert.get_output().stdout, b"GML\nGeoJSON\n");
}

#[test]
fn test_drivers_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drivers.txt");

    drivers().arg("-e").arg(&path).assert().success();
    assert_eq!(fs::read_to_string(&path).unwrap(), "GML\nGeoJSON\n");
}

#[test]
fn test_drivers_export_and_print_exit_1_before_io() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drivers.txt");

    drivers().arg("-e").arg(&path).arg("-p").assert().code(1);
    drivers().arg("-p").arg("-e").arg(&path).assert().code(1);
    assert!(!path.exists());
}

#[test]
fn test_drivers_argument_errors() {
    drivers().arg("-h").assert().code(0);
    drivers().arg("-z").assert().code(2);
    drivers()
        .arg("-e")
        .arg("/nonexistent/dir/drivers.txt")
        .assert()
        .code(3);
}
