//! Encodages textuels des géométries (WKT, GML)
//!
//! Les deux encodeurs passent par `geozero::GeozeroGeometry`: le WKT utilise le
//! `WktWriter` de geozero, le GML un `GeomProcessor` maison (`GmlWriter`).

mod gml;

pub use gml::GmlWriter;

use geozero::error::GeozeroError;
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;

use crate::geometry::Geometry;

/// Encode une géométrie en WKT ISO (`POINT Z (...)` si la géométrie porte un Z)
pub fn to_wkt(geometry: &Geometry) -> Result<String, GeozeroError> {
    let dims = geometry.dims();
    let mut buf = Vec::new();
    let mut writer = WktWriter::with_dims(&mut buf, dims);
    geometry.process_geom(&mut writer)?;
    let wkt = String::from_utf8(buf).map_err(|e| GeozeroError::Geometry(e.to_string()))?;
    Ok(if dims.z { tag_z(&wkt) } else { wkt })
}

/// Ajoute le marqueur de dimension `Z` après le mot-clé de type.
///
/// Le `WktWriter` de geozero écrit les ordonnées Z sans marqueur.
fn tag_z(wkt: &str) -> String {
    let Some(open) = wkt.find('(') else {
        return wkt.to_string();
    };
    let keyword = wkt[..open].trim_end();
    if keyword.ends_with(" Z") {
        return wkt.to_string();
    }
    format!("{} Z {}", keyword, &wkt[open..])
}

/// Encode une géométrie en GML 2, avec `srsName` sur l'élément racine si fourni
pub fn to_gml(geometry: &Geometry, srs_name: Option<&str>) -> Result<String, GeozeroError> {
    let mut buf = Vec::new();
    let mut writer = GmlWriter::new(&mut buf, srs_name);
    geometry.process_geom(&mut writer)?;
    String::from_utf8(buf).map_err(|e| GeozeroError::Geometry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Coord, Polygon};

    #[test]
    fn test_wkt_point_3d() {
        let wkt = to_wkt(&Geometry::Point(Coord::xyz(155000.0, 463000.0, 0.0))).unwrap();
        assert_eq!(wkt, "POINT Z (155000 463000 0)");
    }

    #[test]
    fn test_wkt_multipolygon_3d_tagged_once() {
        let square = Polygon::new(
            vec![
                Coord::xyz(0.0, 0.0, 0.0),
                Coord::xyz(1.0, 0.0, 0.0),
                Coord::xyz(1.0, 1.0, 0.0),
                Coord::xyz(0.0, 0.0, 0.0),
            ],
            vec![],
        );
        let wkt = to_wkt(&Geometry::MultiPolygon(vec![square.clone(), square])).unwrap();
        assert!(wkt.starts_with("MULTIPOLYGON Z (((0 0 0,"), "wkt={}", wkt);
        assert_eq!(wkt.matches(" Z ").count(), 1, "wkt={}", wkt);
    }

    #[test]
    fn test_wkt_mixed_dimensions_written_as_3d() {
        let line = Geometry::LineString(vec![Coord::xy(0.0, 0.0), Coord::xyz(1.0, 0.0, 5.0)]);
        let wkt = to_wkt(&line.promote_z()).unwrap();
        assert_eq!(wkt, "LINESTRING Z (0 0 0,1 0 5)");
    }

    #[test]
    fn test_tag_z_idempotent() {
        assert_eq!(tag_z("POINT(1 2 3)"), "POINT Z (1 2 3)");
        assert_eq!(tag_z("POINT Z (1 2 3)"), "POINT Z (1 2 3)");
        assert_eq!(tag_z("POINT EMPTY"), "POINT EMPTY");
    }

    #[test]
    fn test_wkt_polygon_2d() {
        let poly = Geometry::Polygon(Polygon::new(
            vec![
                Coord::xy(0.0, 0.0),
                Coord::xy(1.0, 0.0),
                Coord::xy(1.0, 1.0),
                Coord::xy(0.0, 0.0),
            ],
            vec![],
        ));
        let wkt = to_wkt(&poly).unwrap();
        assert!(wkt.starts_with("POLYGON(("), "wkt={}", wkt);
        assert!(wkt.contains("1 1"), "wkt={}", wkt);
    }

    #[test]
    fn test_gml_point_with_srs() {
        let gml = to_gml(
            &Geometry::Point(Coord::xyz(155000.0, 463000.0, 0.0)),
            Some("EPSG:28992"),
        )
        .unwrap();
        assert_eq!(
            gml,
            r#"<gml:Point srsName="EPSG:28992"><gml:coordinates>155000,463000,0</gml:coordinates></gml:Point>"#
        );
    }
}
