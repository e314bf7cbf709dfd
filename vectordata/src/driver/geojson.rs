//! Driver GeoJSON (RFC 7946, avec le membre `crs` de l'ancienne spécification)
//!
//! Le fichier est lu entièrement à l'ouverture; le schéma est l'union des
//! propriétés de toutes les features, dans l'ordre de première apparition.

use std::fs;
use std::path::Path;

use geojson::{feature::Id, GeoJson, JsonObject, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{has_extension, trim_head, Driver};
use crate::dataset::{FeatureSource, Layer};
use crate::geometry::{Coord, Geometry, Polygon};
use crate::types::{Feature, FieldDefn, FieldSchema, FieldType, FieldValue};
use crate::VectorError;

/// SRS implicite d'un fichier GeoJSON
const DEFAULT_SRS: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// Nom du champ portant l'identifiant de la feature
pub const ID_FIELD: &str = "id";

pub struct GeoJsonDriver;

impl Driver for GeoJsonDriver {
    fn short_name(&self) -> &'static str {
        "GeoJSON"
    }

    fn long_name(&self) -> &'static str {
        "GeoJSON"
    }

    fn probe(&self, path: &Path, head: &[u8]) -> bool {
        has_extension(path, &["geojson", "json"]) || trim_head(head).starts_with(b"{")
    }

    fn open(&self, path: &Path) -> Result<Layer, VectorError> {
        let file = path.display().to_string();
        let content = fs::read_to_string(path)?;
        let (features, crs) = match content.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => {
                let crs = fc.foreign_members.as_ref().and_then(legacy_crs_name);
                (fc.features, crs)
            }
            GeoJson::Feature(f) => (vec![f], None),
            GeoJson::Geometry(g) => (
                vec![geojson::Feature {
                    bbox: None,
                    geometry: Some(g),
                    id: None,
                    properties: None,
                    foreign_members: None,
                }],
                None,
            ),
        };

        let schema = infer_schema(&features);
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let srs_name = crs.unwrap_or_else(|| DEFAULT_SRS.to_string());
        debug!(
            path = %path.display(),
            layer = name.as_str(),
            features = features.len(),
            fields = schema.len(),
            srs = srs_name.as_str(),
            "GeoJSON loaded"
        );

        Ok(Layer::new(
            name,
            schema,
            Some(srs_name),
            FeatureSource::GeoJson(GeoJsonSource {
                features,
                cursor: 0,
                file,
            }),
        ))
    }
}

/// `"crs": {"type": "name", "properties": {"name": "EPSG:28992"}}`
fn legacy_crs_name(members: &JsonObject) -> Option<String> {
    members
        .get("crs")?
        .pointer("/properties/name")?
        .as_str()
        .map(str::to_string)
}

fn json_type(value: &JsonValue) -> Option<FieldType> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(_) => Some(FieldType::Integer),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(FieldType::Integer),
        JsonValue::Number(_) => Some(FieldType::Real),
        _ => Some(FieldType::String),
    }
}

fn merge_types(current: FieldType, next: FieldType) -> FieldType {
    match (current, next) {
        (a, b) if a == b => a,
        (FieldType::Integer, FieldType::Real) | (FieldType::Real, FieldType::Integer) => {
            FieldType::Real
        }
        _ => FieldType::String,
    }
}

fn infer_schema(features: &[geojson::Feature]) -> FieldSchema {
    let mut fields: Vec<(String, Option<FieldType>)> = Vec::new();
    if features.iter().any(|f| f.id.is_some()) {
        let ty = features.iter().filter_map(|f| f.id.as_ref()).fold(
            Some(FieldType::Integer),
            |acc, id| match id {
                Id::String(_) => Some(FieldType::String),
                Id::Number(_) => acc,
            },
        );
        fields.push((ID_FIELD.to_string(), ty));
    }

    for props in features.iter().filter_map(|f| f.properties.as_ref()) {
        for (name, value) in props {
            let ty = json_type(value);
            match fields.iter_mut().find(|(n, _)| n == name) {
                Some((_, current)) => {
                    *current = match (*current, ty) {
                        (Some(a), Some(b)) => Some(merge_types(a, b)),
                        (a, b) => a.or(b),
                    }
                }
                None => fields.push((name.clone(), ty)),
            }
        }
    }

    FieldSchema::new(
        fields
            .into_iter()
            .map(|(name, ty)| FieldDefn::new(name, ty.unwrap_or(FieldType::String)))
            .collect(),
    )
}

fn field_value(value: &JsonValue, field_type: FieldType) -> FieldValue {
    match (value, field_type) {
        (JsonValue::Null, _) => FieldValue::Null,
        (JsonValue::Bool(b), FieldType::Integer) => FieldValue::Integer(i64::from(*b)),
        (JsonValue::Number(n), FieldType::Integer) => {
            n.as_i64().map_or(FieldValue::Null, FieldValue::Integer)
        }
        (JsonValue::Number(n), FieldType::Real) => {
            n.as_f64().map_or(FieldValue::Null, FieldValue::Real)
        }
        (JsonValue::String(s), _) => FieldValue::String(s.clone()),
        (other, _) => FieldValue::String(other.to_string()),
    }
}

fn to_coord(position: &[f64], file: &str) -> Result<Coord, VectorError> {
    Coord::from_slice(position).ok_or_else(|| {
        VectorError::parse_error(file, format!("invalid position {:?}", position))
    })
}

fn to_ring(positions: &[Vec<f64>], file: &str) -> Result<Vec<Coord>, VectorError> {
    positions.iter().map(|p| to_coord(p, file)).collect()
}

fn to_polygon(rings: &[Vec<Vec<f64>>], file: &str) -> Result<Polygon, VectorError> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| VectorError::parse_error(file, "polygon without rings"))?;
    Ok(Polygon::new(
        to_ring(exterior, file)?,
        interiors
            .iter()
            .map(|r| to_ring(r, file))
            .collect::<Result<_, _>>()?,
    ))
}

fn to_geometry(value: &Value, fid: u64, file: &str) -> Result<Geometry, VectorError> {
    Ok(match value {
        Value::Point(p) => Geometry::Point(to_coord(p, file)?),
        Value::MultiPoint(ps) => Geometry::MultiPoint(to_ring(ps, file)?),
        Value::LineString(l) => Geometry::LineString(to_ring(l, file)?),
        Value::MultiLineString(ls) => Geometry::MultiLineString(
            ls.iter().map(|l| to_ring(l, file)).collect::<Result<_, _>>()?,
        ),
        Value::Polygon(p) => Geometry::Polygon(to_polygon(p, file)?),
        Value::MultiPolygon(ps) => Geometry::MultiPolygon(
            ps.iter()
                .map(|p| to_polygon(p, file))
                .collect::<Result<_, _>>()?,
        ),
        Value::GeometryCollection(_) => {
            return Err(VectorError::invalid_geometry(
                fid,
                "GeometryCollection is not supported",
            ))
        }
    })
}

/// Source de features d'une couche GeoJSON (en mémoire)
pub(crate) struct GeoJsonSource {
    features: Vec<geojson::Feature>,
    cursor: usize,
    file: String,
}

impl GeoJsonSource {
    pub(crate) fn next_feature(
        &mut self,
        schema: &FieldSchema,
        fid: u64,
    ) -> Result<Option<Feature>, VectorError> {
        let Some(source) = self.features.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        let fields = schema
            .iter()
            .map(|defn| {
                if defn.name == ID_FIELD {
                    if let Some(id) = &source.id {
                        return match id {
                            Id::String(s) => FieldValue::String(s.clone()),
                            Id::Number(n) => field_value(&JsonValue::Number(n.clone()), defn.field_type),
                        };
                    }
                }
                source
                    .properties
                    .as_ref()
                    .and_then(|props| props.get(&defn.name))
                    .map_or(FieldValue::Null, |v| field_value(v, defn.field_type))
            })
            .collect();

        let geometry = source
            .geometry
            .as_ref()
            .map(|g| to_geometry(&g.value, fid, &self.file).map(Geometry::promote_z))
            .transpose()?;

        Ok(Some(Feature {
            fid,
            fields,
            geometry,
        }))
    }

    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn features(value: JsonValue) -> Vec<geojson::Feature> {
        match value.to_string().parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => fc.features,
            other => panic!("Expected FeatureCollection, got {:?}", other),
        }
    }

    #[test]
    fn test_infer_schema() {
        let fs = features(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "0001", "geometry": null,
                 "properties": {"bouwjaar": 1900, "oppervlakte": 40, "status": "ok"}},
                {"type": "Feature", "id": "0002", "geometry": null,
                 "properties": {"bouwjaar": 1975, "oppervlakte": 40.5, "status": null, "extra": [1]}}
            ]
        }));
        let schema = infer_schema(&fs);
        let types: Vec<_> = schema.iter().map(|f| (f.name.as_str(), f.field_type)).collect();
        assert_eq!(
            types,
            vec![
                ("id", FieldType::String),
                ("bouwjaar", FieldType::Integer),
                ("oppervlakte", FieldType::Real),
                ("status", FieldType::String),
                ("extra", FieldType::String),
            ]
        );
    }

    #[test]
    fn test_legacy_crs() {
        let members: JsonObject = serde_json::from_value(json!({
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::28992"}}
        }))
        .unwrap();
        assert_eq!(
            legacy_crs_name(&members).as_deref(),
            Some("urn:ogc:def:crs:EPSG::28992")
        );
    }

    #[test]
    fn test_source_reads_in_order() {
        let fs = features(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": 1, "properties": {"naam": "a"},
                 "geometry": {"type": "Point", "coordinates": [155000.0, 463000.0, 0.0]}},
                {"type": "Feature", "id": 2, "properties": {"naam": "b"},
                 "geometry": {"type": "GeometryCollection", "geometries": []}}
            ]
        }));
        let schema = infer_schema(&fs);
        let mut source = GeoJsonSource {
            features: fs,
            cursor: 0,
            file: "test.geojson".to_string(),
        };

        let first = source.next_feature(&schema, 0).unwrap().unwrap();
        assert_eq!(first.fields[0], FieldValue::Integer(1));
        assert_eq!(first.fields[1], FieldValue::String("a".to_string()));
        assert_eq!(
            first.geometry,
            Some(Geometry::Point(Coord::xyz(155000.0, 463000.0, 0.0)))
        );

        let err = source.next_feature(&schema, 1).unwrap_err();
        assert!(matches!(err, VectorError::InvalidGeometry { fid: 1, .. }));

        assert!(source.next_feature(&schema, 2).unwrap().is_none());
        source.reset();
        assert!(source.next_feature(&schema, 0).unwrap().is_some());
    }
}
