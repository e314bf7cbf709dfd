//! Driver GML (GML 2, GML 3.1, GML 3.2)
//!
//! Lecture en flux avec `quick-xml`. Comme OGR sans fichier `.gfs`, le schéma
//! est construit par une première passe (prescan) puis les features sont
//! relues une par une lors de l'itération.
//!
//! La couche correspond au premier type de feature rencontré; les features
//! d'autres types sont ignorées.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};

use super::{has_extension, trim_head, Driver};
use crate::dataset::{FeatureSource, Layer};
use crate::geometry::{Coord, Geometry, Polygon};
use crate::types::{Feature, FieldDefn, FieldSchema, FieldType, FieldValue};
use crate::VectorError;

/// Nom du champ portant l'attribut `gml:id` de la feature
pub const GML_ID: &str = "gml_id";

/// Éléments enveloppant les features d'une collection
const MEMBER_ELEMENTS: &[&str] = &["featureMember", "featureMembers", "member"];

/// Éléments géométriques reconnus
const GEOMETRY_ELEMENTS: &[&str] = &[
    "Point",
    "LineString",
    "LinearRing",
    "Curve",
    "Polygon",
    "Surface",
    "MultiPoint",
    "MultiLineString",
    "MultiCurve",
    "MultiPolygon",
    "MultiSurface",
    "CompositeSurface",
];

/// Propriétés de feature qui ne sont pas des attributs
const IGNORED_PROPERTIES: &[&str] = &["boundedBy"];

pub struct GmlDriver;

impl Driver for GmlDriver {
    fn short_name(&self) -> &'static str {
        "GML"
    }

    fn long_name(&self) -> &'static str {
        "Geography Markup Language (GML)"
    }

    fn probe(&self, path: &Path, head: &[u8]) -> bool {
        if has_extension(path, &["gml", "xml"]) {
            return true;
        }
        let head = trim_head(head);
        head.starts_with(b"<")
            && (contains(head, b"http://www.opengis.net/gml") || contains(head, b"<gml:"))
    }

    fn open(&self, path: &Path) -> Result<Layer, VectorError> {
        let scan = prescan(path)?;
        let name = scan.feature_type.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        debug!(
            path = %path.display(),
            layer = name.as_str(),
            features = scan.count,
            fields = scan.schema.len(),
            srs = ?scan.srs_name,
            "GML prescan done"
        );
        let source = GmlSource {
            path: path.to_path_buf(),
            feature_type: scan.feature_type,
            reader: GmlReader::open(path)?,
        };
        Ok(Layer::new(
            name,
            scan.schema,
            scan.srs_name,
            FeatureSource::Gml(source),
        ))
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Résultat de la première passe
struct Prescan {
    feature_type: Option<String>,
    schema: FieldSchema,
    srs_name: Option<String>,
    count: usize,
}

fn prescan(path: &Path) -> Result<Prescan, VectorError> {
    let mut reader = GmlReader::open(path)?;
    let mut feature_type: Option<String> = None;
    let mut fields = vec![FieldDefn::new(GML_ID, FieldType::String)];
    let mut srs_name = None;
    let mut count = 0;

    while let Some(raw) = reader.next_raw()? {
        match &feature_type {
            None => feature_type = Some(raw.element.clone()),
            Some(t) if *t != raw.element => continue,
            Some(_) => {}
        }
        count += 1;
        if srs_name.is_none() {
            srs_name = raw.srs_name;
        }
        for (name, value) in &raw.properties {
            if name == GML_ID {
                continue;
            }
            match fields.iter_mut().find(|f| &f.name == name) {
                Some(field) => field.field_type = field.field_type.widen(value),
                None => fields.push(FieldDefn::new(name.clone(), FieldType::Integer.widen(value))),
            }
        }
    }

    Ok(Prescan {
        feature_type,
        schema: FieldSchema::new(fields),
        srs_name,
        count,
    })
}

/// Source de features d'une couche GML
pub(crate) struct GmlSource {
    path: PathBuf,
    feature_type: Option<String>,
    reader: GmlReader<BufReader<File>>,
}

impl GmlSource {
    pub(crate) fn next_feature(
        &mut self,
        schema: &FieldSchema,
        fid: u64,
    ) -> Result<Option<Feature>, VectorError> {
        while let Some(raw) = self.reader.next_raw()? {
            if self.feature_type.as_deref() != Some(raw.element.as_str()) {
                trace!(element = raw.element.as_str(), "Skipping feature of another type");
                continue;
            }
            return raw.into_feature(schema, fid, &self.reader.file).map(Some);
        }
        Ok(None)
    }

    /// Rouvre le fichier pour repartir de la première feature
    pub(crate) fn reset(&mut self) -> Result<(), VectorError> {
        self.reader = GmlReader::open(&self.path)?;
        Ok(())
    }
}

/// Feature telle que lue dans le XML, avant typage
#[derive(Debug)]
struct RawFeature {
    element: String,
    id: Option<String>,
    properties: Vec<(String, String)>,
    geometry: Option<Geometry>,
    srs_name: Option<String>,
}

impl RawFeature {
    fn into_feature(
        self,
        schema: &FieldSchema,
        fid: u64,
        file: &str,
    ) -> Result<Feature, VectorError> {
        let mut fields = Vec::with_capacity(schema.len());
        for defn in schema.iter() {
            let raw = if defn.name == GML_ID {
                self.id.as_deref()
            } else {
                self.properties
                    .iter()
                    .find(|(name, _)| *name == defn.name)
                    .map(|(_, value)| value.as_str())
            };
            let value = match raw {
                Some(raw) => FieldValue::parse(raw, defn.field_type).ok_or_else(|| {
                    VectorError::parse_error(
                        file,
                        format!(
                            "value '{}' of field '{}' is not a valid {}",
                            raw, defn.name, defn.field_type
                        ),
                    )
                })?,
                None => FieldValue::Null,
            };
            fields.push(value);
        }
        Ok(Feature {
            fid,
            fields,
            geometry: self.geometry,
        })
    }
}

/// Contenu d'une propriété de feature
enum Property {
    Text(String),
    Geometry(Geometry, Option<String>),
}

/// Lecteur GML en flux au-dessus de `quick_xml::Reader`
struct GmlReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Éléments ouverts au-dessus des features
    stack: Vec<String>,
    file: String,
}

impl GmlReader<BufReader<File>> {
    fn open(path: &Path) -> Result<Self, VectorError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> GmlReader<R> {
    fn new(inner: R, file: String) -> Self {
        let mut reader = Reader::from_reader(inner);
        let config = reader.config_mut();
        config.trim_text(true);
        config.expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            stack: Vec::new(),
            file,
        }
    }

    fn error(&self, reason: impl Into<String>) -> VectorError {
        VectorError::parse_error(&self.file, reason)
    }

    fn next_event(&mut self) -> Result<Event<'static>, VectorError> {
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
        Ok(event)
    }

    /// Avance jusqu'à la prochaine feature de la collection
    fn next_raw(&mut self) -> Result<Option<RawFeature>, VectorError> {
        loop {
            match self.next_event()? {
                Event::Start(e) => {
                    let in_member = self
                        .stack
                        .last()
                        .map_or(false, |parent| MEMBER_ELEMENTS.contains(&parent.as_str()));
                    if in_member {
                        return self.read_feature(&e).map(Some);
                    }
                    self.stack.push(local_name(&e));
                }
                Event::End(_) => {
                    self.stack.pop();
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    fn read_feature(&mut self, start: &BytesStart) -> Result<RawFeature, VectorError> {
        let element = local_name(start);
        let id = match self.attribute(start, "id")? {
            Some(id) => Some(id),
            None => self.attribute(start, "fid")?,
        };
        let mut properties = Vec::new();
        let mut geometry = None;
        let mut srs_name = None;

        loop {
            match self.next_event()? {
                Event::Start(child) => {
                    let name = local_name(&child);
                    if IGNORED_PROPERTIES.contains(&name.as_str()) {
                        self.skip_element()?;
                        continue;
                    }
                    match self.read_property()? {
                        Property::Text(text) => properties.push((name, text)),
                        Property::Geometry(geom, srs) if geometry.is_none() => {
                            geometry = Some(geom);
                            srs_name = srs;
                        }
                        Property::Geometry(..) => {
                            debug!(property = name.as_str(), "Additional geometry property ignored");
                        }
                    }
                }
                Event::End(_) => break,
                Event::Eof => return Err(self.error(format!("unexpected end of file in feature {}", element))),
                _ => {}
            }
        }

        Ok(RawFeature {
            element,
            id,
            properties,
            geometry,
            srs_name,
        })
    }

    /// Lit le contenu d'une propriété jusqu'à sa balise fermante
    fn read_property(&mut self) -> Result<Property, VectorError> {
        let mut text = String::new();
        let mut geometry = None;
        let mut depth = 0usize;

        loop {
            match self.next_event()? {
                Event::Start(e) => {
                    if geometry.is_none() && is_geometry(&local_name(&e)) {
                        let srs = self.attribute(&e, "srsName")?;
                        let geom = self.read_geometry(&e, 2)?.promote_z();
                        geometry = Some((geom, srs));
                    } else {
                        depth += 1;
                    }
                }
                Event::Text(t) => text.push_str(&self.unescape(&t)?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Event::Eof => return Err(self.error("unexpected end of file in property")),
                _ => {}
            }
        }

        Ok(match geometry {
            Some((geom, srs)) => Property::Geometry(geom, srs),
            None => Property::Text(text),
        })
    }

    /// Lit un élément géométrique (balise ouvrante déjà consommée)
    fn read_geometry(&mut self, start: &BytesStart, dims: usize) -> Result<Geometry, VectorError> {
        let name = local_name(start);
        let dims = self.srs_dimension(start)?.unwrap_or(dims);

        match name.as_str() {
            "Point" => {
                let coords = self.read_coords(dims)?;
                coords
                    .into_iter()
                    .next()
                    .map(Geometry::Point)
                    .ok_or_else(|| self.error("Point without coordinates"))
            }
            "LineString" | "LinearRing" | "Curve" => Ok(Geometry::LineString(self.read_coords(dims)?)),
            "Polygon" | "Surface" => {
                let mut polygons = self.read_polygons(dims)?;
                match polygons.len() {
                    0 => Err(self.error(format!("{} without exterior ring", name))),
                    1 => Ok(Geometry::Polygon(polygons.remove(0))),
                    _ => Ok(Geometry::MultiPolygon(polygons)),
                }
            }
            "MultiPoint" | "MultiLineString" | "MultiCurve" | "MultiPolygon" | "MultiSurface"
            | "CompositeSurface" => self.read_multi(&name, dims),
            other => Err(self.error(format!("unsupported geometry element {}", other))),
        }
    }

    /// Collecte les coordonnées (`pos`, `posList`, `coordinates`) jusqu'à la fin de l'élément courant
    fn read_coords(&mut self, dims: usize) -> Result<Vec<Coord>, VectorError> {
        let mut coords = Vec::new();
        let mut depth = 0usize;

        loop {
            match self.next_event()? {
                Event::Start(e) => match local_name(&e).as_str() {
                    "pos" => {
                        let text = self.read_text()?;
                        let values = self.parse_numbers(text.split_whitespace())?;
                        let coord = Coord::from_slice(&values)
                            .ok_or_else(|| self.error(format!("invalid pos '{}'", text)))?;
                        coords.push(coord);
                    }
                    "posList" => {
                        let dims = self.srs_dimension(&e)?.unwrap_or(dims);
                        let text = self.read_text()?;
                        coords.extend(self.parse_pos_list(&text, dims)?);
                    }
                    "coordinates" => {
                        let text = self.read_text()?;
                        for tuple in text.split_whitespace() {
                            let values = self.parse_numbers(tuple.split(','))?;
                            let coord = Coord::from_slice(&values)
                                .ok_or_else(|| self.error(format!("invalid tuple '{}'", tuple)))?;
                            coords.push(coord);
                        }
                    }
                    _ => depth += 1,
                },
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Event::Eof => return Err(self.error("unexpected end of file in geometry")),
                _ => {}
            }
        }

        Ok(coords)
    }

    /// Lit les anneaux d'un Polygon ou des patches d'une Surface
    ///
    /// Chaque anneau extérieur ouvre un nouveau polygone.
    fn read_polygons(&mut self, dims: usize) -> Result<Vec<Polygon>, VectorError> {
        let mut polygons: Vec<Polygon> = Vec::new();
        let mut depth = 0usize;

        loop {
            match self.next_event()? {
                Event::Start(e) => match local_name(&e).as_str() {
                    "exterior" | "outerBoundaryIs" => {
                        let ring = self.read_coords(dims)?;
                        polygons.push(Polygon::new(ring, Vec::new()));
                    }
                    "interior" | "innerBoundaryIs" => {
                        let ring = self.read_coords(dims)?;
                        match polygons.last_mut() {
                            Some(polygon) => polygon.interiors.push(ring),
                            None => return Err(self.error("interior ring before exterior ring")),
                        }
                    }
                    _ => depth += 1,
                },
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Event::Eof => return Err(self.error("unexpected end of file in polygon")),
                _ => {}
            }
        }

        Ok(polygons)
    }

    fn read_multi(&mut self, name: &str, dims: usize) -> Result<Geometry, VectorError> {
        let mut parts = Vec::new();
        let mut depth = 0usize;

        loop {
            match self.next_event()? {
                Event::Start(e) => {
                    if is_geometry(&local_name(&e)) {
                        parts.push(self.read_geometry(&e, dims)?);
                    } else {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Event::Eof => return Err(self.error(format!("unexpected end of file in {}", name))),
                _ => {}
            }
        }

        let mismatch = |part: &Geometry| {
            self.error(format!("{} cannot contain {}", name, part.geometry_type()))
        };
        match name {
            "MultiPoint" => {
                let mut points = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        Geometry::Point(c) => points.push(c),
                        Geometry::MultiPoint(cs) => points.extend(cs),
                        other => return Err(mismatch(&other)),
                    }
                }
                Ok(Geometry::MultiPoint(points))
            }
            "MultiLineString" | "MultiCurve" => {
                let mut lines = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        Geometry::LineString(l) => lines.push(l),
                        Geometry::MultiLineString(ls) => lines.extend(ls),
                        other => return Err(mismatch(&other)),
                    }
                }
                Ok(Geometry::MultiLineString(lines))
            }
            _ => {
                let mut polygons = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        Geometry::Polygon(p) => polygons.push(p),
                        Geometry::MultiPolygon(ps) => polygons.extend(ps),
                        other => return Err(mismatch(&other)),
                    }
                }
                Ok(Geometry::MultiPolygon(polygons))
            }
        }
    }

    /// Texte d'un élément feuille (balise fermante consommée)
    fn read_text(&mut self) -> Result<String, VectorError> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::Text(t) => text.push_str(&self.unescape(&t)?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Event::Eof => return Err(self.error("unexpected end of file in text element")),
                _ => {}
            }
        }
        Ok(text)
    }

    fn skip_element(&mut self) -> Result<(), VectorError> {
        let mut depth = 0usize;
        loop {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Event::Eof => return Err(self.error("unexpected end of file")),
                _ => {}
            }
        }
    }

    fn parse_numbers<'s>(
        &self,
        tokens: impl Iterator<Item = &'s str>,
    ) -> Result<Vec<f64>, VectorError> {
        tokens
            .filter(|t| !t.is_empty())
            .map(|t| match t.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(self.error(format!("invalid number '{}'", t))),
            })
            .collect()
    }

    fn parse_pos_list(&self, text: &str, dims: usize) -> Result<Vec<Coord>, VectorError> {
        if !(2..=3).contains(&dims) {
            return Err(self.error(format!("unsupported srsDimension {}", dims)));
        }
        let values = self.parse_numbers(text.split_whitespace())?;
        if values.len() % dims != 0 {
            return Err(self.error(format!(
                "posList of {} values is not a multiple of srsDimension {}",
                values.len(),
                dims
            )));
        }
        Ok(values
            .chunks_exact(dims)
            .filter_map(Coord::from_slice)
            .collect())
    }

    fn srs_dimension(&self, e: &BytesStart) -> Result<Option<usize>, VectorError> {
        match self.attribute(e, "srsDimension")? {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.error(format!("invalid srsDimension '{}'", value))),
            None => Ok(None),
        }
    }

    /// Valeur d'un attribut, recherché par nom local (`gml:id` → `id`)
    fn attribute(&self, e: &BytesStart, name: &str) -> Result<Option<String>, VectorError> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error(err.to_string()))?;
            if attr.key.local_name().as_ref() == name.as_bytes() {
                let raw = String::from_utf8_lossy(&attr.value);
                return Ok(Some(self.unescape_str(&raw)?));
            }
        }
        Ok(None)
    }

    fn unescape(&self, bytes: &[u8]) -> Result<String, VectorError> {
        self.unescape_str(&String::from_utf8_lossy(bytes))
    }

    fn unescape_str(&self, raw: &str) -> Result<String, VectorError> {
        quick_xml::escape::unescape(raw)
            .map(|s| s.into_owned())
            .map_err(|err| self.error(err.to_string()))
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn is_geometry(name: &str) -> bool {
    GEOMETRY_ELEMENTS.contains(&name)
}
