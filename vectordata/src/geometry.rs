//! Modèle de géométrie avec coordonnée Z optionnelle
//!
//! Les bâtiments BAG sont livrés en 3D (Z = 0 le plus souvent). Les types `geo`
//! étant strictement 2D, on porte ici notre propre modèle et on l'expose à
//! l'écosystème via `geozero::GeozeroGeometry`.

use std::convert::Infallible;

use geozero::{CoordDimensions, GeomProcessor, GeozeroGeometry};

/// Coordonnée (x, y) avec altitude optionnelle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Construit une coordonnée depuis une liste d'ordonnées (2 ou 3)
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [x, y] => Some(Self::xy(*x, *y)),
            [x, y, z, ..] => Some(Self::xyz(*x, *y, *z)),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }
}

/// Polygone: un anneau extérieur et zéro ou plusieurs anneaux intérieurs
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Coord>,
    pub interiors: Vec<Vec<Coord>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Coord>, interiors: Vec<Vec<Coord>>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    fn rings(&self) -> impl Iterator<Item = &Vec<Coord>> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    fn try_map<E>(&self, f: &mut impl FnMut(Coord) -> Result<Coord, E>) -> Result<Self, E> {
        Ok(Polygon {
            exterior: map_ring(&self.exterior, f)?,
            interiors: self
                .interiors
                .iter()
                .map(|ring| map_ring(ring, f))
                .collect::<Result<_, E>>()?,
        })
    }
}

/// Géométrie d'une feature
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Polygon),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// Nom du type au sens OGC
    pub fn geometry_type(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Première coordonnée rencontrée (None si la géométrie est vide)
    pub fn first_coord(&self) -> Option<&Coord> {
        match self {
            Geometry::Point(c) => Some(c),
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.first(),
            Geometry::Polygon(p) => p.exterior.first(),
            Geometry::MultiLineString(ls) => ls.iter().find_map(|l| l.first()),
            Geometry::MultiPolygon(ps) => ps.iter().find_map(|p| p.exterior.first()),
        }
    }

    /// Au moins une coordonnée porte-t-elle une altitude ?
    pub fn has_z(&self) -> bool {
        self.any_coord(|c| c.z.is_some())
    }

    fn any_coord(&self, pred: impl Fn(&Coord) -> bool) -> bool {
        match self {
            Geometry::Point(c) => pred(c),
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.iter().any(&pred),
            Geometry::Polygon(p) => p.rings().flatten().any(&pred),
            Geometry::MultiLineString(ls) => ls.iter().flatten().any(&pred),
            Geometry::MultiPolygon(ps) => ps.iter().flat_map(|p| p.rings()).flatten().any(&pred),
        }
    }

    /// Passe toute la géométrie en 3D dès qu'une coordonnée porte un Z (Z manquant = 0)
    pub fn promote_z(self) -> Geometry {
        if !self.has_z() || !self.any_coord(|c| c.z.is_none()) {
            return self;
        }
        let promoted = self.try_map_coords(|c| {
            Ok::<_, Infallible>(Coord {
                z: Some(c.z.unwrap_or(0.0)),
                ..c
            })
        });
        match promoted {
            Ok(geom) => geom,
            Err(never) => match never {},
        }
    }

    /// Nombre total de coordonnées
    pub fn coord_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.len(),
            Geometry::Polygon(p) => p.rings().map(Vec::len).sum(),
            Geometry::MultiLineString(ls) => ls.iter().map(Vec::len).sum(),
            Geometry::MultiPolygon(ps) => ps
                .iter()
                .map(|p| p.rings().map(Vec::len).sum::<usize>())
                .sum(),
        }
    }

    /// Applique une fonction faillible à chaque coordonnée et retourne une nouvelle géométrie
    pub fn try_map_coords<E>(
        &self,
        mut f: impl FnMut(Coord) -> Result<Coord, E>,
    ) -> Result<Geometry, E> {
        let f = &mut f;
        Ok(match self {
            Geometry::Point(c) => Geometry::Point(f(*c)?),
            Geometry::LineString(cs) => Geometry::LineString(map_ring(cs, f)?),
            Geometry::Polygon(p) => Geometry::Polygon(p.try_map(f)?),
            Geometry::MultiPoint(cs) => Geometry::MultiPoint(map_ring(cs, f)?),
            Geometry::MultiLineString(ls) => Geometry::MultiLineString(
                ls.iter()
                    .map(|l| map_ring(l, f))
                    .collect::<Result<_, E>>()?,
            ),
            Geometry::MultiPolygon(ps) => Geometry::MultiPolygon(
                ps.iter()
                    .map(|p| p.try_map(f))
                    .collect::<Result<_, E>>()?,
            ),
        })
    }
}

fn map_ring<E>(
    coords: &[Coord],
    f: &mut impl FnMut(Coord) -> Result<Coord, E>,
) -> Result<Vec<Coord>, E> {
    coords.iter().map(|c| f(*c)).collect()
}

fn process_coord<P: GeomProcessor>(
    c: &Coord,
    idx: usize,
    processor: &mut P,
) -> geozero::error::Result<()> {
    if processor.multi_dim() {
        processor.coordinate(c.x, c.y, c.z, None, None, None, idx)
    } else {
        processor.xy(c.x, c.y, idx)
    }
}

fn process_linestring<P: GeomProcessor>(
    coords: &[Coord],
    tagged: bool,
    idx: usize,
    processor: &mut P,
) -> geozero::error::Result<()> {
    processor.linestring_begin(tagged, coords.len(), idx)?;
    for (i, c) in coords.iter().enumerate() {
        process_coord(c, i, processor)?;
    }
    processor.linestring_end(tagged, idx)
}

fn process_polygon<P: GeomProcessor>(
    polygon: &Polygon,
    tagged: bool,
    idx: usize,
    processor: &mut P,
) -> geozero::error::Result<()> {
    processor.polygon_begin(tagged, polygon.interiors.len() + 1, idx)?;
    for (i, ring) in polygon.rings().enumerate() {
        process_linestring(ring, false, i, processor)?;
    }
    processor.polygon_end(tagged, idx)
}

impl GeozeroGeometry for Geometry {
    fn process_geom<P: GeomProcessor>(&self, processor: &mut P) -> geozero::error::Result<()> {
        match self {
            Geometry::Point(c) => {
                processor.point_begin(0)?;
                process_coord(c, 0, processor)?;
                processor.point_end(0)
            }
            Geometry::LineString(cs) => process_linestring(cs, true, 0, processor),
            Geometry::Polygon(p) => process_polygon(p, true, 0, processor),
            Geometry::MultiPoint(cs) => {
                processor.multipoint_begin(cs.len(), 0)?;
                for (i, c) in cs.iter().enumerate() {
                    process_coord(c, i, processor)?;
                }
                processor.multipoint_end(0)
            }
            Geometry::MultiLineString(ls) => {
                processor.multilinestring_begin(ls.len(), 0)?;
                for (i, l) in ls.iter().enumerate() {
                    process_linestring(l, false, i, processor)?;
                }
                processor.multilinestring_end(0)
            }
            Geometry::MultiPolygon(ps) => {
                processor.multipolygon_begin(ps.len(), 0)?;
                for (i, p) in ps.iter().enumerate() {
                    process_polygon(p, false, i, processor)?;
                }
                processor.multipolygon_end(0)
            }
        }
    }

    fn dims(&self) -> CoordDimensions {
        if self.has_z() {
            CoordDimensions::xyz()
        } else {
            CoordDimensions::xy()
        }
    }
}
