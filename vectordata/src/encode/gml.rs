//! Écriture GML 2 via `geozero::GeomProcessor`
//!
//! Produit la même forme que l'export GML par défaut d'OGR:
//! `<gml:coordinates>` avec des tuples `x,y[,z]` séparés par des espaces.

use std::io::Write;

use geozero::error::Result;
use geozero::{CoordDimensions, GeomProcessor};

/// Conteneur ouvert, pour savoir comment habiller les enfants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// Processeur geozero qui écrit du GML 2
pub struct GmlWriter<'a, W: Write> {
    out: &'a mut W,
    srs_name: Option<String>,
    root_written: bool,
    stack: Vec<Container>,
}

impl<'a, W: Write> GmlWriter<'a, W> {
    pub fn new(out: &'a mut W, srs_name: Option<&str>) -> Self {
        Self {
            out,
            srs_name: srs_name.map(str::to_string),
            root_written: false,
            stack: Vec::new(),
        }
    }

    /// Ouvre un élément géométrique; seul l'élément racine porte `srsName`
    fn open(&mut self, name: &str) -> Result<()> {
        match (&self.srs_name, self.root_written) {
            (Some(srs), false) => write!(self.out, r#"<gml:{} srsName="{}">"#, name, srs)?,
            _ => write!(self.out, "<gml:{}>", name)?,
        }
        self.root_written = true;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        write!(self.out, "</gml:{}>", name)?;
        Ok(())
    }

    fn parent(&self) -> Option<Container> {
        self.stack.last().copied()
    }

    fn write_tuple(&mut self, x: f64, y: f64, z: Option<f64>, idx: usize) -> Result<()> {
        let in_member = self.parent() == Some(Container::MultiPoint);
        if in_member {
            self.out.write_all(b"<gml:pointMember>")?;
            self.open("Point")?;
            self.out.write_all(b"<gml:coordinates>")?;
        } else if idx > 0 {
            self.out.write_all(b" ")?;
        }
        match z {
            Some(z) => write!(self.out, "{},{},{}", x, y, z)?,
            None => write!(self.out, "{},{}", x, y)?,
        }
        if in_member {
            self.out.write_all(b"</gml:coordinates>")?;
            self.close("Point")?;
            self.out.write_all(b"</gml:pointMember>")?;
        }
        Ok(())
    }
}

impl<W: Write> GeomProcessor for GmlWriter<'_, W> {
    fn dimensions(&self) -> CoordDimensions {
        CoordDimensions::xyz()
    }

    fn xy(&mut self, x: f64, y: f64, idx: usize) -> Result<()> {
        self.write_tuple(x, y, None, idx)
    }

    fn coordinate(
        &mut self,
        x: f64,
        y: f64,
        z: Option<f64>,
        _m: Option<f64>,
        _t: Option<f64>,
        _tm: Option<u64>,
        idx: usize,
    ) -> Result<()> {
        self.write_tuple(x, y, z, idx)
    }

    fn point_begin(&mut self, _idx: usize) -> Result<()> {
        self.open("Point")?;
        self.out.write_all(b"<gml:coordinates>")?;
        Ok(())
    }

    fn point_end(&mut self, _idx: usize) -> Result<()> {
        self.out.write_all(b"</gml:coordinates>")?;
        self.close("Point")
    }

    fn multipoint_begin(&mut self, _size: usize, _idx: usize) -> Result<()> {
        self.open("MultiPoint")?;
        self.stack.push(Container::MultiPoint);
        Ok(())
    }

    fn multipoint_end(&mut self, _idx: usize) -> Result<()> {
        self.stack.pop();
        self.close("MultiPoint")
    }

    fn linestring_begin(&mut self, _tagged: bool, _size: usize, idx: usize) -> Result<()> {
        match self.parent() {
            Some(Container::Polygon) => {
                let boundary = if idx == 0 {
                    "outerBoundaryIs"
                } else {
                    "innerBoundaryIs"
                };
                write!(self.out, "<gml:{}>", boundary)?;
                self.open("LinearRing")?;
            }
            Some(Container::MultiLineString) => {
                self.out.write_all(b"<gml:lineStringMember>")?;
                self.open("LineString")?;
            }
            _ => self.open("LineString")?,
        }
        self.out.write_all(b"<gml:coordinates>")?;
        Ok(())
    }

    fn linestring_end(&mut self, _tagged: bool, idx: usize) -> Result<()> {
        self.out.write_all(b"</gml:coordinates>")?;
        match self.parent() {
            Some(Container::Polygon) => {
                self.close("LinearRing")?;
                let boundary = if idx == 0 {
                    "outerBoundaryIs"
                } else {
                    "innerBoundaryIs"
                };
                write!(self.out, "</gml:{}>", boundary)?;
            }
            Some(Container::MultiLineString) => {
                self.close("LineString")?;
                self.out.write_all(b"</gml:lineStringMember>")?;
            }
            _ => self.close("LineString")?,
        }
        Ok(())
    }

    fn multilinestring_begin(&mut self, _size: usize, _idx: usize) -> Result<()> {
        self.open("MultiLineString")?;
        self.stack.push(Container::MultiLineString);
        Ok(())
    }

    fn multilinestring_end(&mut self, _idx: usize) -> Result<()> {
        self.stack.pop();
        self.close("MultiLineString")
    }

    fn polygon_begin(&mut self, _tagged: bool, _size: usize, _idx: usize) -> Result<()> {
        if self.parent() == Some(Container::MultiPolygon) {
            self.out.write_all(b"<gml:polygonMember>")?;
        }
        self.open("Polygon")?;
        self.stack.push(Container::Polygon);
        Ok(())
    }

    fn polygon_end(&mut self, _tagged: bool, _idx: usize) -> Result<()> {
        self.stack.pop();
        self.close("Polygon")?;
        if self.parent() == Some(Container::MultiPolygon) {
            self.out.write_all(b"</gml:polygonMember>")?;
        }
        Ok(())
    }

    fn multipolygon_begin(&mut self, _size: usize, _idx: usize) -> Result<()> {
        self.open("MultiPolygon")?;
        self.stack.push(Container::MultiPolygon);
        Ok(())
    }

    fn multipolygon_end(&mut self, _idx: usize) -> Result<()> {
        self.stack.pop();
        self.close("MultiPolygon")
    }
}
