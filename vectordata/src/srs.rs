//! Lecture des identifiants de systèmes de référence (srsName)

/// Extrait le code EPSG d'un identifiant SRS
///
/// Formes reconnues: `EPSG:28992`, `urn:ogc:def:crs:EPSG::28992`,
/// `http://www.opengis.net/def/crs/EPSG/0/28992`,
/// `http://www.opengis.net/gml/srs/epsg.xml#28992` et `CRS84` (→ 4326).
pub fn parse_epsg(srs: &str) -> Option<u32> {
    let srs = srs.trim();
    if srs.ends_with("CRS84") {
        return Some(4326);
    }
    if !srs.to_ascii_uppercase().contains("EPSG") {
        return None;
    }
    let code = srs.rsplit(|c: char| !c.is_ascii_digit()).next()?;
    code.parse().ok()
}
