//! Résolution de l'identifiant d'un pand

use vectordata::{Feature, FieldSchema, FieldType};

use crate::error::SchemaError;

/// Champ portant l'identifiant BAG dans les exports GML
pub const PAND_ID_FIELD: &str = "gml_id";

/// Identifiant du pand (champ `gml_id`)
pub fn resolve_id(schema: &FieldSchema, feature: &Feature) -> Result<String, SchemaError> {
    resolve_field(schema, feature, PAND_ID_FIELD)
}

/// Valeur textuelle d'un champ de type String
///
/// Le premier champ portant ce nom fait foi. Une valeur nulle donne une chaîne vide.
pub fn resolve_field(
    schema: &FieldSchema,
    feature: &Feature,
    name: &str,
) -> Result<String, SchemaError> {
    let index = schema
        .index_of(name)
        .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))?;
    let defn = schema
        .field(index)
        .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))?;

    if defn.field_type != FieldType::String {
        return Err(SchemaError::UnexpectedFieldType {
            name: name.to_string(),
            found: defn.field_type,
        });
    }

    Ok(feature.field_as_string(index).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vectordata::{FieldDefn, FieldValue};

    fn feature(fields: Vec<FieldValue>) -> Feature {
        Feature {
            fid: 0,
            fields,
            geometry: None,
        }
    }

    #[test]
    fn test_resolve_id() {
        let schema = FieldSchema::new(vec![
            FieldDefn::new("bouwjaar", FieldType::Integer),
            FieldDefn::new("gml_id", FieldType::String),
        ]);
        let f = feature(vec![
            FieldValue::Integer(1900),
            FieldValue::String("0363100012345678".to_string()),
        ]);
        assert_eq!(resolve_id(&schema, &f).unwrap(), "0363100012345678");
    }

    #[test]
    fn test_field_not_found() {
        let schema = FieldSchema::new(vec![FieldDefn::new("id", FieldType::String)]);
        let f = feature(vec![FieldValue::String("1".to_string())]);
        assert_eq!(
            resolve_id(&schema, &f),
            Err(SchemaError::FieldNotFound("gml_id".to_string()))
        );
    }

    #[test]
    fn test_unexpected_field_type() {
        let schema = FieldSchema::new(vec![FieldDefn::new("gml_id", FieldType::Integer)]);
        let f = feature(vec![FieldValue::Integer(1)]);
        assert_eq!(
            resolve_id(&schema, &f),
            Err(SchemaError::UnexpectedFieldType {
                name: "gml_id".to_string(),
                found: FieldType::Integer,
            })
        );
    }

    #[test]
    fn test_value_is_not_escaped() {
        let schema = FieldSchema::new(vec![FieldDefn::new("naam", FieldType::String)]);
        let f = feature(vec![FieldValue::String(r#"De "Toren""#.to_string())]);
        assert_eq!(resolve_field(&schema, &f, "naam").unwrap(), r#"De "Toren""#);
    }
}
