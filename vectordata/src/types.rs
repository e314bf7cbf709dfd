//! Types de données pour le crate vectordata

use std::fmt;

use crate::geometry::Geometry;

/// Type déclaré d'un champ attributaire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Entier signé 64 bits
    Integer,
    /// Réel double précision
    Real,
    /// Texte
    String,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "Integer",
            FieldType::Real => "Real",
            FieldType::String => "String",
        }
    }

    /// Élargit le type pour accepter une nouvelle valeur brute
    ///
    /// Integer → Real → String, jamais dans l'autre sens.
    pub(crate) fn widen(self, raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return self;
        }
        match self {
            FieldType::String => FieldType::String,
            // "0001" est un code, pas un nombre
            _ if has_leading_zero(raw) => FieldType::String,
            FieldType::Integer if raw.parse::<i64>().is_ok() => FieldType::Integer,
            FieldType::Integer | FieldType::Real if raw.parse::<f64>().is_ok() => FieldType::Real,
            _ => FieldType::String,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn has_leading_zero(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.")
}

/// Définition d'un champ (nom + type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefn {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDefn {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Schéma attributaire d'une couche, partagé par toutes ses features
///
/// L'ordre et le type des champs sont figés à l'ouverture du jeu de données.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<FieldDefn>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDefn>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&FieldDefn> {
        self.fields.get(index)
    }

    /// Index du premier champ portant ce nom
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefn> {
        self.fields.iter()
    }
}

/// Valeur d'un champ pour une feature donnée
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    String(String),
}

impl FieldValue {
    /// Convertit une valeur brute selon le type déclaré du champ
    pub(crate) fn parse(raw: &str, field_type: FieldType) -> Option<Self> {
        if raw.trim().is_empty() && field_type != FieldType::String {
            return Some(FieldValue::Null);
        }
        match field_type {
            FieldType::Integer => raw.trim().parse().ok().map(FieldValue::Integer),
            FieldType::Real => raw.trim().parse().ok().map(FieldValue::Real),
            FieldType::String => Some(FieldValue::String(raw.to_string())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Représentation textuelle (chaîne vide pour Null)
    pub fn as_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Real(v) => v.to_string(),
            FieldValue::String(s) => s.clone(),
        }
    }
}

/// Une feature avec ses valeurs attributaires et sa géométrie
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifiant séquentiel dans la couche (ordre du fichier)
    pub fid: u64,

    /// Valeurs alignées sur le `FieldSchema` de la couche
    pub fields: Vec<FieldValue>,

    /// Géométrie (absente si la feature n'en porte pas)
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    pub fn field_as_string(&self, index: usize) -> Option<String> {
        self.fields.get(index).map(FieldValue::as_string)
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn take_geometry(&mut self) -> Option<Geometry> {
        self.geometry.take()
    }
}
