//! Types de données partagés entre parsers et exporteurs

use std::collections::HashMap;
use std::fmt;

/// Un objet géospatial parsé depuis un extrait
#[derive(Debug, Clone, Default)]
pub struct Feature {
    /// Tag de type d'objet (voir [`crate::names::OBJECT_TYPES`])
    pub object_type: String,

    /// Code de système de coordonnées source, absent ou malformé dans
    /// certains documents
    pub srid: Option<String>,

    /// Géométrie en well-known text, vide quand l'objet n'en porte pas
    pub geometry: String,

    /// Valeurs d'attributs indexées par nom de champ logique
    pub attributes: HashMap<String, Value>,
}

impl Feature {
    /// Retourne la valeur d'attribut pour un nom de champ logique
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Indique si l'objet porte une géométrie
    pub fn has_geometry(&self) -> bool {
        !self.geometry.is_empty()
    }
}

/// Valeur d'attribut portée par une feature parsée
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Texte libre
    Text(String),

    /// Attribut entier (compteurs, codes)
    Int(i64),

    /// Attribut flottant (surfaces, coûts)
    Float(f64),
}

impl Value {
    /// Indique si la valeur compte comme non renseignée pour l'export.
    ///
    /// Les documents source remplissent les champs vides avec des chaînes
    /// vides ou des zéros; les exporteurs laissent ces champs hors de
    /// l'enregistrement de sortie.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Text(s) => s.is_empty(),
            Value::Int(n) => *n == 0,
            Value::Float(x) => *x == 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(Value::Text(String::new()).is_empty());
        assert!(Value::Int(0).is_empty());
        assert!(Value::Float(0.0).is_empty());

        assert!(!Value::Text("50:21:0110501:330".to_string()).is_empty());
        assert!(!Value::Int(-3).is_empty());
        assert!(!Value::Float(1245.6).is_empty());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("text").to_string(), "text");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(12.5).to_string(), "12.5");
    }

    #[test]
    fn test_feature_geometry_presence() {
        let mut feature = Feature::default();
        assert!(!feature.has_geometry());

        feature.geometry = "POINT (37.61 55.75)".to_string();
        assert!(feature.has_geometry());
    }

    #[test]
    fn test_feature_attribute_lookup() {
        let mut feature = Feature::default();
        feature
            .attributes
            .insert("area".to_string(), Value::from(600.0));

        assert_eq!(feature.attribute("area"), Some(&Value::Float(600.0)));
        assert_eq!(feature.attribute("address"), None);
    }
}
