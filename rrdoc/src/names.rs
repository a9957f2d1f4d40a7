//! Vocabulaires partagés de champs et de types d'objets
//!
//! Parsers et exporteurs s'accordent sur ces noms: les parsers remplissent
//! [`crate::Feature::attributes`] avec les entrées de [`ATTRIBUTES`] comme
//! clés, et le schéma d'export déclare ses champs de sortie exactement dans
//! cet ordre.

/// Nom logique du champ géométrie dans le schéma d'export
pub const GEOMETRY_FIELD: &str = "geometry";

/// Schéma d'export fixe: le champ géométrie suivi du vocabulaire
/// d'attributs, dans l'ordre de déclaration des champs de sortie
pub const ATTRIBUTES: &[&str] = &[
    GEOMETRY_FIELD,
    "cad_number",
    "address",
    "area",
    "category",
    "permitted_use",
    "cadastral_cost",
    "status",
    "date_created",
];

/// Tags de types d'objets émis par les parsers de documents
pub const OBJECT_TYPES: &[&str] = &[
    "Parcel",
    "Building",
    "Construction",
    "UnderConstruction",
    "Room",
    "Boundary",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_geometry_field_declared_first() {
        assert_eq!(ATTRIBUTES[0], GEOMETRY_FIELD);
    }

    #[test]
    fn test_attribute_names_unique() {
        let unique: HashSet<&str> = ATTRIBUTES.iter().copied().collect();
        assert_eq!(unique.len(), ATTRIBUTES.len());
    }

    #[test]
    fn test_object_types_do_not_overlap_attributes() {
        for object_type in OBJECT_TYPES {
            assert!(!ATTRIBUTES.contains(object_type));
        }
    }
}
