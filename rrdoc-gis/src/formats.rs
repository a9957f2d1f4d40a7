//! Registre des formats de sortie
//!
//! Profils d'écriture statiques pour les formats produits par la chaîne.
//! Le pipeline lit les extensions et options de création ici; les colonnes
//! de remplacement sont consommées par les appelants qui gèrent les
//! fichiers de sortie existants.

/// Profil d'écriture d'un format de sortie connu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteProfile {
    /// Nom de format du driver, tel que demandé par les appelants
    pub format: &'static str,

    /// Extension de fichier canonique, sans le point
    pub extension: &'static str,

    /// Indique si une sortie reprojetée a du sens pour ce format
    pub transform: bool,

    /// Indique si les artefacts existants doivent être remplacés plutôt
    /// que complétés
    pub replace: bool,

    /// Options de création passées au driver
    pub options: &'static [&'static str],
}

/// Formats de sortie connus et leurs profils d'écriture
pub const WRITE_PROFILES: &[WriteProfile] = &[
    WriteProfile {
        format: "MapInfo File",
        extension: "mif",
        transform: false,
        replace: true,
        options: &[],
    },
    WriteProfile {
        format: "GeoJSON",
        extension: "geojson",
        transform: true,
        replace: false,
        options: &["ENCODING=UTF8"],
    },
    WriteProfile {
        format: "ESRI Shapefile",
        extension: "shp",
        transform: false,
        replace: true,
        options: &[],
    },
    WriteProfile {
        format: "KML",
        extension: "kml",
        transform: false,
        replace: true,
        options: &[],
    },
    WriteProfile {
        format: "CSV",
        extension: "csv",
        transform: false,
        replace: false,
        options: &[],
    },
];

/// Cherche le profil d'écriture d'un nom de format
pub fn profile(format: &str) -> Option<&'static WriteProfile> {
    WRITE_PROFILES.iter().find(|p| p.format == format)
}

/// Résout l'extension de sortie d'un format, en repli sur l'extension par
/// défaut du driver quand le format n'a pas de profil
pub fn extension_for<'a>(format: &str, driver_default: &'a str) -> &'a str {
    match profile(format) {
        Some(p) => p.extension,
        None => driver_default,
    }
}
