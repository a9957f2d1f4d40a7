//! Types d'erreurs pour le pipeline d'export

use thiserror::Error;

use rrdoc::ParseError;

/// Erreurs fatales levées par un run d'export.
///
/// Tout le reste (mapping par feature, résolution CRS, écritures
/// d'enregistrements) dégrade en "ignorer et continuer" dans le pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Aucun driver enregistré pour le format demandé
    #[error("No driver registered for format '{format}' (available: {available})")]
    UnknownDriver { format: String, available: String },

    /// La source de données n'a pas pu être créée, déclarée ou finalisée
    #[error(transparent)]
    Datasource(#[from] DatasourceError),

    /// Le CRS cible explicite n'a pas pu être construit
    #[error("Invalid target CRS EPSG:{code}: {source}")]
    TargetCrs { code: u32, source: CrsError },

    /// Le parsing du document a échoué
    #[error("Document parsing failed: {0}")]
    Parse(#[from] ParseError),
}

/// Erreurs levées par les drivers de sortie
#[derive(Debug, Error)]
pub enum DatasourceError {
    /// Échec de création de la source de données
    #[error("Failed to create datastore at {path}: {reason}")]
    Create { path: String, reason: String },

    /// Échec de création de la couche
    #[error("Failed to create layer '{name}': {reason}")]
    Layer { name: String, reason: String },

    /// Échec de déclaration d'un champ
    #[error("Failed to declare field '{name}': {reason}")]
    Field { name: String, reason: String },

    /// Géométrie rejetée à l'écriture
    #[error("Geometry rejected: {0}")]
    Geometry(String),

    /// Échec d'écriture d'un enregistrement
    #[error("Record write failed: {0}")]
    Write(String),

    /// Erreur d'I/O côté driver
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasourceError {
    /// Crée une erreur de création de source avec contexte
    pub fn create(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Create {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de création de couche avec contexte
    pub fn layer(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Layer {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de déclaration de champ avec contexte
    pub fn field(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Erreurs de résolution de systèmes de coordonnées ou de construction de
/// transformations
#[derive(Debug, Error)]
pub enum CrsError {
    /// Aucune définition de projection enregistrée sous la clé normalisée
    #[error("Unknown coordinate system code: {0}")]
    UnknownCode(String),

    /// Code EPSG rejeté par le moteur de projection
    #[error("Invalid EPSG code: {0}")]
    InvalidEpsg(u32),

    /// Échec du moteur de projection (initialisation ou conversion)
    #[error("Projection engine error: {0}")]
    Engine(String),

    /// La transformation n'a produit aucun résultat utilisable
    #[error("Coordinate transform failed: {0}")]
    Transform(String),

    /// Le fichier de définitions n'a pas pu être lu
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
