//! Types d'erreurs pour le parsing de documents

use thiserror::Error;

/// Erreurs pouvant survenir lors du parsing d'un extrait
#[derive(Debug, Error)]
pub enum ParseError {
    /// Erreur d'I/O lors de la lecture du document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Type de document reconnu mais non pris en charge
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    /// Version de schéma reconnue mais non prise en charge
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(String),

    /// Structure du document incohérente avec le type déclaré
    #[error("Malformed document: {0}")]
    Malformed(String),
}
