//! Contrat de parsing consommé par les exporteurs

use std::path::Path;

use crate::error::ParseError;
use crate::types::Feature;

/// Flux paresseux de features parsées, dans l'ordre du document
pub type FeatureStream<'a> = Box<dyn Iterator<Item = Feature> + 'a>;

/// Indications optionnelles précisant comment parser un document
#[derive(Debug, Clone, Default)]
pub struct ParseHints {
    /// Type de document attendu, quand l'appelant le connaît
    pub document_type: Option<String>,

    /// Version de schéma du document attendue
    pub document_version: Option<String>,
}

/// Un parser produisant des features depuis un extrait.
///
/// Les parsers concrets vivent hors de ce workspace; les exporteurs ne
/// dépendent que du trait et traitent tout échec de parsing comme fatal
/// pour le document concerné.
pub trait DocumentParser {
    /// Parse un document en un flux paresseux de features.
    ///
    /// # Errors
    ///
    /// Retourne [`ParseError::UnsupportedType`] ou
    /// [`ParseError::UnsupportedVersion`] quand le document est reconnu mais
    /// non pris en charge, [`ParseError::Malformed`] quand sa structure ne
    /// correspond pas au type déclaré, et [`ParseError::Io`] quand il ne
    /// peut pas être lu.
    fn parse<'a>(
        &'a self,
        document: &Path,
        hints: &ParseHints,
    ) -> Result<FeatureStream<'a>, ParseError>;
}
