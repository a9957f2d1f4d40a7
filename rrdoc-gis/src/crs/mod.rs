//! Résolution des systèmes de coordonnées
//!
//! Les documents source marquent chaque feature avec un code de système de
//! coordonnées propre au projet. Le résolveur normalise ce code en une clé
//! de registre à six caractères, cherche la clé dans un [`CrsRegistry`] et
//! rend un [`SpatialRef`] opaque. La résolution n'interrompt jamais un
//! export: chaque échec dégrade en "pas de CRS" et la feature concernée
//! est écrite sans reprojection.

pub mod catalog;
pub mod engine;
pub mod transform;

use tracing::{debug, warn};

use rrdoc::Feature;

use crate::error::CrsError;

pub use catalog::CrsCatalog;
#[cfg(feature = "reproject")]
pub use engine::ProjRegistry;
pub use transform::{transform_geometry, CoordTransform, TransformCache};

/// Une référence spatiale résolue, opaque
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialRef {
    code: String,
    definition: String,
}

impl SpatialRef {
    /// Enveloppe un code de registre et sa définition de projection
    pub fn new(code: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            definition: definition.into(),
        }
    }

    /// Construit une référence non vérifiée pour un code EPSG connu
    pub fn from_epsg_code(code: u32) -> Self {
        let code = format!("EPSG:{}", code);
        Self {
            definition: code.clone(),
            code,
        }
    }

    /// Code de registre (clé normalisée ou identifiant EPSG)
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Définition de projection comprise par le moteur
    pub fn definition(&self) -> &str {
        &self.definition
    }
}

/// Options par appel pour la construction et l'application des
/// transformations
#[derive(Debug, Clone, Copy)]
pub struct TransformOptions {
    /// Garder les coordonnées qui survivent à une transformation
    /// partiellement échouée au lieu de rejeter toute la géométrie
    pub allow_partial: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            allow_partial: true,
        }
    }
}

/// Registre de définitions de coordonnées et fabrique de transformations.
///
/// Les implémentations sont construites explicitement et injectées dans
/// l'exporteur; rien n'enregistre d'état global au processus.
pub trait CrsRegistry {
    /// Résout une clé de registre normalisée en référence spatiale.
    ///
    /// # Errors
    ///
    /// [`CrsError::UnknownCode`] quand aucune définition n'est enregistrée
    /// sous la clé.
    fn spatial_ref(&self, key: &str) -> Result<SpatialRef, CrsError>;

    /// Construit une référence spatiale pour un code EPSG connu.
    ///
    /// # Errors
    ///
    /// [`CrsError::InvalidEpsg`] quand le moteur rejette le code.
    fn from_epsg(&self, code: u32) -> Result<SpatialRef, CrsError>;

    /// Construit une transformation de coordonnées entre deux références.
    fn transform(
        &self,
        source: &SpatialRef,
        target: &SpatialRef,
        options: &TransformOptions,
    ) -> Result<Box<dyn CoordTransform>, CrsError>;
}

/// Normalise un code source brut en clé de registre à six caractères.
///
/// Convention observée dans les documents source: les cinq premiers
/// caractères identifient la famille de systèmes et le premier chiffre du
/// reste, parsé comme entier signé, sélectionne la zone. Les codes qui ne
/// suivent pas la convention rendent `None`.
pub fn normalize_srid_code(raw: &str) -> Option<String> {
    let head = raw.get(..5)?;
    let tail: i64 = raw.get(5..)?.trim().parse().ok()?;
    let digit = tail.unsigned_abs().to_string().chars().next()?;
    Some(format!("{}{}", head, digit))
}

/// Résout le CRS source d'une feature, en dégradant en `None` sur tout échec
pub fn resolve_feature_srs(feature: &Feature, registry: &dyn CrsRegistry) -> Option<SpatialRef> {
    let raw = match feature.srid.as_deref() {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            debug!(object_type = %feature.object_type, "feature carries no srid");
            return None;
        }
    };

    let key = match normalize_srid_code(raw) {
        Some(key) => key,
        None => {
            debug!(srid = raw, "could not normalize srid code");
            return None;
        }
    };

    match registry.spatial_ref(&key) {
        Ok(srs) => Some(srs),
        Err(e) => {
            warn!(srid = raw, key = %key, error = %e, "could not resolve source CRS");
            None
        }
    }
}
