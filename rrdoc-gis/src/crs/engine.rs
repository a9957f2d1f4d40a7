//! Registre de coordonnées adossé à PROJ
//!
//! Le registre lui-même n'existe qu'avec la feature `reproject`; la sonde
//! [`is_available`] compile dans tous les cas.

#[cfg(feature = "reproject")]
use proj::Proj;
#[cfg(feature = "reproject")]
use tracing::debug;

#[cfg(feature = "reproject")]
use super::{CoordTransform, CrsCatalog, CrsRegistry, SpatialRef, TransformOptions};
#[cfg(feature = "reproject")]
use crate::error::CrsError;

/// Indique si la reprojection adossée au moteur a été compilée
pub fn is_available() -> bool {
    cfg!(feature = "reproject")
}

/// Registre adossé au moteur, résolvant ses définitions depuis un catalogue.
///
/// La résolution se comporte exactement comme le catalogue nu; la
/// construction de transformations et la validation EPSG passent par PROJ.
#[cfg(feature = "reproject")]
pub struct ProjRegistry {
    catalog: CrsCatalog,
}

#[cfg(feature = "reproject")]
impl ProjRegistry {
    /// Enveloppe un catalogue de définitions avec le moteur PROJ
    pub fn new(catalog: CrsCatalog) -> Self {
        Self { catalog }
    }

    /// Registre adossé au moteur sur les définitions de zones embarquées
    pub fn builtin() -> Self {
        Self::new(CrsCatalog::builtin())
    }

    /// Le catalogue de définitions enveloppé
    pub fn catalog(&self) -> &CrsCatalog {
        &self.catalog
    }
}

#[cfg(feature = "reproject")]
impl CrsRegistry for ProjRegistry {
    fn spatial_ref(&self, key: &str) -> Result<SpatialRef, CrsError> {
        self.catalog.spatial_ref(key)
    }

    fn from_epsg(&self, code: u32) -> Result<SpatialRef, CrsError> {
        let srs = SpatialRef::from_epsg_code(code);
        // Validation immédiate pour qu'un code inconnu fasse échouer le
        // run, pas chaque enregistrement
        Proj::new_known_crs(srs.definition(), srs.definition(), None)
            .map_err(|_| CrsError::InvalidEpsg(code))?;
        Ok(srs)
    }

    fn transform(
        &self,
        source: &SpatialRef,
        target: &SpatialRef,
        _options: &TransformOptions,
    ) -> Result<Box<dyn CoordTransform>, CrsError> {
        debug!(
            source = source.code(),
            target = target.code(),
            "creating PROJ transform"
        );
        let proj = Proj::new_known_crs(source.definition(), target.definition(), None)
            .map_err(|e| CrsError::Engine(e.to_string()))?;
        Ok(Box::new(ProjTransform { proj }))
    }
}

/// Transformation de coordonnées portée par une conversion PROJ
#[cfg(feature = "reproject")]
struct ProjTransform {
    proj: Proj,
}

#[cfg(feature = "reproject")]
impl CoordTransform for ProjTransform {
    fn transform_coord(&self, coord: (f64, f64)) -> Result<(f64, f64), CrsError> {
        self.proj
            .convert(coord)
            .map_err(|e| CrsError::Transform(e.to_string()))
    }

    fn transform_slice(&self, coords: &mut [(f64, f64)]) -> Result<(), CrsError> {
        // Conversion par lot, bien plus rapide que point par point
        self.proj
            .convert_array(coords)
            .map_err(|e| CrsError::Transform(e.to_string()))?;
        Ok(())
    }
}
