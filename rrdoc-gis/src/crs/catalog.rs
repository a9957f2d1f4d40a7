//! Catalogue de définitions de coordonnées
//!
//! Associe les clés de registre à six caractères aux chaînes de paramètres
//! proj. La table embarquée porte les définitions de zones livrées avec le
//! système source; les zones propres à un site se chargent depuis des
//! fichiers au format init de PROJ.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::{CoordTransform, CrsRegistry, SpatialRef, TransformOptions};
use crate::error::CrsError;

/// Définitions de zones embarquées, format init de PROJ
const BUILTIN_DEFINITIONS: &str = include_str!("data/rrdoc");

/// Registre de définitions de projections indexées par code normalisé.
///
/// Implémente [`CrsRegistry`] sans moteur de projection: les références se
/// résolvent depuis la table, mais la construction de transformation
/// signale l'absence de la feature `reproject` et les exports retombent
/// sur les coordonnées source. Le registre adossé au moteur enveloppe un
/// catalogue (voir [`super::engine`]).
#[derive(Debug, Clone, Default)]
pub struct CrsCatalog {
    definitions: HashMap<String, String>,
}

impl CrsCatalog {
    /// Crée un catalogue vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Crée un catalogue préchargé avec les définitions de zones embarquées
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.extend_from_init(BUILTIN_DEFINITIONS);
        catalog
    }

    /// Enregistre une définition sous une clé normalisée, en remplaçant
    /// toute entrée précédente
    pub fn insert(&mut self, key: impl Into<String>, definition: impl Into<String>) {
        self.definitions.insert(key.into(), definition.into());
    }

    /// Retourne la définition enregistrée sous une clé
    pub fn get(&self, key: &str) -> Option<&str> {
        self.definitions.get(key).map(String::as_str)
    }

    /// Nombre de définitions enregistrées
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Indique si le catalogue ne contient aucune définition
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Charge des définitions depuis un fichier au format init de PROJ et
    /// retourne le nombre d'entrées ajoutées.
    ///
    /// # Errors
    ///
    /// Retourne [`CrsError::Io`] quand le fichier ne peut pas être lu.
    pub fn load_init_file(&mut self, path: &Path) -> Result<usize, CrsError> {
        let content = fs::read_to_string(path)?;
        Ok(self.extend_from_init(&content))
    }

    /// Parse du texte au format init de PROJ (`<KEY> +proj=... <>`) et
    /// retourne le nombre de définitions ajoutées. Les lignes malformées
    /// sont ignorées avec un avertissement.
    pub fn extend_from_init(&mut self, text: &str) -> usize {
        let mut added = 0;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_init_line(line) {
                Some((key, definition)) => {
                    self.insert(key, definition);
                    added += 1;
                }
                None => {
                    warn!(line = line_no + 1, "skipping malformed init line");
                }
            }
        }

        debug!(
            added,
            total = self.definitions.len(),
            "loaded projection definitions"
        );
        added
    }
}

impl CrsRegistry for CrsCatalog {
    fn spatial_ref(&self, key: &str) -> Result<SpatialRef, CrsError> {
        self.get(key)
            .map(|definition| SpatialRef::new(key, definition))
            .ok_or_else(|| CrsError::UnknownCode(key.to_string()))
    }

    fn from_epsg(&self, code: u32) -> Result<SpatialRef, CrsError> {
        // Sans moteur le code ne peut pas être validé; on rend la référence
        // et la construction de transformation signalera le manque
        Ok(SpatialRef::from_epsg_code(code))
    }

    fn transform(
        &self,
        _source: &SpatialRef,
        _target: &SpatialRef,
        _options: &TransformOptions,
    ) -> Result<Box<dyn CoordTransform>, CrsError> {
        Err(CrsError::Engine(
            "coordinate transforms require the 'reproject' feature. \
             Build with: cargo build --features reproject"
                .to_string(),
        ))
    }
}

/// Découpe une ligne init `<KEY> definition <>` en clé et définition
fn parse_init_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('<')?;
    let (key, rest) = rest.split_once('>')?;
    let definition = rest.strip_suffix("<>").unwrap_or(rest).trim();
    if key.is_empty() || definition.is_empty() {
        return None;
    }
    Some((key, definition))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_definitions_load() {
        let catalog = CrsCatalog::builtin();
        assert!(!catalog.is_empty());

        let moscow = catalog.get("773011").unwrap();
        assert!(moscow.contains("+proj=tmerc"));
        assert!(moscow.contains("+towgs84="));
    }

    #[test]
    fn test_every_builtin_definition_is_wgs84_anchored() {
        let catalog = CrsCatalog::builtin();
        for key in ["773011", "503011", "503012", "233011"] {
            let definition = catalog.get(key).unwrap();
            assert!(
                definition.contains("+towgs84="),
                "{} should carry a datum shift",
                key
            );
        }
    }

    #[test]
    fn test_init_line_parsing() {
        assert_eq!(
            parse_init_line("<503011> +proj=tmerc +lon_0=35.5 <>"),
            Some(("503011", "+proj=tmerc +lon_0=35.5"))
        );
        assert_eq!(
            parse_init_line("<503011> +proj=tmerc"),
            Some(("503011", "+proj=tmerc"))
        );
        assert_eq!(parse_init_line("503011 +proj=tmerc"), None);
        assert_eq!(parse_init_line("<> +proj=tmerc"), None);
        assert_eq!(parse_init_line("<503011> <>"), None);
    }

    #[test]
    fn test_extend_skips_comments_and_garbage() {
        let mut catalog = CrsCatalog::new();
        let added = catalog.extend_from_init(
            "# zone file\n\
             \n\
             <111111> +proj=tmerc +lon_0=33.5 <>\n\
             not an init line\n\
             <222222> +proj=tmerc +lon_0=36.5 <>\n",
        );

        assert_eq!(added, 2);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("111111").is_some());
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = CrsCatalog::new();
        catalog.insert("111111", "+proj=tmerc +lon_0=33.5");
        catalog.insert("111111", "+proj=tmerc +lon_0=34.5");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("111111"), Some("+proj=tmerc +lon_0=34.5"));
    }

    #[test]
    fn test_unknown_key_errors() {
        let catalog = CrsCatalog::builtin();
        match catalog.spatial_ref("000000") {
            Err(CrsError::UnknownCode(key)) => assert_eq!(key, "000000"),
            other => panic!("Expected UnknownCode, got {:?}", other),
        }
    }

    #[test]
    fn test_load_init_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones");
        fs::write(&path, "<333333> +proj=tmerc +lon_0=39.5 +ellps=krass <>\n").unwrap();

        let mut catalog = CrsCatalog::new();
        let added = catalog.load_init_file(&path).unwrap();

        assert_eq!(added, 1);
        assert!(catalog.get("333333").unwrap().contains("+ellps=krass"));
    }
}
