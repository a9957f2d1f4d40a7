//! Abstraction des drivers de sortie
//!
//! Rend l'ensemble des capacités backend (créer un datastore, créer une
//! couche avec CRS et champs, écritures transactionnelles, flush et
//! fermeture) sous forme de traits object-safe. Les drivers s'enregistrent
//! dans un [`DriverRegistry`] construit explicitement; les drivers de
//! formats fichiers concrets vivent hors de ce workspace, le driver
//! mémoire est livré ici pour les tests et les benches.

pub mod memory;

use std::collections::BTreeMap;
use std::path::Path;

use crate::crs::SpatialRef;
use crate::error::DatasourceError;
use crate::schema::Record;

pub use memory::MemoryDriver;

/// Type d'un champ de sortie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Champ géométrie générique
    Geometry,

    /// Champ texte
    Text,
}

/// Un driver produisant des jeux de données dans un format de sortie
pub trait GisDriver {
    /// Nom de format du driver, tel que demandé par les appelants
    fn format_name(&self) -> &str;

    /// Extension utilisée quand le format n'a pas de profil d'écriture
    fn default_extension(&self) -> &str;

    /// Ouvre ou crée un datastore à un chemin.
    ///
    /// # Errors
    ///
    /// [`DatasourceError::Create`] quand le chemin ne peut pas être ouvert
    /// en écriture.
    fn create(&self, path: &Path) -> Result<Box<dyn Datastore>, DatasourceError>;
}

/// Un datastore de sortie ouvert
pub trait Datastore {
    /// Crée une couche avec CRS optionnel et options de création.
    fn create_layer<'a>(
        &'a mut self,
        name: &str,
        srs: Option<&SpatialRef>,
        options: &[&str],
    ) -> Result<Box<dyn Layer + 'a>, DatasourceError>;

    /// Pousse les écritures en attente vers le stockage.
    fn sync(&mut self) -> Result<(), DatasourceError>;

    /// Pousse puis ferme le datastore.
    fn close(self: Box<Self>) -> Result<(), DatasourceError>;
}

/// Une couche de sortie ouverte
pub trait Layer {
    /// Déclare un champ et retourne le nom que le driver a réellement
    /// assigné.
    ///
    /// Les drivers peuvent renommer ou tronquer; les appelants doivent
    /// ensuite adresser le champ par le nom retourné.
    fn add_field(&mut self, name: &str, kind: FieldKind) -> Result<String, DatasourceError>;

    /// Ouvre une transaction d'écriture.
    fn begin_transaction(&mut self) -> Result<(), DatasourceError>;

    /// Valide la transaction d'écriture ouverte.
    fn commit_transaction(&mut self) -> Result<(), DatasourceError>;

    /// Écrit un enregistrement mappé.
    fn write_record(&mut self, record: Record) -> Result<(), DatasourceError>;

    /// Pousse la couche.
    fn sync(&mut self) -> Result<(), DatasourceError>;
}

/// Registre de drivers de sortie construit explicitement
#[derive(Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<String, Box<dyn GisDriver>>,
}

impl DriverRegistry {
    /// Crée un registre vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre un driver sous son nom de format, en remplaçant tout
    /// driver précédent
    pub fn register(&mut self, driver: Box<dyn GisDriver>) {
        self.drivers.insert(driver.format_name().to_string(), driver);
    }

    /// Retourne le driver enregistré pour un nom de format
    pub fn get(&self, format: &str) -> Option<&dyn GisDriver> {
        self.drivers.get(format).map(|driver| driver.as_ref())
    }

    /// Noms de formats enregistrés, triés
    pub fn format_names(&self) -> Vec<&str> {
        self.drivers.keys().map(String::as_str).collect()
    }

    /// Nombre de drivers enregistrés
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Indique si aucun driver n'est enregistré
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = DriverRegistry::new();
        assert!(registry.is_empty());

        registry.register(Box::new(MemoryDriver::new()));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("Memory").is_some());
        assert!(registry.get("GeoJSON").is_none());
    }

    #[test]
    fn test_format_names_sorted() {
        struct Named(&'static str);

        impl GisDriver for Named {
            fn format_name(&self) -> &str {
                self.0
            }

            fn default_extension(&self) -> &str {
                "dat"
            }

            fn create(&self, path: &Path) -> Result<Box<dyn Datastore>, DatasourceError> {
                Err(DatasourceError::create(path.display().to_string(), "stub"))
            }
        }

        let mut registry = DriverRegistry::new();
        registry.register(Box::new(Named("KML")));
        registry.register(Box::new(Named("CSV")));
        registry.register(Box::new(Named("GeoJSON")));

        assert_eq!(registry.format_names(), vec!["CSV", "GeoJSON", "KML"]);
    }

    #[test]
    fn test_register_replaces_same_format() {
        let mut registry = DriverRegistry::new();
        registry.register(Box::new(MemoryDriver::new()));
        registry.register(Box::new(MemoryDriver::new()));

        assert_eq!(registry.len(), 1);
    }
}
