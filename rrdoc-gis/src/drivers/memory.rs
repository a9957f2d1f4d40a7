//! Driver de sortie en mémoire
//!
//! Range les jeux de données dans une map partagée en processus au lieu de
//! fichiers. Les exports tournent dessus exactement comme sur un driver
//! fichier, et les tests inspectent ensuite les couches écrites via
//! [`MemoryDriver::store`]. Les enregistrements écrits dans une
//! transaction ouverte deviennent visibles au commit; un buffer non commité
//! est perdu quand la couche disparaît.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::{Datastore, FieldKind, GisDriver, Layer};
use crate::crs::SpatialRef;
use crate::error::DatasourceError;
use crate::schema::Record;

type SharedStores = Arc<Mutex<HashMap<PathBuf, MemoryStore>>>;

/// Instantané d'une couche écrite
#[derive(Debug, Clone, Default)]
pub struct MemoryLayerData {
    /// Nom de la couche
    pub name: String,

    /// CRS avec lequel la couche a été créée
    pub srs: Option<SpatialRef>,

    /// Options de création passées par le pipeline
    pub options: Vec<String>,

    /// Champs déclarés avec leurs noms assignés, dans l'ordre de
    /// déclaration
    pub fields: Vec<(String, FieldKind)>,

    /// Enregistrements commités
    pub records: Vec<Record>,

    /// Indique si la couche a été poussée
    pub synced: bool,
}

/// Instantané d'un datastore mémoire
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Couches dans l'ordre de création
    pub layers: Vec<MemoryLayerData>,

    /// Indique si le datastore a été fermé
    pub closed: bool,
}

/// Driver gardant les datastores en mémoire, inspectables après fermeture
#[derive(Clone, Default)]
pub struct MemoryDriver {
    stores: SharedStores,
    name_limit: Option<usize>,
}

impl MemoryDriver {
    /// Crée un driver avec une map de stores vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Crée un driver qui tronque les noms de champs assignés, comme le
    /// font les formats à longueur limitée
    pub fn with_name_limit(limit: usize) -> Self {
        Self {
            stores: SharedStores::default(),
            name_limit: Some(limit),
        }
    }

    /// Instantané du datastore créé à un chemin
    pub fn store(&self, path: &Path) -> Option<MemoryStore> {
        lock(&self.stores).get(path).cloned()
    }

    /// Chemins de tous les datastores créés via ce driver, triés
    pub fn store_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = lock(&self.stores).keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl GisDriver for MemoryDriver {
    fn format_name(&self) -> &str {
        "Memory"
    }

    fn default_extension(&self) -> &str {
        "mem"
    }

    fn create(&self, path: &Path) -> Result<Box<dyn Datastore>, DatasourceError> {
        debug!(path = %path.display(), "creating memory datastore");
        lock(&self.stores).insert(path.to_path_buf(), MemoryStore::default());

        Ok(Box::new(MemoryDatastore {
            stores: Arc::clone(&self.stores),
            path: path.to_path_buf(),
            name_limit: self.name_limit,
        }))
    }
}

struct MemoryDatastore {
    stores: SharedStores,
    path: PathBuf,
    name_limit: Option<usize>,
}

impl Datastore for MemoryDatastore {
    fn create_layer<'a>(
        &'a mut self,
        name: &str,
        srs: Option<&SpatialRef>,
        options: &[&str],
    ) -> Result<Box<dyn Layer + 'a>, DatasourceError> {
        let mut stores = lock(&self.stores);
        let store = stores
            .get_mut(&self.path)
            .ok_or_else(|| DatasourceError::layer(name, "memory datastore is gone"))?;

        store.layers.push(MemoryLayerData {
            name: name.to_string(),
            srs: srs.cloned(),
            options: options.iter().map(|s| s.to_string()).collect(),
            ..MemoryLayerData::default()
        });
        let layer_index = store.layers.len() - 1;
        drop(stores);

        Ok(Box::new(MemoryLayer {
            stores: Arc::clone(&self.stores),
            path: self.path.clone(),
            layer_index,
            name_limit: self.name_limit,
            buffer: Vec::new(),
            in_transaction: false,
        }))
    }

    fn sync(&mut self) -> Result<(), DatasourceError> {
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), DatasourceError> {
        let mut stores = lock(&self.stores);
        if let Some(store) = stores.get_mut(&self.path) {
            store.closed = true;
        }
        Ok(())
    }
}

struct MemoryLayer {
    stores: SharedStores,
    path: PathBuf,
    layer_index: usize,
    name_limit: Option<usize>,
    buffer: Vec<Record>,
    in_transaction: bool,
}

impl MemoryLayer {
    fn with_layer<R>(
        &self,
        f: impl FnOnce(&mut MemoryLayerData) -> R,
    ) -> Result<R, DatasourceError> {
        let mut stores = lock(&self.stores);
        let store = stores
            .get_mut(&self.path)
            .ok_or_else(|| DatasourceError::Write("memory datastore is gone".to_string()))?;
        let layer = store
            .layers
            .get_mut(self.layer_index)
            .ok_or_else(|| DatasourceError::Write("memory layer is gone".to_string()))?;
        Ok(f(layer))
    }
}

impl Layer for MemoryLayer {
    fn add_field(&mut self, name: &str, kind: FieldKind) -> Result<String, DatasourceError> {
        let assigned = match self.name_limit {
            Some(limit) => name.chars().take(limit).collect(),
            None => name.to_string(),
        };

        self.with_layer(|layer| layer.fields.push((assigned.clone(), kind)))?;
        Ok(assigned)
    }

    fn begin_transaction(&mut self) -> Result<(), DatasourceError> {
        self.in_transaction = true;
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), DatasourceError> {
        let buffered = std::mem::take(&mut self.buffer);
        self.in_transaction = false;
        self.with_layer(|layer| layer.records.extend(buffered))
    }

    fn write_record(&mut self, record: Record) -> Result<(), DatasourceError> {
        if self.in_transaction {
            self.buffer.push(record);
            return Ok(());
        }
        self.with_layer(|layer| layer.records.push(record))
    }

    fn sync(&mut self) -> Result<(), DatasourceError> {
        self.with_layer(|layer| layer.synced = true)
    }
}

fn lock(stores: &SharedStores) -> MutexGuard<'_, HashMap<PathBuf, MemoryStore>> {
    stores.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
