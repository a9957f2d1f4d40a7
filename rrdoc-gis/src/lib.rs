//! # rrdoc-gis
//!
//! Pipeline d'export des documents cadastraux Rosreestr parsés vers des
//! datasets SIG.
//!
//! Le crate prend le flux de features produit par un
//! [`rrdoc::DocumentParser`] et l'écrit à travers une couche de drivers
//! interchangeables, un dataset par run avec un schéma d'attributs fixe.
//! Les systèmes de coordonnées sont résolus depuis les codes de zone
//! portés par chaque feature, contre un catalogue embarqué de définitions
//! régionales, et les géométries peuvent être reprojetées vers un code
//! EPSG cible quand le feature `reproject` est activé.
//!
//! ## Features
//!
//! - Mapping de géométries WKT avec récupération d'erreur par
//!   enregistrement
//! - Schéma de sortie fixe sur le vocabulaire d'attributs partagé
//! - Normalisation des codes de zone et résolution CRS depuis un
//!   catalogue au format init PROJ
//! - Reprojection optionnelle via PROJ (feature `reproject`), avec cache
//!   de transformations et repli en conversion partielle
//! - Registre de drivers avec écritures transactionnelles et rapport
//!   d'artefacts multi-fichiers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! use rrdoc_gis::crs::CrsCatalog;
//! use rrdoc_gis::{DriverRegistry, ExportOptions, Exporter, MemoryDriver};
//!
//! let mut drivers = DriverRegistry::new();
//! drivers.register(Box::new(MemoryDriver::new()));
//!
//! let exporter = Exporter::new(
//!     Box::new(ExtractParser::new()),
//!     drivers,
//!     Box::new(CrsCatalog::builtin()),
//! );
//!
//! let options = ExportOptions {
//!     object_type: Some("Parcel".to_string()),
//!     ..Default::default()
//! };
//! let artifacts = exporter.export(Path::new("extract.xml"), "parcels", "Memory", &options)?;
//! ```

pub mod crs;
pub mod drivers;
pub mod error;
pub mod export;
pub mod formats;
pub mod schema;

pub use drivers::{Datastore, DriverRegistry, FieldKind, GisDriver, Layer, MemoryDriver};
pub use error::{CrsError, DatasourceError, ExportError};
pub use export::{ExportOptions, Exporter};
pub use formats::{WriteProfile, WRITE_PROFILES};
pub use schema::{FieldBinding, OutputSchema, Record};
