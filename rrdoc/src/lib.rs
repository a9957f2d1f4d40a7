//! # rrdoc
//!
//! Modèle de données et contrat de parsing pour les extraits Rosreestr.
//!
//! ## Features
//!
//! - Modèle `Feature` partagé entre parsers de documents et exporteurs
//! - Vocabulaire d'attributs fixe et tags de types d'objets connus
//! - Trait `DocumentParser` produisant des flux paresseux de features
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rrdoc::{DocumentParser, ParseHints};
//! use std::path::Path;
//!
//! let hints = ParseHints::default();
//! let features = parser.parse(Path::new("extract.xml"), &hints)?;
//!
//! for feature in features {
//!     println!("{}: {} attributes", feature.object_type, feature.attributes.len());
//! }
//! ```

pub mod error;
pub mod names;
pub mod parser;
pub mod types;

pub use error::ParseError;
pub use parser::{DocumentParser, FeatureStream, ParseHints};
pub use types::{Feature, Value};
