//! Mapping de schéma des features parsées vers les enregistrements de
//! sortie
//!
//! Le schéma de sortie est fixe par run: un emplacement par entrée du
//! vocabulaire d'attributs partagé, déclaré une fois sur la couche
//! fraîchement créée. L'identité des champs survit au renommage par le
//! driver parce que chaque champ logique garde le nom assigné par le
//! driver à la déclaration.

use geo::Geometry;
use geozero::wkt::Wkt;
use geozero::ToGeo;
use tracing::{debug, error};

use rrdoc::{names, Feature};

use crate::drivers::{FieldKind, Layer};
use crate::error::DatasourceError;

/// Un champ de sortie avec le nom que le driver lui a assigné
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Nom logique issu du vocabulaire partagé
    pub logical: String,

    /// Nom assigné par le driver à la déclaration
    pub assigned: String,
}

/// Un enregistrement de sortie mappé, prêt pour un appel d'écriture
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// Géométrie parsée (et éventuellement reprojetée), `None` quand la
    /// feature source ne portait pas de payload exploitable
    pub geometry: Option<Geometry<f64>>,

    /// Valeurs sous les noms de champs assignés par le driver, dans
    /// l'ordre de déclaration
    pub fields: Vec<(String, String)>,
}

impl Record {
    /// Indique si l'enregistrement porte une géométrie
    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Le schéma de sortie fixe d'un run d'export
#[derive(Debug, Clone)]
pub struct OutputSchema {
    bindings: Vec<FieldBinding>,
}

impl OutputSchema {
    /// Déclare le schéma fixe sur une couche fraîchement créée.
    ///
    /// Un champ par entrée du vocabulaire dans l'ordre du vocabulaire,
    /// l'emplacement géométrie typé géométrie et tout le reste texte.
    ///
    /// # Errors
    ///
    /// Propage le premier échec de déclaration de champ.
    pub fn declare(layer: &mut dyn Layer) -> Result<Self, DatasourceError> {
        let mut bindings = Vec::with_capacity(names::ATTRIBUTES.len());

        for &logical in names::ATTRIBUTES {
            let kind = if logical == names::GEOMETRY_FIELD {
                FieldKind::Geometry
            } else {
                FieldKind::Text
            };
            let assigned = layer.add_field(logical, kind)?;
            bindings.push(FieldBinding {
                logical: logical.to_string(),
                assigned,
            });
        }

        Ok(Self { bindings })
    }

    /// Liaisons de champs dans l'ordre de déclaration
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// Mappe une feature vers un enregistrement de sortie.
    ///
    /// Les échecs par champ sont journalisés avec le nom du champ et la
    /// valeur fautive et laissent l'emplacement vide; ils n'interrompent
    /// jamais le reste de l'enregistrement. Les valeurs d'attributs
    /// absentes ou non renseignées sont sautées.
    pub fn map_feature(&self, feature: &Feature) -> Record {
        let mut record = Record::default();

        for binding in &self.bindings {
            if binding.logical == names::GEOMETRY_FIELD {
                record.geometry = map_geometry(feature);
            } else if let Some(value) = feature.attribute(&binding.logical) {
                if value.is_empty() {
                    continue;
                }
                record
                    .fields
                    .push((binding.assigned.clone(), value.to_string()));
            }
        }

        record
    }
}

/// Parse le payload WKT, en laissant l'emplacement vide sur entrée vide ou
/// invalide
fn map_geometry(feature: &Feature) -> Option<Geometry<f64>> {
    if !feature.has_geometry() {
        debug!(object_type = %feature.object_type, "feature carries no geometry");
        return None;
    }

    match Wkt(feature.geometry.as_str()).to_geo() {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            error!(
                field = names::GEOMETRY_FIELD,
                value = %feature.geometry,
                error = %e,
                "failed to map field"
            );
            None
        }
    }
}
