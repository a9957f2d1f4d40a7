//! Pipeline d'export des documents parsés vers les jeux de données SIG
//!
//! Un [`Exporter`] porte le parser, le registre de drivers et le registre
//! CRS d'un run. [`Exporter::export`] conduit le pipeline complet: parser,
//! créer le jeu de données, déclarer le schéma, mapper et écrire chaque
//! enregistrement dans une transaction, puis finaliser et rapporter les
//! artefacts. Les problèmes par enregistrement sont journalisés et sautés;
//! seuls les échecs au niveau datasource interrompent le run.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use geo::Geometry;
use tracing::{debug, error, info, warn};

use rrdoc::{DocumentParser, Feature, ParseHints};

use crate::crs::{
    resolve_feature_srs, transform_geometry, CrsRegistry, SpatialRef, TransformCache,
    TransformOptions,
};
use crate::drivers::{DriverRegistry, Layer};
use crate::error::{DatasourceError, ExportError};
use crate::formats;
use crate::schema::OutputSchema;

/// Options d'export par run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Ne garder que les features de ce type d'objet
    pub object_type: Option<String>,

    /// Écrire les enregistrements dont la géométrie n'a pas pu être mappée
    pub include_empty: bool,

    /// Reprojeter chaque géométrie vers ce code EPSG
    pub target_crs: Option<u32>,

    /// Indication de type de document passée au parser
    pub document_type: Option<String>,

    /// Indication de version de document passée au parser
    pub document_version: Option<String>,

    /// Garder les coordonnées qu'une transformation a pu convertir et
    /// écarter le reste au lieu de faire échouer la géométrie entière
    pub partial_reprojection: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            object_type: None,
            include_empty: false,
            target_crs: None,
            document_type: None,
            document_version: None,
            partial_reprojection: true,
        }
    }
}

impl ExportOptions {
    fn parse_hints(&self) -> ParseHints {
        ParseHints {
            document_type: self.document_type.clone(),
            document_version: self.document_version.clone(),
        }
    }

    fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            allow_partial: self.partial_reprojection,
        }
    }
}

/// Compteurs d'écriture par run
#[derive(Debug, Default)]
struct WriteOutcome {
    written: usize,
    skipped_empty: usize,
    filtered: usize,
    failed: usize,
}

/// Conduit les exports des documents source vers les jeux de données SIG
pub struct Exporter {
    parser: Box<dyn DocumentParser>,
    drivers: DriverRegistry,
    crs: Box<dyn CrsRegistry>,
}

impl Exporter {
    /// Crée un exporteur sur un parser, un registre de drivers et un
    /// registre CRS
    pub fn new(
        parser: Box<dyn DocumentParser>,
        drivers: DriverRegistry,
        crs: Box<dyn CrsRegistry>,
    ) -> Self {
        Self {
            parser,
            drivers,
            crs,
        }
    }

    /// Exporte un document vers un jeu de données à côté de lui.
    ///
    /// Le jeu de données est nommé `base_name` plus l'extension du format
    /// et créé dans le répertoire du document. Retourne les chemins de
    /// chaque fichier produit par le run.
    ///
    /// # Errors
    ///
    /// Échoue quand le document ne peut pas être parsé, quand le format n'a
    /// pas de driver enregistré, quand le CRS cible est inconnu ou quand la
    /// datasource rapporte un échec.
    pub fn export(
        &self,
        document: &Path,
        base_name: &str,
        format: &str,
        options: &ExportOptions,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let hints = options.parse_hints();
        let features = match self.parser.parse(document, &hints) {
            Ok(features) => features,
            Err(e) => {
                error!(document = %document.display(), error = %e, "failed to parse document");
                return Err(ExportError::Parse(e));
            }
        };

        self.export_features(features, document, base_name, format, options)
    }

    /// Exporte un flux de features déjà parsé.
    ///
    /// Même pipeline que [`export`](Self::export) à partir de la création
    /// du jeu de données.
    ///
    /// # Errors
    ///
    /// Échoue quand le format n'a pas de driver enregistré, quand le CRS
    /// cible est inconnu ou quand la datasource rapporte un échec.
    pub fn export_features<I>(
        &self,
        features: I,
        document: &Path,
        base_name: &str,
        format: &str,
        options: &ExportOptions,
    ) -> Result<Vec<PathBuf>, ExportError>
    where
        I: IntoIterator<Item = Feature>,
    {
        let driver = match self.drivers.get(format) {
            Some(driver) => driver,
            None => {
                return Err(ExportError::UnknownDriver {
                    format: format.to_string(),
                    available: self.drivers.format_names().join(", "),
                })
            }
        };

        let profile = formats::profile(format);
        let extension = formats::extension_for(format, driver.default_extension());
        let out_path = output_path(document, base_name, extension);

        info!(
            document = %document.display(),
            dataset = %out_path.display(),
            format,
            "starting export"
        );

        let mut features = features.into_iter().peekable();

        // Le CRS de couche vient de la cible quand on reprojette, sinon du
        // premier enregistrement du flux. Une cible invalide est fatale et
        // doit échouer avant que quoi que ce soit touche le disque.
        let layer_srs = match options.target_crs {
            Some(code) => Some(
                self.crs
                    .from_epsg(code)
                    .map_err(|source| ExportError::TargetCrs { code, source })?,
            ),
            None => features
                .peek()
                .and_then(|first| resolve_feature_srs(first, self.crs.as_ref())),
        };
        let target_srs = if options.target_crs.is_some() {
            layer_srs.as_ref()
        } else {
            None
        };

        let mut store = driver.create(&out_path).map_err(ExportError::Datasource)?;

        let layer_options = profile.map(|p| p.options).unwrap_or(&[]);
        let mut layer = store
            .create_layer(&layer_name(document, base_name), layer_srs.as_ref(), layer_options)
            .map_err(ExportError::Datasource)?;

        let schema = OutputSchema::declare(layer.as_mut()).map_err(ExportError::Datasource)?;

        layer.begin_transaction().map_err(ExportError::Datasource)?;
        let outcome = self.write_features(features, layer.as_mut(), &schema, target_srs, options);

        // Dérouler chaque étape de finalisation avant de rapporter le
        // premier échec, pour qu'une erreur de commit laisse quand même le
        // datastore synchronisé et fermé.
        let committed = layer.commit_transaction();
        let layer_synced = layer.sync();
        drop(layer);
        let store_synced = store.sync();
        let closed = store.close();

        committed?;
        layer_synced?;
        store_synced?;
        closed?;

        info!(
            dataset = %out_path.display(),
            written = outcome.written,
            skipped_empty = outcome.skipped_empty,
            filtered = outcome.filtered,
            failed = outcome.failed,
            "export finished"
        );

        Ok(collect_artifacts(&out_path, document))
    }

    fn write_features<I>(
        &self,
        features: I,
        layer: &mut dyn Layer,
        schema: &OutputSchema,
        target_srs: Option<&SpatialRef>,
        options: &ExportOptions,
    ) -> WriteOutcome
    where
        I: Iterator<Item = Feature>,
    {
        let mut outcome = WriteOutcome::default();
        let mut cache = TransformCache::new();
        let transform_options = options.transform_options();

        for feature in features {
            if let Some(wanted) = options.object_type.as_deref() {
                if feature.object_type != wanted {
                    outcome.filtered += 1;
                    continue;
                }
            }

            let mut record = schema.map_feature(&feature);

            if let Some(target) = target_srs {
                if let Some(geometry) = record.geometry.take() {
                    record.geometry = Some(self.reproject(
                        geometry,
                        &feature,
                        target,
                        &mut cache,
                        &transform_options,
                    ));
                }
            }

            if !record.has_geometry() && !options.include_empty {
                outcome.skipped_empty += 1;
                continue;
            }

            match layer.write_record(record) {
                Ok(()) => outcome.written += 1,
                Err(DatasourceError::Geometry(reason)) => {
                    error!(
                        object_type = %feature.object_type,
                        %reason,
                        "geometry rejected, record skipped"
                    );
                    outcome.failed += 1;
                }
                Err(e) => {
                    error!(object_type = %feature.object_type, error = %e, "record write failed");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Reprojette une géométrie, en retombant sur les coordonnées source
    /// quand le CRS source ne se résout pas ou que la transformation échoue
    fn reproject(
        &self,
        geometry: Geometry<f64>,
        feature: &Feature,
        target: &SpatialRef,
        cache: &mut TransformCache,
        options: &TransformOptions,
    ) -> Geometry<f64> {
        let source = match resolve_feature_srs(feature, self.crs.as_ref()) {
            Some(source) => source,
            None => return geometry,
        };

        let code = feature.srid.as_deref().unwrap_or_default();
        let transform =
            match cache.get_or_build(code, &source, target, self.crs.as_ref(), options) {
                Ok(transform) => transform,
                Err(e) => {
                    warn!(
                        source = source.code(),
                        target = target.code(),
                        error = %e,
                        "could not build transform, writing source coordinates"
                    );
                    return geometry;
                }
            };

        match transform_geometry(transform, &geometry, options) {
            Ok(reprojected) => reprojected,
            Err(e) => {
                warn!(
                    source = source.code(),
                    target = target.code(),
                    error = %e,
                    "reprojection failed, writing source coordinates"
                );
                geometry
            }
        }
    }
}

/// Place le jeu de données à côté du document sous le nom de base
fn output_path(document: &Path, base_name: &str, extension: &str) -> PathBuf {
    document
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{}.{}", base_name, extension))
}

/// Nom de couche tiré du stem du document, avec repli sur le nom de base
fn layer_name(document: &Path, base_name: &str) -> String {
    document
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(base_name)
        .to_string()
}

/// Collecte chaque fichier produit par le run à côté du jeu de données.
///
/// Les formats multi-fichiers écrivent leurs sidecars sous le même stem,
/// donc tout ce qui partage le stem du jeu de données compte, sauf le
/// document source lui-même et ce qui ressemble à une autre source.
fn collect_artifacts(dataset: &Path, document: &Path) -> Vec<PathBuf> {
    let stem = match dataset.file_stem().and_then(OsStr::to_str) {
        Some(stem) => stem,
        None => return Vec::new(),
    };

    let parent = dataset.parent().unwrap_or_else(|| Path::new(""));
    let dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not scan for artifacts");
            return Vec::new();
        }
    };

    let mut artifacts = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.file_stem().and_then(OsStr::to_str) != Some(stem) {
            continue;
        }
        if path == document {
            continue;
        }
        let extension = path.extension().and_then(OsStr::to_str);
        if matches!(extension, Some("xml") | Some("zip")) {
            debug!(path = %path.display(), "skipping source-like file");
            continue;
        }
        artifacts.push(path);
    }

    artifacts.sort();
    artifacts
}
