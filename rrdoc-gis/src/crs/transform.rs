//! Application des transformations aux géométries et cache par run

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use tracing::{debug, warn};

use super::{CrsRegistry, SpatialRef, TransformOptions};
use crate::error::CrsError;

/// Une transformation de coordonnées réutilisable entre deux références
pub trait CoordTransform {
    /// Transforme une paire de coordonnées.
    ///
    /// # Errors
    ///
    /// [`CrsError::Transform`] quand la coordonnée tombe hors de la zone de
    /// définition de la transformation.
    fn transform_coord(&self, coord: (f64, f64)) -> Result<(f64, f64), CrsError>;

    /// Transforme une tranche de paires de coordonnées sur place.
    fn transform_slice(&self, coords: &mut [(f64, f64)]) -> Result<(), CrsError> {
        for coord in coords.iter_mut() {
            *coord = self.transform_coord(*coord)?;
        }
        Ok(())
    }
}

/// Transforme une géométrie vers la référence cible et retourne une
/// nouvelle géométrie.
///
/// Avec `allow_partial`, les coordonnées rejetées par la transformation
/// sont écartées et le reste conservé; une géométrie qui perd toutes ses
/// coordonnées est une erreur. Sans, la première coordonnée rejetée fait
/// échouer la géométrie entière. Les variantes de géométrie que le
/// parcours ne traite pas passent inchangées.
pub fn transform_geometry(
    transform: &dyn CoordTransform,
    geometry: &Geometry<f64>,
    options: &TransformOptions,
) -> Result<Geometry<f64>, CrsError> {
    let partial = options.allow_partial;

    match geometry {
        Geometry::Point(p) => {
            let (x, y) = transform.transform_coord((p.x(), p.y()))?;
            Ok(Geometry::Point(Point::new(x, y)))
        }
        Geometry::LineString(ls) => Ok(Geometry::LineString(transform_linestring(
            transform, ls, partial,
        )?)),
        Geometry::Polygon(p) => Ok(Geometry::Polygon(transform_polygon(transform, p, partial)?)),
        Geometry::MultiPoint(mp) => {
            let line = LineString::from(
                mp.0.iter()
                    .map(|p| Coord { x: p.x(), y: p.y() })
                    .collect::<Vec<_>>(),
            );
            let transformed = transform_linestring(transform, &line, partial)?;
            let points: Vec<Point> = transformed.0.into_iter().map(Point::from).collect();
            Ok(Geometry::MultiPoint(MultiPoint::new(points)))
        }
        Geometry::MultiLineString(mls) => {
            let lines: Result<Vec<LineString>, CrsError> = mls
                .0
                .iter()
                .map(|ls| transform_linestring(transform, ls, partial))
                .collect();
            Ok(Geometry::MultiLineString(MultiLineString::new(lines?)))
        }
        Geometry::MultiPolygon(mp) => {
            let polygons: Result<Vec<Polygon>, CrsError> =
                mp.0.iter()
                    .map(|p| transform_polygon(transform, p, partial))
                    .collect();
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons?)))
        }
        // Les autres variantes ne sortent pas des payloads WKT mappés
        _ => Ok(geometry.clone()),
    }
}

/// Transforme une linestring, en écartant les coordonnées rejetées en mode
/// partiel
fn transform_linestring(
    transform: &dyn CoordTransform,
    ls: &LineString,
    partial: bool,
) -> Result<LineString, CrsError> {
    if !partial {
        // Conversion par lot, les moteurs convertissent les tableaux bien
        // plus vite
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();
        transform.transform_slice(&mut coords)?;
        return Ok(coords.into_iter().map(Coord::from).collect());
    }

    let mut coords = Vec::with_capacity(ls.0.len());
    let mut dropped = 0usize;
    for c in &ls.0 {
        match transform.transform_coord((c.x, c.y)) {
            Ok((x, y)) => coords.push(Coord { x, y }),
            Err(_) => dropped += 1,
        }
    }

    if coords.is_empty() && dropped > 0 {
        return Err(CrsError::Transform(
            "no coordinate could be transformed".to_string(),
        ));
    }
    if dropped > 0 {
        warn!(dropped, kept = coords.len(), "dropped untransformable coordinates");
    }

    Ok(LineString::new(coords))
}

/// Transforme un polygone anneau par anneau
fn transform_polygon(
    transform: &dyn CoordTransform,
    polygon: &Polygon,
    partial: bool,
) -> Result<Polygon, CrsError> {
    let exterior = transform_linestring(transform, polygon.exterior(), partial)?;
    let interiors: Result<Vec<LineString>, CrsError> = polygon
        .interiors()
        .iter()
        .map(|ls| transform_linestring(transform, ls, partial))
        .collect();
    Ok(Polygon::new(exterior, interiors?))
}

/// Cache par run des transformations de coordonnées, indexé par le srid
/// brut de la feature.
///
/// Au plus une transformation est construite par code distinct et par run;
/// les constructions échouées ne cachent rien et sont retentées à la
/// prochaine feature portant le code.
#[derive(Default)]
pub struct TransformCache {
    transforms: HashMap<String, Box<dyn CoordTransform>>,
}

impl TransformCache {
    /// Crée un cache vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Nombre de transformations en cache
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Indique si aucune transformation n'a encore été mise en cache
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Retourne la transformation en cache pour un code, en la construisant
    /// au premier usage.
    ///
    /// # Errors
    ///
    /// Propage l'échec de construction du registre; rien n'est mis en cache
    /// dans ce cas.
    pub fn get_or_build(
        &mut self,
        code: &str,
        source: &SpatialRef,
        target: &SpatialRef,
        registry: &dyn CrsRegistry,
        options: &TransformOptions,
    ) -> Result<&dyn CoordTransform, CrsError> {
        // Réemprunt explicite: `as_ref()` emprunterait le `&mut Box` temporaire
        match self.transforms.entry(code.to_string()) {
            Entry::Occupied(entry) => Ok(&**entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!(
                    code,
                    source = source.code(),
                    target = target.code(),
                    "building coordinate transform"
                );
                let transform = registry.transform(source, target, options)?;
                Ok(&**entry.insert(transform))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Rect};
    use std::cell::Cell;

    /// Décale les coordonnées d'un delta fixe, rejette les x négatifs
    struct Shift {
        dx: f64,
        dy: f64,
    }

    impl CoordTransform for Shift {
        fn transform_coord(&self, (x, y): (f64, f64)) -> Result<(f64, f64), CrsError> {
            if x < 0.0 {
                return Err(CrsError::Transform("outside test area".to_string()));
            }
            Ok((x + self.dx, y + self.dy))
        }
    }

    fn shift() -> Shift {
        Shift { dx: 100.0, dy: -50.0 }
    }

    #[test]
    fn test_point_transform() {
        let result = transform_geometry(
            &shift(),
            &Geometry::Point(Point::new(37.61, 55.75)),
            &TransformOptions::default(),
        )
        .unwrap();

        match result {
            Geometry::Point(p) => {
                assert!((p.x() - 137.61).abs() < 1e-12);
                assert!((p.y() - 5.75).abs() < 1e-12);
            }
            other => panic!("Expected Point, got {:?}", other),
        }
    }

    #[test]
    fn test_polygon_transform_keeps_rings() {
        let poly = polygon![
            (x: 10.0, y: 10.0),
            (x: 20.0, y: 10.0),
            (x: 20.0, y: 20.0),
            (x: 10.0, y: 10.0),
        ];

        let result = transform_geometry(
            &shift(),
            &Geometry::Polygon(poly),
            &TransformOptions::default(),
        )
        .unwrap();

        match result {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 4);
                assert!((p.exterior().0[0].x - 110.0).abs() < 1e-12);
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_mode_drops_rejected_coordinates() {
        let line = Geometry::LineString(LineString::from(vec![
            (1.0, 1.0),
            (-1.0, 1.0),
            (2.0, 2.0),
        ]));

        let result = transform_geometry(
            &shift(),
            &line,
            &TransformOptions {
                allow_partial: true,
            },
        )
        .unwrap();

        match result {
            Geometry::LineString(ls) => assert_eq!(ls.0.len(), 2),
            other => panic!("Expected LineString, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_mode_fails_on_first_rejection() {
        let line = Geometry::LineString(LineString::from(vec![(1.0, 1.0), (-1.0, 1.0)]));

        let result = transform_geometry(
            &shift(),
            &line,
            &TransformOptions {
                allow_partial: false,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_fully_rejected_geometry_is_an_error() {
        let line = Geometry::LineString(LineString::from(vec![(-1.0, 1.0), (-2.0, 1.0)]));

        let result = transform_geometry(&shift(), &line, &TransformOptions::default());
        match result {
            Err(CrsError::Transform(_)) => {}
            other => panic!("Expected Transform error, got {:?}", other),
        }
    }

    #[test]
    fn test_unhandled_variant_passes_through() {
        let rect = Geometry::Rect(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }));

        let result = transform_geometry(&shift(), &rect, &TransformOptions::default()).unwrap();
        assert_eq!(result, rect);
    }

    /// Bouchon de registre comptant les constructions de transformations
    struct CountingRegistry {
        builds: Cell<usize>,
    }

    impl CrsRegistry for CountingRegistry {
        fn spatial_ref(&self, key: &str) -> Result<SpatialRef, CrsError> {
            Ok(SpatialRef::new(key, "+proj=test"))
        }

        fn from_epsg(&self, code: u32) -> Result<SpatialRef, CrsError> {
            Ok(SpatialRef::from_epsg_code(code))
        }

        fn transform(
            &self,
            _source: &SpatialRef,
            _target: &SpatialRef,
            _options: &TransformOptions,
        ) -> Result<Box<dyn CoordTransform>, CrsError> {
            self.builds.set(self.builds.get() + 1);
            Ok(Box::new(shift()))
        }
    }

    #[test]
    fn test_cache_builds_once_per_code() {
        let registry = CountingRegistry {
            builds: Cell::new(0),
        };
        let source_a = SpatialRef::new("453011", "+proj=test +zone=1");
        let source_b = SpatialRef::new("453012", "+proj=test +zone=2");
        let target = SpatialRef::from_epsg_code(4326);
        let options = TransformOptions::default();

        let mut cache = TransformCache::new();
        for _ in 0..5 {
            cache
                .get_or_build("45301-1", &source_a, &target, &registry, &options)
                .unwrap();
            cache
                .get_or_build("4530121", &source_b, &target, &registry, &options)
                .unwrap();
        }

        assert_eq!(registry.builds.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cached_transform_is_usable_on_first_and_repeat_lookup() {
        let registry = CountingRegistry {
            builds: Cell::new(0),
        };
        let source = SpatialRef::new("453011", "+proj=test");
        let target = SpatialRef::from_epsg_code(4326);
        let options = TransformOptions::default();

        let mut cache = TransformCache::new();
        let first = cache
            .get_or_build("45301-1", &source, &target, &registry, &options)
            .unwrap()
            .transform_coord((1.0, 2.0))
            .unwrap();
        let again = cache
            .get_or_build("45301-1", &source, &target, &registry, &options)
            .unwrap()
            .transform_coord((1.0, 2.0))
            .unwrap();

        assert_eq!(first, (101.0, -48.0));
        assert_eq!(again, first);
        assert_eq!(registry.builds.get(), 1);
    }
}
