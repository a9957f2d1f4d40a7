//! Benchmarks pour le pipeline d'export

use std::collections::HashMap;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use rrdoc::{DocumentParser, Feature, FeatureStream, ParseError, ParseHints, Value};
use rrdoc_gis::crs::CrsCatalog;
use rrdoc_gis::{DriverRegistry, ExportOptions, Exporter, GisDriver, MemoryDriver, OutputSchema};

struct NoopParser;

impl DocumentParser for NoopParser {
    fn parse<'a>(
        &'a self,
        _document: &Path,
        _hints: &ParseHints,
    ) -> Result<FeatureStream<'a>, ParseError> {
        Ok(Box::new(std::iter::empty()))
    }
}

fn synthetic_features(count: usize) -> Vec<Feature> {
    (0..count)
        .map(|i| {
            let mut attributes = HashMap::new();
            attributes.insert(
                "cad_number".to_string(),
                Value::from(format!("50:21:0110501:{}", i)),
            );
            attributes.insert("area".to_string(), Value::from((i % 5000) as f64));

            Feature {
                object_type: "Parcel".to_string(),
                srid: Some("45301-1".to_string()),
                geometry: format!("POINT ({} {})", i % 360, i % 80),
                attributes,
            }
        })
        .collect()
}

fn memory_exporter() -> Exporter {
    let mut drivers = DriverRegistry::new();
    drivers.register(Box::new(MemoryDriver::new()));
    Exporter::new(
        Box::new(NoopParser),
        drivers,
        Box::new(CrsCatalog::builtin()),
    )
}

fn bench_export(c: &mut Criterion) {
    let features = synthetic_features(5000);
    let exporter = memory_exporter();

    let mut group = c.benchmark_group("export");
    group.throughput(Throughput::Elements(features.len() as u64));
    group.sample_size(20);

    group.bench_function("memory_5000_features", |b| {
        b.iter(|| {
            let artifacts = exporter
                .export_features(
                    black_box(features.clone()),
                    Path::new("bench/extract.xml"),
                    "parcels",
                    "Memory",
                    &ExportOptions::default(),
                )
                .unwrap();
            black_box(artifacts)
        })
    });

    group.finish();
}

fn bench_map_features(c: &mut Criterion) {
    let driver = MemoryDriver::new();
    let mut store = driver.create(Path::new("bench.mem")).unwrap();
    let mut layer = store.create_layer("bench", None, &[]).unwrap();
    let schema = OutputSchema::declare(layer.as_mut()).unwrap();

    let features = synthetic_features(1000);

    let mut group = c.benchmark_group("schema");
    group.throughput(Throughput::Elements(features.len() as u64));

    group.bench_function("map_1000_features", |b| {
        b.iter(|| {
            let mapped = features
                .iter()
                .map(|f| schema.map_feature(black_box(f)))
                .filter(|r| r.has_geometry())
                .count();
            black_box(mapped)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_export, bench_map_features);
criterion_main!(benches);
