use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

use view_lint::engine::LintEngine;
use view_lint::flatten::flatten;
use view_lint::model::ModelBuilder;
use view_lint::rules::registry::RuleRegistry;
use view_lint::rules::RuleSettings;

/// Generate a synthetic view document with the requested number of child
/// components, a mix of bindings, scripts, and plain properties.
fn generate_view(components: usize) -> Value {
    let mut children = Vec::new();
    for i in 0..components {
        let child = match i % 4 {
            0 => json!({
                "meta": { "name": format!("Label{i}") },
                "type": "label",
                "props": { "text": format!("row {i}"), "visible": true }
            }),
            1 => json!({
                "meta": { "name": format!("clock{i}") },
                "type": "label",
                "props": {
                    "text": {
                        "binding": {
                            "type": "expr",
                            "config": { "expression": "dateFormat(now(500), 'HH:mm:ss')" }
                        }
                    }
                }
            }),
            2 => json!({
                "meta": { "name": format!("Button{i}") },
                "type": "button",
                "events": { "onActionPerformed": { "script": format!("self.handle({i})") } }
            }),
            _ => json!({
                "meta": { "name": format!("Gauge{i}") },
                "type": "gauge",
                "props": {
                    "value": {
                        "binding": {
                            "type": "tag",
                            "config": { "tagPath": format!("[default]Plant/Line{i}/Speed") },
                            "transforms": [ { "type": "script", "script": "return value * 2" } ]
                        }
                    }
                }
            }),
        };
        children.push(child);
    }

    json!({
        "root": {
            "meta": { "name": "root" },
            "type": "flex",
            "props": { "direction": "column" },
            "children": children
        },
        "custom": { "refreshRate": 1000 },
        "params": { "mode": "view" }
    })
}

fn bench_flatten_scalability(c: &mut Criterion) {
    let sizes = vec![10, 100, 500];
    let mut group = c.benchmark_group("flatten_scalability");

    for &size in &sizes {
        let document = generate_view(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("components", size), &document, |b, doc| {
            b.iter(|| {
                let entries = flatten(black_box(doc)).unwrap();
                black_box(entries)
            })
        });
    }

    group.finish();
}

fn bench_model_build(c: &mut Criterion) {
    let sizes = vec![10, 100, 500];
    let mut group = c.benchmark_group("model_build");

    for &size in &sizes {
        let document = generate_view(size);
        let entries = flatten(&document).unwrap();
        group.throughput(Throughput::Elements(entries.len() as u64));
        group.bench_with_input(BenchmarkId::new("entries", size), &entries, |b, entries| {
            b.iter(|| {
                let model = ModelBuilder::new().build(black_box(entries)).unwrap();
                black_box(model)
            })
        });
    }

    group.finish();
}

fn bench_full_lint_run(c: &mut Criterion) {
    let registry = RuleRegistry::with_builtin_rules();
    let configured: std::collections::BTreeMap<String, RuleSettings> = registry
        .list()
        .into_iter()
        .map(|id| (id.to_string(), RuleSettings::default()))
        .collect();

    let document = generate_view(200);
    let entries = flatten(&document).unwrap();
    let model = ModelBuilder::new().build(&entries).unwrap();

    c.bench_function("lint_run_200_components", |b| {
        b.iter(|| {
            // Rule instances carry per-document state, so activation is part
            // of the measured per-document cost.
            let (rules, _) = registry.activate_all(&configured);
            let result = LintEngine::new(rules).run(black_box(&model));
            black_box(result)
        })
    });
}

criterion_group!(
    lint_benches,
    bench_flatten_scalability,
    bench_model_build,
    bench_full_lint_run
);

criterion_main!(lint_benches);
