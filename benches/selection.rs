//! Selection-core benchmarks — the scoring loop is the request hot path.
//!
//! The selector is O(modules × concepts) with no I/O, so these runs bound
//! the per-request overhead the HTTP layer inherits.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use webgl_effect_orchestrator::{Concept, DecisionContext, ModuleSelector};

fn concept(name: &str, confidence: f64) -> Concept {
    Concept {
        name: name.to_string(),
        confidence,
        kind: "element".to_string(),
    }
}

fn bench_select_single_concept(c: &mut Criterion) {
    let selector = ModuleSelector::with_defaults();
    let concepts = vec![concept("explosion", 0.9)];

    c.bench_function("select_single_concept", |b| {
        b.iter(|| {
            let decisions = selector.select_modules(black_box(&concepts), None);
            black_box(decisions);
        })
    });
}

fn bench_select_six_concepts_budgeted(c: &mut Criterion) {
    let selector = ModuleSelector::with_defaults();
    let concepts = vec![
        concept("fire", 0.9),
        concept("gravity", 0.8),
        concept("glow", 0.7),
        concept("morph", 0.6),
        concept("water", 0.8),
        concept("noise", 0.5),
    ];
    let ctx = DecisionContext {
        complexity_budget: Some(10.0),
        ..DecisionContext::default()
    };

    c.bench_function("select_six_concepts_budgeted", |b| {
        b.iter(|| {
            let decisions = selector.select_modules(black_box(&concepts), Some(black_box(&ctx)));
            black_box(decisions);
        })
    });
}

fn bench_select_no_match(c: &mut Criterion) {
    let selector = ModuleSelector::with_defaults();
    let concepts = vec![concept("spreadsheet", 0.9), concept("invoice", 0.8)];

    c.bench_function("select_no_match", |b| {
        b.iter(|| {
            let decisions = selector.select_modules(black_box(&concepts), None);
            black_box(decisions);
        })
    });
}

criterion_group!(
    benches,
    bench_select_single_concept,
    bench_select_six_concepts_budgeted,
    bench_select_no_match
);
criterion_main!(benches);
