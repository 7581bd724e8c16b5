//! Behavioural properties of the module selector.
//!
//! These tests pin the selection contract end to end over the built-in
//! rule table: determinism, budget handling (including the intentional
//! fallthrough when nothing fits), result bounds, gate evidence, feedback
//! clamping, and the named example scenarios.

use webgl_effect_orchestrator::{
    Concept, DecisionContext, ModuleDecision, ModuleSelector,
};

fn concept(name: &str, confidence: f64) -> Concept {
    Concept {
        name: name.to_string(),
        confidence,
        kind: "element".to_string(),
    }
}

fn find<'a>(decisions: &'a [ModuleDecision], module: &str) -> Option<&'a ModuleDecision> {
    decisions.iter().find(|d| d.module == module)
}

fn budget(b: f64) -> DecisionContext {
    DecisionContext {
        complexity_budget: Some(b),
        ..DecisionContext::default()
    }
}

// ── Property 1: determinism ───────────────────────────────────────────

#[test]
fn selection_is_deterministic_for_identical_state() {
    let concepts = [
        concept("fire", 0.9),
        concept("gravity", 0.7),
        concept("glow", 0.6),
    ];
    let ctx = budget(50.0);

    // Two selectors built from the same table hold identical state; one
    // call each must agree in order and in every value.
    let first = ModuleSelector::with_defaults().select_modules(&concepts, Some(&ctx));
    let second = ModuleSelector::with_defaults().select_modules(&concepts, Some(&ctx));

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.module, b.module);
        assert_eq!(a.priority, b.priority);
        assert!((a.confidence - b.confidence).abs() < f64::EPSILON);
        assert!((a.synergy_boost - b.synergy_boost).abs() < f64::EPSILON);
        assert_eq!(a.reasoning, b.reasoning);
    }
}

// ── Property 2: budget respected ──────────────────────────────────────

#[test]
fn budget_caps_total_complexity_when_modules_fit() {
    let concepts = [concept("fire", 0.8), concept("gravity", 0.8)];

    for b in [3.0, 3.5, 7.0, 100.0] {
        let selector = ModuleSelector::with_defaults();
        let decisions = selector.select_modules(&concepts, Some(&budget(b)));
        let total: f64 = decisions.iter().map(|d| d.complexity_score).sum();
        assert!(
            total <= b,
            "budget {b}: total complexity {total} exceeds the budget"
        );
        assert!(!decisions.is_empty(), "budget {b} fits at least particles");
    }
}

#[test]
fn generous_budget_admits_both_modules() {
    let selector = ModuleSelector::with_defaults();
    let decisions = selector.select_modules(
        &[concept("fire", 0.8), concept("gravity", 0.8)],
        Some(&budget(7.0)),
    );
    // particles (3.0) + physics (4.0) exactly fill the budget.
    assert!(find(&decisions, "particles").is_some());
    assert!(find(&decisions, "physics").is_some());
}

// ── Property 3: at most four decisions ────────────────────────────────

#[test]
fn never_more_than_four_decisions() {
    let concepts = [
        concept("fire", 0.9),
        concept("gravity", 0.9),
        concept("glow", 0.9),
        concept("morph", 0.9),
        concept("water", 0.9),
        concept("noise", 0.9),
    ];

    let unbudgeted = ModuleSelector::with_defaults().select_modules(&concepts, None);
    assert!(unbudgeted.len() <= 4, "unbudgeted: {}", unbudgeted.len());

    let budgeted =
        ModuleSelector::with_defaults().select_modules(&concepts, Some(&budget(1000.0)));
    assert!(budgeted.len() <= 4, "budgeted: {}", budgeted.len());
}

// ── Property 4: confidence and synergy bounds ─────────────────────────

#[test]
fn confidence_and_synergy_stay_in_bounds() {
    let inputs: Vec<Vec<Concept>> = vec![
        vec![concept("explosion", 1.0)],
        vec![concept("fire", 0.9), concept("gravity", 0.9)],
        vec![concept("morph", 0.9), concept("water", 0.9)],
        vec![
            concept("fire", 0.5),
            concept("glow", 0.5),
            concept("noise", 0.5),
        ],
    ];

    let selector = ModuleSelector::with_defaults();
    for concepts in &inputs {
        for decision in selector.select_modules(concepts, None) {
            assert!(
                (0.0..=0.98).contains(&decision.confidence),
                "{}: confidence {} out of bounds",
                decision.module,
                decision.confidence
            );
            assert!(
                (-0.3..=0.3).contains(&decision.synergy_boost),
                "{}: synergy {} out of bounds",
                decision.module,
                decision.synergy_boost
            );
        }
    }
}

// ── Property 5: gate evidence ─────────────────────────────────────────

#[test]
fn every_returned_module_has_keyword_evidence() {
    let concepts = [
        concept("fire", 0.8),
        concept("gravity", 0.8),
        concept("noise", 0.8),
    ];
    let selector = ModuleSelector::with_defaults();
    let table = selector.table().clone();

    for decision in selector.select_modules(&concepts, None) {
        let rule = table.rule(&decision.module).expect("rule exists");
        let matched = concepts.iter().any(|c| {
            rule.keywords
                .iter()
                .any(|k| c.name.to_lowercase().contains(k.as_str()))
        });
        assert!(
            matched,
            "{} returned without any keyword match",
            decision.module
        );
        assert!(
            !decision.reasoning.is_empty(),
            "{} returned without recorded evidence",
            decision.module
        );
    }
}

// ── Property 6: feedback bounds under sustained load ──────────────────

#[test]
fn feedback_tables_stay_clamped_over_many_calls() {
    let selector = ModuleSelector::with_defaults();
    let concepts = [concept("fire", 0.9)];

    for _ in 0..2000 {
        let _ = selector.select_modules(&concepts, None);
    }

    for module in ["particles", "physics", "lighting"] {
        let threshold = selector.threshold(module);
        assert!(
            (0.2..=0.8).contains(&threshold),
            "{module}: threshold {threshold} out of bounds"
        );
    }
    let weight = selector.concept_weight("particles", "fire");
    assert!(
        (0.1..=1.0).contains(&weight),
        "weight {weight} out of bounds"
    );
}

// ── Scenario A: explosion → particles ─────────────────────────────────

#[test]
fn scenario_explosion_selects_particles_above_base_confidence() {
    let selector = ModuleSelector::with_defaults();
    let decisions = selector.select_modules(&[concept("explosion", 0.9)], None);

    let particles = find(&decisions, "particles").expect("particles selected");
    assert!(
        particles.confidence > 0.85,
        "confidence {} should clear the 0.85 base",
        particles.confidence
    );
    assert!(
        particles.reasoning.iter().any(|r| r.contains("explosion")),
        "reasoning should mention the explosion concept: {:?}",
        particles.reasoning
    );
}

// ── Scenario B: empty concepts ────────────────────────────────────────

#[test]
fn scenario_empty_concepts_return_empty_without_error() {
    let selector = ModuleSelector::with_defaults();
    assert!(selector.select_modules(&[], None).is_empty());
    assert!(selector
        .select_modules(&[], Some(&budget(100.0)))
        .is_empty());
    assert!(selector
        .select_modules(&[], Some(&DecisionContext::default()))
        .is_empty());
}

// ── Scenario C: fire + gravity synergy ────────────────────────────────

#[test]
fn scenario_fire_and_gravity_select_synergistic_pair() {
    let selector = ModuleSelector::with_defaults();
    let decisions = selector.select_modules(
        &[concept("fire", 0.8), concept("gravity", 0.8)],
        Some(&budget(100.0)),
    );

    let particles = find(&decisions, "particles").expect("particles selected");
    let physics = find(&decisions, "physics").expect("physics selected");

    // Synergy credit only looks backward at modules accepted earlier in
    // table order, so the pair's boost lands on physics alone:
    // 0.8 (edge strength) x 0.1 = +0.08.
    assert!((physics.synergy_boost - 0.08).abs() < 1e-9);
    assert!(particles.synergy_boost.abs() < f64::EPSILON);
}

// ── Scenario D: unfillable budget falls through ───────────────────────

#[test]
fn scenario_unfillable_budget_falls_through_to_threshold_filter() {
    // Both candidate modules cost more than the budget of 1, so the
    // budgeted pass selects nothing — and the selector then intentionally
    // falls through to the unbudgeted adaptive-threshold filter rather
    // than returning empty.
    let selector = ModuleSelector::with_defaults();
    let decisions = selector.select_modules(
        &[concept("fire", 0.8), concept("gravity", 0.8)],
        Some(&budget(1.0)),
    );

    assert!(
        !decisions.is_empty(),
        "fallthrough must return threshold-passing modules"
    );
    assert!(find(&decisions, "particles").is_some());
    assert!(find(&decisions, "physics").is_some());
    assert!(decisions.len() <= 4);
}
