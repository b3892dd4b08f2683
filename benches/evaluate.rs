use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rulekit::{
    EngineConfig, Facts, Registry, Rule, RuleBuilder, RuleGroup, RuleGroupBuilder, RulesEngine,
};

/// `n` rules that compare a unique fact each. Only the last one holds, so
/// every evaluation walks the whole list.
fn build_rules(n: usize) -> (Vec<Rule>, Facts) {
    let mut facts = Facts::new();
    let rules = (0..n)
        .map(|i| {
            let threshold = if i + 1 == n { 1 } else { 100 };
            facts.insert(&format!("f{i}"), 10_i64.into());
            RuleBuilder::with_id(format!("r{i}"))
                .name(format!("r{i}"))
                .condition(format!("f{i} >= {threshold}"))
                .message(format!("r{i} matched"))
                .priority(i32::try_from(i).unwrap())
                .category_name("bench")
                .build()
                .unwrap()
        })
        .collect();
    (rules, facts)
}

/// One AND group over `n` rules that all hold.
fn build_group(n: usize) -> (RuleGroup, Facts) {
    let (rules, facts) = build_rules(n);
    let mut group = RuleGroupBuilder::with_id("all")
        .name("all")
        .description("every rule")
        .and()
        .build()
        .unwrap();
    for (seq, rule) in rules.into_iter().enumerate() {
        let always = RuleBuilder::with_id(rule.id())
            .name(rule.name())
            .condition(format!("f{seq} >= 1"))
            .message(rule.message())
            .build()
            .unwrap();
        group.add_rule(always, i32::try_from(seq).unwrap());
    }
    (group, facts)
}

fn bench_rules_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("rules_list");

    for &n in &[5, 20, 50] {
        let (rules, facts) = build_rules(n);
        let engine = RulesEngine::default();
        group.bench_function(&format!("{n}_rules"), |b| {
            b.iter(|| engine.execute_rules_list(&rules, black_box(&facts)));
        });

        let cached = RulesEngine::new(Registry::with_config(
            EngineConfig::new().with_cache_expressions(true),
        ));
        group.bench_function(&format!("{n}_rules_cached"), |b| {
            b.iter(|| cached.execute_rules_list(&rules, black_box(&facts)));
        });
    }

    group.finish();
}

fn bench_rule_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_group");

    for &n in &[5, 20, 50] {
        let (rule_group, facts) = build_group(n);
        let engine = RulesEngine::default();
        group.bench_function(&format!("and_{n}_members"), |b| {
            b.iter(|| rule_group.evaluate(engine.evaluator(), black_box(&facts)));
        });
    }

    group.finish();
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    for &n in &[5, 20, 50] {
        let (rules, _) = build_rules(n);
        group.bench_function(&format!("{n}_rules"), |b| {
            b.iter(|| {
                let mut registry = Registry::new();
                for rule in &rules {
                    registry.register_rule(rule.clone());
                }
                black_box(registry.rules_for_category("bench").len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_rules_list,
    bench_rule_group,
    bench_registration
);
criterion_main!(benches);
