use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_core::{
    ast::ImportDecl,
    config::LoweringConfig,
    events::EventBus,
    hir::{HirNode, HirType},
    pipeline::Pipeline,
    rewrite::{LoweringContext, RewriteEngine, RewriteResult, Stage},
    rules::{BinaryExpressionLowering, RegexLiteralLowering},
    stdlib::{FunctionDecl, StdlibRegistry},
    target::TargetNode,
};

/// Left-leaning chain `0 + 1 + ... + n`
fn binary_chain(length: i64) -> HirNode {
    (1..=length).fold(HirNode::int(0), |acc, n| {
        HirNode::binary(acc, "+", HirNode::int(n), HirType::Int)
    })
}

fn bench_lower_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("lower_expression");
    let pipeline = Pipeline::new(LoweringConfig {
        collect_stats: false,
        ..LoweringConfig::default()
    })
    .unwrap();

    for length in [1, 16, 128] {
        let hir = binary_chain(length);
        group.bench_with_input(BenchmarkId::new("binary_chain", length), &hir, |b, hir| {
            b.iter(|| black_box(pipeline.lower_expression(hir).unwrap()));
        });
    }

    let call = HirNode::call(
        "Regex.replace",
        vec![
            HirNode::regex("[aeiou]", "ig"),
            HirNode::identifier("text", HirType::String),
            HirNode::string("_"),
        ],
        HirType::String,
    );
    group.bench_function("regex_call", |b| {
        b.iter(|| black_box(pipeline.lower_expression(&call).unwrap()));
    });

    group.finish();
}

fn bench_stage_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_dispatch");

    let lowerer = |node: &HirNode| -> RewriteResult<TargetNode> {
        Ok(match node {
            HirNode::Literal(_) => TargetNode::number(1),
            _ => TargetNode::Nil,
        })
    };
    let context = LoweringContext::new().with_lowerer(&lowerer);
    let node = HirNode::binary(HirNode::int(1), "+", HirNode::int(2), HirType::Int);

    for stats in [false, true] {
        let mut engine = RewriteEngine::new().collect_stats(stats);
        engine
            .register(Stage::CODEGEN, RegexLiteralLowering::new())
            .register(Stage::CODEGEN, BinaryExpressionLowering::new());

        group.bench_function(BenchmarkId::new("shared", stats), |b| {
            b.iter(|| {
                black_box(
                    engine
                        .apply(&Stage::CODEGEN, node.clone().into(), &context)
                        .unwrap(),
                )
            });
        });
    }

    let mut fresh = RewriteEngine::new().collect_stats(false);
    fresh
        .register_definition::<RegexLiteralLowering>(Stage::CODEGEN)
        .register_definition::<BinaryExpressionLowering>(Stage::CODEGEN);
    group.bench_function("fresh_per_call", |b| {
        b.iter(|| {
            black_box(
                fresh
                    .apply(&Stage::CODEGEN, node.clone().into(), &context)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

fn bench_import_resolution(c: &mut Criterion) {
    let pipeline = Pipeline::new(LoweringConfig::default()).unwrap();
    let registry = StdlibRegistry::with_builtins();
    let bus = EventBus::new();
    bus.subscribe_all(|event| {
        black_box(event);
        Ok(())
    });
    let register = |decl: &FunctionDecl| -> RewriteResult<()> {
        black_box(decl);
        Ok(())
    };
    let on_missing = |name: &str, _origin: Option<&str>| -> RewriteResult<()> {
        black_box(name);
        Ok(())
    };

    let selective = ImportDecl::items("Str", ["length", "split", "reverse"]);
    let wildcard = ImportDecl::all("Math");

    c.bench_function("import_selective", |b| {
        b.iter(|| {
            black_box(
                pipeline
                    .resolve_import(&selective, &registry, &bus, &register, &on_missing)
                    .unwrap(),
            )
        });
    });
    c.bench_function("import_wildcard", |b| {
        b.iter(|| {
            black_box(
                pipeline
                    .resolve_import(&wildcard, &registry, &bus, &register, &on_missing)
                    .unwrap(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_lower_expression,
    bench_stage_dispatch,
    bench_import_resolution
);
criterion_main!(benches);
