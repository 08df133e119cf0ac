/*!
# RewriteEngine Integration Tests

Stage ordering, composition, instance policies and error propagation of the
staged rewrite engine.
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use strata_core::ast::SourceAst;
use strata_core::errors::LoweringError;
use strata_core::hir::{HirNode, Literal};
use strata_core::node::{Node, NodeKind};
use strata_core::rewrite::{
    CollaboratorKey, FnRule, InstancePolicy, KindSet, LoweringContext, LoweringRule, Rewrite,
    RewriteEngine, RewriteResult, Stage,
};

/// Rewrites integer literal `from` into integer literal `to`
fn int_rewriter(name: &'static str, from: i64, to: i64) -> impl LoweringRule {
    FnRule::new(
        name,
        move |node: &Node| matches!(node, Node::Hir(HirNode::Literal(Literal::Int(n))) if *n == from),
        move |_node: &Node, _context: &LoweringContext<'_>| Ok(Rewrite::replaced(HirNode::int(to))),
    )
}

/// Appends its tag to a shared log every time it runs
struct TraceRule {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl LoweringRule for TraceRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn applies(&self, _node: &Node, _context: &LoweringContext<'_>) -> bool {
        true
    }

    fn apply(&self, _node: &Node, _context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        self.log.lock().push(self.name);
        Ok(Rewrite::Unchanged)
    }
}

#[test]
fn test_empty_stage_is_identity() -> anyhow::Result<()> {
    let engine = RewriteEngine::new();
    let node = Node::from(HirNode::string("unchanged"));

    let result = engine.apply(&Stage::CODEGEN, node.clone(), &LoweringContext::new())?;
    assert_eq!(result, node);
    assert_eq!(engine.rule_count(&Stage::CODEGEN), 0);

    Ok(())
}

#[test]
fn test_no_matching_rule_leaves_node_untouched() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine.register(Stage::CODEGEN, int_rewriter("one_to_two", 1, 2));

    let node = Node::from(HirNode::int(7));
    let result = engine.apply(&Stage::CODEGEN, node.clone(), &LoweringContext::new())?;
    assert_eq!(result, node);

    Ok(())
}

#[test]
fn test_rules_compose_sequentially_within_a_stage() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine
        .register(Stage::CODEGEN, int_rewriter("one_to_two", 1, 2))
        .register(Stage::CODEGEN, int_rewriter("two_to_three", 2, 3));

    let result = engine.apply(&Stage::CODEGEN, HirNode::int(1).into(), &LoweringContext::new())?;
    assert_eq!(result, Node::from(HirNode::int(3)));

    Ok(())
}

#[test]
fn test_earlier_rule_does_not_see_later_output() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine
        .register(Stage::CODEGEN, int_rewriter("two_to_three", 2, 3))
        .register(Stage::CODEGEN, int_rewriter("one_to_two", 1, 2));

    let result = engine.apply(&Stage::CODEGEN, HirNode::int(1).into(), &LoweringContext::new())?;
    assert_eq!(result, Node::from(HirNode::int(2)));

    Ok(())
}

#[test]
fn test_unchanged_outcome_keeps_current_node() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut engine = RewriteEngine::new();
    engine
        .register(Stage::CODEGEN, int_rewriter("one_to_two", 1, 2))
        .register(
            Stage::CODEGEN,
            TraceRule {
                name: "observer",
                log: log.clone(),
            },
        );

    let result = engine.apply(&Stage::CODEGEN, HirNode::int(1).into(), &LoweringContext::new())?;
    assert_eq!(result, Node::from(HirNode::int(2)));
    assert_eq!(*log.lock(), vec!["observer"]);

    Ok(())
}

#[test]
fn test_duplicate_registration_runs_twice() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let rule: Arc<dyn LoweringRule> = Arc::new(TraceRule {
        name: "twice",
        log: log.clone(),
    });

    let mut engine = RewriteEngine::new();
    engine
        .register_shared(Stage::CORE_IR, rule.clone())
        .register_shared(Stage::CORE_IR, rule);

    engine.apply(&Stage::CORE_IR, HirNode::int(0).into(), &LoweringContext::new())?;
    assert_eq!(*log.lock(), vec!["twice", "twice"]);
    assert_eq!(engine.rule_names(&Stage::CORE_IR), vec!["twice", "twice"]);

    Ok(())
}

#[test]
fn test_stages_are_isolated() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine.register(Stage::CORE_IR, int_rewriter("one_to_two", 1, 2));

    let result = engine.apply(&Stage::CODEGEN, HirNode::int(1).into(), &LoweringContext::new())?;
    assert_eq!(result, Node::from(HirNode::int(1)));

    let custom = Stage::named("optimize");
    engine.register(custom.clone(), int_rewriter("two_to_four", 2, 4));
    let stages: Vec<_> = engine.stages().map(Stage::as_str).collect();
    assert_eq!(stages, vec!["core_ir", "optimize"]);

    Ok(())
}

#[test]
fn test_apply_stages_feeds_each_stage_into_the_next() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine
        .register(Stage::CORE_IR, int_rewriter("one_to_two", 1, 2))
        .register(Stage::CODEGEN, int_rewriter("two_to_three", 2, 3));

    let result = engine.apply_stages(
        &[Stage::CORE_IR, Stage::CODEGEN],
        HirNode::int(1).into(),
        &LoweringContext::new(),
    )?;
    assert_eq!(result, Node::from(HirNode::int(3)));

    Ok(())
}

/// Counts how many instances were created and how often each was applied
struct CountingRule {
    applications: AtomicUsize,
}

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

impl Default for CountingRule {
    fn default() -> Self {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Self {
            applications: AtomicUsize::new(0),
        }
    }
}

impl LoweringRule for CountingRule {
    fn name(&self) -> &'static str {
        "CountingRule"
    }

    fn applies(&self, _node: &Node, _context: &LoweringContext<'_>) -> bool {
        true
    }

    fn apply(&self, _node: &Node, _context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        let seen = self.applications.fetch_add(1, Ordering::SeqCst);
        // A fresh instance has never been applied before
        Ok(Rewrite::replaced(HirNode::int(seen as i64)))
    }
}

#[test]
fn test_fresh_definition_gets_a_new_instance_per_application() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine.register_definition::<CountingRule>(Stage::CODEGEN);
    assert_eq!(engine.policies(&Stage::CODEGEN), vec![InstancePolicy::FreshPerCall]);

    let before = CONSTRUCTED.load(Ordering::SeqCst);
    for _ in 0..3 {
        let result =
            engine.apply(&Stage::CODEGEN, HirNode::int(9).into(), &LoweringContext::new())?;
        assert_eq!(result, Node::from(HirNode::int(0)));
    }
    assert!(CONSTRUCTED.load(Ordering::SeqCst) - before >= 3);

    Ok(())
}

#[test]
fn test_shared_instance_is_reused() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine.register(
        Stage::CODEGEN,
        CountingRule {
            applications: AtomicUsize::new(0),
        },
    );
    assert_eq!(engine.policies(&Stage::CODEGEN), vec![InstancePolicy::Shared]);

    let context = LoweringContext::new();
    let first = engine.apply(&Stage::CODEGEN, HirNode::int(9).into(), &context)?;
    let second = engine.apply(&Stage::CODEGEN, HirNode::int(9).into(), &context)?;
    assert_eq!(first, Node::from(HirNode::int(0)));
    assert_eq!(second, Node::from(HirNode::int(1)));

    Ok(())
}

#[test]
fn test_rule_error_aborts_stage_without_rollback() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut engine = RewriteEngine::new();
    engine
        .register(
            Stage::CODEGEN,
            TraceRule {
                name: "before",
                log: log.clone(),
            },
        )
        .register(
            Stage::CODEGEN,
            FnRule::new(
                "failing",
                KindSet::of([NodeKind::HirLiteral]),
                |_node: &Node, _context: &LoweringContext<'_>| -> RewriteResult<Rewrite> {
                    anyhow::bail!("collaborator exploded")
                },
            ),
        )
        .register(
            Stage::CODEGEN,
            TraceRule {
                name: "after",
                log: log.clone(),
            },
        );

    let err = engine
        .apply(&Stage::CODEGEN, HirNode::int(1).into(), &LoweringContext::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "collaborator exploded");
    assert_eq!(*log.lock(), vec!["before"]);

    let stats = engine.stage_stats(&Stage::CODEGEN);
    assert_eq!(stats["failing"].errors, 1);
    assert_eq!(stats["failing"].replacements, 0);
}

#[test]
fn test_validate_reports_every_missing_collaborator() {
    let mut engine = RewriteEngine::new();
    engine
        .register(Stage::CODEGEN, strata_core::rules::BinaryExpressionLowering::new())
        .register(Stage::CORE_IR, strata_core::rules::MatchDesugaring::new());

    let context = LoweringContext::new();
    let match_node = Node::from(SourceAst::match_expr(SourceAst::identifier("x"), Vec::new()));
    let err = engine
        .validate(&Stage::CORE_IR, &match_node, &context)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<LoweringError>(),
        Some(&LoweringError::MissingCollaborators {
            keys: vec![
                "scrutinee".to_string(),
                "match_analyzer".to_string(),
                "transform_arm".to_string(),
            ],
        })
    );
    // no rule of the stage claims a literal, so nothing is required
    assert!(engine
        .validate(&Stage::CORE_IR, &Node::from(HirNode::int(1)), &context)
        .is_ok());

    let lowerer = |node: &HirNode| -> RewriteResult<strata_core::target::TargetNode> {
        Ok(strata_core::target::TargetNode::identifier(format!("{:?}", node.ty())))
    };
    let binary = Node::from(HirNode::binary(
        HirNode::int(1),
        "+",
        HirNode::int(2),
        strata_core::hir::HirType::Int,
    ));
    assert!(engine.validate(&Stage::CODEGEN, &binary, &context).is_err());

    let context = LoweringContext::new().with_lowerer(&lowerer);
    assert!(engine.validate(&Stage::CODEGEN, &binary, &context).is_ok());
    assert!(context.has(&CollaboratorKey::Lowerer));
}

#[test]
fn test_stats_track_applications_and_replacements() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine.register(Stage::CODEGEN, int_rewriter("one_to_two", 1, 2));

    let context = LoweringContext::new();
    engine.apply(&Stage::CODEGEN, HirNode::int(1).into(), &context)?;
    engine.apply(&Stage::CODEGEN, HirNode::int(5).into(), &context)?;

    let stats = engine.stage_stats(&Stage::CODEGEN);
    let rule_stats = &stats["one_to_two"];
    assert_eq!(rule_stats.applications, 1);
    assert_eq!(rule_stats.replacements, 1);
    assert_eq!(rule_stats.replacement_rate(), 1.0);

    engine.clear_stats();
    assert_eq!(engine.stage_stats(&Stage::CODEGEN)["one_to_two"].applications, 0);

    Ok(())
}

#[test]
fn test_disabled_stats_record_nothing() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new().collect_stats(false);
    engine.register(Stage::CODEGEN, int_rewriter("one_to_two", 1, 2));

    engine.apply(&Stage::CODEGEN, HirNode::int(1).into(), &LoweringContext::new())?;
    assert_eq!(engine.stage_stats(&Stage::CODEGEN)["one_to_two"].applications, 0);

    Ok(())
}

#[test]
fn test_source_nodes_pass_through_codegen_rules() -> anyhow::Result<()> {
    let mut engine = RewriteEngine::new();
    engine.register(Stage::CODEGEN, strata_core::rules::RegexLiteralLowering::new());

    let node = Node::from(SourceAst::Regex {
        pattern: "a+".to_string(),
        flags: String::new(),
    });
    let result = engine.apply(&Stage::CODEGEN, node.clone(), &LoweringContext::new())?;
    assert_eq!(result, node);

    Ok(())
}
