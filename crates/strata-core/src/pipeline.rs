//! Lowering Pipeline - High-level interface over the staged rewrite engine
//!
//! Assembles the default `core_ir` and `codegen` stages and provides the
//! recursive-descent [`TargetEmitter`] that the codegen stage delegates
//! literals, identifiers and calls to.

use std::cell::Cell;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{ImportDecl, SourceAst};
use crate::config::LoweringConfig;
use crate::errors::LoweringError;
use crate::events::EventBus;
use crate::hir::{HirNode, Literal, TypedValue};
use crate::node::{Node, NodeKind};
use crate::rewrite::{
    DelegateDescriptor, DelegatingRule, ExpressionLowerer, LoweringContext, MatchAnalyzer,
    MissingItemHandler, RegisterFunction, RewriteEngine, RewriteResult, Stage, StdlibResolver,
    TransformArm,
};
use crate::rules::{
    BinaryExpressionLowering, MatchDesugaring, RegexLiteralLowering, StdlibImportResolution,
};
use crate::target::TargetNode;

/// Recursive-descent lowerer from HighIR to the target AST
///
/// Lowers each subexpression by running the codegen stage on it, passing
/// itself as both the `lowerer` and the delegate for leaves and calls.
pub struct TargetEmitter {
    engine: Arc<RewriteEngine>,
    delegate_key: String,
    max_depth: usize,
    depth: Cell<usize>,
}

impl TargetEmitter {
    pub fn new(engine: Arc<RewriteEngine>, config: &LoweringConfig) -> Self {
        Self {
            engine,
            delegate_key: config.delegate_key.clone(),
            max_depth: config.max_lowering_depth,
            depth: Cell::new(0),
        }
    }

    /// Adapter rule forwarding literals and identifiers to [`TargetEmitter::emit_leaf`]
    pub fn leaf_rule(key: &str) -> DelegatingRule<TargetEmitter> {
        DelegatingRule::new(
            "TargetEmitter::emit_leaf",
            DelegateDescriptor::new(
                [NodeKind::HirLiteral, NodeKind::HirIdentifier],
                "emit_leaf",
                TargetEmitter::emit_leaf,
            )
            .with_key(key.to_string()),
        )
    }

    /// Adapter rule forwarding calls to [`TargetEmitter::emit_call`]
    pub fn call_rule(key: &str) -> DelegatingRule<TargetEmitter> {
        DelegatingRule::new(
            "TargetEmitter::emit_call",
            DelegateDescriptor::new([NodeKind::HirCall], "emit_call", TargetEmitter::emit_call)
                .with_key(key.to_string()),
        )
    }

    pub fn emit_leaf(&self, node: &Node) -> RewriteResult<Node> {
        let lowered = match node {
            Node::Hir(HirNode::Literal(literal)) => match literal {
                Literal::Int(value) => TargetNode::number(value),
                Literal::Float(value) if value.is_finite() => {
                    TargetNode::Number(format!("{value:?}"))
                }
                Literal::Float(value) => {
                    return Err(LoweringError::NonFiniteFloat {
                        value: value.to_string(),
                    }
                    .into())
                }
                Literal::Str(value) => TargetNode::string(value.as_str()),
                Literal::Bool(value) => TargetNode::Boolean(*value),
                Literal::Nil => TargetNode::Nil,
            },
            Node::Hir(HirNode::Identifier { name, .. }) => TargetNode::identifier(name.as_str()),
            other => {
                return Err(LoweringError::unexpected_node(
                    "TargetEmitter::emit_leaf",
                    "a HighIR literal or identifier",
                    other.kind(),
                )
                .into())
            }
        };
        Ok(Node::Target(lowered))
    }

    pub fn emit_call(&self, node: &Node) -> RewriteResult<Node> {
        let Node::Hir(HirNode::Call { callee, args, .. }) = node else {
            return Err(LoweringError::unexpected_node(
                "TargetEmitter::emit_call",
                "a HighIR call",
                node.kind(),
            )
            .into());
        };

        let args = args
            .iter()
            .map(|arg| self.lower_expression(arg))
            .collect::<RewriteResult<Vec<_>>>()?;
        Ok(Node::Target(TargetNode::call(callee.as_str(), args)))
    }
}

impl ExpressionLowerer for TargetEmitter {
    fn lower_expression(&self, node: &HirNode) -> RewriteResult<TargetNode> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(LoweringError::DepthExceeded {
                max: self.max_depth,
            }
            .into());
        }

        let context = LoweringContext::new()
            .with_lowerer(self)
            .with_delegate(self.delegate_key.clone(), self);

        let node = Node::Hir(node.clone());
        self.engine.validate(&Stage::CODEGEN, &node, &context)?;

        self.depth.set(depth + 1);
        let result = self.engine.apply(&Stage::CODEGEN, node, &context);
        self.depth.set(depth);

        result?.into_target().map_err(|other| {
            LoweringError::NotLowered {
                stage: Stage::CODEGEN.to_string(),
                found: other.kind(),
            }
            .into()
        })
    }
}

/// High-level lowering pipeline with the default stages
pub struct Pipeline {
    engine: Arc<RewriteEngine>,
    config: LoweringConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration
    pub fn new(config: LoweringConfig) -> RewriteResult<Self> {
        config.validate()?;
        let engine = Self::build_engine(&config);
        Ok(Self {
            engine: Arc::new(engine),
            config,
        })
    }

    /// Default stage layout:
    /// - `core_ir`: match desugaring, stdlib import resolution
    /// - `codegen`: leaf and call delegation, binary lowering, regex lowering
    pub fn build_engine(config: &LoweringConfig) -> RewriteEngine {
        let mut engine = RewriteEngine::new().collect_stats(config.collect_stats);

        engine
            .register(Stage::CORE_IR, MatchDesugaring::new())
            .register(Stage::CORE_IR, StdlibImportResolution::new());

        engine
            .register(Stage::CODEGEN, TargetEmitter::leaf_rule(&config.delegate_key))
            .register(Stage::CODEGEN, TargetEmitter::call_rule(&config.delegate_key))
            .register(Stage::CODEGEN, BinaryExpressionLowering::new())
            .register(Stage::CODEGEN, RegexLiteralLowering::from_config(config));

        engine
    }

    pub fn engine(&self) -> &RewriteEngine {
        &self.engine
    }

    pub fn config(&self) -> &LoweringConfig {
        &self.config
    }

    /// Lower a HighIR expression to the target AST
    pub fn lower_expression(&self, hir: &HirNode) -> RewriteResult<TargetNode> {
        let emitter = TargetEmitter::new(self.engine.clone(), &self.config);
        emitter.lower_expression(hir)
    }

    /// Desugar a source match expression into HighIR
    pub fn desugar_match(
        &self,
        source: &SourceAst,
        scrutinee: &TypedValue,
        analyzer: &dyn MatchAnalyzer,
        transform_arm: &TransformArm<'_>,
    ) -> RewriteResult<HirNode> {
        let context = LoweringContext::new()
            .with_scrutinee(scrutinee)
            .with_match_analyzer(analyzer)
            .with_transform_arm(transform_arm);

        self.run_core_ir(Node::Source(source.clone()), &context)
    }

    /// Resolve an import against `registry`, reporting outcomes through the
    /// callbacks and `bus`
    pub fn resolve_import(
        &self,
        import: &ImportDecl,
        registry: &dyn StdlibResolver,
        bus: &EventBus,
        register: &RegisterFunction<'_>,
        on_missing: &MissingItemHandler<'_>,
    ) -> RewriteResult<HirNode> {
        let context = LoweringContext::new()
            .with_stdlib_registry(registry)
            .with_event_bus(bus)
            .with_register_stdlib_function(register)
            .with_on_missing_item(on_missing);

        self.run_core_ir(Node::Source(SourceAst::Import(import.clone())), &context)
    }

    fn run_core_ir(&self, node: Node, context: &LoweringContext<'_>) -> RewriteResult<HirNode> {
        self.engine.validate(&Stage::CORE_IR, &node, context)?;
        let lowered = self.engine.apply(&Stage::CORE_IR, node, context)?;
        debug!(result = %lowered.kind(), "core_ir stage finished");

        lowered.into_hir().map_err(|other| {
            LoweringError::NotLowered {
                stage: Stage::CORE_IR.to_string(),
                found: other.kind(),
            }
            .into()
        })
    }
}
