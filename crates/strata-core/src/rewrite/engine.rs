/*!
# RewriteEngine - Staged Rule Application

Owns the stage → rule list registry and folds a node through the rules of one
stage in registration order.
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::node::Node;

use super::context::{CollaboratorKey, LoweringContext};
use super::rules::{LoweringRule, Rewrite, RuleStats};
use super::{RewriteResult, Stage};

/// Builds a new rule instance for each application
pub type RuleFactory = Arc<dyn Fn() -> Box<dyn LoweringRule> + Send + Sync>;

/// How a registered rule is instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstancePolicy {
    /// One instance reused for every application
    Shared,
    /// A fresh instance constructed before each applies/apply pair
    FreshPerCall,
}

enum RuleSource {
    Shared(Arc<dyn LoweringRule>),
    Fresh(RuleFactory),
}

struct RuleEntry {
    name: &'static str,
    source: RuleSource,
    inert_checked: AtomicBool,
}

impl RuleEntry {
    fn policy(&self) -> InstancePolicy {
        match self.source {
            RuleSource::Shared(_) => InstancePolicy::Shared,
            RuleSource::Fresh(_) => InstancePolicy::FreshPerCall,
        }
    }

    /// Run `f` against the instance this entry's policy selects
    fn with_rule<T>(&self, stage: &Stage, f: impl FnOnce(&dyn LoweringRule) -> T) -> T {
        match &self.source {
            RuleSource::Shared(rule) => f(rule.as_ref()),
            RuleSource::Fresh(factory) => {
                let rule = factory();
                if !self.inert_checked.swap(true, Ordering::Relaxed) && rule.is_inert() {
                    warn!(%stage, rule = self.name, "registered rule can never match any node");
                }
                f(rule.as_ref())
            }
        }
    }
}

/// Short type name used for rules registered by type
fn definition_name<R>() -> &'static str {
    let full = std::any::type_name::<R>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Staged rewrite engine
///
/// Registration happens once while the pipeline is built; `apply` takes
/// `&self` so a finished engine can be shared between compilation units.
pub struct RewriteEngine {
    stages: IndexMap<Stage, Vec<RuleEntry>>,
    stats: Mutex<IndexMap<(Stage, &'static str), RuleStats>>,
    collect_stats: bool,
}

impl RewriteEngine {
    pub fn new() -> Self {
        Self {
            stages: IndexMap::new(),
            stats: Mutex::new(IndexMap::new()),
            collect_stats: true,
        }
    }

    /// Enable or disable per-rule statistics
    pub fn collect_stats(mut self, enabled: bool) -> Self {
        self.collect_stats = enabled;
        self
    }

    /// Append a rule instance to `stage`; the instance is reused for every application
    pub fn register<R>(&mut self, stage: impl Into<Stage>, rule: R) -> &mut Self
    where
        R: LoweringRule + 'static,
    {
        self.register_shared(stage, Arc::new(rule))
    }

    /// Append an already shared rule instance to `stage`
    pub fn register_shared(&mut self, stage: impl Into<Stage>, rule: Arc<dyn LoweringRule>) -> &mut Self {
        let stage = stage.into();
        if rule.is_inert() {
            warn!(%stage, rule = rule.name(), "registered rule can never match any node");
        }
        let entry = RuleEntry {
            name: rule.name(),
            source: RuleSource::Shared(rule),
            inert_checked: AtomicBool::new(true),
        };
        self.push_entry(stage, entry)
    }

    /// Append a rule definition named `name` to `stage`
    ///
    /// `factory` is never called here; it runs once before every applies/apply
    /// pair, and the first instance it builds is checked for inertness.
    pub fn register_fresh<R, F>(
        &mut self,
        stage: impl Into<Stage>,
        name: &'static str,
        factory: F,
    ) -> &mut Self
    where
        R: LoweringRule + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let factory: RuleFactory = Arc::new(move || Box::new(factory()) as Box<dyn LoweringRule>);
        let entry = RuleEntry {
            name,
            source: RuleSource::Fresh(factory),
            inert_checked: AtomicBool::new(false),
        };
        self.push_entry(stage.into(), entry)
    }

    /// Append the rule type `R`, instantiated through `Default` before every
    /// application and named after the type
    pub fn register_definition<R>(&mut self, stage: impl Into<Stage>) -> &mut Self
    where
        R: LoweringRule + Default + 'static,
    {
        self.register_fresh(stage, definition_name::<R>(), R::default)
    }

    fn push_entry(&mut self, stage: Stage, entry: RuleEntry) -> &mut Self {
        debug!(%stage, rule = entry.name, policy = ?entry.policy(), "registering rule");

        self.stats
            .get_mut()
            .entry((stage.clone(), entry.name))
            .or_insert_with(|| RuleStats::for_stage(stage.to_string(), entry.name.to_string()));
        self.stages.entry(stage).or_default().push(entry);
        self
    }

    /// Apply every rule of `stage`, in registration order, to `node`
    ///
    /// Each rule is tested against the current result, so a rule can claim a
    /// node produced by an earlier rule of the same stage. Errors from a rule
    /// abort the stage and are returned as-is; side effects already performed
    /// by earlier rules stay in place.
    pub fn apply(&self, stage: &Stage, node: Node, context: &LoweringContext<'_>) -> RewriteResult<Node> {
        let Some(entries) = self.stages.get(stage) else {
            trace!(%stage, "no rules registered for stage");
            return Ok(node);
        };

        let mut result = node;
        for entry in entries {
            let outcome = entry.with_rule(stage, |rule| -> RewriteResult<Option<Rewrite>> {
                if !rule.applies(&result, context) {
                    return Ok(None);
                }

                let start_time = Instant::now();
                let outcome = rule.apply(&result, context);
                self.record(
                    stage,
                    entry.name,
                    outcome.as_ref().ok().map(Rewrite::is_replaced),
                    start_time.elapsed(),
                );
                outcome.map(Some)
            })?;

            match outcome {
                Some(Rewrite::Replaced(replacement)) => {
                    debug!(
                        %stage,
                        rule = entry.name,
                        from = %result.kind(),
                        to = %replacement.kind(),
                        "rule replaced node"
                    );
                    result = replacement;
                }
                Some(Rewrite::Unchanged) => {
                    trace!(%stage, rule = entry.name, "rule left node unchanged");
                }
                None => {}
            }
        }

        Ok(result)
    }

    /// Fold `node` through `stages` in order; each stage's output feeds the next
    pub fn apply_stages(
        &self,
        stages: &[Stage],
        node: Node,
        context: &LoweringContext<'_>,
    ) -> RewriteResult<Node> {
        stages
            .iter()
            .try_fold(node, |node, stage| self.apply(stage, node, context))
    }

    /// Check up front that `context` holds every collaborator needed by the
    /// rules of `stage` that claim `node`, instead of failing when a rule
    /// first needs one
    ///
    /// Only the rules claiming `node` itself are checked. A rule that would
    /// claim the output of an earlier rule in the stage still fails lazily.
    /// Fresh entries build one instance for the check.
    pub fn validate(
        &self,
        stage: &Stage,
        node: &Node,
        context: &LoweringContext<'_>,
    ) -> RewriteResult<()> {
        let required: Vec<CollaboratorKey> = self
            .stages
            .get(stage)
            .into_iter()
            .flatten()
            .flat_map(|entry| {
                entry.with_rule(stage, |rule| {
                    if rule.applies(node, context) {
                        rule.requires()
                    } else {
                        Vec::new()
                    }
                })
            })
            .collect();

        context.require(&required)?;
        Ok(())
    }

    fn record(
        &self,
        stage: &Stage,
        rule_name: &'static str,
        replaced: Option<bool>,
        elapsed: Duration,
    ) {
        if !self.collect_stats {
            return;
        }

        let mut stats = self.stats.lock();
        let stats = stats
            .entry((stage.clone(), rule_name))
            .or_insert_with(|| RuleStats::for_stage(stage.to_string(), rule_name.to_string()));
        stats.applications += 1;
        stats.total_time += elapsed;
        match replaced {
            Some(true) => stats.replacements += 1,
            Some(false) => {}
            None => stats.errors += 1,
        }
    }

    /// Registered stages in first-registration order
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.keys()
    }

    /// Rule names of `stage` in application order
    pub fn rule_names(&self, stage: &Stage) -> Vec<&'static str> {
        self.stages
            .get(stage)
            .map(|entries| entries.iter().map(|entry| entry.name).collect())
            .unwrap_or_default()
    }

    /// Instance policy of each rule of `stage`, in application order
    pub fn policies(&self, stage: &Stage) -> Vec<InstancePolicy> {
        self.stages
            .get(stage)
            .map(|entries| entries.iter().map(RuleEntry::policy).collect())
            .unwrap_or_default()
    }

    pub fn rule_count(&self, stage: &Stage) -> usize {
        self.stages.get(stage).map_or(0, Vec::len)
    }

    /// Statistics of every registered rule, in registration order
    ///
    /// Rules of different stages are counted separately; rules sharing a name
    /// within one stage share their counters.
    pub fn stats(&self) -> Vec<RuleStats> {
        self.stats.lock().values().cloned().collect()
    }

    /// Statistics of the rules of `stage`, keyed by rule name
    pub fn stage_stats(&self, stage: &Stage) -> HashMap<String, RuleStats> {
        self.stats
            .lock()
            .iter()
            .filter(|((rule_stage, _), _)| rule_stage == stage)
            .map(|((_, name), stats)| (name.to_string(), stats.clone()))
            .collect()
    }

    /// Clear statistics
    pub fn clear_stats(&self) {
        for stats in self.stats.lock().values_mut() {
            *stats = RuleStats::for_stage(stats.stage.clone(), stats.rule_name.clone());
        }
    }
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::new()
    }
}
