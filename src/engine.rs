use std::borrow::Borrow;
use std::fmt;
use std::time::Instant;

use tracing::{debug, info, instrument, trace, warn};

use crate::expr::{CachingEvaluator, DefaultEvaluator, EvalError, ExpressionEvaluator};
use crate::registry::Registry;
use crate::types::{Evaluable, EvaluableRef, EvaluationReport, Rule, RuleGroup, RuleResult};
use crate::{Facts, Value};

/// Name reported by [`RulesEngine::evaluate_with_result`].
pub const EXPRESSION_RESULT_NAME: &str = "Expression";

/// Names and errors collected for [`EvaluationReport`].
#[derive(Default)]
struct Diagnostics {
    evaluated: Vec<String>,
    errors: Vec<(String, String)>,
}

/// Evaluates rules and groups against facts, first match wins.
///
/// The engine owns the [`Registry`] it reads categories from. Evaluation
/// takes `&self`, so a fully configured engine can be shared across threads
/// behind an `Arc`.
pub struct RulesEngine {
    registry: Registry,
    evaluator: Box<dyn ExpressionEvaluator>,
}

impl fmt::Debug for RulesEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesEngine")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

impl RulesEngine {
    /// An engine over `registry`, caching parsed conditions when the
    /// registry's config asks for it.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        if registry.config().cache_expressions() {
            Self::with_evaluator(registry, CachingEvaluator::new())
        } else {
            Self::with_evaluator(registry, DefaultEvaluator)
        }
    }

    #[must_use]
    pub fn with_evaluator(registry: Registry, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        Self {
            registry,
            evaluator: Box::new(evaluator),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    #[must_use]
    pub fn evaluator(&self) -> &dyn ExpressionEvaluator {
        self.evaluator.as_ref()
    }

    /// Evaluate `rules` in the order given and report the first that fires.
    ///
    /// A rule whose condition fails to evaluate is logged and treated as not
    /// firing.
    pub fn execute_rules_list<R: Borrow<Rule>>(&self, rules: &[R], facts: &Facts) -> RuleResult {
        info!(count = rules.len(), "executing rules list");
        self.first_match(
            rules.iter().map(|r| EvaluableRef::Rule(r.borrow())),
            rules.len(),
            facts,
            None,
        )
    }

    /// Evaluate `groups` in the order given and report the first that fires.
    pub fn execute_rule_groups_list<G: Borrow<RuleGroup>>(
        &self,
        groups: &[G],
        facts: &Facts,
    ) -> RuleResult {
        info!(count = groups.len(), "executing rule groups list");
        self.first_match(
            groups.iter().map(|g| EvaluableRef::Group(g.borrow())),
            groups.len(),
            facts,
            None,
        )
    }

    /// Evaluate a list that may mix rules and groups.
    pub fn execute_rules(&self, items: &[Evaluable], facts: &Facts) -> RuleResult {
        info!(count = items.len(), "executing rules");
        self.first_match(items.iter().map(Evaluable::borrowed), items.len(), facts, None)
    }

    /// Evaluate everything registered under `category`, by priority.
    #[instrument(skip(self, facts), fields(facts = facts.len()))]
    pub fn execute_rules_for_category(&self, category: &str, facts: &Facts) -> RuleResult {
        let items = self.registry.rules_for_category(category);
        info!(count = items.len(), "executing rules for category");
        self.first_match(items.iter().map(Evaluable::borrowed), items.len(), facts, None)
    }

    /// Like [`execute_rules`](Self::execute_rules), also recording what was
    /// evaluated, what failed, and how long it took.
    pub fn execute_detailed(&self, items: &[Evaluable], facts: &Facts) -> EvaluationReport {
        let start = Instant::now();
        let mut diagnostics = Diagnostics::default();
        let result = self.first_match(
            items.iter().map(Evaluable::borrowed),
            items.len(),
            facts,
            Some(&mut diagnostics),
        );
        EvaluationReport::new(
            result,
            diagnostics.evaluated,
            diagnostics.errors,
            start.elapsed(),
        )
    }

    /// Evaluate a free-standing expression.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the expression does not parse or cannot be
    /// evaluated against `facts`.
    pub fn evaluate_expression(&self, source: &str, facts: &Facts) -> Result<Value, EvalError> {
        debug!(source, "evaluating expression");
        self.evaluator.evaluate(source, facts)
    }

    /// Evaluate a free-standing expression into a [`RuleResult`].
    ///
    /// `true`, or any non-null non-boolean value, is a match; `false` and
    /// `null` are no match; a failure is an error result carrying its text.
    pub fn evaluate_with_result(&self, source: &str, facts: &Facts) -> RuleResult {
        match self.evaluate_expression(source, facts) {
            Ok(Value::Bool(true)) => RuleResult::matched(
                EXPRESSION_RESULT_NAME,
                format!("Expression evaluated to true: {source}"),
            ),
            Ok(Value::Bool(false) | Value::Null) => RuleResult::no_match(),
            Ok(value) => {
                debug!(source, result = %value, "non-boolean expression result");
                RuleResult::matched(
                    EXPRESSION_RESULT_NAME,
                    format!("Expression evaluated successfully: {source}"),
                )
            }
            Err(err) => {
                warn!(source, error = %err, "error evaluating expression");
                RuleResult::error(
                    EXPRESSION_RESULT_NAME,
                    format!("Error evaluating expression: {err}"),
                )
            }
        }
    }

    fn first_match<'a>(
        &self,
        candidates: impl Iterator<Item = EvaluableRef<'a>>,
        count: usize,
        facts: &Facts,
        mut diagnostics: Option<&mut Diagnostics>,
    ) -> RuleResult {
        if count == 0 {
            info!("no rules provided");
            return RuleResult::no_rules();
        }
        log_facts(facts);

        let evaluator = self.evaluator.as_ref();
        for candidate in candidates {
            if let Some(d) = diagnostics.as_deref_mut() {
                d.evaluated.push(candidate.name().to_owned());
            }
            match candidate.evaluate(evaluator, facts) {
                Ok(Some(message)) => {
                    info!(rule = candidate.name(), "rule matched");
                    return RuleResult::matched(candidate.name(), message);
                }
                Ok(None) => debug!(rule = candidate.name(), "rule did not match"),
                Err(err) => {
                    warn!(rule = candidate.name(), error = %err, "error evaluating rule");
                    if let Some(d) = diagnostics.as_deref_mut() {
                        d.errors.push((candidate.name().to_owned(), err.to_string()));
                    }
                }
            }
        }

        info!("no matching rules found");
        RuleResult::no_match()
    }
}

fn log_facts(facts: &Facts) {
    debug!(facts = facts.len(), "evaluation context created");
    for name in facts.names() {
        if let Some(value) = facts.get(name) {
            trace!(fact = name, %value, "fact");
        }
    }
}
