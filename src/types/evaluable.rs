use std::sync::Arc;

use super::category::Category;
use super::group::RuleGroup;
use super::rule::Rule;
use crate::expr::{EvalError, ExpressionEvaluator};
use crate::Facts;

/// Either a single [`Rule`] or a [`RuleGroup`], as stored in a category.
#[derive(Debug, Clone)]
pub enum Evaluable {
    Rule(Arc<Rule>),
    Group(Arc<RuleGroup>),
}

impl Evaluable {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Evaluable::Rule(r) => r.id(),
            Evaluable::Group(g) => g.id(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Evaluable::Rule(r) => r.name(),
            Evaluable::Group(g) => g.name(),
        }
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        match self {
            Evaluable::Rule(r) => r.priority(),
            Evaluable::Group(g) => g.priority(),
        }
    }

    pub fn categories(&self) -> Box<dyn Iterator<Item = &Category> + '_> {
        match self {
            Evaluable::Rule(r) => Box::new(r.categories()),
            Evaluable::Group(g) => Box::new(g.categories()),
        }
    }

    #[must_use]
    pub fn as_rule(&self) -> Option<&Arc<Rule>> {
        match self {
            Evaluable::Rule(r) => Some(r),
            Evaluable::Group(_) => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Arc<RuleGroup>> {
        match self {
            Evaluable::Group(g) => Some(g),
            Evaluable::Rule(_) => None,
        }
    }

    /// Evaluate against `facts`, returning the message to report if it fired.
    ///
    /// # Errors
    ///
    /// Only a single rule can fail here. Groups absorb member errors
    /// according to their operator.
    pub fn evaluate(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        facts: &Facts,
    ) -> Result<Option<String>, EvalError> {
        self.borrowed().evaluate(evaluator, facts)
    }

    pub(crate) fn borrowed(&self) -> EvaluableRef<'_> {
        match self {
            Evaluable::Rule(rule) => EvaluableRef::Rule(rule),
            Evaluable::Group(group) => EvaluableRef::Group(group),
        }
    }
}

/// A rule or group borrowed for one evaluation pass, wherever it is stored.
#[derive(Debug, Clone, Copy)]
pub(crate) enum EvaluableRef<'a> {
    Rule(&'a Rule),
    Group(&'a RuleGroup),
}

impl<'a> EvaluableRef<'a> {
    pub(crate) fn name(self) -> &'a str {
        match self {
            EvaluableRef::Rule(rule) => rule.name(),
            EvaluableRef::Group(group) => group.name(),
        }
    }

    pub(crate) fn evaluate(
        self,
        evaluator: &dyn ExpressionEvaluator,
        facts: &Facts,
    ) -> Result<Option<String>, EvalError> {
        match self {
            EvaluableRef::Rule(rule) => Ok(rule
                .evaluate(evaluator, facts)?
                .then(|| rule.message().to_owned())),
            EvaluableRef::Group(group) => Ok(group.evaluate(evaluator, facts).message),
        }
    }
}

impl From<Rule> for Evaluable {
    fn from(rule: Rule) -> Self {
        Evaluable::Rule(Arc::new(rule))
    }
}

impl From<RuleGroup> for Evaluable {
    fn from(group: RuleGroup) -> Self {
        Evaluable::Group(Arc::new(group))
    }
}

impl From<Arc<Rule>> for Evaluable {
    fn from(rule: Arc<Rule>) -> Self {
        Evaluable::Rule(rule)
    }
}

impl From<Arc<RuleGroup>> for Evaluable {
    fn from(group: Arc<RuleGroup>) -> Self {
        Evaluable::Group(group)
    }
}
