use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::category::Category;
use super::error::ConfigError;
use super::rule::{generate_id, push_unique, Rule};
use crate::config::{DEFAULT_CATEGORY, DEFAULT_PRIORITY};
use crate::expr::ExpressionEvaluator;
use crate::Facts;

/// How the member rules of a [`RuleGroup`] are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupOperator {
    /// Every member must hold. Stops at the first member that does not.
    #[default]
    And,
    /// Any member may hold. Stops at the first member that does.
    Or,
}

impl GroupOperator {
    /// The accumulator's starting value: `true` for AND, `false` for OR.
    #[must_use]
    pub fn identity(self) -> bool {
        matches!(self, GroupOperator::And)
    }
}

impl fmt::Display for GroupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOperator::And => write!(f, "AND"),
            GroupOperator::Or => write!(f, "OR"),
        }
    }
}

/// Outcome of one [`RuleGroup::evaluate`] call.
///
/// `message` is `Some` exactly when `triggered` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct GroupEvaluation {
    pub triggered: bool,
    pub message: Option<String>,
}

impl GroupEvaluation {
    fn not_triggered() -> Self {
        Self {
            triggered: false,
            message: None,
        }
    }
}

/// Rules combined under AND or OR, evaluated in ascending sequence number.
///
/// Sequence numbers are unique keys within the group: adding a rule at a
/// sequence number that is already taken replaces the previous rule.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    id: String,
    categories: Vec<Category>,
    name: String,
    description: String,
    priority: i32,
    operator: GroupOperator,
    rules: BTreeMap<i32, Arc<Rule>>,
}

impl RuleGroup {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    #[must_use]
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name() == name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[must_use]
    pub fn operator(&self) -> GroupOperator {
        self.operator
    }

    /// Add a rule at `sequence_number`, replacing any rule already there.
    pub fn add_rule(&mut self, rule: impl Into<Arc<Rule>>, sequence_number: i32) {
        let rule = rule.into();
        if let Some(previous) = self.rules.insert(sequence_number, Arc::clone(&rule)) {
            debug!(
                group = %self.name,
                sequence_number,
                replaced = %previous.name(),
                rule = %rule.name(),
                "replaced rule at existing sequence number"
            );
        }
    }

    /// Member rules in sequence order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate the members in sequence order against `facts`.
    ///
    /// An empty group never triggers. Evaluation stops as soon as the
    /// operator's outcome is decided. A member whose condition fails to
    /// evaluate fails the whole group under AND and is skipped under OR.
    pub fn evaluate(&self, evaluator: &dyn ExpressionEvaluator, facts: &Facts) -> GroupEvaluation {
        if self.rules.is_empty() {
            debug!(group = %self.name, "empty rule group does not trigger");
            return GroupEvaluation::not_triggered();
        }

        let mut result = self.operator.identity();
        for (sequence_number, rule) in &self.rules {
            let rule_result = match rule.evaluate(evaluator, facts) {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        group = %self.name,
                        rule = %rule.name(),
                        sequence_number,
                        error = %err,
                        "error evaluating rule in group"
                    );
                    match self.operator {
                        GroupOperator::And => return GroupEvaluation::not_triggered(),
                        GroupOperator::Or => continue,
                    }
                }
            };
            debug!(
                group = %self.name,
                rule = %rule.name(),
                sequence_number,
                result = rule_result,
                "group member evaluated"
            );

            match self.operator {
                GroupOperator::And => {
                    result = result && rule_result;
                    if !result {
                        break;
                    }
                }
                GroupOperator::Or => {
                    result = result || rule_result;
                    if result {
                        break;
                    }
                }
            }
        }

        if result {
            GroupEvaluation {
                triggered: true,
                message: Some(self.compose_message()),
            }
        } else {
            GroupEvaluation::not_triggered()
        }
    }

    /// `"{name}: m1 AND m2"` over every member, or the lone member's message.
    fn compose_message(&self) -> String {
        let mut rules = self.rules.values();
        match (rules.next(), rules.next()) {
            (Some(only), None) => only.message().to_owned(),
            _ => {
                let separator = format!(" {} ", self.operator);
                let messages: Vec<&str> = self.rules.values().map(|r| r.message()).collect();
                format!("{}: {}", self.name, messages.join(&separator))
            }
        }
    }
}

/// Fluent builder for [`RuleGroup`]. Name and description are mandatory.
#[derive(Debug, Clone)]
#[must_use]
pub struct RuleGroupBuilder {
    id: String,
    categories: Vec<Category>,
    fallback_category: String,
    name: Option<String>,
    description: Option<String>,
    priority: i32,
    operator: GroupOperator,
}

impl Default for RuleGroupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleGroupBuilder {
    /// A builder with a generated `G`-prefixed id.
    pub fn new() -> Self {
        Self::with_id(generate_id('G'))
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            categories: Vec::new(),
            fallback_category: DEFAULT_CATEGORY.to_owned(),
            name: None,
            description: None,
            priority: DEFAULT_PRIORITY,
            operator: GroupOperator::And,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        push_unique(&mut self.categories, category);
        self
    }

    /// Add a category by name at the builder's current priority.
    pub fn category_name(self, name: &str) -> Self {
        let category = Category::new(name, self.priority);
        self.category(category)
    }

    /// Category assigned at build time when none was added.
    pub fn default_category(mut self, name: impl Into<String>) -> Self {
        self.fallback_category = name.into();
        self
    }

    /// Replace all categories.
    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.clear();
        for category in categories {
            push_unique(&mut self.categories, category);
        }
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn operator(mut self, operator: GroupOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn and(self) -> Self {
        self.operator(GroupOperator::And)
    }

    pub fn or(self) -> Self {
        self.operator(GroupOperator::Or)
    }

    /// Materialize an empty group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingGroupField`] if the name or description
    /// is unset or empty.
    pub fn build(self) -> Result<RuleGroup, ConfigError> {
        let name = self.name.filter(|n| !n.is_empty()).ok_or_else(|| {
            ConfigError::MissingGroupField {
                id: self.id.clone(),
                field: "name",
            }
        })?;
        let description = self
            .description
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ConfigError::MissingGroupField {
                id: self.id.clone(),
                field: "description",
            })?;

        let mut categories = self.categories;
        if categories.is_empty() {
            categories.push(Category::new(self.fallback_category, self.priority));
        }

        Ok(RuleGroup {
            id: self.id,
            categories,
            name,
            description,
            priority: self.priority,
            operator: self.operator,
            rules: BTreeMap::new(),
        })
    }
}
