use tracing::warn;

use super::category::Category;
use super::error::ConfigError;
use crate::config::{DEFAULT_CATEGORY, DEFAULT_PRIORITY};
use crate::expr::{EvalError, ExpressionEvaluator};
use crate::Facts;

/// A named condition with the message shown when it fires.
///
/// Rules are immutable once built. The condition is kept as source text and
/// handed to an [`ExpressionEvaluator`] on every evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: String,
    categories: Vec<Category>,
    name: String,
    condition: String,
    message: String,
    description: String,
    priority: i32,
}

impl Rule {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The categories this rule is indexed under, in the order they were added.
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
    pub fn condition(&self) -> &str {
        &self.condition
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Lower values are evaluated first.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Evaluate the condition. Anything other than a boolean `true` counts
    /// as not firing.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the condition cannot be parsed or evaluated.
    pub fn evaluate(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        facts: &Facts,
    ) -> Result<bool, EvalError> {
        evaluator.evaluate_condition(&self.condition, facts)
    }
}

/// Fluent builder for [`Rule`].
///
/// Name, condition and message are mandatory. The description falls back to
/// the message, and a rule given no category lands in `"default"`.
#[derive(Debug, Clone)]
#[must_use]
pub struct RuleBuilder {
    id: String,
    categories: Vec<Category>,
    fallback_category: String,
    name: Option<String>,
    condition: Option<String>,
    message: Option<String>,
    description: Option<String>,
    priority: i32,
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBuilder {
    /// A builder with a generated `R`-prefixed id.
    pub fn new() -> Self {
        Self::with_id(generate_id('R'))
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            categories: Vec::new(),
            fallback_category: DEFAULT_CATEGORY.to_owned(),
            name: None,
            condition: None,
            message: None,
            description: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Add a category. A category with the same name already present wins.
    pub fn category(mut self, category: Category) -> Self {
        push_unique(&mut self.categories, category);
        self
    }

    /// Add a category by name. Its sequence number is the builder's priority
    /// at the time of this call.
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

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
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

    /// Materialize the rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRuleField`] if the name, condition or
    /// message is unset or empty.
    pub fn build(self) -> Result<Rule, ConfigError> {
        let name = required(self.name, &self.id, "name")?;
        let condition = required(self.condition, &self.id, "condition")?;
        let message = required(self.message, &self.id, "message")?;
        let description = self
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| message.clone());

        let mut categories = self.categories;
        if categories.is_empty() {
            categories.push(Category::new(self.fallback_category, self.priority));
        }

        Ok(Rule {
            id: self.id,
            categories,
            name,
            condition,
            message,
            description,
            priority: self.priority,
        })
    }
}

fn required(value: Option<String>, id: &str, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            warn!(rule = id, field, "rule is missing a mandatory field");
            Err(ConfigError::MissingRuleField {
                id: id.to_owned(),
                field,
            })
        }
    }
}

pub(crate) fn push_unique(categories: &mut Vec<Category>, category: Category) {
    if !categories.contains(&category) {
        categories.push(category);
    }
}

/// `prefix` followed by the first 8 hex digits of a v4 UUID.
pub(crate) fn generate_id(prefix: char) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &uuid[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RuleBuilder {
        RuleBuilder::with_id("R1")
            .name("large order")
            .condition("#orderTotal > 500")
            .message("Large order discount applies")
    }

    #[test]
    fn build_minimal_rule() {
        let rule = minimal().build().unwrap();
        assert_eq!(rule.id(), "R1");
        assert_eq!(rule.name(), "large order");
        assert_eq!(rule.condition(), "#orderTotal > 500");
        assert_eq!(rule.priority(), DEFAULT_PRIORITY);
    }

    #[test]
    fn description_defaults_to_message() {
        let rule = minimal().build().unwrap();
        assert_eq!(rule.description(), "Large order discount applies");

        let rule = minimal().description("").build().unwrap();
        assert_eq!(rule.description(), "Large order discount applies");

        let rule = minimal().description("explicit").build().unwrap();
        assert_eq!(rule.description(), "explicit");
    }

    #[test]
    fn default_category_uses_builder_priority() {
        let rule = minimal().priority(7).build().unwrap();
        let categories: Vec<&Category> = rule.categories().collect();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name(), DEFAULT_CATEGORY);
        assert_eq!(categories[0].sequence_number(), 7);
    }

    #[test]
    fn category_name_takes_current_priority() {
        let rule = minimal()
            .priority(5)
            .category_name("orders")
            .priority(50)
            .build()
            .unwrap();
        let category = rule.categories().next().unwrap();
        assert_eq!(category.sequence_number(), 5);
        assert_eq!(rule.priority(), 50);
        assert!(rule.has_category("orders"));
        assert!(!rule.has_category(DEFAULT_CATEGORY));
    }

    #[test]
    fn categories_replaces_existing() {
        let rule = minimal()
            .category_name("a")
            .categories([Category::new("b", 1), Category::new("c", 2)])
            .build()
            .unwrap();
        let names: Vec<&str> = rule.categories().map(Category::name).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn duplicate_category_names_keep_first() {
        let rule = minimal()
            .category(Category::new("orders", 1))
            .category(Category::new("orders", 99))
            .build()
            .unwrap();
        let categories: Vec<&Category> = rule.categories().collect();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].sequence_number(), 1);
    }

    #[test]
    fn missing_fields_are_config_errors() {
        let err = RuleBuilder::with_id("R9")
            .condition("true")
            .message("m")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRuleField {
                id: "R9".into(),
                field: "name"
            }
        );

        let err = RuleBuilder::with_id("R9")
            .name("n")
            .condition("")
            .message("m")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRuleField { field: "condition", .. }));

        let err = RuleBuilder::with_id("R9")
            .name("n")
            .condition("true")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRuleField { field: "message", .. }));
    }

    #[test]
    fn generated_ids() {
        let id = RuleBuilder::new().name("n").condition("true").message("m").build().unwrap();
        assert!(id.id().starts_with('R'));
        assert_eq!(id.id().len(), 9);
        assert_ne!(generate_id('R'), generate_id('R'));
    }
}
