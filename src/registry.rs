use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::types::{
    Category, CombineError, ConfigError, Evaluable, GroupOperator, Rule, RuleBuilder, RuleGroup,
    RuleGroupBuilder,
};

/// Key of one entry in a category list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Member {
    Rule(String),
    Group(String),
}

/// Owns every registered rule and group, indexed by id and by category.
///
/// Category lists are kept sorted by ascending priority as entries are
/// registered. Entries with equal priority stay in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    config: EngineConfig,
    rules: HashMap<String, Arc<Rule>>,
    groups: HashMap<String, Arc<RuleGroup>>,
    categories: HashMap<String, Category>,
    by_category: HashMap<String, Vec<(i32, Member)>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -- Builders -----------------------------------------------------------

    /// An unregistered rule builder seeded with the configured defaults.
    pub fn new_rule(&self) -> RuleBuilder {
        self.seed_rule(RuleBuilder::new())
    }

    pub fn new_rule_with_id(&self, id: impl Into<String>) -> RuleBuilder {
        self.seed_rule(RuleBuilder::with_id(id))
    }

    /// An unregistered group builder seeded with the configured defaults.
    pub fn new_group(&self) -> RuleGroupBuilder {
        self.seed_group(RuleGroupBuilder::new())
    }

    pub fn new_group_with_id(&self, id: impl Into<String>) -> RuleGroupBuilder {
        self.seed_group(RuleGroupBuilder::with_id(id))
    }

    fn seed_rule(&self, builder: RuleBuilder) -> RuleBuilder {
        builder
            .priority(self.config.default_priority())
            .default_category(self.config.default_category())
    }

    fn seed_group(&self, builder: RuleGroupBuilder) -> RuleGroupBuilder {
        builder
            .priority(self.config.default_priority())
            .default_category(self.config.default_category())
    }

    // -- Registration -------------------------------------------------------

    /// Index `rule` by id and under each of its categories. A rule already
    /// registered under the same id is replaced everywhere.
    pub fn register_rule(&mut self, rule: Rule) -> Arc<Rule> {
        let rule = Arc::new(rule);
        let member = Member::Rule(rule.id().to_owned());
        if self
            .rules
            .insert(rule.id().to_owned(), Arc::clone(&rule))
            .is_some()
        {
            debug!(rule = rule.id(), "replacing registered rule");
            self.unindex(&member);
        }
        for category in rule.categories() {
            self.index(category, rule.priority(), member.clone());
        }
        debug!(
            rule = rule.id(),
            name = rule.name(),
            priority = rule.priority(),
            "registered rule"
        );
        rule
    }

    /// Index `group` by id and under each of its categories. A group already
    /// registered under the same id is replaced everywhere.
    pub fn register_group(&mut self, group: RuleGroup) -> Arc<RuleGroup> {
        let group = Arc::new(group);
        let member = Member::Group(group.id().to_owned());
        if self
            .groups
            .insert(group.id().to_owned(), Arc::clone(&group))
            .is_some()
        {
            debug!(group = group.id(), "replacing registered rule group");
            self.unindex(&member);
        }
        for category in group.categories() {
            self.index(category, group.priority(), member.clone());
        }
        debug!(
            group = group.id(),
            name = group.name(),
            priority = group.priority(),
            operator = %group.operator(),
            "registered rule group"
        );
        group
    }

    fn index(&mut self, category: &Category, priority: i32, member: Member) {
        self.categories
            .entry(category.name().to_owned())
            .or_insert_with(|| category.clone());
        let list = self.by_category.entry(category.name().to_owned()).or_default();
        let at = list.partition_point(|(p, _)| *p <= priority);
        list.insert(at, (priority, member));
    }

    fn unindex(&mut self, member: &Member) {
        for list in self.by_category.values_mut() {
            list.retain(|(_, m)| m != member);
        }
    }

    // -- Lookup -------------------------------------------------------------

    /// The rule registered under `id`. A miss is logged, not an error.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Arc<Rule>> {
        let found = self.rules.get(id);
        if found.is_none() {
            warn!(rule = id, "rule not found");
        }
        found
    }

    /// The group registered under `id`. A miss is logged, not an error.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Arc<RuleGroup>> {
        let found = self.groups.get(id);
        if found.is_none() {
            warn!(group = id, "rule group not found");
        }
        found
    }

    /// Rules and groups in `category`, by ascending priority. Empty when the
    /// category is unknown; the lookup never creates it.
    #[must_use]
    pub fn rules_for_category(&self, category: &str) -> Vec<Evaluable> {
        let Some(list) = self.by_category.get(category) else {
            debug!(category, "no rules registered for category");
            return Vec::new();
        };
        list.iter()
            .filter_map(|(_, member)| match member {
                Member::Rule(id) => self.rules.get(id).cloned().map(Evaluable::Rule),
                Member::Group(id) => self.groups.get(id).cloned().map(Evaluable::Group),
            })
            .collect()
    }

    /// The category interned under `name`, creating it at the configured
    /// category priority on first use.
    ///
    /// The first category seen for a name wins: later explicit categories
    /// with the same name do not change its sequence number. Use
    /// [`register_category`](Self::register_category) before anything else
    /// refers to the name to control its priority.
    pub fn category(&mut self, name: &str) -> Category {
        let priority = self.config.category_priority();
        self.categories
            .entry(name.to_owned())
            .or_insert_with(|| {
                debug!(category = name, priority, "creating category");
                Category::new(name, priority)
            })
            .clone()
    }

    /// Intern `category` unless its name is already known. Returns the
    /// interned category.
    pub fn register_category(&mut self, category: Category) -> Category {
        self.categories
            .entry(category.name().to_owned())
            .or_insert(category)
            .clone()
    }

    /// Every interned category, by sequence number.
    #[must_use]
    pub fn categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.values().collect();
        categories.sort();
        categories
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    // -- Combination --------------------------------------------------------

    /// Build a rule whose condition is the conjunction of `rules`' conditions,
    /// in the order given. The result is not registered.
    ///
    /// # Errors
    ///
    /// [`CombineError::Empty`] if `rules` is empty, or
    /// [`CombineError::Config`] if `builder` lacks a name or message.
    pub fn combine_with_and<R: Borrow<Rule>>(
        &self,
        rules: &[R],
        builder: RuleBuilder,
    ) -> Result<Rule, CombineError> {
        combine(rules, builder, GroupOperator::And)
    }

    /// Like [`combine_with_and`](Self::combine_with_and) with a disjunction.
    ///
    /// # Errors
    ///
    /// Same as [`combine_with_and`](Self::combine_with_and).
    pub fn combine_with_or<R: Borrow<Rule>>(
        &self,
        rules: &[R],
        builder: RuleBuilder,
    ) -> Result<Rule, CombineError> {
        combine(rules, builder, GroupOperator::Or)
    }

    /// Resolve `ids`, AND their conditions together and register the result.
    ///
    /// # Errors
    ///
    /// [`CombineError::UnknownRule`] if any id is not registered; nothing is
    /// registered in that case. Otherwise as
    /// [`combine_with_and`](Self::combine_with_and).
    pub fn combine_rules_with_and(
        &mut self,
        ids: &[&str],
        builder: RuleBuilder,
    ) -> Result<Arc<Rule>, CombineError> {
        self.combine_registered(ids, builder, GroupOperator::And)
    }

    /// Resolve `ids`, OR their conditions together and register the result.
    ///
    /// # Errors
    ///
    /// Same as [`combine_rules_with_and`](Self::combine_rules_with_and).
    pub fn combine_rules_with_or(
        &mut self,
        ids: &[&str],
        builder: RuleBuilder,
    ) -> Result<Arc<Rule>, CombineError> {
        self.combine_registered(ids, builder, GroupOperator::Or)
    }

    fn combine_registered(
        &mut self,
        ids: &[&str],
        builder: RuleBuilder,
        operator: GroupOperator,
    ) -> Result<Arc<Rule>, CombineError> {
        let rules = ids
            .iter()
            .map(|id| {
                self.rule(id).cloned().ok_or_else(|| {
                    warn!(rule = *id, %operator, "cannot combine unknown rule");
                    CombineError::UnknownRule {
                        id: (*id).to_owned(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let combined = combine(&rules, builder, operator)?;
        Ok(self.register_rule(combined))
    }

    // -- Groups -------------------------------------------------------------

    /// Build an AND group from `builder` and register it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the builder lacks a name or description.
    pub fn create_rule_group_with_and(
        &mut self,
        builder: RuleGroupBuilder,
    ) -> Result<Arc<RuleGroup>, ConfigError> {
        let group = builder.and().build()?;
        Ok(self.register_group(group))
    }

    /// Build an OR group from `builder` and register it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the builder lacks a name or description.
    pub fn create_rule_group_with_or(
        &mut self,
        builder: RuleGroupBuilder,
    ) -> Result<Arc<RuleGroup>, ConfigError> {
        let group = builder.or().build()?;
        Ok(self.register_group(group))
    }

    /// Add the registered rule `rule_id` to the registered group `group_id`
    /// at `sequence_number`. Returns `false` if either id is unknown.
    ///
    /// The stored group is updated copy-on-write: lists previously returned
    /// by [`rules_for_category`](Self::rules_for_category) keep the group as
    /// it was.
    pub fn add_rule_to_group(&mut self, group_id: &str, rule_id: &str, sequence_number: i32) -> bool {
        let Some(rule) = self.rule(rule_id).cloned() else {
            return false;
        };
        let Some(group) = self.groups.get_mut(group_id) else {
            warn!(group = group_id, "rule group not found");
            return false;
        };
        Arc::make_mut(group).add_rule(rule, sequence_number);
        debug!(
            group = group_id,
            rule = rule_id,
            sequence_number,
            "added rule to group"
        );
        true
    }
}

fn combine<R: Borrow<Rule>>(
    rules: &[R],
    builder: RuleBuilder,
    operator: GroupOperator,
) -> Result<Rule, CombineError> {
    if rules.is_empty() {
        warn!(%operator, "no rules to combine");
        return Err(CombineError::Empty);
    }
    let joiner = match operator {
        GroupOperator::And => " && ",
        GroupOperator::Or => " || ",
    };
    let condition = rules
        .iter()
        .map(|rule| format!("({})", rule.borrow().condition()))
        .collect::<Vec<_>>()
        .join(joiner);
    debug!(%operator, count = rules.len(), condition, "combined rule conditions");
    Ok(builder.condition(condition).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CATEGORY, DEFAULT_PRIORITY};

    fn rule(registry: &Registry, id: &str, priority: i32, category: &str) -> Rule {
        registry
            .new_rule_with_id(id)
            .name(id)
            .condition("true")
            .message(format!("{id} fired"))
            .priority(priority)
            .category_name(category)
            .build()
            .unwrap()
    }

    fn ids(list: &[Evaluable]) -> Vec<&str> {
        list.iter().map(Evaluable::id).collect()
    }

    #[test]
    fn category_list_sorted_by_priority() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "A", 10, "c"));
        registry.register_rule(rule(&registry, "B", 5, "c"));
        assert_eq!(ids(&registry.rules_for_category("c")), vec!["B", "A"]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let mut registry = Registry::new();
        for id in ["x", "y", "z"] {
            registry.register_rule(rule(&registry, id, 1, "c"));
        }
        registry.register_rule(rule(&registry, "first", 0, "c"));
        assert_eq!(
            ids(&registry.rules_for_category("c")),
            vec!["first", "x", "y", "z"]
        );
    }

    #[test]
    fn unknown_category_is_empty_and_not_created() {
        let registry = Registry::new();
        assert!(registry.rules_for_category("nope").is_empty());
        assert!(registry.categories().is_empty());
    }

    #[test]
    fn rules_and_groups_share_category_lists() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "r", 20, "c"));
        let group = registry
            .new_group_with_id("g")
            .name("g")
            .description("d")
            .priority(10)
            .category_name("c")
            .build()
            .unwrap();
        registry.register_group(group);

        let list = registry.rules_for_category("c");
        assert_eq!(ids(&list), vec!["g", "r"]);
        assert!(list[0].as_group().is_some());
        assert!(list[1].as_rule().is_some());
    }

    #[test]
    fn reregistering_replaces_without_duplicates() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "r", 20, "a"));
        registry.register_rule(rule(&registry, "r", 5, "b"));
        assert_eq!(registry.rule_count(), 1);
        assert!(registry.rules_for_category("a").is_empty());
        assert_eq!(ids(&registry.rules_for_category("b")), vec!["r"]);
    }

    #[test]
    fn lookup_hits_and_misses() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "r", 1, "c"));
        assert_eq!(registry.rule("r").map(|r| r.name()), Some("r"));
        assert!(registry.rule("missing").is_none());
        assert!(registry.group("missing").is_none());
    }

    #[test]
    fn builders_use_config_defaults() {
        let registry = Registry::with_config(
            EngineConfig::new()
                .with_default_priority(7)
                .with_default_category("general"),
        );
        let rule = registry
            .new_rule()
            .name("n")
            .condition("true")
            .message("m")
            .build()
            .unwrap();
        assert_eq!(rule.priority(), 7);
        assert!(rule.has_category("general"));
        assert!(rule.id().starts_with('R'));

        let group = registry.new_group().name("n").description("d").build().unwrap();
        assert_eq!(group.priority(), 7);
        assert!(group.has_category("general"));

        let plain = Registry::new()
            .new_rule()
            .name("n")
            .condition("true")
            .message("m")
            .build()
            .unwrap();
        assert_eq!(plain.priority(), DEFAULT_PRIORITY);
        assert!(plain.has_category(DEFAULT_CATEGORY));
    }

    #[test]
    fn category_interning_first_write_wins() {
        let mut registry = Registry::new();
        let first = registry.category("pricing");
        assert_eq!(first.sequence_number(), 100);

        registry.register_rule(
            registry
                .new_rule_with_id("r")
                .name("r")
                .condition("true")
                .message("m")
                .category(Category::new("pricing", 1))
                .build()
                .unwrap(),
        );
        assert_eq!(registry.category("pricing").sequence_number(), 100);
    }

    #[test]
    fn register_category_controls_priority_before_first_use() {
        let mut registry = Registry::with_config(EngineConfig::new().with_category_priority(50));
        registry.register_category(Category::new("fast", 1));
        assert_eq!(registry.category("fast").sequence_number(), 1);
        assert_eq!(registry.category("slow").sequence_number(), 50);
        let names: Vec<&str> = registry.categories().into_iter().map(Category::name).collect();
        assert_eq!(names, vec!["fast", "slow"]);
    }

    #[test]
    fn combine_with_and_parenthesizes_conditions() {
        let registry = Registry::new();
        let a = RuleBuilder::with_id("a")
            .name("a")
            .condition("x > 1")
            .message("m")
            .build()
            .unwrap();
        let b = RuleBuilder::with_id("b")
            .name("b")
            .condition("y or z")
            .message("m")
            .build()
            .unwrap();
        let combined = registry
            .combine_with_and(
                &[a.clone(), b.clone()],
                RuleBuilder::with_id("ab").name("both").message("both hold"),
            )
            .unwrap();
        assert_eq!(combined.condition(), "(x > 1) && (y or z)");
        assert_eq!(combined.description(), "both hold");
        assert_eq!(registry.rule_count(), 0);

        let either = registry
            .combine_with_or(&[a, b], RuleBuilder::with_id("ab").name("either").message("m"))
            .unwrap();
        assert_eq!(either.condition(), "(x > 1) || (y or z)");
    }

    #[test]
    fn combine_empty_fails() {
        let registry = Registry::new();
        let err = registry
            .combine_with_or::<Rule>(&[], RuleBuilder::with_id("c").name("n").message("m"))
            .unwrap_err();
        assert_eq!(err, CombineError::Empty);
    }

    #[test]
    fn combine_by_id_registers() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "a", 1, "c"));
        registry.register_rule(rule(&registry, "b", 2, "c"));
        let combined = registry
            .combine_rules_with_or(
                &["a", "b"],
                RuleBuilder::with_id("ab").name("ab").message("m").category_name("c"),
            )
            .unwrap();
        assert_eq!(combined.condition(), "(true) || (true)");
        assert!(registry.rule("ab").is_some());
        assert_eq!(registry.rules_for_category("c").len(), 3);
    }

    #[test]
    fn combine_by_id_with_unknown_registers_nothing() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "a", 1, "c"));
        let err = registry
            .combine_rules_with_and(
                &["a", "ghost"],
                RuleBuilder::with_id("combo").name("combo").message("m"),
            )
            .unwrap_err();
        assert_eq!(err, CombineError::UnknownRule { id: "ghost".into() });
        assert!(registry.rule("combo").is_none());
        assert_eq!(registry.rule_count(), 1);
    }

    #[test]
    fn create_group_forces_operator() {
        let mut registry = Registry::new();
        let group = registry
            .create_rule_group_with_or(registry.new_group_with_id("g").name("g").description("d").and())
            .unwrap();
        assert_eq!(group.operator(), GroupOperator::Or);
        assert_eq!(registry.group_count(), 1);

        let err = registry
            .create_rule_group_with_and(registry.new_group_with_id("bad").description("d"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingGroupField { field: "name", .. }));
        assert_eq!(registry.group_count(), 1);
    }

    #[test]
    fn add_rule_to_group_is_copy_on_write() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "r", 1, "c"));
        registry
            .create_rule_group_with_and(
                registry
                    .new_group_with_id("g")
                    .name("g")
                    .description("d")
                    .category_name("c"),
            )
            .unwrap();

        let before = registry.rules_for_category("c");
        assert!(registry.add_rule_to_group("g", "r", 1));
        assert_eq!(registry.group("g").map(|g| g.len()), Some(1));

        let snapshot = before.iter().find_map(Evaluable::as_group).unwrap();
        assert!(snapshot.is_empty());
        let fresh = registry.rules_for_category("c");
        assert_eq!(fresh.iter().find_map(Evaluable::as_group).map(|g| g.len()), Some(1));
    }

    #[test]
    fn add_rule_to_group_unknown_ids() {
        let mut registry = Registry::new();
        registry.register_rule(rule(&registry, "r", 1, "c"));
        assert!(!registry.add_rule_to_group("missing", "r", 1));
        registry
            .create_rule_group_with_and(registry.new_group_with_id("g").name("g").description("d"))
            .unwrap();
        assert!(!registry.add_rule_to_group("g", "missing", 1));
        assert_eq!(registry.group("g").map(|g| g.len()), Some(0));
    }
}
