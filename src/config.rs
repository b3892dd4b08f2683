/// Priority given to rules, groups and categories that do not set one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Category assigned to rules and groups built without one.
pub const DEFAULT_CATEGORY: &str = "default";

/// Settings shared by a [`Registry`](crate::Registry) and the
/// [`RulesEngine`](crate::RulesEngine) built on it.
///
/// ```
/// use rulekit::EngineConfig;
///
/// let config = EngineConfig::new()
///     .with_default_priority(10)
///     .with_cache_expressions(true);
/// assert_eq!(config.default_priority(), 10);
/// assert_eq!(config.default_category(), "default");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    default_priority: i32,
    default_category: String,
    category_priority: i32,
    cache_expressions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            default_category: DEFAULT_CATEGORY.to_owned(),
            category_priority: DEFAULT_PRIORITY,
            cache_expressions: false,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Priority seeded into builders handed out by the registry.
    #[must_use]
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }

    /// Category used by registry builders when none is added.
    #[must_use]
    pub fn with_default_category(mut self, name: impl Into<String>) -> Self {
        self.default_category = name.into();
        self
    }

    /// Sequence number for categories interned by name.
    #[must_use]
    pub fn with_category_priority(mut self, priority: i32) -> Self {
        self.category_priority = priority;
        self
    }

    /// Parse each distinct condition once and reuse it.
    #[must_use]
    pub fn with_cache_expressions(mut self, enabled: bool) -> Self {
        self.cache_expressions = enabled;
        self
    }

    #[must_use]
    pub fn default_priority(&self) -> i32 {
        self.default_priority
    }

    #[must_use]
    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    #[must_use]
    pub fn category_priority(&self) -> i32 {
        self.category_priority
    }

    #[must_use]
    pub fn cache_expressions(&self) -> bool {
        self.cache_expressions
    }
}
