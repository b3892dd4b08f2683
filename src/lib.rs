//! Categorized, prioritized rule evaluation.
//!
//! Rules pair a condition with a message. They are registered in a
//! [`Registry`] under one or more categories, optionally combined into AND/OR
//! [`RuleGroup`]s, and evaluated by a [`RulesEngine`] against [`Facts`]. The
//! first rule or group that fires wins.
//!
//! ```
//! use rulekit::{Facts, Registry, ResultType, RulesEngine};
//!
//! let mut registry = Registry::new();
//! let rule = registry
//!     .new_rule_with_id("big")
//!     .name("large investment")
//!     .condition("amount > 100000")
//!     .message("Large investment")
//!     .category_name("investments")
//!     .build()
//!     .unwrap();
//! registry.register_rule(rule);
//!
//! let engine = RulesEngine::new(registry);
//! let facts = Facts::new().set("amount", 150_000_i64);
//! let result = engine.execute_rules_for_category("investments", &facts);
//! assert_eq!(result.result_type(), ResultType::Match);
//! assert_eq!(result.rule_name(), "large investment");
//! ```

mod config;
mod engine;
pub mod expr;
mod registry;
mod types;

pub use config::{EngineConfig, DEFAULT_CATEGORY, DEFAULT_PRIORITY};
pub use engine::{RulesEngine, EXPRESSION_RESULT_NAME};
pub use expr::{CachingEvaluator, DefaultEvaluator, EvalError, ExpressionEvaluator, ParseError};
pub use registry::Registry;
pub use types::{
    Category, CombineError, ConfigError, Evaluable, EvaluationReport, Facts, GroupEvaluation,
    GroupOperator, ResultType, Rule, RuleBuilder, RuleGroup, RuleGroupBuilder, RuleResult, Value,
};
