use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What kind of outcome a [`RuleResult`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ResultType {
    /// A rule or rule group fired.
    Match,
    /// Rules were evaluated but none fired.
    NoMatch,
    /// There was nothing to evaluate.
    NoRules,
    /// Evaluation could not be carried out.
    Error,
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultType::Match => "MATCH",
            ResultType::NoMatch => "NO_MATCH",
            ResultType::NoRules => "NO_RULES",
            ResultType::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// The immutable outcome of one evaluation call.
///
/// `triggered()` is true exactly when the type is [`ResultType::Match`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct RuleResult {
    id: Uuid,
    rule_name: String,
    message: String,
    timestamp: DateTime<Utc>,
    result_type: ResultType,
}

impl RuleResult {
    pub const NO_MATCH_NAME: &'static str = "no-match";
    pub const NO_RULES_NAME: &'static str = "no-rule";

    fn new(rule_name: impl Into<String>, message: impl Into<String>, result_type: ResultType) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_name: rule_name.into(),
            message: message.into(),
            timestamp: Utc::now(),
            result_type,
        }
    }

    /// The named rule or group fired with `message`.
    pub fn matched(rule_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_name, message, ResultType::Match)
    }

    pub fn no_match() -> Self {
        Self::new(Self::NO_MATCH_NAME, "No matching rules found", ResultType::NoMatch)
    }

    pub fn no_rules() -> Self {
        Self::new(Self::NO_RULES_NAME, "No rules provided", ResultType::NoRules)
    }

    pub fn error(rule_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self::new(rule_name, error_message, ResultType::Error)
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn triggered(&self) -> bool {
        self.result_type == ResultType::Match
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }
}

impl fmt::Display for RuleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule_name, self.message)
    }
}
