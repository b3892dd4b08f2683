use thiserror::Error;

/// Raised when a rule or rule group is built without a mandatory field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rule '{id}' is missing its {field}")]
    MissingRuleField { id: String, field: &'static str },

    #[error("rule group '{id}' is missing its {field}")]
    MissingGroupField { id: String, field: &'static str },
}

/// Errors from combining existing rules into a new one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CombineError {
    #[error("no rules to combine")]
    Empty,

    #[error("unknown rule id '{id}' in combination")]
    UnknownRule { id: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
