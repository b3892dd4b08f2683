use thiserror::Error;

/// Errors produced when parsing a condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("parse error: {message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors produced when a condition cannot be evaluated against the facts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("no property '{property}' on {type_name}")]
    UnknownProperty {
        property: String,
        type_name: &'static str,
    },

    #[error("cannot access '{member}' on null")]
    NullReference { member: String },

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("'{context}' requires a boolean, found {found}")]
    NotBoolean {
        context: &'static str,
        found: &'static str,
    },

    #[error("operator '{op}' cannot be applied to {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in '{op}'")]
    Overflow { op: &'static str },

    #[error("unknown method '{method}' on {type_name}")]
    UnknownMethod {
        method: String,
        type_name: &'static str,
    },

    #[error("method '{method}' expects {expected} argument(s), got {found}")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
}
