//! The condition language: a small expression grammar over [`Facts`].
//!
//! Variables may be written `#name` or `name`; fields, indices and a handful
//! of string and collection methods chain after them.

mod ast;
mod error;
mod eval;
mod grammar;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use error::{EvalError, ParseError};

use crate::{Facts, Value};

/// Parse a condition into an [`Expr`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid expression.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    use winnow::Parser;
    grammar::expression
        .parse(source)
        .map_err(|e| ParseError::new(e.to_string()))
}

/// Evaluates condition source text against a set of facts.
///
/// Implementations must be safe to share across threads: an engine holds one
/// evaluator and may be used from many threads at once.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `source` to a value.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the source does not parse or cannot be
    /// evaluated against `facts`.
    fn evaluate(&self, source: &str, facts: &Facts) -> Result<Value, EvalError>;

    /// Evaluate `source` as a condition. Only a boolean `true` fires; any
    /// other successful result, including `null`, is `false`.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    fn evaluate_condition(&self, source: &str, facts: &Facts) -> Result<bool, EvalError> {
        let value = self.evaluate(source, facts)?;
        match value.as_bool() {
            Some(b) => Ok(b),
            None => {
                trace!(source, found = value.type_name(), "non-boolean condition treated as false");
                Ok(false)
            }
        }
    }
}

/// Parses the source on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEvaluator;

impl ExpressionEvaluator for DefaultEvaluator {
    fn evaluate(&self, source: &str, facts: &Facts) -> Result<Value, EvalError> {
        let expr = parse(source)?;
        eval::eval(&expr, facts)
    }
}

/// Caches parsed expressions by source text.
///
/// Parse failures are not cached, so a failing condition reports its error
/// on every evaluation.
#[derive(Debug, Default)]
pub struct CachingEvaluator {
    cache: RwLock<HashMap<String, Arc<Expr>>>,
}

impl CachingEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached expressions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    fn parsed(&self, source: &str) -> Result<Arc<Expr>, ParseError> {
        if let Some(expr) = self.cache.read().get(source) {
            return Ok(Arc::clone(expr));
        }
        let expr = Arc::new(parse(source)?);
        self.cache
            .write()
            .entry(source.to_owned())
            .or_insert_with(|| Arc::clone(&expr));
        Ok(expr)
    }
}

impl ExpressionEvaluator for CachingEvaluator {
    fn evaluate(&self, source: &str, facts: &Facts) -> Result<Value, EvalError> {
        let expr = self.parsed(source)?;
        eval::eval(&expr, facts)
    }
}
