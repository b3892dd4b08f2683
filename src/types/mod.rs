mod category;
mod error;
mod evaluable;
mod evaluation_report;
mod facts;
mod group;
mod result;
mod rule;
mod value;

pub use category::Category;
pub use error::{CombineError, ConfigError};
pub use evaluable::Evaluable;
pub(crate) use evaluable::EvaluableRef;
pub use evaluation_report::EvaluationReport;
pub use facts::Facts;
pub use group::{GroupEvaluation, GroupOperator, RuleGroup, RuleGroupBuilder};
pub use result::{ResultType, RuleResult};
pub use rule::{Rule, RuleBuilder};
pub use value::Value;
