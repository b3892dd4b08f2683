use std::fmt;
use std::time::Duration;

use super::result::RuleResult;

/// Detailed evaluation report returned by
/// [`RulesEngine::execute_detailed()`](crate::RulesEngine::execute_detailed).
///
/// Carries the same [`RuleResult`] the plain call would return, plus the
/// names of every rule or group evaluated, the errors that were skipped over,
/// and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    result: RuleResult,
    evaluated: Vec<String>,
    errors: Vec<(String, String)>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        result: RuleResult,
        evaluated: Vec<String>,
        errors: Vec<(String, String)>,
        duration: Duration,
    ) -> Self {
        Self {
            result,
            evaluated,
            errors,
            duration,
        }
    }

    pub fn result(&self) -> &RuleResult {
        &self.result
    }

    /// Names of the rules and groups evaluated, in order. Items after the
    /// first match are absent.
    #[must_use]
    pub fn evaluated(&self) -> &[String] {
        &self.evaluated
    }

    /// `(name, error)` for each rule whose condition failed to evaluate.
    #[must_use]
    pub fn errors(&self) -> &[(String, String)] {
        &self.errors
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "result: {} ({})",
            self.result.rule_name(),
            self.result.result_type()
        )?;
        write!(f, ", evaluated: [{}]", self.evaluated.join(", "))?;
        if !self.errors.is_empty() {
            let names: Vec<&str> = self.errors.iter().map(|(name, _)| name.as_str()).collect();
            write!(f, ", errors: [{}]", names.join(", "))?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accessors() {
        let report = EvaluationReport::new(
            RuleResult::matched("r2", "fired"),
            vec!["r1".into(), "r2".into()],
            vec![("r1".into(), "unknown variable 'x'".into())],
            Duration::from_nanos(500),
        );

        assert_eq!(report.result().rule_name(), "r2");
        assert_eq!(report.evaluated(), &["r1", "r2"]);
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn report_display_with_match() {
        let report = EvaluationReport::new(
            RuleResult::matched("r2", "fired"),
            vec!["r1".into(), "r2".into()],
            vec![("r1".into(), "boom".into())],
            Duration::from_nanos(500),
        );
        let s = report.to_string();
        assert!(s.contains("result: r2 (MATCH)"));
        assert!(s.contains("evaluated: [r1, r2]"));
        assert!(s.contains("errors: [r1]"));
    }

    #[test]
    fn report_display_no_rules() {
        let report = EvaluationReport::new(
            RuleResult::no_rules(),
            vec![],
            vec![],
            Duration::from_nanos(100),
        );
        let s = report.to_string();
        assert!(s.contains("result: no-rule (NO_RULES)"));
        assert!(!s.contains("errors"));
    }
}
