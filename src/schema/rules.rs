//! Field-level validation rules.
//!
//! A [`Rules`] set is declared per attribute at schema-definition time and
//! run against the coerced attribute value whenever validity is queried. All
//! rule failures for an attribute are accumulated, not short-circuited.

use std::sync::Arc;

use regex::Regex;
use stillwater::Validation;

use crate::coerce::Attr;
use crate::error::{FieldError, FieldErrors};
use crate::RuleResult;

type Predicate = Arc<dyn Fn(&Attr) -> bool + Send + Sync>;

enum Rule {
    Presence,
    Pattern { regex: Regex, pattern_str: String },
    Check {
        code: String,
        message: String,
        predicate: Predicate,
    },
}

/// An ordered set of rules for one declared attribute.
///
/// Presence is on by default, matching the engine's "required attribute"
/// contract; use [`Rules::optional`] to drop it.
///
/// # Example
///
/// ```rust
/// use triage::Rules;
///
/// let rules = Rules::new().pattern(r"bar").unwrap();
/// ```
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    /// Creates the default rule set: presence only.
    pub fn new() -> Self {
        Self {
            rules: vec![Rule::Presence],
        }
    }

    /// Creates an empty rule set with no presence requirement.
    pub fn optional() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a regex pattern rule.
    ///
    /// The rule applies to present string values only; absence is the
    /// presence rule's concern. Returns an error if the pattern is invalid,
    /// so a bad regex surfaces at definition time.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        self.rules.push(Rule::Pattern {
            regex,
            pattern_str: pattern.to_string(),
        });
        Ok(self)
    }

    /// Adds a custom predicate rule.
    ///
    /// The predicate receives the coerced attribute value and returns true
    /// when the value passes.
    pub fn check(
        mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        predicate: impl Fn(&Attr) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule::Check {
            code: code.into(),
            message: message.into(),
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Runs every rule against the value, accumulating all failures.
    pub(crate) fn run(&self, attribute: &str, value: &Attr) -> RuleResult {
        let mut errors = Vec::new();
        for rule in &self.rules {
            match rule {
                Rule::Presence => {
                    if value.is_blank() {
                        errors.push(
                            FieldError::new(attribute, "can't be blank").with_code("blank"),
                        );
                    }
                }
                Rule::Pattern { regex, pattern_str } => {
                    if let Some(s) = value.as_str() {
                        if !regex.is_match(s) {
                            errors.push(
                                FieldError::new(
                                    attribute,
                                    format!("does not match /{pattern_str}/"),
                                )
                                .with_code("format"),
                            );
                        }
                    }
                }
                Rule::Check {
                    code,
                    message,
                    predicate,
                } => {
                    if !predicate(value) {
                        errors.push(FieldError::new(attribute, message.clone()).with_code(code));
                    }
                }
            }
        }

        if errors.is_empty() {
            Validation::Success(())
        } else {
            Validation::Failure(FieldErrors::from_vec(errors))
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
