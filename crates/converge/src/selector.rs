//! Label selector model used to scope collection queries.
//!
//! A [`Selector`] is an ordered, conjunctive set of label requirements.
//! It serializes to the query string the control plane expects
//! (`app=sc,tier!=db,env in (stg,prod)`), and can also evaluate the
//! conjunction locally against a label map, which is what mock clients
//! and harness-side filtering use.

use std::collections::BTreeMap;
use std::fmt;

/// How a single requirement compares a label key against its value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
}

/// A malformed requirement was handed to [`Selector::add`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// The operator and value-set cardinality do not agree.
    #[error("invalid requirement on key '{key}': {reason}")]
    InvalidRequirement { key: String, reason: String },
}

/// One `(key, operator, values)` clause of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: Vec<String>,
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self.operator {
            Operator::Equals | Operator::In => labels
                .get(&self.key)
                .map(|value| self.values.iter().any(|v| v == value))
                .unwrap_or(false),
            Operator::NotEquals | Operator::NotIn => labels
                .get(&self.key)
                .map(|value| !self.values.iter().any(|v| v == value))
                .unwrap_or(true),
            Operator::Exists => labels.contains_key(&self.key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::Equals => write!(f, "{}={}", self.key, self.values[0]),
            Operator::NotEquals => write!(f, "{}!={}", self.key, self.values[0]),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
            Operator::Exists => write!(f, "{}", self.key),
        }
    }
}

/// Conjunctive label filter.
///
/// Requirements are kept in insertion order and are not deduplicated:
/// two requirements on the same key must both hold. A selector with no
/// requirements matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a requirement.
    ///
    /// Fails when `In`/`NotIn` is given an empty value set, when
    /// `Equals`/`NotEquals` is given anything but exactly one value,
    /// or when `Exists` carries values.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        operator: Operator,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<&mut Self, SelectorError> {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();

        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                return Err(SelectorError::InvalidRequirement {
                    key,
                    reason: "'in'/'notin' requires a non-empty value set".to_owned(),
                });
            }
            Operator::Equals | Operator::NotEquals if values.len() != 1 => {
                return Err(SelectorError::InvalidRequirement {
                    key,
                    reason: format!("'='/'!=' requires exactly one value, got {}", values.len()),
                });
            }
            Operator::Exists if !values.is_empty() => {
                return Err(SelectorError::InvalidRequirement {
                    key,
                    reason: "'exists' takes no values".to_owned(),
                });
            }
            _ => {}
        }

        self.requirements.push(Requirement {
            key,
            operator,
            values,
        });
        Ok(self)
    }

    /// Shorthand for the common `key=value` requirement.
    pub fn equals(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, SelectorError> {
        self.add(key, Operator::Equals, [value.into()])?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Query string handed verbatim to the collection endpoint.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Evaluates all requirements against a label map.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|req| req.matches(labels))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for req in &self.requirements {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{req}")?;
            first = false;
        }
        Ok(())
    }
}
