//! Per-context key/value store shared by the nodes of one run.
//!
//! Entries hold a typed [`Value`]. Comparisons follow the blackboard compare
//! rules: equality works on every type (floats nearly-equal), ordering only on
//! Int, Float and Enum, and both sides must carry the same type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{PinType, Value};

/// Blackboard lookup or comparison error; surfaces as a node fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlackboardError {
    #[error("blackboard key not found: {0}")]
    MissingKey(String),

    #[error("cannot compare {left} with {right}")]
    TypeMismatch { left: PinType, right: PinType },

    #[error("operator {op} is not supported for {ty}")]
    NotArithmetic { op: CompareOperator, ty: PinType },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    values: BTreeMap<String, Value>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Like [`get`](Self::get) but a missing key is an error.
    pub fn require(&self, key: &str) -> Result<&Value, BlackboardError> {
        self.values
            .get(key)
            .ok_or_else(|| BlackboardError::MissingKey(key.to_string()))
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Blackboard {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Blackboard {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOperator {
    #[serde(alias = "==")]
    Equal,
    #[serde(alias = "!=")]
    NotEqual,
    #[serde(alias = "<")]
    Less,
    #[serde(alias = "<=")]
    LessOrEqual,
    #[serde(alias = ">")]
    Greater,
    #[serde(alias = ">=")]
    GreaterOrEqual,
}

impl CompareOperator {
    pub fn is_arithmetic(self) -> bool {
        !matches!(self, CompareOperator::Equal | CompareOperator::NotEqual)
    }

    /// Evaluates `lhs <op> rhs`.
    pub fn compare(self, lhs: &Value, rhs: &Value) -> Result<bool, BlackboardError> {
        let (left, right) = (lhs.pin_type(), rhs.pin_type());
        if left != right {
            return Err(BlackboardError::TypeMismatch { left, right });
        }

        match self {
            CompareOperator::Equal => return Ok(lhs.nearly_eq(rhs)),
            CompareOperator::NotEqual => return Ok(!lhs.nearly_eq(rhs)),
            _ => {}
        }

        let (Some((li, lf)), Some((ri, rf))) = (lhs.numeric(), rhs.numeric()) else {
            return Err(BlackboardError::NotArithmetic { op: self, ty: left });
        };

        let ordering = if left == PinType::Float {
            lf.partial_cmp(&rf)
        } else {
            Some(li.cmp(&ri))
        };
        // NaN compares false under every ordering operator.
        let Some(ordering) = ordering else {
            return Ok(false);
        };
        Ok(match self {
            CompareOperator::Less => ordering.is_lt(),
            CompareOperator::LessOrEqual => ordering.is_le(),
            CompareOperator::Greater => ordering.is_gt(),
            CompareOperator::GreaterOrEqual => ordering.is_ge(),
            CompareOperator::Equal => ordering.is_eq(),
            CompareOperator::NotEqual => ordering.is_ne(),
        })
    }
}

impl std::fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompareOperator::Equal => "==",
            CompareOperator::NotEqual => "!=",
            CompareOperator::Less => "<",
            CompareOperator::LessOrEqual => "<=",
            CompareOperator::Greater => ">",
            CompareOperator::GreaterOrEqual => ">=",
        };
        f.write_str(s)
    }
}
