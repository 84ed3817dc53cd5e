//! State value type definitions

use serde::Serialize;
use std::fmt;

/// Value held in a state slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl StateValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            StateValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Int(n) => write!(f, "{}", n),
            StateValue::Float(v) => write!(f, "{}", v),
            StateValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

impl From<i64> for StateValue {
    fn from(n: i64) -> Self {
        StateValue::Int(n)
    }
}

impl From<i32> for StateValue {
    fn from(n: i32) -> Self {
        StateValue::Int(i64::from(n))
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        StateValue::Float(v)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Text(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Text(s)
    }
}

/// Handle returned by `StateStore::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(super) u64);
