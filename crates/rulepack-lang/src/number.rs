#[cfg(feature = "ast-json")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric scalar shared by rule models and host trees.
///
/// Integers are kept exactly. Floats render in their shortest exact form, so
/// `30.0` prints as `30` in both rule text and host source.
#[cfg_attr(feature = "ast-json", derive(Serialize, Deserialize), serde(untagged))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn new(value: f64) -> Self {
        Number::Float(value)
    }

    /// The value as a float. Integers beyond 2^53 lose precision.
    pub fn value(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Float(n) => *n,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(*n),
            Number::Float(_) => None,
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::Int(0)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(i64::from(value))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}
