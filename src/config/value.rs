//! Configuration value model
//!
//! Values are a closed sum over scalars and sequences of scalars, so
//! merge-strategy type checks are exhaustive. Anything outside this model
//! (nulls, floats, mappings) is rejected at load time.

use serde::{Deserialize, Serialize};

/// A resolved configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    String(String),
    Sequence(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::String(_) => "string",
            ConfigValue::Sequence(_) => "sequence",
        }
    }

    /// Whether this value is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, ConfigValue::Sequence(_))
    }

    /// Borrow the elements if this value is a sequence
    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the string if this value is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean if this value is a boolean scalar
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer if this value is an integer scalar
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::String(s) => write!(f, "{:?}", s),
            ConfigValue::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

/// Build a sequence of string values, the common case for pattern lists
pub fn string_sequence<I, S>(items: I) -> ConfigValue
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ConfigValue::Sequence(
        items
            .into_iter()
            .map(|s| ConfigValue::String(s.into()))
            .collect(),
    )
}
