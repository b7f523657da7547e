use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

/// Opaque value chosen for a single issue. Values are only ever compared
/// for equality, their content has no meaning for the negotiation logic.
#[derive(Clone, Debug, Display, From, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(String);

impl Value {
    pub fn new(value: impl ToString) -> Value {
        Value(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::new(value)
    }
}

/// Complete assignment of one `Value` to every issue of a `Domain`.
/// Issues are addressed by their 0-based index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bid {
    values: Vec<Value>,
}

impl Bid {
    pub fn new(values: Vec<Value>) -> Bid {
        Bid { values }
    }

    /// Builds `Bid` from anything convertible to `Value`, mostly useful in tests.
    pub fn from_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Bid {
        Bid {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns value for issue or `IllegalBidAccess` if issue is outside this bid.
    pub fn value(&self, issue: usize) -> Result<&Value, Error> {
        self.values
            .get(issue)
            .ok_or(Error::IllegalBidAccess { issue })
    }

    pub fn set_value(&mut self, issue: usize, value: Value) -> Result<(), Error> {
        let slot = self
            .values
            .get_mut(issue)
            .ok_or(Error::IllegalBidAccess { issue })?;
        *slot = value;
        Ok(())
    }

    pub fn issue_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}
