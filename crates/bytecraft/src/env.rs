//! Evaluation environment: names bound so far while reading one record.

use crate::{errors::ReadError, value::Value};

/// Append-only `name -> value` bindings, in binding order.
///
/// Extra arguments are bound first, then each field as it is read. A binding is never
/// changed once made.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: Vec<(String, Value)>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Like [Env::get], but an unbound name is an error.
    pub fn require(&self, name: &str) -> Result<&Value, ReadError> {
        self.get(name)
            .ok_or_else(|| ReadError::Unbound(name.to_string()))
    }

    /// Looks up an integer binding.
    pub fn integer(&self, name: &str) -> Result<i128, ReadError> {
        let value = self.require(name)?;
        value.as_integer().ok_or(ReadError::TypeMismatch {
            name: name.to_string(),
            expected: "integer",
            found: value.kind_name(),
        })
    }

    /// Looks up an array binding.
    pub fn array(&self, name: &str) -> Result<&[Value], ReadError> {
        let value = self.require(name)?;
        value.as_array().ok_or(ReadError::TypeMismatch {
            name: name.to_string(),
            expected: "array",
            found: value.kind_name(),
        })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Drops the first `skip` bindings and returns the rest.
    pub(crate) fn into_tail(self, skip: usize) -> Vec<(String, Value)> {
        self.bindings.into_iter().skip(skip).collect()
    }
}
