//! Scope - one snapshot of circumstances

use indexmap::IndexMap;

use crate::criteria::Value;

/// An ordered mapping from circumstance name to value
///
/// Scopes are plain values: opening a child scope clones the parent, so a
/// scope never observes writes made to scopes opened after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    circumstances: IndexMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a circumstance, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.circumstances.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.circumstances.contains_key(name)
    }

    /// Circumstances in write order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.circumstances.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.circumstances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.circumstances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circumstances.is_empty()
    }

    /// Write a circumstance; an existing one keeps its position
    pub(crate) fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        self.circumstances.insert(name, value)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Value> {
        self.circumstances.shift_remove(name)
    }
}

impl<'a> FromIterator<(&'a str, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        Self {
            circumstances: iter
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}
