//! Sparse, insertion-ordered row representation.

use std::fmt;

/// Origin index of a merged record (0-based position of its input).
pub const FILE_INDEX: &str = "@fn";
/// Row index within the record's own input.
pub const FILE_ROW_INDEX: &str = "@frn";
/// Row index across the whole merged stream.
pub const ROW_INDEX: &str = "@rn";

/// Fields reserved for provenance tags.
pub const PROVENANCE_FIELDS: [&str; 3] = [FILE_INDEX, FILE_ROW_INDEX, ROW_INDEX];

/// Returns true for the reserved `@fn`/`@frn`/`@rn` names.
pub fn is_provenance_field(name: &str) -> bool {
    PROVENANCE_FIELDS.contains(&name)
}

/// One row: an ordered mapping from field name to value.
///
/// Empty values are never stored. Setting a field to `""` removes it, and
/// reading an absent field yields `""`. Fields keep first-insertion order;
/// equality ignores order.
#[derive(Clone, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name`, or `""` when absent.
    pub fn get(&self, name: &str) -> &str {
        self.position(name)
            .map(|idx| self.fields[idx].1.as_str())
            .unwrap_or("")
    }

    /// Set `name` to `value`. An empty value removes the field.
    ///
    /// Updating an existing field keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.remove(&name);
            return;
        }
        match self.position(&name) {
            Some(idx) => self.fields[idx].1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Remove `name`, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.position(name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Values of `columns`, in order, with `""` for absent fields.
    pub fn project(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| self.get(column).to_string())
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(field, _)| field == name)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        // Stored values are never empty, so `get` distinguishes absent fields.
        self.len() == other.len() && self.iter().all(|(name, value)| other.get(name) == value)
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
