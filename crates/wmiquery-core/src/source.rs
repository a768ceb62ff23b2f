//! The `RowSource` capability consumed by the loader, plus an in-memory
//! implementation.
//!
//! A real provider (COM, a remote agent, ...) implements [`RowSource`] and
//! [`Row`]; the decoder only ever talks to these traits.

use crate::error::SourceError;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One result entry exposing named properties.
pub trait Row {
    /// Resolve a property by exact name.
    ///
    /// `Ok(None)` means the row has no such property. `Err` is reserved for
    /// provider failures and aborts the batch.
    fn get_property(&self, name: &str) -> Result<Option<Value>, SourceError>;
}

impl<R: Row + ?Sized> Row for &R {
    fn get_property(&self, name: &str) -> Result<Option<Value>, SourceError> {
        (**self).get_property(name)
    }
}

/// An indexed result set.
pub trait RowSource {
    fn count(&self) -> Result<u64, SourceError>;

    fn row_at(&self, index: u64) -> Result<Box<dyn Row + '_>, SourceError>;
}

impl<S: RowSource + ?Sized> RowSource for &S {
    fn count(&self) -> Result<u64, SourceError> {
        (**self).count()
    }

    fn row_at(&self, index: u64) -> Result<Box<dyn Row + '_>, SourceError> {
        (**self).row_at(index)
    }
}

/// A row held in memory, properties in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRow {
    properties: IndexMap<String, Value>,
}

impl MemoryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Row for MemoryRow {
    fn get_property(&self, name: &str) -> Result<Option<Value>, SourceError> {
        Ok(self.properties.get(name).cloned())
    }
}

/// A result set held in memory. Suitable for tests, fixtures and replaying
/// captured query output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRowSource {
    rows: Vec<MemoryRow>,
}

impl MemoryRowSource {
    pub fn new(rows: Vec<MemoryRow>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: MemoryRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[MemoryRow] {
        &self.rows
    }
}

impl FromIterator<MemoryRow> for MemoryRowSource {
    fn from_iter<I: IntoIterator<Item = MemoryRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl RowSource for MemoryRowSource {
    fn count(&self) -> Result<u64, SourceError> {
        Ok(self.rows.len() as u64)
    }

    fn row_at(&self, index: u64) -> Result<Box<dyn Row + '_>, SourceError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.rows.get(i))
            .map(|row| Box::new(row) as Box<dyn Row + '_>)
            .ok_or(SourceError::RowOutOfRange {
                index,
                count: self.rows.len() as u64,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_row_resolves_by_exact_name() {
        let row = MemoryRow::new().with("Name", "svchost.exe").with("ProcessId", 4u32);
        assert_eq!(
            row.get_property("Name").unwrap(),
            Some(Value::String("svchost.exe".into()))
        );
        assert_eq!(row.get_property("name").unwrap(), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn out_of_range_row_is_an_error() {
        let source: MemoryRowSource = vec![MemoryRow::new()].into_iter().collect();
        assert_eq!(source.count().unwrap(), 1);
        assert!(source.row_at(0).is_ok());
        assert!(matches!(
            source.row_at(1),
            Err(SourceError::RowOutOfRange { index: 1, count: 1 })
        ));
    }
}
