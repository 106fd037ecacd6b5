//! Immutable value ↔ id dictionaries for one column.
//!
//! A dictionary is built once from the complete population of a column and never changes
//! afterwards, so it can be shared read-only between every predicate and encoder of that column.
//! Looking up a value that is not part of the population is an expected outcome and yields
//! [`NULL_DICT_ID`] instead of an error.

pub mod arrow;
mod error;
mod hash;
mod sorted;

use std::fmt;

pub use error::DictionaryError;
pub use hash::HashDictionary;
pub use sorted::SortedDictionary;

use crate::record::Value;

/// Dense, non-negative surrogate for a distinct column value.
pub type DictId = i32;

/// Id reported for values that are not present in a dictionary.
pub const NULL_DICT_ID: DictId = -1;

/// Bidirectional mapping between the distinct values of a column and `[0, cardinality)`.
pub trait Dictionary: fmt::Debug + Send + Sync {
    /// Returns the id of `value`, or [`NULL_DICT_ID`] when it is not present.
    fn index_of(&self, value: &Value) -> DictId;

    /// All values in id order.
    fn values(&self) -> &[Value];

    /// Returns the value for `id`.
    fn value_at(&self, id: DictId) -> Result<&Value, DictionaryError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.values().get(idx))
            .ok_or(DictionaryError::OutOfRange {
                id,
                cardinality: self.cardinality(),
            })
    }

    /// Number of distinct values.
    fn cardinality(&self) -> usize {
        self.values().len()
    }

    /// Returns `Some` when id order matches value order.
    fn as_sorted(&self) -> Option<&SortedDictionary> {
        None
    }

    /// Maps every value to its id, absent values to [`NULL_DICT_ID`].
    fn encode_values(&self, values: &[Value]) -> Vec<DictId> {
        values.iter().map(|value| self.index_of(value)).collect()
    }
}

pub(crate) fn check_population(values: &[Value]) -> Result<(), DictionaryError> {
    if values.len() > DictId::MAX as usize {
        return Err(DictionaryError::CardinalityOverflow(values.len()));
    }
    if values.iter().any(Value::is_null) {
        return Err(DictionaryError::NullValue);
    }
    Ok(())
}
