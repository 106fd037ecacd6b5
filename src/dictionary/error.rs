use arrow::datatypes::DataType;
use thiserror::Error;

use crate::{dictionary::DictId, record::Value};

#[derive(Debug, Error, PartialEq)]
pub enum DictionaryError {
    #[error("dictionary id {id} out of range [0, {cardinality})")]
    OutOfRange { id: DictId, cardinality: usize },
    #[error("value {0} appears more than once in the dictionary population")]
    DuplicateValue(Value),
    #[error("null cannot be a dictionary value")]
    NullValue,
    #[error("dictionary of {0} values exceeds the id space")]
    CardinalityOverflow(usize),
    #[error("unsupported arrow dictionary value type {0:?}")]
    UnsupportedArrowType(DataType),
    #[error("key {key} at slot {slot} does not address a dictionary value")]
    InvalidKey { slot: usize, key: i32 },
}
