//! Conversion from Arrow dictionary-encoded arrays.

use arrow::{
    array::{Array, AsArray, DictionaryArray},
    datatypes::{
        DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
        UInt16Type, UInt32Type, UInt8Type,
    },
};

use crate::{
    dictionary::{DictId, Dictionary, DictionaryError, HashDictionary, NULL_DICT_ID},
    record::Value,
};

/// Splits an Arrow dictionary array into a [`HashDictionary`] over its values and one id per
/// slot. Null slots are reported as [`NULL_DICT_ID`].
///
/// Arrow keys are reused as ids, so the dictionary keeps the array's value order.
pub fn decode_dictionary_array(
    array: &DictionaryArray<Int32Type>,
) -> Result<(HashDictionary, Vec<DictId>), DictionaryError> {
    let values = array.values();
    let mut decoded = Vec::with_capacity(values.len());
    for idx in 0..values.len() {
        decoded.push(value_from_array(values.as_ref(), idx)?);
    }
    let dictionary = HashDictionary::new(decoded)?;

    let keys = array.keys();
    let mut ids = Vec::with_capacity(keys.len());
    for slot in 0..keys.len() {
        if keys.is_null(slot) {
            ids.push(NULL_DICT_ID);
            continue;
        }
        let key = keys.value(slot);
        if key < 0 || key as usize >= dictionary.cardinality() {
            return Err(DictionaryError::InvalidKey { slot, key });
        }
        ids.push(key);
    }
    Ok((dictionary, ids))
}

/// Reads one cell of a scalar Arrow array as a [`Value`].
pub fn value_from_array(array: &dyn Array, idx: usize) -> Result<Value, DictionaryError> {
    if array.is_null(idx) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Boolean => Value::Boolean(array.as_boolean().value(idx)),
        DataType::Int8 => Value::Int64(array.as_primitive::<Int8Type>().value(idx).into()),
        DataType::Int16 => Value::Int64(array.as_primitive::<Int16Type>().value(idx).into()),
        DataType::Int32 => Value::Int64(array.as_primitive::<Int32Type>().value(idx).into()),
        DataType::Int64 => Value::Int64(array.as_primitive::<Int64Type>().value(idx)),
        DataType::UInt8 => Value::Int64(array.as_primitive::<UInt8Type>().value(idx).into()),
        DataType::UInt16 => Value::Int64(array.as_primitive::<UInt16Type>().value(idx).into()),
        DataType::UInt32 => Value::Int64(array.as_primitive::<UInt32Type>().value(idx).into()),
        DataType::Float32 => {
            Value::Float64(array.as_primitive::<Float32Type>().value(idx).into())
        }
        DataType::Float64 => Value::Float64(array.as_primitive::<Float64Type>().value(idx)),
        DataType::Utf8 => Value::String(array.as_string::<i32>().value(idx).to_owned()),
        DataType::LargeUtf8 => Value::String(array.as_string::<i64>().value(idx).to_owned()),
        other => return Err(DictionaryError::UnsupportedArrowType(other.clone())),
    };
    Ok(value)
}
