use std::collections::HashMap;

use crate::{
    dictionary::{check_population, DictId, Dictionary, DictionaryError, NULL_DICT_ID},
    record::Value,
};

/// Dictionary whose ids follow the order in which values were supplied.
///
/// Ids carry no value order, so range predicates cannot be resolved against it.
#[derive(Debug, Clone)]
pub struct HashDictionary {
    values: Vec<Value>,
    ids: HashMap<Value, DictId>,
}

impl HashDictionary {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Result<Self, DictionaryError> {
        let values: Vec<Value> = values.into_iter().collect();
        check_population(&values)?;
        let mut ids = HashMap::with_capacity(values.len());
        for (idx, value) in values.iter().enumerate() {
            if ids.insert(value.clone(), idx as DictId).is_some() {
                return Err(DictionaryError::DuplicateValue(value.clone()));
            }
        }
        Ok(Self { values, ids })
    }
}

impl Dictionary for HashDictionary {
    fn index_of(&self, value: &Value) -> DictId {
        self.ids.get(value).copied().unwrap_or(NULL_DICT_ID)
    }

    fn values(&self) -> &[Value] {
        &self.values
    }
}
