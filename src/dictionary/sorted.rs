use crate::{
    dictionary::{check_population, DictId, Dictionary, DictionaryError, NULL_DICT_ID},
    record::Value,
};

/// Dictionary whose ids follow value order, so id ranges are value ranges.
#[derive(Debug, Clone)]
pub struct SortedDictionary {
    values: Vec<Value>,
}

impl SortedDictionary {
    /// Sorts `values` and assigns ids in ascending order.
    pub fn new(values: impl IntoIterator<Item = Value>) -> Result<Self, DictionaryError> {
        let mut values: Vec<Value> = values.into_iter().collect();
        check_population(&values)?;
        values.sort_unstable();
        if let Some(pair) = values.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(DictionaryError::DuplicateValue(pair[0].clone()));
        }
        Ok(Self { values })
    }

    /// Binary-search position of `value`: `Ok(id)` when present, otherwise `Err(position)` where
    /// the value would be inserted.
    pub fn insertion_index_of(&self, value: &Value) -> Result<usize, usize> {
        self.values.binary_search(value)
    }
}

impl Dictionary for SortedDictionary {
    fn index_of(&self, value: &Value) -> DictId {
        match self.values.binary_search(value) {
            // population size is bounded by DictId::MAX at construction
            Ok(idx) => idx as DictId,
            Err(_) => NULL_DICT_ID,
        }
    }

    fn values(&self) -> &[Value] {
        &self.values
    }

    fn as_sorted(&self) -> Option<&SortedDictionary> {
        Some(self)
    }
}
