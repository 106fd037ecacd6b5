use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    fmt,
    hash::{Hash, Hasher},
};

use crate::record::{RowError, Value};

/// Schema-agnostic row keyed by field name.
///
/// A field mapped to [`Value::Null`] is still present: it shows up in [`field_names`] and
/// [`contains_field`], while [`value`] reports it exactly like an absent field. Rows are meant
/// to be reused across records through [`GenericRow::create_or_reuse`], which keeps the key set
/// and the map's allocation alive between records.
///
/// [`field_names`]: GenericRow::field_names
/// [`contains_field`]: GenericRow::contains_field
/// [`value`]: GenericRow::value
#[derive(Debug, Clone, Default)]
pub struct GenericRow {
    fields: HashMap<String, Value>,
}

impl GenericRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: HashMap::with_capacity(capacity),
        }
    }

    /// Replaces the backing field map.
    pub fn init(&mut self, fields: HashMap<String, Value>) {
        self.fields = fields;
    }

    /// Returns the value of `name`, or `None` when the field is absent or null.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    /// Snapshot of the field names, in no particular order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Inserts or overwrites a field. No type checking is done against any schema.
    pub fn put_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.get_mut(&name) {
            Some(slot) => *slot = value,
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    /// Sets every field to null. Keys and the map's capacity are kept.
    pub fn clear(&mut self) {
        for value in self.fields.values_mut() {
            *value = Value::Null;
        }
    }

    /// Hands out the row stored in `slot`, allocating one only when the slot is empty.
    ///
    /// An occupied slot is cleared first, so the returned row has every previous key mapped to
    /// null. This is the pooling point for per-record loops:
    ///
    /// ```
    /// use dictscan::record::GenericRow;
    ///
    /// let mut slot = None;
    /// for id in 0..3i64 {
    ///     let row = GenericRow::create_or_reuse(&mut slot);
    ///     row.put_field("id", id);
    /// }
    /// assert_eq!(slot.unwrap().value("id"), Some(&2i64.into()));
    /// ```
    pub fn create_or_reuse(slot: &mut Option<GenericRow>) -> &mut GenericRow {
        if let Some(row) = slot.as_mut() {
            row.clear();
        }
        slot.get_or_insert_with(GenericRow::new)
    }

    /// Encodes the row as a JSON object.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RowError> {
        serde_json::to_vec(&self.fields).map_err(RowError::Encode)
    }

    /// Decodes a row previously produced by [`GenericRow::to_bytes`].
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, RowError> {
        let fields: HashMap<String, Value> =
            serde_json::from_slice(buffer).map_err(RowError::Decode)?;
        Ok(Self { fields })
    }
}

impl From<HashMap<String, Value>> for GenericRow {
    fn from(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl PartialEq for GenericRow {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for GenericRow {}

impl Hash for GenericRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Sum of per-entry hashes, so the result does not depend on map iteration order.
        let mut sum = 0u64;
        for (name, value) in &self.fields {
            let mut entry = DefaultHasher::new();
            name.hash(&mut entry);
            value.hash(&mut entry);
            sum = sum.wrapping_add(entry.finish());
        }
        self.fields.len().hash(state);
        sum.hash(state);
    }
}

impl fmt::Display for GenericRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            write!(f, "{name} : {value}, ")?;
        }
        Ok(())
    }
}
