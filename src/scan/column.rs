use std::{collections::HashMap, sync::Arc};

use crate::{
    dictionary::{DictId, Dictionary},
    record::{GenericRow, Value},
    scan::ScanError,
};

/// Borrowed dictionary ids of one column, one entry per record.
#[derive(Debug, Clone, Copy)]
pub enum ColumnIds<'a> {
    /// One id per record.
    Single(&'a [DictId]),
    /// Record `i` owns `ids[offsets[i]..offsets[i + 1]]`.
    Multi {
        offsets: &'a [u32],
        ids: &'a [DictId],
    },
}

impl<'a> ColumnIds<'a> {
    pub fn num_records(&self) -> usize {
        match self {
            ColumnIds::Single(ids) => ids.len(),
            ColumnIds::Multi { offsets, .. } => offsets.len().saturating_sub(1),
        }
    }

    /// Ids of one record; `None` past the end.
    pub fn record(&self, record: usize) -> Option<&'a [DictId]> {
        match *self {
            ColumnIds::Single(ids) => ids.get(record).map(std::slice::from_ref),
            ColumnIds::Multi { offsets, ids } => {
                let start = *offsets.get(record)? as usize;
                let end = *offsets.get(record + 1)? as usize;
                ids.get(start..end)
            }
        }
    }

    fn validate(&self, column: &Arc<str>, num_records: usize) -> Result<(), ScanError> {
        if self.num_records() != num_records {
            return Err(ScanError::LengthMismatch {
                column: column.clone(),
                expected: num_records,
                actual: self.num_records(),
            });
        }
        if let ColumnIds::Multi { offsets, ids } = self {
            let monotonic = offsets.windows(2).all(|pair| pair[0] <= pair[1]);
            let in_bounds = offsets.last().map_or(true, |last| *last as usize <= ids.len());
            if !monotonic || !in_bounds {
                return Err(ScanError::InvalidOffsets(column.clone()));
            }
        }
        Ok(())
    }
}

/// Per-column id arrays for a batch of `num_records` records.
#[derive(Debug, Clone, Default)]
pub struct ScanInput<'a> {
    num_records: usize,
    columns: HashMap<Arc<str>, ColumnIds<'a>>,
}

impl<'a> ScanInput<'a> {
    pub fn new(num_records: usize) -> Self {
        Self {
            num_records,
            columns: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_column(mut self, name: impl Into<Arc<str>>, ids: ColumnIds<'a>) -> Self {
        self.columns.insert(name.into(), ids);
        self
    }

    pub fn insert_column(&mut self, name: impl Into<Arc<str>>, ids: ColumnIds<'a>) {
        self.columns.insert(name.into(), ids);
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn column(&self, name: &str) -> Option<&ColumnIds<'a>> {
        self.columns.get(name)
    }

    pub(crate) fn validate_column(&self, name: &Arc<str>) -> Result<(), ScanError> {
        self.columns
            .get(name)
            .ok_or_else(|| ScanError::UnknownColumn(name.clone()))?
            .validate(name, self.num_records)
    }

    pub(crate) fn record_ids(&self, column: &str, record: usize) -> Option<&'a [DictId]> {
        self.columns.get(column)?.record(record)
    }
}

/// Owned multi-valued id column produced from raw rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedColumn {
    offsets: Vec<u32>,
    ids: Vec<DictId>,
}

impl Default for EncodedColumn {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            ids: Vec::new(),
        }
    }
}

impl EncodedColumn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `column` of every row with `dictionary`.
    pub fn encode_rows(
        rows: &[GenericRow],
        column: &Arc<str>,
        dictionary: &dyn Dictionary,
    ) -> Result<Self, ScanError> {
        let mut encoded = Self {
            offsets: Vec::with_capacity(rows.len() + 1),
            ids: Vec::with_capacity(rows.len()),
        };
        encoded.offsets.push(0);
        encoded.encode_rows_into(rows, column, dictionary)?;
        Ok(encoded)
    }

    /// Replaces the content with `column` of `rows`, reusing the existing buffers.
    ///
    /// On error the column is left cleared.
    pub fn encode_rows_into(
        &mut self,
        rows: &[GenericRow],
        column: &Arc<str>,
        dictionary: &dyn Dictionary,
    ) -> Result<(), ScanError> {
        self.clear();
        self.offsets.reserve(rows.len());
        for (record, row) in rows.iter().enumerate() {
            let encoded = encode_field(row, column, dictionary, record, &mut self.ids)
                .and_then(|()| self.close_record(column));
            if let Err(err) = encoded {
                self.clear();
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn num_records(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn as_column_ids(&self) -> ColumnIds<'_> {
        ColumnIds::Multi {
            offsets: &self.offsets,
            ids: &self.ids,
        }
    }

    /// Drops every record but keeps the allocations.
    pub fn clear(&mut self) {
        self.offsets.truncate(1);
        self.ids.clear();
    }

    fn close_record(&mut self, column: &Arc<str>) -> Result<(), ScanError> {
        let end =
            u32::try_from(self.ids.len()).map_err(|_| ScanError::InvalidOffsets(column.clone()))?;
        self.offsets.push(end);
        Ok(())
    }
}

/// Appends the ids of `row[column]` to `out`: one id for a scalar, one per non-null element for
/// a list, none for null or absent fields.
///
/// A value missing from the dictionary means the dictionary was not built from this data and is
/// reported as [`ScanError::ValueNotInDictionary`].
pub(crate) fn encode_field(
    row: &GenericRow,
    column: &Arc<str>,
    dictionary: &dyn Dictionary,
    record: usize,
    out: &mut Vec<DictId>,
) -> Result<(), ScanError> {
    let mut push = |value: &Value| {
        let id = dictionary.index_of(value);
        if id < 0 {
            return Err(ScanError::ValueNotInDictionary {
                column: column.clone(),
                record,
                value: value.clone(),
            });
        }
        out.push(id);
        Ok(())
    };
    match row.value(column) {
        None => Ok(()),
        Some(Value::List(values)) => values
            .iter()
            .filter(|value| !value.is_null())
            .try_for_each(&mut push),
        Some(value) => push(value),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ColumnIds, EncodedColumn, ScanInput};
    use crate::{
        dictionary::SortedDictionary,
        record::{GenericRow, Value},
        scan::ScanError,
    };

    fn tags() -> SortedDictionary {
        SortedDictionary::new(vec![Value::from("x"), Value::from("y"), Value::from("z")]).unwrap()
    }

    #[test]
    fn record_slices() {
        let single = [4, 5, 6];
        let column = ColumnIds::Single(&single);
        assert_eq!(column.num_records(), 3);
        assert_eq!(column.record(1), Some(&[5][..]));
        assert_eq!(column.record(3), None);

        let offsets = [0, 2, 2, 3];
        let ids = [1, 2, 0];
        let column = ColumnIds::Multi {
            offsets: &offsets,
            ids: &ids,
        };
        assert_eq!(column.num_records(), 3);
        assert_eq!(column.record(0), Some(&[1, 2][..]));
        assert_eq!(column.record(1), Some(&[][..]));
        assert_eq!(column.record(2), Some(&[0][..]));
    }

    #[test]
    fn encode_rows_handles_scalars_lists_and_nulls() {
        let column: Arc<str> = Arc::from("tag");
        let mut rows = Vec::new();
        for value in [
            Value::from("y"),
            Value::from(vec!["z", "x"]),
            Value::Null,
            Value::List(vec![Value::from("x"), Value::Null]),
        ] {
            let mut row = GenericRow::new();
            row.put_field("tag", value);
            rows.push(row);
        }
        rows.push(GenericRow::new());

        let encoded = EncodedColumn::encode_rows(&rows, &column, &tags()).unwrap();
        assert_eq!(encoded.num_records(), 5);
        let ids = encoded.as_column_ids();
        assert_eq!(ids.record(0), Some(&[1][..]));
        assert_eq!(ids.record(1), Some(&[2, 0][..]));
        assert_eq!(ids.record(2), Some(&[][..]));
        assert_eq!(ids.record(3), Some(&[0][..]));
        assert_eq!(ids.record(4), Some(&[][..]));
    }

    #[test]
    fn encode_rows_rejects_unknown_values() {
        let column: Arc<str> = Arc::from("tag");
        let mut row = GenericRow::new();
        row.put_field("tag", "w");
        let err = EncodedColumn::encode_rows(&[row], &column, &tags()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::ValueNotInDictionary { record: 0, .. }
        ));
    }

    #[test]
    fn clear_keeps_one_offset() {
        let column: Arc<str> = Arc::from("tag");
        let mut row = GenericRow::new();
        row.put_field("tag", "x");
        let mut encoded = EncodedColumn::encode_rows(&[row], &column, &tags()).unwrap();
        encoded.clear();
        assert_eq!(encoded, EncodedColumn::new());
        assert_eq!(encoded.num_records(), 0);
    }

    #[test]
    fn encode_rows_into_reuses_one_column() {
        let column: Arc<str> = Arc::from("tag");
        let batch = |values: &[&str]| -> Vec<GenericRow> {
            values
                .iter()
                .map(|value| {
                    let mut row = GenericRow::new();
                    row.put_field("tag", *value);
                    row
                })
                .collect()
        };

        let mut encoded = EncodedColumn::new();
        encoded
            .encode_rows_into(&batch(&["z", "y", "x"]), &column, &tags())
            .unwrap();
        assert_eq!(encoded.num_records(), 3);

        encoded
            .encode_rows_into(&batch(&["x", "z"]), &column, &tags())
            .unwrap();
        assert_eq!(encoded.num_records(), 2);
        let ids = encoded.as_column_ids();
        assert_eq!(ids.record(0), Some(&[0][..]));
        assert_eq!(ids.record(1), Some(&[2][..]));
        assert_eq!(ids.record(2), None);

        let err = encoded
            .encode_rows_into(&batch(&["x", "w"]), &column, &tags())
            .unwrap_err();
        assert!(matches!(err, ScanError::ValueNotInDictionary { record: 1, .. }));
        assert_eq!(encoded, EncodedColumn::new());
    }

    #[test]
    fn validate_reports_length_and_offset_errors() {
        let name: Arc<str> = Arc::from("c");
        let ids = [0, 1];
        let input = ScanInput::new(3).with_column(name.clone(), ColumnIds::Single(&ids));
        assert!(matches!(
            input.validate_column(&name),
            Err(ScanError::LengthMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));

        let offsets = [0, 3, 1];
        let input = ScanInput::new(2).with_column(
            name.clone(),
            ColumnIds::Multi {
                offsets: &offsets,
                ids: &ids,
            },
        );
        assert!(matches!(
            input.validate_column(&name),
            Err(ScanError::InvalidOffsets(_))
        ));

        let missing: Arc<str> = Arc::from("missing");
        assert!(matches!(
            input.validate_column(&missing),
            Err(ScanError::UnknownColumn(_))
        ));
    }
}
