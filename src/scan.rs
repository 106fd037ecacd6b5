//! Reference scan over dictionary-encoded columns.
//!
//! A [`ScanEvaluator`] owns a tree of resolved clauses combined with `AND`/`OR`. For every
//! record it evaluates the batch form of each clause over that record's ids and short-circuits
//! on the first decisive child. The same tree can also be evaluated directly over
//! [`GenericRow`]s, in which case each clause encodes its column through its own dictionary
//! first.

mod column;
mod row_set;

use std::{collections::HashSet, sync::Arc};

pub use column::{ColumnIds, EncodedColumn, ScanInput};
pub use row_set::{BitmapRowSet, RowId, RowIdIter, RowSet};
use thiserror::Error;

use crate::{
    dictionary::{DictId, Dictionary, DictionaryError},
    logging::scan_log,
    option::ScanOption,
    query::{PredicateClause, PredicateFilter, ResolveError},
    record::{GenericRow, Value},
};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unknown column: {0}")]
    UnknownColumn(Arc<str>),
    #[error("Column '{column}' has {actual} records, expected {expected}")]
    LengthMismatch {
        column: Arc<str>,
        expected: usize,
        actual: usize,
    },
    #[error("Column '{0}' has malformed offsets")]
    InvalidOffsets(Arc<str>),
    #[error("AND/OR requires at least one child")]
    EmptyExpression,
    #[error("Record {record} is out of range for a batch of {num_records} records")]
    RecordOutOfRange { record: usize, num_records: usize },
    #[error("Batch of {0} records exceeds the row id space")]
    TooManyRecords(usize),
    #[error("Column '{column}' is bound to different dictionaries")]
    DictionaryConflict { column: Arc<str> },
    #[error("Value {value} of column '{column}' in record {record} is not in the dictionary")]
    ValueNotInDictionary {
        column: Arc<str>,
        record: usize,
        value: Value,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// A resolved clause bound to the column and dictionary it was resolved against.
#[derive(Debug, Clone)]
pub struct BoundClause {
    column: Arc<str>,
    dictionary: Arc<dyn Dictionary>,
    filter: PredicateFilter,
}

impl BoundClause {
    pub fn new(
        column: impl Into<Arc<str>>,
        dictionary: Arc<dyn Dictionary>,
        filter: PredicateFilter,
    ) -> Self {
        Self {
            column: column.into(),
            dictionary,
            filter,
        }
    }

    pub fn column(&self) -> &Arc<str> {
        &self.column
    }

    pub fn dictionary(&self) -> &Arc<dyn Dictionary> {
        &self.dictionary
    }

    pub fn filter(&self) -> &PredicateFilter {
        &self.filter
    }
}

/// Boolean combination of bound clauses.
#[derive(Debug, Clone)]
pub enum FilterExpr {
    Clause(BoundClause),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Resolves `clause` against `dictionary` and wraps it as a leaf.
    pub fn clause(
        clause: &PredicateClause,
        dictionary: Arc<dyn Dictionary>,
    ) -> Result<Self, ScanError> {
        let filter = clause.resolve(dictionary.as_ref())?;
        Ok(FilterExpr::Clause(BoundClause::new(
            clause.column.clone(),
            dictionary,
            filter,
        )))
    }

    pub fn and(children: impl IntoIterator<Item = FilterExpr>) -> Self {
        FilterExpr::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = FilterExpr>) -> Self {
        FilterExpr::Or(children.into_iter().collect())
    }

    /// True when no record can satisfy the expression, judging by the filters alone.
    pub fn is_always_false(&self) -> bool {
        match self {
            FilterExpr::Clause(clause) => clause.filter.is_always_false(),
            FilterExpr::And(children) => children.iter().any(FilterExpr::is_always_false),
            FilterExpr::Or(children) => children.iter().all(FilterExpr::is_always_false),
        }
    }

    fn validate(&self) -> Result<(), ScanError> {
        match self {
            FilterExpr::Clause(_) => Ok(()),
            FilterExpr::And(children) | FilterExpr::Or(children) => {
                if children.is_empty() {
                    return Err(ScanError::EmptyExpression);
                }
                children.iter().try_for_each(FilterExpr::validate)
            }
        }
    }

    fn clauses<'e>(&'e self, out: &mut Vec<&'e BoundClause>) {
        match self {
            FilterExpr::Clause(clause) => out.push(clause),
            FilterExpr::And(children) | FilterExpr::Or(children) => {
                for child in children {
                    child.clauses(out);
                }
            }
        }
    }

    fn evaluate<F>(&self, leaf: &mut F) -> bool
    where
        F: FnMut(&BoundClause) -> bool,
    {
        match self {
            FilterExpr::Clause(clause) => leaf(clause),
            FilterExpr::And(children) => children.iter().all(|child| child.evaluate(leaf)),
            FilterExpr::Or(children) => children.iter().any(|child| child.evaluate(leaf)),
        }
    }

    fn try_evaluate<F>(&self, leaf: &mut F) -> Result<bool, ScanError>
    where
        F: FnMut(&BoundClause) -> Result<bool, ScanError>,
    {
        match self {
            FilterExpr::Clause(clause) => leaf(clause),
            FilterExpr::And(children) => {
                for child in children {
                    if !child.try_evaluate(leaf)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            FilterExpr::Or(children) => {
                for child in children {
                    if child.try_evaluate(leaf)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Encoded columns kept between [`ScanEvaluator::evaluate_rows_with`] calls.
#[derive(Debug, Default)]
pub struct RowScratch {
    columns: Vec<(Arc<str>, EncodedColumn)>,
}

impl RowScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Brute-force evaluator of a [`FilterExpr`] over id columns or raw rows.
#[derive(Debug, Clone)]
pub struct ScanEvaluator {
    expr: FilterExpr,
    option: ScanOption,
}

impl ScanEvaluator {
    pub fn new(expr: FilterExpr) -> Result<Self, ScanError> {
        Self::with_option(expr, ScanOption::default())
    }

    pub fn with_option(expr: FilterExpr, option: ScanOption) -> Result<Self, ScanError> {
        expr.validate()?;
        let mut clauses = Vec::new();
        expr.clauses(&mut clauses);
        for (idx, clause) in clauses.iter().enumerate() {
            let conflict = clauses[..idx].iter().any(|earlier| {
                earlier.column == clause.column
                    && !Arc::ptr_eq(&earlier.dictionary, &clause.dictionary)
            });
            if conflict {
                return Err(ScanError::DictionaryConflict {
                    column: clause.column.clone(),
                });
            }
        }
        Ok(Self { expr, option })
    }

    pub fn expr(&self) -> &FilterExpr {
        &self.expr
    }

    /// Columns referenced by the expression, each listed once.
    pub fn columns(&self) -> Vec<Arc<str>> {
        let mut clauses = Vec::new();
        self.expr.clauses(&mut clauses);
        let mut seen = HashSet::new();
        clauses
            .into_iter()
            .filter(|clause| seen.insert(clause.column.clone()))
            .map(|clause| clause.column.clone())
            .collect()
    }

    /// Evaluates one record of `input`.
    pub fn matches(&self, input: &ScanInput<'_>, record: usize) -> Result<bool, ScanError> {
        self.validate_input(input)?;
        let num_records = input.num_records();
        if record >= num_records {
            return Err(ScanError::RecordOutOfRange {
                record,
                num_records,
            });
        }
        Ok(self.matches_validated(input, record))
    }

    /// Positions of every record of `input` satisfying the expression.
    pub fn select(&self, input: &ScanInput<'_>) -> Result<BitmapRowSet, ScanError> {
        self.validate_input(input)?;
        let num_records = input.num_records();
        let last = u32::try_from(num_records).map_err(|_| ScanError::TooManyRecords(num_records))?;
        if self.pruned() {
            return Ok(BitmapRowSet::new());
        }

        let mut selection = BitmapRowSet::new();
        for row in 0..last {
            if self.matches_validated(input, row as usize) {
                selection.insert(row);
            }
        }
        scan_log!(
            log::Level::Debug,
            ctx: self.option.log_context,
            "scan_finished",
            "records={} selected={}",
            num_records,
            selection.len()
        );
        Ok(selection)
    }

    /// Same as [`ScanEvaluator::select`], as an ascending position list.
    pub fn select_positions(&self, input: &ScanInput<'_>) -> Result<Vec<RowId>, ScanError> {
        Ok(self.select(input)?.to_vec())
    }

    /// Evaluates a raw row, encoding each referenced field through its clause's dictionary.
    ///
    /// `scratch` is reused across calls to avoid allocating per record.
    pub fn matches_row(
        &self,
        row: &GenericRow,
        scratch: &mut Vec<DictId>,
    ) -> Result<bool, ScanError> {
        self.expr
            .try_evaluate(&mut |clause: &BoundClause| -> Result<bool, ScanError> {
                scratch.clear();
                column::encode_field(
                    row,
                    &clause.column,
                    clause.dictionary.as_ref(),
                    0,
                    scratch,
                )?;
                Ok(clause.filter.apply_batch(scratch, scratch.len()))
            })
    }

    /// Encodes every referenced column of `rows` and selects the matching positions.
    pub fn evaluate_rows(&self, rows: &[GenericRow]) -> Result<BitmapRowSet, ScanError> {
        self.evaluate_rows_with(rows, &mut RowScratch::new())
    }

    /// Same as [`ScanEvaluator::evaluate_rows`], re-encoding into the columns held by
    /// `scratch` so repeated batches reuse their buffers.
    pub fn evaluate_rows_with(
        &self,
        rows: &[GenericRow],
        scratch: &mut RowScratch,
    ) -> Result<BitmapRowSet, ScanError> {
        let mut clauses = Vec::new();
        self.expr.clauses(&mut clauses);

        let mut used = 0;
        for clause in clauses {
            if scratch.columns[..used]
                .iter()
                .any(|(column, _)| *column == clause.column)
            {
                continue;
            }
            if used == scratch.columns.len() {
                scratch
                    .columns
                    .push((clause.column.clone(), EncodedColumn::new()));
            }
            let (name, encoded) = &mut scratch.columns[used];
            if *name != clause.column {
                *name = clause.column.clone();
            }
            encoded.encode_rows_into(rows, &clause.column, clause.dictionary.as_ref())?;
            used += 1;
        }

        let mut input = ScanInput::new(rows.len());
        for (name, column) in &scratch.columns[..used] {
            input.insert_column(name.clone(), column.as_column_ids());
        }
        self.select(&input)
    }

    fn pruned(&self) -> bool {
        if self.option.prune_unsatisfiable && self.expr.is_always_false() {
            scan_log!(
                log::Level::Debug,
                ctx: self.option.log_context,
                "scan_pruned",
                "reason=unsatisfiable"
            );
            return true;
        }
        false
    }

    fn validate_input(&self, input: &ScanInput<'_>) -> Result<(), ScanError> {
        let mut clauses = Vec::new();
        self.expr.clauses(&mut clauses);
        clauses
            .iter()
            .try_for_each(|clause| input.validate_column(&clause.column))
    }

    fn matches_validated(&self, input: &ScanInput<'_>, record: usize) -> bool {
        self.expr.evaluate(&mut |clause: &BoundClause| {
            input
                .record_ids(&clause.column, record)
                .is_some_and(|ids| clause.filter.apply_batch(ids, ids.len()))
        })
    }
}
