//! Dictionary-encoded predicate scans.
//!
//! Columns store each distinct value once in a [`Dictionary`](dictionary::Dictionary) and refer
//! to it by integer id. Predicates are written against raw values as
//! [`PredicateClause`](query::PredicateClause)s, resolved once per dictionary into id-level
//! [`PredicateFilter`](query::PredicateFilter)s, and then evaluated per record by a
//! [`ScanEvaluator`](scan::ScanEvaluator) without touching the original values again.
//!
//! Raw records travel between ingestion stages as reusable [`GenericRow`](record::GenericRow)s.

/// Value dictionaries and id assignment.
pub mod dictionary;
mod logging;
/// Scan tuning knobs.
pub mod option;
/// Predicate clauses and their resolved id-level filters.
pub mod query;
/// Raw values and generic rows.
pub mod record;
/// Record evaluation over id columns.
pub mod scan;

pub use crate::{
    dictionary::{DictId, Dictionary, HashDictionary, SortedDictionary, NULL_DICT_ID},
    logging::LogContext,
    option::ScanOption,
    query::{Bound, PredicateClause, PredicateFilter},
    record::{GenericRow, Value},
    scan::{FilterExpr, ScanError, ScanEvaluator, ScanInput},
};
