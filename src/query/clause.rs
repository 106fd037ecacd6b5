use std::sync::Arc;

use crate::{
    dictionary::Dictionary,
    logging::scan_log,
    query::{error::ResolveError, PredicateFilter},
    record::Value,
};

/// One end of a range clause; `inclusive` selects `>=`/`<=` over `>`/`<`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub inclusive: bool,
    pub value: Value,
}

impl Bound {
    pub fn new(value: impl Into<Value>, inclusive: bool) -> Self {
        Self {
            inclusive,
            value: value.into(),
        }
    }
}

/// Value-level predicate on one column, before dictionary resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseKind {
    Equals(Value),
    NotEquals(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    /// `None` leaves that side unbounded.
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
    Regex(String),
}

/// Value-level predicate clause, resolved against a column dictionary with
/// [`PredicateClause::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateClause {
    pub column: Arc<str>,
    pub kind: ClauseKind,
}

impl PredicateClause {
    pub fn new(column: impl Into<Arc<str>>, kind: ClauseKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }

    pub fn equals(column: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        Self::new(column, ClauseKind::Equals(value.into()))
    }

    pub fn not_equals(column: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        Self::new(column, ClauseKind::NotEquals(value.into()))
    }

    pub fn in_list<I, V>(column: impl Into<Arc<str>>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            column,
            ClauseKind::In(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn not_in_list<I, V>(column: impl Into<Arc<str>>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            column,
            ClauseKind::NotIn(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn range(column: impl Into<Arc<str>>, lower: Option<Bound>, upper: Option<Bound>) -> Self {
        Self::new(column, ClauseKind::Range { lower, upper })
    }

    pub fn regex(column: impl Into<Arc<str>>, pattern: impl Into<String>) -> Self {
        Self::new(column, ClauseKind::Regex(pattern.into()))
    }

    /// Resolves every literal against `dictionary` and returns the id-level filter.
    pub fn resolve(&self, dictionary: &dyn Dictionary) -> Result<PredicateFilter, ResolveError> {
        let filter = match &self.kind {
            ClauseKind::Equals(value) => {
                self.check_literal(value)?;
                PredicateFilter::equals(dictionary, value)
            }
            ClauseKind::NotEquals(value) => {
                self.check_literal(value)?;
                PredicateFilter::not_equals(dictionary, value)
            }
            ClauseKind::In(values) => {
                self.check_list("in", values)?;
                PredicateFilter::in_set(dictionary, values)
            }
            ClauseKind::NotIn(values) => {
                self.check_list("not in", values)?;
                PredicateFilter::not_in_set(dictionary, values)
            }
            ClauseKind::Range { lower, upper } => {
                if lower.is_none() && upper.is_none() {
                    return Err(ResolveError::InvalidArity {
                        op: "range",
                        expected: "1 or 2",
                        got: 0,
                    });
                }
                for bound in lower.iter().chain(upper.iter()) {
                    self.check_literal(&bound.value)?;
                }
                let sorted = dictionary.as_sorted().ok_or_else(|| {
                    ResolveError::RangeRequiresSortedDictionary(self.column.clone())
                })?;
                PredicateFilter::range(sorted, lower.as_ref(), upper.as_ref())
            }
            ClauseKind::Regex(pattern) => PredicateFilter::regex(dictionary, pattern).map_err(
                |source| ResolveError::InvalidRegex {
                    column: self.column.clone(),
                    pattern: pattern.clone(),
                    source,
                },
            )?,
        };
        scan_log!(
            log::Level::Debug,
            "clause_resolved",
            "column={} filter=\"{}\" cardinality={}",
            self.column,
            filter,
            dictionary.cardinality()
        );
        Ok(filter)
    }

    fn check_literal(&self, value: &Value) -> Result<(), ResolveError> {
        if value.is_null() {
            return Err(ResolveError::NullLiteral(self.column.clone()));
        }
        Ok(())
    }

    fn check_list(&self, op: &'static str, values: &[Value]) -> Result<(), ResolveError> {
        if values.is_empty() {
            return Err(ResolveError::InvalidArity {
                op,
                expected: ">=1",
                got: 0,
            });
        }
        values.iter().try_for_each(|value| self.check_literal(value))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        dictionary::{HashDictionary, SortedDictionary, NULL_DICT_ID},
        query::{Bound, ClauseKind, FilterKind, PredicateClause, ResolveError},
        record::Value,
    };

    fn colors() -> SortedDictionary {
        SortedDictionary::new(vec![
            Value::from("blue"),
            Value::from("green"),
            Value::from("red"),
        ])
        .unwrap()
    }

    #[test]
    fn resolves_equality_once() {
        let filter = PredicateClause::equals("color", "green")
            .resolve(&colors())
            .unwrap();
        assert_eq!(filter.kind(), &FilterKind::Equals { target: 1 });

        let absent = PredicateClause::equals("color", "purple")
            .resolve(&colors())
            .unwrap();
        assert_eq!(
            absent.kind(),
            &FilterKind::Equals {
                target: NULL_DICT_ID
            }
        );
    }

    #[test]
    fn rejects_null_literals() {
        let err = PredicateClause::equals("color", Value::Null)
            .resolve(&colors())
            .unwrap_err();
        assert!(matches!(err, ResolveError::NullLiteral(column) if &*column == "color"));

        let err = PredicateClause::in_list("color", vec![Value::from("red"), Value::Null])
            .resolve(&colors())
            .unwrap_err();
        assert!(matches!(err, ResolveError::NullLiteral(_)));
    }

    #[test]
    fn rejects_empty_lists_and_open_ranges() {
        let err = PredicateClause::in_list("color", Vec::<Value>::new())
            .resolve(&colors())
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidArity {
                op: "in",
                got: 0,
                ..
            }
        ));

        let err = PredicateClause::range("color", None, None)
            .resolve(&colors())
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidArity { op: "range", .. }));
    }

    #[test]
    fn range_needs_sorted_dictionary() {
        let hashed =
            HashDictionary::new(vec![Value::Int64(3), Value::Int64(1), Value::Int64(2)]).unwrap();
        let clause = PredicateClause::range("n", Some(Bound::new(2i64, true)), None);
        let err = clause.resolve(&hashed).unwrap_err();
        assert!(matches!(err, ResolveError::RangeRequiresSortedDictionary(_)));

        let sorted =
            SortedDictionary::new(vec![Value::Int64(3), Value::Int64(1), Value::Int64(2)]).unwrap();
        let filter = clause.resolve(&sorted).unwrap();
        assert_eq!(filter.kind(), &FilterKind::Range { lower: 1, upper: 2 });
    }

    #[test]
    fn invalid_regex_reports_pattern() {
        let err = PredicateClause::regex("color", "[")
            .resolve(&colors())
            .unwrap_err();
        match err {
            ResolveError::InvalidRegex {
                column, pattern, ..
            } => {
                assert_eq!(&*column, "color");
                assert_eq!(pattern, "[");
            }
            other => panic!("expected InvalidRegex, got {other:?}"),
        }
    }

    #[test]
    fn not_in_list_keeps_present_values_only() {
        let clause = PredicateClause::not_in_list("color", ["red", "violet"]);
        assert_eq!(
            clause.kind,
            ClauseKind::NotIn(vec![Value::from("red"), Value::from("violet")])
        );
        let filter = clause.resolve(&colors()).unwrap();
        match filter.kind() {
            FilterKind::NotIn { targets } => {
                assert_eq!(targets.iter().collect::<Vec<_>>(), vec![2]);
            }
            other => panic!("expected NotIn, got {other:?}"),
        }
    }
}
