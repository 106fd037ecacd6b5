//! Dictionary-resolved predicate filters.
//!
//! A [`PredicateFilter`] is the id-level form of one predicate clause. All value literals are
//! looked up in the column's dictionary once, when the filter is built; evaluation afterwards
//! only compares integers. Values that are missing from the dictionary collapse into a concrete
//! unsatisfiable state (sentinel target, empty set, empty range) instead of a deferred lookup.
//!
//! Batch evaluation answers a question about one record of a possibly multi-valued column:
//! the positive kinds (`Equals`, `In`, `Range`, `Regex`) match when **any** id matches, the
//! negative kinds (`NotEquals`, `NotIn`) match only when **all** ids differ. An empty batch never
//! matches. Negative ids stand for null slots and never satisfy any kind.

mod clause;
mod error;

use std::fmt;

pub use clause::{Bound, ClauseKind, PredicateClause};
pub use error::ResolveError;
use regex::Regex;
use roaring::RoaringBitmap;

use crate::{
    dictionary::{DictId, Dictionary, SortedDictionary, NULL_DICT_ID},
    logging::scan_log,
    record::Value,
};

/// Resolved, immutable id-level predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct PredicateFilter {
    kind: FilterKind,
}

/// Id-level targets of a [`PredicateFilter`].
#[derive(Clone, Debug, PartialEq)]
pub enum FilterKind {
    /// Matches `target`; [`NULL_DICT_ID`] when the literal is not in the dictionary.
    Equals { target: DictId },
    /// Matches every valid id except `target`.
    NotEquals { target: DictId },
    /// Matches ids in `targets`.
    In { targets: RoaringBitmap },
    /// Matches valid ids outside `targets`.
    NotIn { targets: RoaringBitmap },
    /// Matches ids in `lower..=upper`; empty when `lower > upper`.
    Range { lower: DictId, upper: DictId },
    /// Matches ids whose value matched the pattern at construction.
    Regex { matches: RoaringBitmap },
}

impl PredicateFilter {
    pub(crate) fn from_kind(kind: FilterKind) -> Self {
        scan_log!(
            log::Level::Trace,
            "filter_resolved",
            "kind={} always_false={}",
            kind.name(),
            kind.is_always_false()
        );
        Self { kind }
    }

    /// Equality against `value`.
    pub fn equals<D>(dictionary: &D, value: &Value) -> Self
    where
        D: Dictionary + ?Sized,
    {
        Self::from_kind(FilterKind::Equals {
            target: dictionary.index_of(value),
        })
    }

    /// Inequality against `value`.
    pub fn not_equals<D>(dictionary: &D, value: &Value) -> Self
    where
        D: Dictionary + ?Sized,
    {
        Self::from_kind(FilterKind::NotEquals {
            target: dictionary.index_of(value),
        })
    }

    /// Membership in `values`. Values missing from the dictionary are dropped.
    pub fn in_set<D>(dictionary: &D, values: &[Value]) -> Self
    where
        D: Dictionary + ?Sized,
    {
        Self::from_kind(FilterKind::In {
            targets: resolve_set(dictionary, values),
        })
    }

    /// Non-membership in `values`.
    pub fn not_in_set<D>(dictionary: &D, values: &[Value]) -> Self
    where
        D: Dictionary + ?Sized,
    {
        Self::from_kind(FilterKind::NotIn {
            targets: resolve_set(dictionary, values),
        })
    }

    /// Value range over a sorted dictionary. `None` leaves that side unbounded.
    ///
    /// Bounds that are not dictionary values resolve through their insertion point, so
    /// `[15, 25]` over `{10, 20, 30}` selects exactly the id of `20`.
    pub fn range(
        dictionary: &SortedDictionary,
        lower: Option<&Bound>,
        upper: Option<&Bound>,
    ) -> Self {
        let lower_id = match lower {
            None => 0,
            Some(bound) => match dictionary.insertion_index_of(&bound.value) {
                Ok(idx) if bound.inclusive => idx as i64,
                Ok(idx) => idx as i64 + 1,
                Err(insert_at) => insert_at as i64,
            },
        };
        let upper_id = match upper {
            None => dictionary.cardinality() as i64 - 1,
            Some(bound) => match dictionary.insertion_index_of(&bound.value) {
                Ok(idx) if bound.inclusive => idx as i64,
                Ok(idx) => idx as i64 - 1,
                Err(insert_at) => insert_at as i64 - 1,
            },
        };
        Self::from_kind(FilterKind::Range {
            lower: clamp_id(lower_id),
            upper: clamp_id(upper_id),
        })
    }

    /// Ids of every string value matching `pattern` (unanchored search). Non-string values never
    /// match.
    pub fn regex<D>(dictionary: &D, pattern: &str) -> Result<Self, regex::Error>
    where
        D: Dictionary + ?Sized,
    {
        let regex = Regex::new(pattern)?;
        let mut matches = RoaringBitmap::new();
        for (idx, value) in dictionary.values().iter().enumerate() {
            if let Value::String(s) = value {
                if regex.is_match(s) {
                    matches.insert(idx as u32);
                }
            }
        }
        Ok(Self::from_kind(FilterKind::Regex { matches }))
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// True when no valid id can satisfy the filter.
    pub fn is_always_false(&self) -> bool {
        self.kind.is_always_false()
    }

    /// Evaluates a single id.
    pub fn apply(&self, dict_id: DictId) -> bool {
        if dict_id < 0 {
            return false;
        }
        match &self.kind {
            FilterKind::Equals { target } => dict_id == *target,
            FilterKind::NotEquals { target } => dict_id != *target,
            FilterKind::In { targets } | FilterKind::Regex { matches: targets } => {
                targets.contains(dict_id as u32)
            }
            FilterKind::NotIn { targets } => !targets.contains(dict_id as u32),
            FilterKind::Range { lower, upper } => *lower <= dict_id && dict_id <= *upper,
        }
    }

    /// Evaluates the first `length` ids of one record.
    ///
    /// `length` beyond the slice is clamped to the slice length.
    pub fn apply_batch(&self, dict_ids: &[DictId], length: usize) -> bool {
        let dict_ids = &dict_ids[..length.min(dict_ids.len())];
        if dict_ids.is_empty() {
            return false;
        }
        match &self.kind {
            FilterKind::NotEquals { .. } | FilterKind::NotIn { .. } => {
                dict_ids.iter().all(|&id| self.apply(id))
            }
            _ => dict_ids.iter().any(|&id| self.apply(id)),
        }
    }
}

impl FilterKind {
    /// Lower-case name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Equals { .. } => "equals",
            FilterKind::NotEquals { .. } => "not_equals",
            FilterKind::In { .. } => "in",
            FilterKind::NotIn { .. } => "not_in",
            FilterKind::Range { .. } => "range",
            FilterKind::Regex { .. } => "regex",
        }
    }

    fn is_always_false(&self) -> bool {
        match self {
            FilterKind::Equals { target } => *target == NULL_DICT_ID,
            FilterKind::In { targets } | FilterKind::Regex { matches: targets } => {
                targets.is_empty()
            }
            FilterKind::Range { lower, upper } => lower > upper,
            FilterKind::NotEquals { .. } | FilterKind::NotIn { .. } => false,
        }
    }
}

impl fmt::Display for PredicateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FilterKind::Equals { target } => write!(f, "id = {target}"),
            FilterKind::NotEquals { target } => write!(f, "id != {target}"),
            FilterKind::In { targets } => write!(f, "id IN {} ids", targets.len()),
            FilterKind::NotIn { targets } => write!(f, "id NOT IN {} ids", targets.len()),
            FilterKind::Range { lower, upper } => write!(f, "id IN [{lower}, {upper}]"),
            FilterKind::Regex { matches } => write!(f, "id MATCHES {} ids", matches.len()),
        }
    }
}

fn resolve_set<D>(dictionary: &D, values: &[Value]) -> RoaringBitmap
where
    D: Dictionary + ?Sized,
{
    values
        .iter()
        .map(|value| dictionary.index_of(value))
        .filter(|id| *id >= 0)
        .map(|id| id as u32)
        .collect()
}

fn clamp_id(id: i64) -> DictId {
    id.clamp(i64::from(NULL_DICT_ID), i64::from(DictId::MAX)) as DictId
}

#[cfg(test)]
mod tests {
    use super::{Bound, FilterKind, PredicateFilter};
    use crate::{
        dictionary::{HashDictionary, SortedDictionary, NULL_DICT_ID},
        record::Value,
    };

    fn abc() -> SortedDictionary {
        SortedDictionary::new(vec![Value::from("a"), Value::from("b"), Value::from("c")]).unwrap()
    }

    fn tens() -> SortedDictionary {
        SortedDictionary::new(vec![
            Value::Int64(10),
            Value::Int64(20),
            Value::Int64(30),
            Value::Int64(40),
        ])
        .unwrap()
    }

    fn range(lower: Option<(i64, bool)>, upper: Option<(i64, bool)>) -> FilterKind {
        let lower = lower.map(|(v, inclusive)| Bound::new(v, inclusive));
        let upper = upper.map(|(v, inclusive)| Bound::new(v, inclusive));
        PredicateFilter::range(&tens(), lower.as_ref(), upper.as_ref())
            .kind()
            .clone()
    }

    #[test]
    fn equals_scenario() {
        let filter = PredicateFilter::equals(&abc(), &Value::from("b"));
        assert_eq!(filter.kind(), &FilterKind::Equals { target: 1 });
        assert!(filter.apply(1));
        assert!(!filter.apply(0));
        assert!(filter.apply_batch(&[2, 1, 0], 3));
        assert!(!filter.apply_batch(&[2, 0], 2));
    }

    #[test]
    fn not_equals_scenario() {
        let filter = PredicateFilter::not_equals(&abc(), &Value::from("b"));
        assert!(filter.apply_batch(&[0, 2], 2));
        assert!(!filter.apply_batch(&[0, 1], 2));
    }

    // Batch semantics are asymmetric: positive kinds need one hit, negative kinds need every
    // entry to miss. `[0, 1]` contains "b", so it both equals "b" and fails not-equals "b".
    #[test]
    fn batch_any_versus_all_asymmetry() {
        let dictionary = abc();
        let eq = PredicateFilter::equals(&dictionary, &Value::from("b"));
        let ne = PredicateFilter::not_equals(&dictionary, &Value::from("b"));
        let mixed = [0, 1];
        assert!(eq.apply_batch(&mixed, 2));
        assert!(!ne.apply_batch(&mixed, 2));

        let values = [Value::from("a"), Value::from("b")];
        let is_in = PredicateFilter::in_set(&dictionary, &values);
        let not_in = PredicateFilter::not_in_set(&dictionary, &values);
        assert!(is_in.apply_batch(&[2, 0], 2));
        assert!(!not_in.apply_batch(&[2, 0], 2));
        assert!(not_in.apply_batch(&[2, 2], 2));
    }

    #[test]
    fn single_element_batch_matches_single_form() {
        let dictionary = abc();
        let filters = [
            PredicateFilter::equals(&dictionary, &Value::from("b")),
            PredicateFilter::not_equals(&dictionary, &Value::from("b")),
            PredicateFilter::in_set(&dictionary, &[Value::from("a")]),
            PredicateFilter::not_in_set(&dictionary, &[Value::from("a")]),
        ];
        for filter in &filters {
            for id in 0..3 {
                assert_eq!(filter.apply_batch(&[id], 1), filter.apply(id), "{filter}");
            }
        }
    }

    #[test]
    fn empty_batch_never_matches() {
        let dictionary = abc();
        let filters = [
            PredicateFilter::equals(&dictionary, &Value::from("b")),
            PredicateFilter::not_equals(&dictionary, &Value::from("b")),
            PredicateFilter::in_set(&dictionary, &[Value::from("a")]),
            PredicateFilter::not_in_set(&dictionary, &[Value::from("a")]),
            PredicateFilter::range(&dictionary, None, None),
            PredicateFilter::regex(&dictionary, ".*").unwrap(),
        ];
        for filter in &filters {
            assert!(!filter.apply_batch(&[], 0), "{filter}");
            assert!(!filter.apply_batch(&[0, 1, 2], 0), "{filter}");
        }
    }

    #[test]
    fn batch_honors_length_prefix() {
        let filter = PredicateFilter::equals(&abc(), &Value::from("c"));
        assert!(!filter.apply_batch(&[0, 1, 2], 2));
        assert!(filter.apply_batch(&[0, 1, 2], 3));

        let ne = PredicateFilter::not_equals(&abc(), &Value::from("c"));
        assert!(ne.apply_batch(&[0, 1, 2], 2));
        assert!(!ne.apply_batch(&[0, 1, 2], 3));
    }

    #[test]
    fn absent_literal_matches_nothing() {
        let filter = PredicateFilter::equals(&abc(), &Value::from("zzz"));
        assert_eq!(
            filter.kind(),
            &FilterKind::Equals {
                target: NULL_DICT_ID
            }
        );
        assert!(filter.is_always_false());
        for id in [NULL_DICT_ID, 0, 1, 2] {
            assert!(!filter.apply(id));
        }
        assert!(!filter.apply_batch(&[0, 1, 2], 3));

        let in_absent = PredicateFilter::in_set(&abc(), &[Value::from("x"), Value::from("y")]);
        assert!(in_absent.is_always_false());
        assert!(!in_absent.apply_batch(&[0, 1, 2], 3));
    }

    #[test]
    fn not_equals_absent_literal_matches_every_valid_id() {
        let filter = PredicateFilter::not_equals(&abc(), &Value::from("zzz"));
        assert!(!filter.is_always_false());
        assert!(filter.apply_batch(&[0, 1, 2], 3));
        assert!(!filter.apply(NULL_DICT_ID));
    }

    #[test]
    fn null_slots_never_match() {
        let dictionary = abc();
        let eq = PredicateFilter::equals(&dictionary, &Value::from("a"));
        let ne = PredicateFilter::not_equals(&dictionary, &Value::from("a"));
        assert!(!eq.apply(NULL_DICT_ID));
        assert!(!ne.apply(NULL_DICT_ID));
        assert!(!ne.apply_batch(&[1, NULL_DICT_ID], 2));
        assert!(eq.apply_batch(&[NULL_DICT_ID, 0], 2));
    }

    #[test]
    fn range_resolves_inclusive_and_exclusive_bounds() {
        assert_eq!(
            range(Some((20, true)), Some((30, true))),
            FilterKind::Range { lower: 1, upper: 2 }
        );
        assert_eq!(
            range(Some((20, false)), Some((30, false))),
            FilterKind::Range { lower: 2, upper: 1 }
        );
        assert_eq!(
            range(Some((15, true)), Some((35, false))),
            FilterKind::Range { lower: 1, upper: 2 }
        );
        assert_eq!(
            range(None, Some((10, false))),
            FilterKind::Range { lower: 0, upper: -1 }
        );
        assert_eq!(
            range(Some((41, true)), None),
            FilterKind::Range { lower: 4, upper: 3 }
        );
        assert_eq!(range(None, None), FilterKind::Range { lower: 0, upper: 3 });
    }

    #[test]
    fn range_applies_over_ids() {
        let dictionary = tens();
        let lower = Bound::new(15i64, true);
        let upper = Bound::new(30i64, true);
        let filter = PredicateFilter::range(&dictionary, Some(&lower), Some(&upper));
        assert!(!filter.apply(0));
        assert!(filter.apply(1));
        assert!(filter.apply(2));
        assert!(!filter.apply(3));
        assert!(filter.apply_batch(&[0, 3, 2], 3));
        assert!(!filter.apply_batch(&[0, 3], 2));

        let empty = Bound::new(20i64, false);
        let filter = PredicateFilter::range(&dictionary, Some(&empty), Some(&empty));
        assert!(filter.is_always_false());
        assert!((0..4).all(|id| !filter.apply(id)));
    }

    #[test]
    fn regex_precomputes_matching_ids() {
        let dictionary = HashDictionary::new(vec![
            Value::from("apple"),
            Value::from("banana"),
            Value::from("apricot"),
            Value::Int64(7),
        ])
        .unwrap();
        let filter = PredicateFilter::regex(&dictionary, "^ap").unwrap();
        assert!(filter.apply(0));
        assert!(!filter.apply(1));
        assert!(filter.apply(2));
        assert!(!filter.apply(3));

        let nothing = PredicateFilter::regex(&dictionary, "^z").unwrap();
        assert!(nothing.is_always_false());

        let unanchored = PredicateFilter::regex(&dictionary, "nan").unwrap();
        assert!(unanchored.apply(1));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(PredicateFilter::regex(&abc(), "(unclosed").is_err());
    }
}
