//! Selection vectors built on top of roaring bitmaps.

use std::convert::TryFrom;

use roaring::RoaringBitmap;

/// Position of a record inside the scanned batch.
pub type RowId = u32;

/// Borrowed iterator that yields [`RowId`] values.
pub type RowIdIter<'a> = Box<dyn Iterator<Item = RowId> + Send + 'a>;

/// Read-only view over a set of selected record positions.
pub trait RowSet: Send + Sync {
    /// Returns the number of rows tracked by the set.
    fn len(&self) -> usize;

    /// Returns true when the set is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over row identifiers in ascending order.
    fn iter(&self) -> RowIdIter<'_>;
}

/// [`RowSet`] implementation backed by a roaring bitmap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitmapRowSet {
    bitmap: RoaringBitmap,
}

impl BitmapRowSet {
    /// Creates an empty bitmap-backed row set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row identifier into the set.
    pub fn insert(&mut self, row: RowId) {
        self.bitmap.insert(row);
    }

    /// Returns true when the set contains the provided row identifier.
    #[must_use]
    pub fn contains(&self, row: RowId) -> bool {
        self.bitmap.contains(row)
    }

    /// Positions in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<RowId> {
        self.bitmap.iter().collect()
    }
}

impl FromIterator<RowId> for BitmapRowSet {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            bitmap: iter.into_iter().collect(),
        }
    }
}

impl RowSet for BitmapRowSet {
    fn len(&self) -> usize {
        usize::try_from(self.bitmap.len()).unwrap_or(usize::MAX)
    }

    fn iter(&self) -> RowIdIter<'_> {
        Box::new(self.bitmap.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::{BitmapRowSet, RowSet};

    #[test]
    fn collect_deduplicates_positions() {
        let set: BitmapRowSet = [7, 1, 3, 7, 1].into_iter().collect();
        assert_eq!(set.to_vec(), vec![1, 3, 7]);
        assert_eq!(set.len(), 3);
        assert!(BitmapRowSet::new().is_empty());
    }

    #[test]
    fn iter_is_ascending() {
        let mut set = BitmapRowSet::new();
        for row in [9, 2, 6] {
            set.insert(row);
        }
        assert!(set.contains(6));
        assert!(!set.contains(5));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 6, 9]);
    }
}
