use crate::{Document, HashFamily, ShingleSet, Shingler};
use rayon::prelude::*;

/// MinHash signatures, `num_hashes` rows by `num_items` columns.
///
/// Stored column-major: each item's signature is one contiguous slice.
/// `None` marks a cell for an item that produced no shingles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatrix {
    num_hashes: usize,
    num_items: usize,
    cells: Vec<Option<u64>>,
}

impl SignatureMatrix {
    fn from_columns(num_hashes: usize, columns: Vec<Vec<Option<u64>>>) -> Self {
        let num_items = columns.len();
        let mut cells = Vec::with_capacity(num_hashes * num_items);
        for column in columns {
            debug_assert_eq!(column.len(), num_hashes);
            cells.extend(column);
        }
        Self {
            num_hashes,
            num_items,
            cells,
        }
    }

    #[inline]
    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Cell `(row, col)`; `None` for the sentinel or out-of-range coordinates.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<u64> {
        if row >= self.num_hashes || col >= self.num_items {
            return None;
        }
        self.cells[col * self.num_hashes + row]
    }

    /// Full signature of item `col`.
    #[inline]
    pub fn column(&self, col: usize) -> &[Option<u64>] {
        let start = col * self.num_hashes;
        &self.cells[start..start + self.num_hashes]
    }
}

/// Computes shingle sets and MinHash columns for a corpus field.
pub struct SignatureBuilder<'a> {
    shingler: &'a Shingler,
    family: &'a HashFamily,
}

impl<'a> SignatureBuilder<'a> {
    pub fn new(shingler: &'a Shingler, family: &'a HashFamily) -> Self {
        Self { shingler, family }
    }

    /// MinHash column for one shingle set: the per-function minimum.
    pub fn signature(&self, shingles: &ShingleSet) -> Vec<Option<u64>> {
        let mut mins: Vec<Option<u64>> = vec![None; self.family.len()];
        for shingle in shingles.iter() {
            for (slot, func) in mins.iter_mut().zip(self.family.iter()) {
                let value = func.apply(shingle);
                match slot {
                    Some(current) if *current <= value => {}
                    _ => *slot = Some(value),
                }
            }
        }
        mins
    }

    /// Shingle and sign every document's `field`. Items are independent, so
    /// they are processed in parallel; output order follows `docs`.
    pub fn build(&self, docs: &[Document], field: &str) -> (SignatureMatrix, Vec<ShingleSet>) {
        let per_item: Vec<(Vec<Option<u64>>, ShingleSet)> = docs
            .par_iter()
            .map(|doc| {
                let shingles = doc
                    .text(field)
                    .map(|text| self.shingler.shingle(text))
                    .unwrap_or_default();
                (self.signature(&shingles), shingles)
            })
            .collect();

        let (columns, shingles): (Vec<_>, Vec<_>) = per_item.into_iter().unzip();
        (SignatureMatrix::from_columns(self.family.len(), columns), shingles)
    }
}
