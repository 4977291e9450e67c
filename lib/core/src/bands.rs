//! Banded LSH bucketing over a signature matrix.

use crate::{Error, Result, SignatureMatrix};
use ahash::AHashMap;
use smallvec::SmallVec;
use std::ops::Range;

/// Bucket key: band number plus that band's signature values. Carrying the
/// band keeps equal tuples from different bands apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BandKey {
    pub band: u32,
    pub rows: SmallVec<[u64; 8]>,
}

/// How `num_hashes` signature rows split into `bands` bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandLayout {
    bands: usize,
    rows_per_band: usize,
}

impl BandLayout {
    pub fn new(num_hashes: usize, bands: usize) -> Result<Self> {
        if num_hashes == 0 {
            return Err(Error::InvalidConfig(
                "num_hashes must be greater than zero".to_string(),
            ));
        }
        if bands == 0 {
            return Err(Error::InvalidConfig(
                "bands must be greater than zero".to_string(),
            ));
        }
        if num_hashes % bands != 0 {
            return Err(Error::InvalidConfig(format!(
                "num_hashes ({num_hashes}) must be divisible by bands ({bands})"
            )));
        }
        Ok(Self {
            bands,
            rows_per_band: num_hashes / bands,
        })
    }

    #[inline]
    pub fn bands(&self) -> usize {
        self.bands
    }

    #[inline]
    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    #[inline]
    pub fn num_hashes(&self) -> usize {
        self.bands * self.rows_per_band
    }

    #[inline]
    pub fn band_range(&self, band: usize) -> Range<usize> {
        let start = band * self.rows_per_band;
        start..start + self.rows_per_band
    }

    /// Similarity at which a pair becomes a candidate with probability ~1/2.
    pub fn threshold(&self) -> f64 {
        (1.0 / self.bands as f64).powf(1.0 / self.rows_per_band as f64)
    }

    /// One entry per band for a signature column; `None` where the band
    /// holds a sentinel.
    pub fn band_keys<'a>(
        &'a self,
        column: &'a [Option<u64>],
    ) -> impl Iterator<Item = Option<BandKey>> + 'a {
        (0..self.bands).map(move |band| {
            let rows = column[self.band_range(band)]
                .iter()
                .copied()
                .collect::<Option<SmallVec<[u64; 8]>>>()?;
            Some(BandKey {
                band: band as u32,
                rows,
            })
        })
    }
}

/// Mapping from band key to the ascending list of item indices sharing it.
#[derive(Debug, Clone, Default)]
pub struct BucketTable {
    buckets: AHashMap<BandKey, Vec<usize>>,
}

impl PartialEq for BucketTable {
    fn eq(&self, other: &Self) -> bool {
        self.buckets.len() == other.buckets.len()
            && self
                .buckets
                .iter()
                .all(|(key, items)| other.buckets.get(key) == Some(items))
    }
}

impl Eq for BucketTable {}

impl BucketTable {
    pub fn build(matrix: &SignatureMatrix, layout: &BandLayout) -> Result<Self> {
        if matrix.num_hashes() != layout.num_hashes() {
            return Err(Error::InvalidState(format!(
                "signature matrix has {} rows, band layout expects {}",
                matrix.num_hashes(),
                layout.num_hashes()
            )));
        }

        let mut buckets: AHashMap<BandKey, Vec<usize>> = AHashMap::new();
        // Items are visited in index order, so every bucket stays sorted.
        for item in 0..matrix.num_items() {
            for key in layout.band_keys(matrix.column(item)).flatten() {
                buckets.entry(key).or_default().push(item);
            }
        }

        Ok(Self { buckets })
    }

    #[inline]
    pub fn get(&self, key: &BandKey) -> Option<&[usize]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn largest_bucket(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BandKey, &[usize])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, HashFamily, Shingler, SignatureBuilder};

    fn matrix(texts: &[&str], num_hashes: usize) -> SignatureMatrix {
        let docs: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::from_fields(i.to_string(), [("text", *t)]))
            .collect();
        let shingler = Shingler::new(3).unwrap();
        let family = HashFamily::generate(num_hashes, 42).unwrap();
        SignatureBuilder::new(&shingler, &family).build(&docs, "text").0
    }

    #[test]
    fn test_layout_divisibility() {
        assert_eq!(BandLayout::new(30, 6).unwrap().rows_per_band(), 5);
        assert!(matches!(BandLayout::new(30, 7), Err(Error::InvalidConfig(_))));
        assert!(matches!(BandLayout::new(30, 0), Err(Error::InvalidConfig(_))));
        assert!(matches!(BandLayout::new(0, 5), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_band_range_and_threshold() {
        let layout = BandLayout::new(100, 20).unwrap();
        assert_eq!(layout.band_range(0), 0..5);
        assert_eq!(layout.band_range(19), 95..100);
        assert!((layout.threshold() - 0.5493).abs() < 1e-3);
    }

    #[test]
    fn test_sentinel_band_skipped() {
        let layout = BandLayout::new(4, 2).unwrap();
        let column = [Some(1), None, Some(3), Some(4)];
        let keys: Vec<_> = layout.band_keys(&column).collect();
        assert!(keys[0].is_none());
        assert_eq!(keys[1].as_ref().unwrap().rows.as_slice(), &[3, 4]);
        assert_eq!(keys[1].as_ref().unwrap().band, 1);
    }

    #[test]
    fn test_band_index_is_part_of_key() {
        let a = BandKey {
            band: 0,
            rows: SmallVec::from_slice(&[7, 7]),
        };
        let b = BandKey {
            band: 1,
            rows: SmallVec::from_slice(&[7, 7]),
        };
        assert_ne!(a, b);

        // Same tuple in two different bands of one item lands in two buckets.
        let layout = BandLayout::new(4, 2).unwrap();
        let column = [Some(7), Some(7), Some(7), Some(7)];
        let keys: Vec<_> = layout.band_keys(&column).flatten().collect();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
    }

    #[test]
    fn test_identical_items_share_every_bucket() {
        let m = matrix(&["stainless ice maker", "stainless ice maker", ""], 12);
        let layout = BandLayout::new(12, 4).unwrap();
        let table = BucketTable::build(&m, &layout).unwrap();

        assert_eq!(table.len(), 4);
        for (_, items) in table.iter() {
            assert_eq!(items, &[0, 1]);
        }
        assert_eq!(table.largest_bucket(), 2);
    }

    #[test]
    fn test_bucket_members_agree_on_band() {
        let m = matrix(&["dryer vent hose", "dryer vent kit", "water filter", "water filters"], 20);
        let layout = BandLayout::new(20, 10).unwrap();
        let table = BucketTable::build(&m, &layout).unwrap();
        for (key, items) in table.iter() {
            let range = layout.band_range(key.band as usize);
            for &item in items {
                let band: Vec<u64> = m.column(item)[range.clone()]
                    .iter()
                    .map(|v| v.unwrap())
                    .collect();
                assert_eq!(band.as_slice(), key.rows.as_slice());
            }
        }
    }

    #[test]
    fn test_layout_mismatch_is_state_error() {
        let m = matrix(&["abc"], 12);
        let layout = BandLayout::new(10, 5).unwrap();
        assert!(matches!(
            BucketTable::build(&m, &layout),
            Err(Error::InvalidState(_))
        ));
    }
}
