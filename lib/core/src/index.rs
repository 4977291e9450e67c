use crate::{
    BandLayout, BucketTable, Document, Error, HashFamily, Result, ShingleSet, Shingler,
    SignatureBuilder, SignatureMatrix,
};
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::time::Instant;
use tracing::{debug, info};

/// Build parameters for one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    pub num_hashes: usize,
    pub bands: usize,
    pub k_shingle: usize,
    pub seed: u64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            num_hashes: 30,
            bands: 15,
            k_shingle: 3,
            seed: 42,
        }
    }
}

impl IndexParams {
    pub fn validate(&self) -> Result<()> {
        Shingler::new(self.k_shingle)?;
        BandLayout::new(self.num_hashes, self.bands)?;
        Ok(())
    }
}

/// One ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarItem {
    pub id: String,
    pub similarity: f64,
}

/// Summary numbers for a fitted index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub items: usize,
    pub empty_items: usize,
    pub buckets: usize,
    pub largest_bucket: usize,
    pub threshold: f64,
}

struct Signed {
    field: String,
    ids: Vec<String>,
    positions: AHashMap<String, usize>,
    shingles: Vec<ShingleSet>,
    matrix: SignatureMatrix,
}

enum IndexState {
    Empty,
    Signed(Signed),
    Ready(Signed, BucketTable),
}

/// MinHash LSH index over one text field of a corpus.
///
/// Created empty, filled once by [`LshIndex::fit`], then read-only.
pub struct LshIndex {
    params: IndexParams,
    shingler: Shingler,
    layout: BandLayout,
    family: HashFamily,
    state: IndexState,
}

impl LshIndex {
    pub fn new(params: IndexParams) -> Result<Self> {
        let shingler = Shingler::new(params.k_shingle)?;
        let layout = BandLayout::new(params.num_hashes, params.bands)?;
        let family = HashFamily::generate(params.num_hashes, params.seed)?;
        Ok(Self {
            params,
            shingler,
            layout,
            family,
            state: IndexState::Empty,
        })
    }

    #[inline]
    pub fn params(&self) -> &IndexParams {
        &self.params
    }

    #[inline]
    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    #[inline]
    pub fn hash_family(&self) -> &HashFamily {
        &self.family
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        matches!(self.state, IndexState::Ready(..))
    }

    /// Shingle and sign `field` of every document.
    pub fn compute_signatures(&mut self, docs: &[Document], field: &str) -> Result<()> {
        if !matches!(self.state, IndexState::Empty) {
            return Err(Error::InvalidState(
                "signatures already computed; build a new index instead".to_string(),
            ));
        }

        let mut positions = AHashMap::with_capacity(docs.len());
        for (idx, doc) in docs.iter().enumerate() {
            if positions.insert(doc.id.clone(), idx).is_some() {
                return Err(Error::DuplicateItem(doc.id.clone()));
            }
        }

        let (matrix, shingles) =
            SignatureBuilder::new(&self.shingler, &self.family).build(docs, field);
        let empty = shingles.iter().filter(|s| s.is_empty()).count();
        debug!(field, items = docs.len(), empty, "signatures computed");

        self.state = IndexState::Signed(Signed {
            field: field.to_string(),
            ids: docs.iter().map(|d| d.id.clone()).collect(),
            positions,
            shingles,
            matrix,
        });
        Ok(())
    }

    /// Bucket the computed signatures. Requires `compute_signatures` first.
    pub fn build_buckets(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, IndexState::Empty) {
            IndexState::Signed(signed) => match BucketTable::build(&signed.matrix, &self.layout) {
                Ok(table) => {
                    self.state = IndexState::Ready(signed, table);
                    Ok(())
                }
                Err(e) => {
                    self.state = IndexState::Signed(signed);
                    Err(e)
                }
            },
            other => {
                let msg = match other {
                    IndexState::Empty => "signatures must be computed before bucketing",
                    _ => "buckets already built",
                };
                self.state = other;
                Err(Error::InvalidState(msg.to_string()))
            }
        }
    }

    /// Full build pass: signatures then buckets.
    pub fn fit(&mut self, docs: &[Document], field: &str) -> Result<()> {
        let start = Instant::now();
        info!(
            field,
            items = docs.len(),
            num_hashes = self.params.num_hashes,
            bands = self.params.bands,
            "building MinHash signatures"
        );
        self.compute_signatures(docs, field)?;
        self.build_buckets()?;
        if let Ok(stats) = self.stats() {
            info!(
                field,
                buckets = stats.buckets,
                largest_bucket = stats.largest_bucket,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "LSH index built"
            );
        }
        Ok(())
    }

    fn ready(&self) -> Result<(&Signed, &BucketTable)> {
        match &self.state {
            IndexState::Ready(signed, table) => Ok((signed, table)),
            _ => Err(Error::InvalidState("index has not been fitted".to_string())),
        }
    }

    fn position(signed: &Signed, id: &str) -> Result<usize> {
        signed
            .positions
            .get(id)
            .copied()
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    /// Text field this index was built over.
    pub fn field(&self) -> Option<&str> {
        match &self.state {
            IndexState::Empty => None,
            IndexState::Signed(s) | IndexState::Ready(s, _) => Some(&s.field),
        }
    }

    pub fn len(&self) -> usize {
        match &self.state {
            IndexState::Empty => 0,
            IndexState::Signed(s) | IndexState::Ready(s, _) => s.ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        match &self.state {
            IndexState::Empty => false,
            IndexState::Signed(s) | IndexState::Ready(s, _) => s.positions.contains_key(id),
        }
    }

    pub fn signature_matrix(&self) -> Result<&SignatureMatrix> {
        Ok(&self.ready()?.0.matrix)
    }

    pub fn bucket_table(&self) -> Result<&BucketTable> {
        Ok(self.ready()?.1)
    }

    pub fn shingles(&self, id: &str) -> Result<&ShingleSet> {
        let (signed, _) = self.ready()?;
        Ok(&signed.shingles[Self::position(signed, id)?])
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let (signed, table) = self.ready()?;
        Ok(IndexStats {
            items: signed.ids.len(),
            empty_items: signed.shingles.iter().filter(|s| s.is_empty()).count(),
            buckets: table.len(),
            largest_bucket: table.largest_bucket(),
            threshold: self.layout.threshold(),
        })
    }

    fn candidate_indices(&self, signed: &Signed, table: &BucketTable, query: usize) -> Vec<usize> {
        let mut candidates: Vec<usize> = self
            .layout
            .band_keys(signed.matrix.column(query))
            .flatten()
            .filter_map(|key| table.get(&key))
            .flatten()
            .copied()
            .filter(|&idx| idx != query)
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }

    /// Items sharing at least one bucket with `id`, excluding `id` itself.
    pub fn candidates(&self, id: &str) -> Result<Vec<String>> {
        let (signed, table) = self.ready()?;
        let query = Self::position(signed, id)?;
        Ok(self
            .candidate_indices(signed, table, query)
            .into_iter()
            .map(|idx| signed.ids[idx].clone())
            .collect())
    }

    /// Up to `top_n` items most similar to `id`, by exact Jaccard similarity
    /// over shingle sets. Ties are ordered by ascending item index.
    pub fn find_similar(&self, id: &str, top_n: usize) -> Result<Vec<SimilarItem>> {
        let (signed, table) = self.ready()?;
        let query = Self::position(signed, id)?;
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let candidates = self.candidate_indices(signed, table, query);
        let query_shingles = &signed.shingles[query];

        let mut scored: Vec<(usize, f64)> = candidates
            .iter()
            .map(|&idx| (idx, query_shingles.jaccard(&signed.shingles[idx])))
            .filter(|&(_, sim)| sim > 0.0)
            .collect();
        debug!(
            id,
            candidates = candidates.len(),
            scored = scored.len(),
            "similarity query"
        );

        scored.sort_unstable_by_key(|&(idx, sim)| (Reverse(OrderedFloat(sim)), idx));
        scored.truncate(top_n);

        Ok(scored
            .into_iter()
            .map(|(idx, similarity)| SimilarItem {
                id: signed.ids[idx].clone(),
                similarity,
            })
            .collect())
    }

    /// MinHash estimate of the Jaccard similarity between two items: the
    /// share of rows where both signatures hold the same value.
    pub fn estimate_similarity(&self, a: &str, b: &str) -> Result<f64> {
        let (signed, _) = self.ready()?;
        let col_a = signed.matrix.column(Self::position(signed, a)?);
        let col_b = signed.matrix.column(Self::position(signed, b)?);
        let matches = col_a
            .iter()
            .zip(col_b)
            .filter(|(x, y)| x.is_some() && x == y)
            .count();
        Ok(matches as f64 / self.params.num_hashes as f64)
    }
}

/// Construct and fit an index over `field` of `docs` in one call.
pub fn build_index(
    method: &str,
    docs: &[Document],
    field: &str,
    params: IndexParams,
) -> Result<LshIndex> {
    let mut index = LshIndex::new(params)?;
    info!(method, field, "fitting index");
    index.fit(docs, field)?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::from_fields(format!("p{i}"), [("title", *t)]))
            .collect()
    }

    fn params(num_hashes: usize, bands: usize, k_shingle: usize) -> IndexParams {
        IndexParams {
            num_hashes,
            bands,
            k_shingle,
            seed: 42,
        }
    }

    #[test]
    fn test_config_errors() {
        assert!(LshIndex::new(params(30, 6, 3)).is_ok());
        assert!(matches!(LshIndex::new(params(30, 7, 3)), Err(Error::InvalidConfig(_))));
        assert!(matches!(LshIndex::new(params(0, 1, 3)), Err(Error::InvalidConfig(_))));
        assert!(matches!(LshIndex::new(params(30, 6, 0)), Err(Error::InvalidConfig(_))));
        assert!(IndexParams::default().validate().is_ok());
    }

    #[test]
    fn test_query_before_fit() {
        let index = LshIndex::new(IndexParams::default()).unwrap();
        assert!(!index.is_fitted());
        assert!(matches!(index.find_similar("p0", 5), Err(Error::InvalidState(_))));
        assert!(matches!(index.stats(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_bucket_before_signatures() {
        let mut index = LshIndex::new(IndexParams::default()).unwrap();
        assert!(matches!(index.build_buckets(), Err(Error::InvalidState(_))));
        // the failed call leaves the index usable
        index.fit(&corpus(&["abc def"]), "title").unwrap();
        assert!(index.is_fitted());
    }

    #[test]
    fn test_fit_twice_rejected() {
        let docs = corpus(&["water filter", "water filters"]);
        let mut index = LshIndex::new(IndexParams::default()).unwrap();
        index.fit(&docs, "title").unwrap();
        assert!(matches!(index.fit(&docs, "title"), Err(Error::InvalidState(_))));
        assert!(matches!(index.build_buckets(), Err(Error::InvalidState(_))));
        assert!(index.is_fitted());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let docs = vec![
            Document::from_fields("a", [("title", "one")]),
            Document::from_fields("a", [("title", "two")]),
        ];
        let mut index = LshIndex::new(IndexParams::default()).unwrap();
        assert!(matches!(index.fit(&docs, "title"), Err(Error::DuplicateItem(_))));
    }

    #[test]
    fn test_identical_items_score_one() {
        let docs = corpus(&[
            "refrigerator water filter",
            "refrigerator water filter",
            "dryer belt",
        ]);
        let mut index = LshIndex::new(params(30, 15, 3)).unwrap();
        index.fit(&docs, "title").unwrap();

        let results = index.find_similar("p0", 10).unwrap();
        assert_eq!(results[0].id, "p1");
        assert_eq!(results[0].similarity, 1.0);
        assert!(results.iter().all(|r| r.id != "p0"));
        assert_eq!(index.estimate_similarity("p0", "p1").unwrap(), 1.0);
    }

    #[test]
    fn test_ties_break_by_index() {
        let docs = corpus(&["ice maker", "ice maker", "ice maker", "ice maker"]);
        let mut index = LshIndex::new(params(20, 20, 3)).unwrap();
        index.fit(&docs, "title").unwrap();

        let ids: Vec<_> = index
            .find_similar("p2", 10)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["p0", "p1", "p3"]);
    }

    #[test]
    fn test_top_n() {
        let docs = corpus(&["ice maker", "ice maker", "ice maker", "ice maker"]);
        let mut index = LshIndex::new(params(20, 20, 3)).unwrap();
        index.fit(&docs, "title").unwrap();
        assert_eq!(index.find_similar("p0", 2).unwrap().len(), 2);
        assert!(index.find_similar("p0", 0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let mut index = LshIndex::new(IndexParams::default()).unwrap();
        index.fit(&corpus(&["abc"]), "title").unwrap();
        assert!(matches!(index.find_similar("nope", 3), Err(Error::ItemNotFound(_))));
        assert!(matches!(index.candidates("nope"), Err(Error::ItemNotFound(_))));
        // unknown id wins over top_n = 0
        assert!(matches!(index.find_similar("nope", 0), Err(Error::ItemNotFound(_))));
    }

    #[test]
    fn test_empty_text_isolated() {
        let docs = corpus(&["", "", "gas range knob", "gas range knob"]);
        let mut index = LshIndex::new(params(20, 20, 3)).unwrap();
        index.fit(&docs, "title").unwrap();

        assert!(index.find_similar("p0", 10).unwrap().is_empty());
        assert!(index.candidates("p0").unwrap().is_empty());
        let ids: Vec<_> = index.find_similar("p2", 10).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["p3"]);
        assert_eq!(index.stats().unwrap().empty_items, 2);
        assert_eq!(index.estimate_similarity("p0", "p1").unwrap(), 0.0);
    }

    #[test]
    fn test_stats_and_accessors() {
        let docs = corpus(&["washer hose", "washer hoses"]);
        let index = build_index("title", &docs, "title", params(30, 15, 3)).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.field(), Some("title"));
        assert!(index.contains("p1"));
        assert!(!index.contains("p9"));
        assert_eq!(index.signature_matrix().unwrap().num_items(), 2);
        assert!(!index.shingles("p0").unwrap().is_empty());
        let stats = index.stats().unwrap();
        assert_eq!(stats.items, 2);
        assert!(stats.buckets > 0);
    }
}
