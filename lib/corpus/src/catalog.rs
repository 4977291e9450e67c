use crate::normalize::{flatten_value, normalize_text, NormalizeConfig};
use ahash::AHashMap;
use lshfind_core::{Document, Error, MethodSpec, Result};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

pub const TITLE_FIELD: &str = "title";
pub const DESCRIPTION_FIELD: &str = "description";
pub const HYBRID_FIELD: &str = "hybrid";

/// How raw product records become indexable documents.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Record key holding the product id.
    pub id_field: String,
    /// Times the title is repeated ahead of the description in `hybrid`.
    pub title_weight: usize,
    pub normalize: NormalizeConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            id_field: "asin".to_string(),
            title_weight: 5,
            normalize: NormalizeConfig::default(),
        }
    }
}

/// Short method names used by existing clients, mapped to the methods they
/// stand for.
pub const METHOD_ALIASES: [(&str, &str); 3] = [
    ("pst", TITLE_FIELD),
    ("psd", DESCRIPTION_FIELD),
    ("pstd", HYBRID_FIELD),
];

/// The three methods served out of a catalog.
pub fn default_methods() -> Vec<MethodSpec> {
    [TITLE_FIELD, DESCRIPTION_FIELD, HYBRID_FIELD]
        .into_iter()
        .map(|f| MethodSpec::new(f, f))
        .collect()
}

/// Canonical method name for `name`, accepting the short aliases in any
/// case. Names that are not aliases come back unchanged.
pub fn resolve_method(name: &str) -> &str {
    METHOD_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map_or(name, |&(_, method)| method)
}

/// Product records plus their normalized documents, in file order.
pub struct Catalog {
    documents: Vec<Document>,
    records: Vec<Value>,
    positions: AHashMap<String, usize>,
}

impl Catalog {
    pub fn load<P: AsRef<Path>>(path: P, config: &CatalogConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading catalog from {:?}", path);
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), config)
    }

    /// Parse a JSON array of records or one JSON record per line.
    pub fn from_reader<R: BufRead>(mut reader: R, config: &CatalogConfig) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let records = if content.trim_start().starts_with('[') {
            serde_json::from_str::<Vec<Value>>(&content)
                .map_err(|e| Error::Corpus(format!("invalid JSON array: {e}")))?
        } else {
            let mut records = Vec::new();
            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let value = serde_json::from_str::<Value>(line)
                    .map_err(|e| Error::Corpus(format!("line {}: {e}", line_no + 1)))?;
                records.push(value);
            }
            records
        };

        Ok(Self::from_records(records, config))
    }

    /// Build a catalog from already-parsed records. Records without a string
    /// id are skipped; repeated ids keep their first record.
    pub fn from_records(records: Vec<Value>, config: &CatalogConfig) -> Self {
        let total = records.len();
        let mut positions = AHashMap::with_capacity(total);
        let mut kept: Vec<(String, Value)> = Vec::with_capacity(total);
        let mut missing_id = 0usize;

        for record in records {
            let id = match record.get(&config.id_field).and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => {
                    missing_id += 1;
                    continue;
                }
            };
            if !positions.contains_key(&id) {
                positions.insert(id.clone(), kept.len());
                kept.push((id, record));
            }
        }

        if missing_id > 0 {
            warn!(missing_id, id_field = %config.id_field, "skipped records without an id");
        }
        let duplicates = total - missing_id - kept.len();
        if duplicates > 0 {
            debug!(duplicates, "dropped duplicate records");
        }

        let documents: Vec<Document> = kept
            .par_iter()
            .map(|(id, record)| build_document(id, record, config))
            .collect();
        info!(products = documents.len(), "catalog loaded");

        Self {
            documents,
            records: kept.into_iter().map(|(_, record)| record).collect(),
            positions,
        }
    }

    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The raw record for a product id.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.positions.get(id).map(|&idx| &self.records[idx])
    }

    /// Raw records in file order, parallel to `documents()`.
    #[inline]
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// One page of raw records. Pages count from 1; page 0 is read as 1 and
    /// a page past the end is empty.
    pub fn page(&self, page: usize, per_page: usize) -> &[Value] {
        let start = page.saturating_sub(1).saturating_mul(per_page);
        if start >= self.records.len() {
            return &[];
        }
        let end = start.saturating_add(per_page).min(self.records.len());
        &self.records[start..end]
    }
}

fn build_document(id: &str, record: &Value, config: &CatalogConfig) -> Document {
    let raw_title = record.get(TITLE_FIELD).and_then(flatten_value);
    // An empty description falls back to the title.
    let raw_description = record
        .get(DESCRIPTION_FIELD)
        .and_then(flatten_value)
        .or_else(|| raw_title.clone());

    let title = raw_title
        .map(|t| normalize_text(&t, &config.normalize))
        .unwrap_or_default();
    let description = raw_description
        .map(|d| normalize_text(&d, &config.normalize))
        .unwrap_or_default();

    let mut hybrid = format!("{title} ").repeat(config.title_weight);
    hybrid.push_str(&description);
    // A product with no text at all must stay shingle-free.
    let hybrid = hybrid.trim().to_string();

    let mut fields = Map::new();
    fields.insert(TITLE_FIELD.to_string(), Value::String(title));
    fields.insert(DESCRIPTION_FIELD.to_string(), Value::String(description));
    fields.insert(HYBRID_FIELD.to_string(), Value::String(hybrid));
    Document::new(id, Value::Object(fields))
}
