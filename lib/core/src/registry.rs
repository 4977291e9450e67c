use crate::{build_index, Document, Error, IndexParams, LshIndex, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// A query method: a public name bound to the document field it indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub field: String,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }
}

/// Fitted indexes keyed by method name.
///
/// Filled at startup and then shared read-only (typically behind an `Arc`);
/// queries take `&self` and never lock.
#[derive(Default)]
pub struct IndexRegistry {
    indexes: BTreeMap<String, LshIndex>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit one index per method. Methods are independent and built in
    /// parallel; the first error aborts the whole registry.
    pub fn build_all(
        docs: &[Document],
        methods: &[MethodSpec],
        params: &IndexParams,
    ) -> Result<Self> {
        params.validate()?;
        info!(methods = methods.len(), items = docs.len(), "building index registry");

        let built: Vec<(String, LshIndex)> = methods
            .par_iter()
            .map(|m| {
                build_index(&m.name, docs, &m.field, *params).map(|idx| (m.name.clone(), idx))
            })
            .collect::<Result<_>>()?;

        let mut registry = Self::new();
        for (name, index) in built {
            registry.register(name, index)?;
        }
        Ok(registry)
    }

    /// Add a fitted index under `name`.
    pub fn register(&mut self, name: impl Into<String>, index: LshIndex) -> Result<()> {
        let name = name.into();
        if !index.is_fitted() {
            return Err(Error::InvalidState(format!(
                "index for method '{name}' has not been fitted"
            )));
        }
        if self.indexes.contains_key(&name) {
            return Err(Error::MethodExists(name));
        }
        self.indexes.insert(name, index);
        Ok(())
    }

    pub fn get(&self, method: &str) -> Result<&LshIndex> {
        self.indexes
            .get(method)
            .ok_or_else(|| Error::InvalidMethod(method.to_string()))
    }

    #[inline]
    pub fn contains(&self, method: &str) -> bool {
        self.indexes.contains_key(method)
    }

    /// Method names in sorted order.
    pub fn methods(&self) -> Vec<&str> {
        self.indexes.keys().map(String::as_str).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Ids of up to `top_n` items similar to `item_id` under `method`.
    pub fn query(&self, method: &str, item_id: &str, top_n: usize) -> Result<Vec<String>> {
        Ok(self
            .get(method)?
            .find_similar(item_id, top_n)?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }
}
