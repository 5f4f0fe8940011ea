//! Query-time retrieval
//!
//! [`Retriever`] is the context object front-ends hold: it owns the loaded
//! index, metadata store, embedding model, and render configuration.
//! Construct it once and pass it wherever queries are served; nothing here
//! touches global state, so parallel instances are independent.
//!
//! # Usage
//!
//! ```ignore
//! use regoslice_lib::retrieve::{Retriever, DEFAULT_K};
//!
//! let mut retriever = Retriever::open(&artifacts, embedder)?;
//! let policy = retriever.generate("Nokia LNBTS param1", DEFAULT_K)?;
//! ```

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::embed::Embedder;
use crate::indexer::ArtifactPaths;
use crate::render::{self, RenderConfig};
use crate::store::FlatIndex;
use crate::table::RowRecord;
use crate::{Error, Result};

/// Default number of neighbors retrieved per query.
pub const DEFAULT_K: usize = 2;

/// A retrieved row with its distance from the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retrieved {
    /// The matched row record
    pub record: RowRecord,
    /// Euclidean (L2) distance from the query, lower is closer
    pub distance: f32,
}

/// Loads the artifact pair once and answers queries against it.
#[derive(Debug)]
pub struct Retriever<E: Embedder> {
    embedder: E,
    index: FlatIndex,
    records: Vec<RowRecord>,
    config: RenderConfig,
}

impl<E: Embedder> Retriever<E> {
    /// Open the artifact pair, binding every stored column to the
    /// snake_case form of its name.
    pub fn open(artifacts: &ArtifactPaths, embedder: E) -> Result<Self> {
        let (index, records) = load_pair(artifacts, &embedder)?;
        let config = RenderConfig::from_columns(records[0].columns())?;
        config.validate_against(&records)?;

        Ok(Self {
            embedder,
            index,
            records,
            config,
        })
    }

    /// Open the artifact pair with an explicit render configuration.
    pub fn open_with_config(
        artifacts: &ArtifactPaths,
        embedder: E,
        config: RenderConfig,
    ) -> Result<Self> {
        let (index, records) = load_pair(artifacts, &embedder)?;
        config.validate_against(&records)?;

        Ok(Self {
            embedder,
            index,
            records,
            config,
        })
    }

    /// Retrieve the `k` records nearest to `query`, closest first.
    ///
    /// `k` is capped at the number of indexed records rather than failing;
    /// `k = 0` yields an empty result. Ties in distance resolve to the
    /// lower index position, so results are deterministic.
    pub fn retrieve(&mut self, query: &str, k: usize) -> Result<Vec<Retrieved>> {
        if query.trim().is_empty() {
            return Err(Error::Retrieval("query must not be empty".to_string()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let k = k.min(self.index.len());

        let query_embedding = self.embedder.embed_query(query)?;
        let neighbors = self.index.search(&query_embedding, k)?;
        debug!(query, k, hits = neighbors.len(), "retrieved neighbors");

        Ok(neighbors
            .into_iter()
            .map(|n| Retrieved {
                record: self.records[n.position].clone(),
                distance: n.distance,
            })
            .collect())
    }

    /// Retrieve and render: the single call surrounding front-ends make.
    pub fn generate(&mut self, query: &str, k: usize) -> Result<String> {
        let retrieved = self.retrieve(query, k)?;
        let records: Vec<&RowRecord> = retrieved.iter().map(|r| &r.record).collect();
        render::render_policy(&records, &self.config)
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the loaded corpus is empty (never true for artifacts the
    /// indexer produced).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The render configuration in use.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

/// Load both artifacts and check the invariants that tie them together:
/// equal counts, matching dimension, at least one record.
fn load_pair<E: Embedder>(
    artifacts: &ArtifactPaths,
    embedder: &E,
) -> Result<(FlatIndex, Vec<RowRecord>)> {
    let index = FlatIndex::load(&artifacts.index)?;
    let records = load_metadata(&artifacts.metadata)?;

    if index.len() != records.len() {
        return Err(Error::IndexCorrupt(format!(
            "index holds {} vectors but metadata holds {} records",
            index.len(),
            records.len()
        )));
    }
    if records.is_empty() {
        return Err(Error::IndexCorrupt(
            "artifact pair contains no records".to_string(),
        ));
    }
    if embedder.dimension() != index.dimension() {
        return Err(Error::DimensionMismatch {
            expected: index.dimension(),
            actual: embedder.dimension(),
        });
    }

    debug!(
        records = records.len(),
        dimension = index.dimension(),
        model = embedder.model_name(),
        "artifact pair loaded"
    );

    Ok((index, records))
}

fn load_metadata(path: &Path) -> Result<Vec<RowRecord>> {
    if !path.exists() {
        return Err(Error::IndexNotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::IndexCorrupt(format!("cannot decode metadata: {e}")))
}
