//! Batch index construction
//!
//! Reads a policy table, embeds every row in table order, and persists the
//! vector index and metadata store as an aligned pair. There is no
//! incremental path: any change to the source table is a full rebuild.
//!
//! # Usage
//!
//! ```ignore
//! use regoslice_lib::indexer::{ArtifactPaths, Indexer};
//!
//! let artifacts = ArtifactPaths::new("policies.index", "policies.json");
//! let summary = Indexer::new(embedder).build("slice_policies.csv", &artifacts)?;
//! println!("indexed {} rows", summary.rows);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::embed::Embedder;
use crate::store::FlatIndex;
use crate::table::{self, RowRecord};
use crate::{Error, Result};

/// Paths of the two co-located artifacts produced by a build.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Binary vector index
    pub index: PathBuf,
    /// JSON metadata store
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Pair an index path with its metadata path.
    #[must_use]
    pub fn new(index: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            metadata: metadata.into(),
        }
    }
}

/// Row and dimension counts reported after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Rows indexed (= vectors = metadata records)
    pub rows: usize,
    /// Embedding dimension of the index
    pub dimension: usize,
}

/// One-shot batch indexer.
pub struct Indexer<E: Embedder> {
    embedder: E,
}

impl<E: Embedder> Indexer<E> {
    /// Create an indexer around an embedding model.
    #[must_use]
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    /// Build the index and metadata pair from a CSV table and write both
    /// artifacts.
    ///
    /// Persistence is all-or-nothing: both artifacts are staged as temp
    /// files next to their targets and renamed into place only after both
    /// writes succeed, so a failed build never leaves the pair out of step
    /// and never clobbers an existing pair.
    pub fn build(
        &mut self,
        table_path: impl AsRef<Path>,
        artifacts: &ArtifactPaths,
    ) -> Result<BuildSummary> {
        let records = table::read_table(&table_path)?;
        info!(
            rows = records.len(),
            table = %table_path.as_ref().display(),
            "read table"
        );

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;
        if embeddings.len() != records.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} rows",
                embeddings.len(),
                records.len()
            )));
        }

        let mut index = FlatIndex::new(self.embedder.dimension());
        for embedding in embeddings {
            index.add(embedding)?;
        }

        persist_pair(&index, &records, artifacts)?;
        info!(
            vectors = index.len(),
            index = %artifacts.index.display(),
            metadata = %artifacts.metadata.display(),
            "artifacts written"
        );

        Ok(BuildSummary {
            rows: index.len(),
            dimension: index.dimension(),
        })
    }
}

fn persist_pair(index: &FlatIndex, records: &[RowRecord], artifacts: &ArtifactPaths) -> Result<()> {
    let index_tmp = staging_path(&artifacts.index);
    let metadata_tmp = staging_path(&artifacts.metadata);

    let result = write_pair(index, records, &index_tmp, &metadata_tmp).and_then(|()| {
        fs::rename(&index_tmp, &artifacts.index)?;
        fs::rename(&metadata_tmp, &artifacts.metadata)?;
        Ok(())
    });

    if result.is_err() {
        let _ = fs::remove_file(&index_tmp);
        let _ = fs::remove_file(&metadata_tmp);
    }

    result
}

fn write_pair(
    index: &FlatIndex,
    records: &[RowRecord],
    index_tmp: &Path,
    metadata_tmp: &Path,
) -> Result<()> {
    index.save(index_tmp)?;

    let json = serde_json::to_string_pretty(records)
        .map_err(|e| Error::Persist(format!("cannot encode metadata: {e}")))?;
    fs::write(metadata_tmp, json)?;

    Ok(())
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    target.with_file_name(name)
}
