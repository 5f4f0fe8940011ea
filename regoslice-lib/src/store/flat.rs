use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::store::Neighbor;
use crate::{Error, Result};

/// Exact nearest-neighbor index over row embeddings.
///
/// Brute-force L2 scan in insert order. Policy tables are spreadsheet-sized
/// (hundreds to low thousands of rows), so a flat scan beats maintaining an
/// approximate structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Embedding>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Append a vector. Its position equals the number of prior inserts.
    pub fn add(&mut self, vector: Embedding) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// Search for the `k` vectors nearest to `query` by L2 distance.
    ///
    /// Results are sorted ascending by distance; ties resolve to the lowest
    /// position, so repeated searches return the same order. At most
    /// `min(k, len)` neighbors are returned.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: l2_distance(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// Number of indexed vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the index holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Embedding dimension this index was built for.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Write the index to a binary artifact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        bincode::serialize_into(BufWriter::new(file), self)
            .map_err(|e| Error::Persist(format!("cannot encode index: {e}")))
    }

    /// Load an index artifact written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::IndexNotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let index: FlatIndex = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| Error::IndexCorrupt(format!("cannot decode index: {e}")))?;

        if let Some(vector) = index.vectors.iter().find(|v| v.len() != index.dimension) {
            return Err(Error::IndexCorrupt(format!(
                "stored vector has dimension {}, index header says {}",
                vector.len(),
                index.dimension
            )));
        }

        Ok(index)
    }
}

/// Compute the Euclidean (L2) distance between two vectors.
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
