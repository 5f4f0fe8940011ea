//! Text embedding using local models
//!
//! Uses sentence-transformers/all-MiniLM-L6-v2 via the fastembed crate
//! (ONNX runtime).
//!
//! # Model Details
//!
//! - Dimensions: 384
//! - Max tokens: 256
//!
//! # Usage
//!
//! ```ignore
//! use regoslice_lib::embed::{Embedder, MiniLmEmbedder};
//!
//! let mut embedder = MiniLmEmbedder::new()?;
//!
//! // Embed row texts (for indexing)
//! let row_embeddings = embedder.embed_documents(&["Nokia LNBTS param1 EQUALS 5"])?;
//!
//! // Embed a query (for searching)
//! let query_embedding = embedder.embed_query("Nokia LNBTS param1")?;
//! ```

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models.
///
/// The index build and the query path must use the same implementation:
/// the stored vectors are only comparable to queries embedded by the same
/// model with the same dimension.
pub trait Embedder: Send + Sync {
    /// Embed multiple row texts for indexing
    ///
    /// Texts may be batched for efficiency; output order matches input
    /// order.
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

mod minilm;
pub use minilm::*;
