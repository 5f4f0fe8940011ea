use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// MiniLM embedder using sentence-transformers/all-MiniLM-L6-v2.
///
/// Uses fastembed for ONNX-based inference. This model produces
/// 384-dimensional embeddings and is small enough to run on CPU alongside
/// the index build.
pub struct MiniLmEmbedder {
    model: TextEmbedding,
}

impl MiniLmEmbedder {
    /// Create a new MiniLM embedder.
    ///
    /// Downloads the model on first use (~90MB).
    pub fn new() -> Result<Self> {
        let opts = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(true);

        TextEmbedding::try_new(opts)
            .map(|model| Self { model })
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

impl Embedder for MiniLmEmbedder {
    fn model_name(&self) -> &str {
        "sentence-transformers/all-MiniLM-L6-v2"
    }

    fn dimension(&self) -> usize {
        384
    }

    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        // MiniLM is symmetric: queries use the same encoding as documents
        self.model
            .embed(vec![text], None)
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires model download, run with: cargo test -- --ignored
    fn test_dimension_matches_model_output() {
        let mut embedder = MiniLmEmbedder::new().unwrap();

        let embedding = embedder.embed_query("Nokia LNBTS param1").unwrap();
        assert_eq!(embedding.len(), embedder.dimension());
    }

    #[test]
    #[ignore] // Requires model download
    fn test_same_text_embeds_identically() {
        let mut embedder = MiniLmEmbedder::new().unwrap();

        let a = embedder.embed_query("slice policy for Nokia").unwrap();
        let b = embedder.embed_query("slice policy for Nokia").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    #[ignore] // Requires model download
    fn test_document_order_is_preserved() {
        let mut embedder = MiniLmEmbedder::new().unwrap();

        let batch = embedder
            .embed_documents(&["first row text", "second row text"])
            .unwrap();
        let first = embedder.embed_documents(&["first row text"]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], first[0]);
    }
}
