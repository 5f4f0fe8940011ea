//! Shared test fixtures: deterministic embedders and a small policy table.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// Two-row slice-policy table used across the test modules.
pub const SLICE_TABLE: &str = "\
Vendor,MOType,Attribute,Operation,Value
Nokia,LNBTS,param1,EQUALS,5
Ericsson,ENodeB,param2,NOT_EQUALS,10
";

/// Deterministic bag-of-words embedder: each whitespace token adds weight
/// to one hashed bucket, so texts sharing tokens land close under L2.
#[derive(Debug)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimension;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for HashEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        Ok(self.encode(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "test/hash-embedder"
    }
}

/// Embedder that always fails; proves nothing gets persisted on error.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed_documents(&mut self, _texts: &[&str]) -> Result<Vec<Embedding>> {
        Err(Error::Embedding("model unavailable".to_string()))
    }

    fn embed_query(&mut self, _text: &str) -> Result<Embedding> {
        Err(Error::Embedding("model unavailable".to_string()))
    }

    fn dimension(&self) -> usize {
        32
    }

    fn model_name(&self) -> &str {
        "test/failing-embedder"
    }
}
