//! RegoSlice - RAG retrieval core for Rego policy generation
//!
//! # Architecture
//!
//! ```text
//! Table (CSV) -> RowRecords -> Embedder -> FlatIndex + metadata store
//!                                                |
//! Query -> Embedder -> k-NN search <-------------+
//!                         |
//!                 records -> Rego render
//! ```
//!
//! # Example
//!
//! ```ignore
//! use regoslice_lib::{
//!     embed::MiniLmEmbedder,
//!     indexer::{ArtifactPaths, Indexer},
//!     retrieve::{Retriever, DEFAULT_K},
//! };
//!
//! let artifacts = ArtifactPaths::new("policies.index", "policies.json");
//!
//! // Index a policy table
//! let mut indexer = Indexer::new(MiniLmEmbedder::new()?);
//! indexer.build("slice_policies.csv", &artifacts)?;
//!
//! // Retrieve the closest rows and render them as Rego
//! let mut retriever = Retriever::open(&artifacts, MiniLmEmbedder::new()?)?;
//! let policy = retriever.generate("Nokia LNBTS param1", DEFAULT_K)?;
//! ```

pub mod embed;
pub mod error;
pub mod indexer;
pub mod render;
pub mod retrieve;
pub mod store;
pub mod table;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod testutil;
