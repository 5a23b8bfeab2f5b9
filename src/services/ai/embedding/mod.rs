//! Embedding and vector storage
//!
//! Split into submodules:
//! - `model`: the `Embedder` trait and the fastembed-backed implementation
//! - `store`: LanceDB storage and similarity search

mod model;
mod store;

pub use model::{Embedder, FastEmbedder};
pub use store::{compute_embedding_hash, SearchResult, VectorStore};

// LanceDB column names
pub(crate) const COLUMN_DISTANCE: &str = "_distance";

pub(crate) const COLUMN_VECTOR_ID: &str = "vector_id";
pub(crate) const COLUMN_CHUNK_ID: &str = "chunk_id";
pub(crate) const COLUMN_SOURCE: &str = "source";
pub(crate) const COLUMN_PAGE_NUMBER: &str = "page_number";
pub(crate) const COLUMN_CHUNK_INDEX: &str = "chunk_index";
pub(crate) const COLUMN_CHUNK_TEXT: &str = "chunk_text";
pub(crate) const COLUMN_EMBEDDING_HASH: &str = "embedding_hash";
pub(crate) const COLUMN_EMBEDDING_MODEL: &str = "embedding_model";
pub(crate) const COLUMN_VECTOR: &str = "vector";
