//! Splitting documents into overlapping chunks for embedding.
//!
//! Chunks are at most [`CHUNK_SIZE`] characters long and consecutive chunks
//! of the same document share up to [`CHUNK_OVERLAP`] characters.

mod recursive;

pub use recursive::RecursiveSplitter;

use crate::document::Document;

/// Maximum chunk length in characters.
pub const CHUNK_SIZE: usize = 1000;

/// Characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 200;

/// Split documents with the fixed chunk size and overlap.
pub fn chunk_documents(documents: &[Document]) -> Vec<Document> {
    RecursiveSplitter::default().split_documents(documents)
}
