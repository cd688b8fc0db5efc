//! Document loaders.
//!
//! Turns files on disk into page-level [`Document`]s.

mod pdf;

pub use pdf::PdfLoader;

use crate::document::Document;
use crate::error::Result;
use std::path::Path;

/// Trait for file-based document loaders.
pub trait DocumentLoader: Send + Sync {
    /// Load a file into one or more documents.
    fn load(&self, path: &Path) -> Result<Vec<Document>>;
}

/// Load every path with `loader`, preserving path order and the order of
/// documents within each file. The first failure aborts the whole load.
pub fn load_all<P: AsRef<Path>>(loader: &dyn DocumentLoader, paths: &[P]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for path in paths {
        documents.extend(loader.load(path.as_ref())?);
    }
    Ok(documents)
}
