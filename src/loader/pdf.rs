//! PDF loader producing one document per page.

use super::DocumentLoader;
use crate::document::{Document, KIND, PAGE, SOURCE};
use crate::error::Result;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Loader for PDF files.
///
/// Every page becomes its own document tagged with the path it was read
/// from and its 0-based page index. Errors opening the file (missing file,
/// malformed PDF) are returned as-is. A page whose text cannot be decoded
/// (for example a font without a usable encoding) is kept with empty
/// content, which the chunker then drops.
pub struct PdfLoader;

impl PdfLoader {
    /// Create a new PDF loader.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for PdfLoader {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let pdf = lopdf::Document::load(path)?;
        let source = path.display().to_string();

        // get_pages is keyed by 1-based page number, in page order
        let pages = pdf.get_pages();
        let mut documents = Vec::with_capacity(pages.len());

        for (index, page_number) in pages.keys().enumerate() {
            let content = match pdf.extract_text(&[*page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!("No text extracted from {} page {}: {}", source, index, e);
                    String::new()
                }
            };
            documents.push(
                Document::new(content)
                    .with_metadata(KIND, "pdf")
                    .with_metadata(SOURCE, source.as_str())
                    .with_metadata(PAGE, index),
            );
        }

        debug!("Loaded {} pages", documents.len());
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamleError;
    use crate::loader::load_all;
    use crate::testing::{identity_h_font, write_pdf, write_pdf_with};

    #[test]
    fn test_single_page_pdfs_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_pdf(dir.path(), "c.pdf", &["Third"]),
            write_pdf(dir.path(), "a.pdf", &["First"]),
            write_pdf(dir.path(), "b.pdf", &["Second"]),
        ];

        let docs = load_all(&PdfLoader::new(), &paths).unwrap();

        assert_eq!(docs.len(), 3);
        for (doc, path) in docs.iter().zip(&paths) {
            assert_eq!(
                doc.meta(SOURCE).and_then(|v| v.as_str()),
                Some(path.display().to_string().as_str())
            );
            assert_eq!(doc.meta(PAGE).and_then(|v| v.as_int()), Some(0));
            assert_eq!(doc.meta(KIND).and_then(|v| v.as_str()), Some("pdf"));
        }
        assert!(docs[0].content.contains("Third"));
    }

    #[test]
    fn test_multi_page_pdf_yields_page_per_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), "book.pdf", &["one", "two", "three"]);

        let docs = PdfLoader::new().load(&path).unwrap();

        let pages: Vec<i64> = docs
            .iter()
            .filter_map(|d| d.meta(PAGE).and_then(|v| v.as_int()))
            .collect();
        assert_eq!(pages, vec![0, 1, 2]);
    }

    #[test]
    fn test_undecodable_font_does_not_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let cjk = write_pdf_with(dir.path(), "cjk.pdf", &["\x00\x21\x00\x22"], identity_h_font);
        let plain = write_pdf(dir.path(), "plain.pdf", &["Readable"]);

        let docs = load_all(&PdfLoader::new(), &[cjk.clone(), plain.clone()]).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(
            docs[0].meta(SOURCE).and_then(|v| v.as_str()),
            Some(cjk.display().to_string().as_str())
        );
        assert_eq!(docs[0].meta(PAGE).and_then(|v| v.as_int()), Some(0));
        assert!(docs[1].content.contains("Readable"));
    }

    #[test]
    fn test_missing_file_propagates_parser_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");

        let err = PdfLoader::new().load(&missing).unwrap_err();
        assert!(matches!(err, SamleError::Pdf(_)));
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        assert!(PdfLoader::new().load(&path).is_err());
    }
}
