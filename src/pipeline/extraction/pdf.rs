use std::path::Path;
use std::sync::Arc;

use lopdf::Document;

use super::types::{PageText, PdfExtractor, RawText};
use super::ExtractionError;

/// PDF text extractor using lopdf.
/// Reads the embedded text layer page by page; scanned pages come back empty.
pub struct LopdfTextExtractor;

impl PdfExtractor for LopdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::read("<memory>", e))?;

        let pages = doc
            .get_pages()
            .into_keys()
            .map(|page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => PageText {
                    page_number,
                    text,
                    readable: true,
                },
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Page text unreadable, treating as empty");
                    PageText {
                        page_number,
                        text: String::new(),
                        readable: false,
                    }
                }
            })
            .collect();

        Ok(pages)
    }
}

/// Reads a document's full text layer.
#[derive(Clone)]
pub struct TextAcquirer {
    extractor: Arc<dyn PdfExtractor>,
}

impl Default for TextAcquirer {
    fn default() -> Self {
        Self::new(Arc::new(LopdfTextExtractor))
    }
}

impl TextAcquirer {
    pub fn new(extractor: Arc<dyn PdfExtractor>) -> Self {
        Self { extractor }
    }

    /// Read a PDF from disk. Pages are joined in order with `\n`.
    pub fn read(&self, path: &Path) -> Result<RawText, ExtractionError> {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| ExtractionError::read(&display, e))?;
        self.read_bytes(&bytes).map_err(|e| match e {
            ExtractionError::DocumentRead { reason, .. } => {
                ExtractionError::DocumentRead { path: display, reason }
            }
            other => other,
        })
    }

    pub fn read_bytes(&self, pdf_bytes: &[u8]) -> Result<RawText, ExtractionError> {
        let pages = self.extractor.extract_pages(pdf_bytes)?;
        let unreadable = pages.iter().filter(|p| !p.readable).count();
        let text = pages
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n");
        let raw = RawText::from(text);
        tracing::debug!(chars = raw.char_len(), unreadable, "Document text acquired");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::test_support::{
        make_multi_page_pdf, make_report_pdf, STANDARD_REPORT_LINES,
    };

    #[test]
    fn extract_text_from_digital_pdf() {
        let pdf_bytes = make_report_pdf(&STANDARD_REPORT_LINES);
        let pages = LopdfTextExtractor.extract_pages(&pdf_bytes).unwrap();

        assert_eq!(pages.len(), 1);
        assert!(pages[0].readable);
        assert!(
            pages[0].text.contains("MARTIN JEAN"),
            "Expected name in text, got: {}",
            pages[0].text
        );
    }

    #[test]
    fn lines_stay_separated() {
        let pdf_bytes = make_report_pdf(&STANDARD_REPORT_LINES);
        let text = TextAcquirer::default().read_bytes(&pdf_bytes).unwrap();
        let line = text
            .as_str()
            .lines()
            .find(|l| l.contains("MARTIN"))
            .unwrap();
        assert!(!line.contains("Reference"));
    }

    #[test]
    fn pages_joined_in_order() {
        let pdf_bytes = make_multi_page_pdf(&[&["Premiere page"], &["Seconde page"]]);
        let text = TextAcquirer::default().read_bytes(&pdf_bytes).unwrap();
        let first = text.as_str().find("Premiere").unwrap();
        let second = text.as_str().find("Seconde").unwrap();
        assert!(first < second);
    }

    #[test]
    fn corrupt_bytes_fail_with_document_read() {
        let result = TextAcquirer::default().read_bytes(b"This is not a PDF file");
        assert!(matches!(result, Err(ExtractionError::DocumentRead { .. })));
    }

    #[test]
    fn empty_bytes_fail_with_document_read() {
        let result = TextAcquirer::default().read_bytes(&[]);
        assert!(matches!(result, Err(ExtractionError::DocumentRead { .. })));
    }

    #[test]
    fn missing_file_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.pdf");
        match TextAcquirer::default().read(&path) {
            Err(ExtractionError::DocumentRead { path: p, .. }) => {
                assert!(p.ends_with("absent.pdf"));
            }
            other => panic!("expected DocumentRead, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_file_on_disk_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\ngarbage").unwrap();
        match TextAcquirer::default().read(&path) {
            Err(ExtractionError::DocumentRead { path: p, .. }) => {
                assert!(p.ends_with("broken.pdf"));
            }
            other => panic!("expected DocumentRead, got {other:?}"),
        }
    }

    struct PartlyUnreadable;

    impl PdfExtractor for PartlyUnreadable {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
            Ok(vec![
                PageText { page_number: 1, text: "Nom : MARTIN".into(), readable: true },
                PageText { page_number: 2, text: String::new(), readable: false },
                PageText { page_number: 3, text: "Date : 01/02/2025".into(), readable: true },
            ])
        }
    }

    #[test]
    fn unreadable_page_contributes_empty_text() {
        let acquirer = TextAcquirer::new(Arc::new(PartlyUnreadable));
        let text = acquirer.read_bytes(b"%PDF").unwrap();
        assert_eq!(text.as_str(), "Nom : MARTIN\n\nDate : 01/02/2025");
    }
}
