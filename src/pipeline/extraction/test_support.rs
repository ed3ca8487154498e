//! Shared fixtures for extraction tests.

use crate::pipeline::models::{ModelError, TaggedSpan, Tagger};

/// Tagger that returns a fixed list of spans regardless of input.
pub struct StubTagger {
    id: String,
    spans: Vec<TaggedSpan>,
}

impl StubTagger {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            spans: Vec::new(),
        }
    }

    pub fn span(mut self, start: usize, end: usize, label: &str, text: &str) -> Self {
        self.spans.push(TaggedSpan {
            start,
            end,
            label: label.to_string(),
            text: text.to_string(),
        });
        self
    }
}

impl Tagger for StubTagger {
    fn backend_id(&self) -> &str {
        &self.id
    }

    fn infer(&self, _text: &str) -> Result<Vec<TaggedSpan>, ModelError> {
        Ok(self.spans.clone())
    }
}

pub struct FailingTagger;

impl Tagger for FailingTagger {
    fn backend_id(&self) -> &str {
        "failing"
    }

    fn infer(&self, _text: &str) -> Result<Vec<TaggedSpan>, ModelError> {
        Err(ModelError::Inference("tensor shape mismatch".into()))
    }
}

pub struct PanickingTagger;

impl Tagger for PanickingTagger {
    fn backend_id(&self) -> &str {
        "panicking"
    }

    fn infer(&self, _text: &str) -> Result<Vec<TaggedSpan>, ModelError> {
        panic!("index out of range in token window")
    }
}

/// Build a single-page PDF with one text object per line.
/// Lines must be ASCII and free of parentheses.
pub fn make_report_pdf(lines: &[&str]) -> Vec<u8> {
    make_multi_page_pdf(&[lines])
}

pub fn make_multi_page_pdf(pages: &[&[&str]]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for lines in pages {
        let mut content = String::new();
        for (i, line) in lines.iter().enumerate() {
            let y = 750 - (i as i64) * 20;
            content.push_str(&format!("BT /F1 12 Tf 72 {y} Td ({line}) Tj ET\n"));
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// ASCII version of the standard evaluation report.
pub const STANDARD_REPORT_LINES: [&str; 5] = [
    "Nom : MARTIN JEAN",
    "Reference : 2025-TEST/01-A",
    "Objet : Test d'analyse",
    "Date : 15/06/2025",
    "Demandeur : Service test",
];
