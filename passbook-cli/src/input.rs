use anyhow::{Context, Result};
use passbook_ingest::Document;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Json,
    Pdf,
    Text,
}

fn input_kind(path: &Path) -> InputKind {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => InputKind::Json,
        Some("pdf") => InputKind::Pdf,
        _ => InputKind::Text,
    }
}

/// Load a statement as a JSON page dump, a PDF text layer, or form-feed separated text.
pub fn read_document(path: &Path) -> Result<Document> {
    let kind = input_kind(path);
    log::debug!("reading {} as {:?}", path.display(), kind);

    match kind {
        InputKind::Json => {
            let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
            Document::from_json_reader(std::io::BufReader::new(file))
                .with_context(|| format!("decode page dump {}", path.display()))
        }
        InputKind::Pdf => {
            let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
            let text = pdf_extract::extract_text_from_mem(&bytes)
                .with_context(|| format!("extract text from {}", path.display()))?;
            Ok(Document::from_text(&text))
        }
        InputKind::Text => {
            let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            Ok(Document::from_text(&text))
        }
    }
}
