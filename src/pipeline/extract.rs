//! Raw text extraction from input documents.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while pulling text out of a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// File could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Document being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// PDF parser rejected the document.
    #[error("Failed to extract PDF text from {path}: {reason}")]
    Pdf {
        /// Document being parsed.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },
    /// No extractor handles this file type.
    #[error("Unsupported document type: {0}")]
    Unsupported(PathBuf),
}

/// Turns a document on disk into plain text.
pub trait TextExtractor: Send + Sync {
    /// Whether `path` looks like a document this extractor understands.
    fn supports(&self, path: &Path) -> bool;

    /// Extract the document's text.
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Extracts PDFs through `pdf-extract` and reads `.txt` / `.md` files verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    PlainText,
}

fn document_kind(path: &Path) -> Option<DocumentKind> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some(DocumentKind::Pdf),
        "txt" | "md" => Some(DocumentKind::PlainText),
        _ => None,
    }
}

impl TextExtractor for DocumentExtractor {
    fn supports(&self, path: &Path) -> bool {
        document_kind(path).is_some()
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        match document_kind(path) {
            Some(DocumentKind::Pdf) => {
                pdf_extract::extract_text(path).map_err(|error| ExtractionError::Pdf {
                    path: path.to_path_buf(),
                    reason: error.to_string(),
                })
            }
            Some(DocumentKind::PlainText) => {
                std::fs::read_to_string(path).map_err(|source| ExtractionError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => Err(ExtractionError::Unsupported(path.to_path_buf())),
        }
    }
}
