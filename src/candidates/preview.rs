// src/candidates/preview.rs
//! Inline preview of submitted identity documents.

use bytes::Bytes;
use infer::Infer;

use super::files::{content_type_for_extension, extension_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// Rendered inline as an image.
    Image,
    /// Rendered in an embedded PDF viewer.
    Pdf,
    /// No inline rendering; offer a download instead.
    Download,
}

/// Chooses how a document is shown from its filename alone.
pub fn preview_kind(filename: &str) -> PreviewKind {
    match extension_of(filename).as_deref() {
        Some("jpg") | Some("jpeg") | Some("png") | Some("gif") => PreviewKind::Image,
        Some("pdf") => PreviewKind::Pdf,
        _ => PreviewKind::Download,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPreview {
    pub filename: String,
    pub kind: PreviewKind,
    pub content_type: String,
    pub bytes: Bytes,
}

impl DocumentPreview {
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        let filename = filename.into();
        let content_type = sniff_content_type(&bytes)
            .unwrap_or_else(|| content_type_for_extension(&filename).to_string());
        Self {
            kind: preview_kind(&filename),
            filename,
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn sniff_content_type(data: &[u8]) -> Option<String> {
    Infer::new()
        .get(data)
        .map(|info| info.mime_type().to_string())
}
