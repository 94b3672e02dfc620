// src/candidates/files.rs
//! Files handed to the gateway. Resumes and identity documents can only
//! reach the gateway as their validated wrappers.

use bytes::Bytes;
use std::path::Path;

use super::validators::{IdentityDocumentValidator, ResumeFileValidator};
use crate::common::{ConsoleError, Validator};

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reads a file from disk, keeping only its final path component as the
    /// upload filename.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension after the last dot, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.filename)
    }

    /// Declared content type, else one derived from the extension.
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| content_type_for_extension(&self.filename).to_string())
    }
}

pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, extension) = filename.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

pub fn content_type_for_extension(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => DOCX_MIME,
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// A resume that passed pre-transmission checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeFile(UploadFile);

impl ResumeFile {
    pub fn validate(file: UploadFile) -> Result<Self, ConsoleError> {
        ResumeFileValidator.validate(&file).into_result()?;
        Ok(Self(file))
    }

    pub fn file(&self) -> &UploadFile {
        &self.0
    }
}

/// A PAN or Aadhaar scan that passed pre-transmission checks.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityDocumentFile(UploadFile);

impl IdentityDocumentFile {
    pub fn validate(file: UploadFile) -> Result<Self, ConsoleError> {
        IdentityDocumentValidator.validate(&file).into_result()?;
        Ok(Self(file))
    }

    pub fn file(&self) -> &UploadFile {
        &self.0
    }
}
