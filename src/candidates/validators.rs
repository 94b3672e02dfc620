// src/candidates/validators.rs

use std::collections::HashSet;

use super::files::{UploadFile, DOCX_MIME};
use super::models::ListQuery;
use crate::common::config::MAX_PAGE_SIZE;
use crate::common::{ValidationResult, Validator};

/// Upload limit shared by resumes and identity documents: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const RESUME_EXTENSIONS: [&str; 2] = ["pdf", "docx"];
pub const RESUME_MIME_TYPES: [&str; 2] = ["application/pdf", DOCX_MIME];
pub const DOCUMENT_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

// ============================================================================
// File Validators
// ============================================================================

fn validate_common(file: &UploadFile, result: &mut ValidationResult) {
    if file.filename.trim().is_empty() {
        result.add_error("filename", "No file selected");
    }

    if file.bytes.is_empty() {
        result.add_error("file", "File is empty");
    } else if file.size() > MAX_UPLOAD_BYTES {
        result.add_error("file", "File size exceeds 10MB limit");
    }
}

pub struct ResumeFileValidator;

impl Validator<UploadFile> for ResumeFileValidator {
    fn validate(&self, data: &UploadFile) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_common(data, &mut result);

        let allowed = HashSet::from(RESUME_EXTENSIONS);
        match data.extension() {
            Some(extension) if allowed.contains(extension.as_str()) => {}
            _ => result.add_error("file_type", "Only PDF and DOCX resumes are allowed"),
        }

        if let Some(content_type) = &data.content_type {
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if !RESUME_MIME_TYPES.contains(&essence.as_str()) {
                result.add_error("content_type", "Only PDF and DOCX resumes are allowed");
            }
        }

        result
    }
}

pub struct IdentityDocumentValidator;

impl Validator<UploadFile> for IdentityDocumentValidator {
    fn validate(&self, data: &UploadFile) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_common(data, &mut result);

        let allowed = HashSet::from(DOCUMENT_EXTENSIONS);
        match data.extension() {
            Some(extension) if allowed.contains(extension.as_str()) => {}
            _ => result.add_error("file_type", "Only PDF, JPG, JPEG and PNG files are allowed"),
        }

        result
    }
}

// ============================================================================
// Listing Validators
// ============================================================================

pub struct ListQueryValidator;

impl Validator<ListQuery> for ListQueryValidator {
    fn validate(&self, data: &ListQuery) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.page < 1 {
            result.add_error("page", "Page must be greater than 0");
        }

        if data.limit < 1 || data.limit > MAX_PAGE_SIZE {
            result.add_error("limit", "Limit must be between 1 and 100");
        }

        result
    }
}
