// src/candidates/mod.rs

pub mod confidence;
pub mod files;
pub mod models;
pub mod preview;
pub mod validators;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use confidence::{classify, confidence_label, BadgeVariant, ConfidenceTier};
pub use files::{IdentityDocumentFile, ResumeFile, UploadFile};
pub use models::*;
pub use preview::{preview_kind, DocumentPreview, PreviewKind};
