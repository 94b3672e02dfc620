// src/services/mod.rs
//
// Backend services consumed by the console. The gateway trait is the seam
// between the console controllers and the extraction/storage backend.

pub mod candidate_api;
pub mod progress;


use async_trait::async_trait;
use bytes::Bytes;

use crate::candidates::{
    CandidatePage, CandidateRecord, DocumentRequestReceipt, DocumentType, IdentityDocumentFile,
    ListQuery, ResumeFile, SubmissionReceipt, UploadReceipt,
};
use crate::common::ConsoleError;

// Re-export commonly used types for convenience
pub use candidate_api::HttpCandidateService;
pub use progress::UploadProgress;

/// Logical operations of the candidate backend.
///
/// Mutations return only an acknowledgment. Callers re-fetch the candidate
/// with [`CandidateGateway::get_candidate`] to see their effect.
#[async_trait]
pub trait CandidateGateway: Send + Sync {
    /// `GET /candidates?page&limit&status`. A page past the end is an empty
    /// page, not an error.
    async fn list_candidates(&self, query: ListQuery) -> Result<CandidatePage, ConsoleError>;

    /// `GET /candidates/{id}` with nested requests and documents.
    async fn get_candidate(&self, candidate_id: &str) -> Result<CandidateRecord, ConsoleError>;

    /// `POST /candidates/{id}/request-documents`. Every call appends a new
    /// request on the backend.
    async fn request_documents(
        &self,
        candidate_id: &str,
    ) -> Result<DocumentRequestReceipt, ConsoleError>;

    /// `POST /candidates/{id}/submit-documents`.
    async fn submit_document(
        &self,
        candidate_id: &str,
        file: &IdentityDocumentFile,
        document_type: DocumentType,
    ) -> Result<SubmissionReceipt, ConsoleError>;

    /// `POST /candidates/upload`.
    async fn upload_resume(
        &self,
        file: &ResumeFile,
        progress: &UploadProgress,
    ) -> Result<UploadReceipt, ConsoleError>;

    /// `GET /candidates/{id}/documents/{docId}`, raw bytes.
    async fn fetch_document(
        &self,
        candidate_id: &str,
        document_id: &str,
    ) -> Result<Bytes, ConsoleError>;
}
