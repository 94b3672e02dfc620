// src/services/candidate_api.rs
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use super::progress::UploadProgress;
use super::CandidateGateway;
use crate::candidates::{
    CandidatePage, CandidateRecord, DocumentRequestReceipt, DocumentType, IdentityDocumentFile,
    ListQuery, ResumeFile, SubmissionReceipt, UploadFile, UploadReceipt,
};
use crate::common::helpers::preview_for_log;
use crate::common::{ConfigError, ConsoleConfig, ConsoleError, ErrorResponse, Operation};

/// Chunk size used when streaming a resume, which is also the progress
/// reporting granularity.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// REST client for the candidate backend.
#[derive(Debug, Clone)]
pub struct HttpCandidateService {
    client: Client,
    base_url: Url,
}

impl HttpCandidateService {
    /// Builds a client that enforces the configured request timeout.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build HTTP client");
                ConfigError::HttpClient(e.to_string())
            })?;

        Ok(Self::with_client(client, config.api_base_url.clone()))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL a viewer can embed to show a submitted document inline.
    pub fn document_url(
        &self,
        candidate_id: &str,
        document_id: &str,
    ) -> Result<Url, ConsoleError> {
        self.endpoint(
            Operation::FetchDocument,
            &["candidates", candidate_id, "documents", document_id],
        )
    }

    /// Joins path segments under the base URL, percent-encoding each one.
    fn endpoint(&self, operation: Operation, segments: &[&str]) -> Result<Url, ConsoleError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::transport(operation, "API base URL cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        operation: Operation,
        sent: Result<Response, reqwest::Error>,
    ) -> Result<T, ConsoleError> {
        let body = self.read_body(operation, sent).await?;
        serde_json::from_slice(&body).map_err(|e| {
            error!(operation = %operation, error = %e, "Unexpected response shape from backend");
            ConsoleError::Transport {
                operation,
                status: None,
                message: None,
            }
        })
    }

    /// Reads a successful body, or converts the failure into the console's
    /// error taxonomy.
    async fn read_body(
        &self,
        operation: Operation,
        sent: Result<Response, reqwest::Error>,
    ) -> Result<Bytes, ConsoleError> {
        let response = sent.map_err(|e| {
            warn!(
                operation = %operation,
                timeout = e.is_timeout(),
                error = %e,
                "Backend request failed"
            );
            ConsoleError::Transport {
                operation,
                status: None,
                message: None,
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(operation = %operation, error = %e, "Failed to read backend response");
            ConsoleError::Transport {
                operation,
                status: Some(status.as_u16()),
                message: None,
            }
        })?;

        if status.is_success() {
            return Ok(body);
        }

        let message = ErrorResponse::message_from_body(&body);
        warn!(
            operation = %operation,
            status = status.as_u16(),
            message = message.as_deref().unwrap_or("<none>"),
            "Backend returned an error"
        );

        if status == StatusCode::NOT_FOUND && targets_resource(operation) {
            return Err(ConsoleError::NotFound { operation, message });
        }

        Err(ConsoleError::Transport {
            operation,
            status: Some(status.as_u16()),
            message,
        })
    }
}

/// Operations addressing an existing candidate or document, where a 404
/// means the resource is absent rather than a routing failure.
fn targets_resource(operation: Operation) -> bool {
    !matches!(
        operation,
        Operation::ListCandidates | Operation::UploadResume
    )
}

fn file_part(operation: Operation, file: &UploadFile, body: Body) -> Result<Part, ConsoleError> {
    Part::stream_with_length(body, file.size())
        .file_name(file.filename.clone())
        .mime_str(&file.mime_type())
        .map_err(|e| {
            warn!(operation = %operation, error = %e, "Invalid content type for upload");
            ConsoleError::transport(operation, "Invalid file content type")
        })
}

/// Splits the file into chunks and reports progress as each one is
/// pulled by the transport.
fn progress_body(file: &UploadFile, progress: &UploadProgress) -> Body {
    let total = file.size();
    let chunks: Vec<Bytes> = (0..file.bytes.len())
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| {
            let end = (start + UPLOAD_CHUNK_BYTES).min(file.bytes.len());
            file.bytes.slice(start..end)
        })
        .collect();

    let progress = progress.clone();
    let mut sent: u64 = 0;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        progress.record(sent, total);
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    Body::wrap_stream(stream)
}

#[async_trait]
impl CandidateGateway for HttpCandidateService {
    async fn list_candidates(&self, query: ListQuery) -> Result<CandidatePage, ConsoleError> {
        let operation = Operation::ListCandidates;
        let url = self.endpoint(operation, &["candidates"])?;

        debug!(
            page = query.page,
            limit = query.limit,
            status = query.status.map(|s| s.as_str()).unwrap_or("all"),
            "Listing candidates"
        );

        let sent = self
            .client
            .get(url)
            .query(&query.to_query_pairs())
            .send()
            .await;
        self.decode(operation, sent).await
    }

    async fn get_candidate(&self, candidate_id: &str) -> Result<CandidateRecord, ConsoleError> {
        let operation = Operation::LoadCandidate;
        let url = self.endpoint(operation, &["candidates", candidate_id])?;

        debug!(candidate_id = %candidate_id, "Loading candidate");

        let sent = self.client.get(url).send().await;
        self.decode(operation, sent).await
    }

    async fn request_documents(
        &self,
        candidate_id: &str,
    ) -> Result<DocumentRequestReceipt, ConsoleError> {
        let operation = Operation::RequestDocuments;
        let url = self.endpoint(operation, &["candidates", candidate_id, "request-documents"])?;

        debug!(candidate_id = %candidate_id, "Requesting identity documents");

        let sent = self.client.post(url).send().await;
        let receipt: DocumentRequestReceipt = self.decode(operation, sent).await?;

        info!(
            candidate_id = %candidate_id,
            preview = %preview_for_log(&receipt.request_preview, 80),
            "Document request generated"
        );
        Ok(receipt)
    }

    async fn submit_document(
        &self,
        candidate_id: &str,
        file: &IdentityDocumentFile,
        document_type: DocumentType,
    ) -> Result<SubmissionReceipt, ConsoleError> {
        let operation = Operation::SubmitDocument;
        let url = self.endpoint(operation, &["candidates", candidate_id, "submit-documents"])?;
        let upload = file.file();

        debug!(
            candidate_id = %candidate_id,
            document_type = %document_type,
            filename = %upload.filename,
            size = upload.size(),
            "Submitting identity document"
        );

        let part = file_part(operation, upload, Body::from(upload.bytes.clone()))?;
        let form = Form::new()
            .part("file", part)
            .text("document_type", document_type.as_str());

        let sent = self.client.post(url).multipart(form).send().await;
        let receipt: SubmissionReceipt = self.decode(operation, sent).await?;

        info!(
            candidate_id = %candidate_id,
            document_type = %document_type,
            document_id = receipt.document_id.as_deref().unwrap_or("<unassigned>"),
            "Identity document submitted"
        );
        Ok(receipt)
    }

    async fn upload_resume(
        &self,
        file: &ResumeFile,
        progress: &UploadProgress,
    ) -> Result<UploadReceipt, ConsoleError> {
        let operation = Operation::UploadResume;
        let url = self.endpoint(operation, &["candidates", "upload"])?;
        let upload = file.file();

        debug!(filename = %upload.filename, size = upload.size(), "Uploading resume");

        let part = file_part(operation, upload, progress_body(upload, progress))?;
        let form = Form::new().part("file", part);

        let sent = self.client.post(url).multipart(form).send().await;
        let receipt: UploadReceipt = self.decode(operation, sent).await?;
        progress.complete();

        info!(
            candidate_id = %receipt.candidate_id,
            auto_request_generated = receipt.auto_request_generated,
            "Resume uploaded"
        );
        Ok(receipt)
    }

    async fn fetch_document(
        &self,
        candidate_id: &str,
        document_id: &str,
    ) -> Result<Bytes, ConsoleError> {
        let operation = Operation::FetchDocument;
        let url = self.document_url(candidate_id, document_id)?;

        debug!(candidate_id = %candidate_id, document_id = %document_id, "Fetching document");

        let sent = self.client.get(url).send().await;
        self.read_body(operation, sent).await
    }
}
