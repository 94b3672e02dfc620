// src/testing.rs
//! In-process stand-in for the candidate backend, shared by the gateway and
//! console tests. The same state is reachable directly (`InMemoryGateway`)
//! and over HTTP (`spawn_fake_server`).

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tokio::net::TcpListener;

use crate::candidates::files::content_type_for_extension;
use crate::candidates::{
    CandidatePage, CandidateRecord, CandidateSummary, DocumentRequest, DocumentRequestReceipt,
    DocumentType, ExtractedData, ExtractedField, Extraction, ExtractionStatus,
    IdentityDocumentFile, ListQuery, RequestHistory, RequestOrigin, ResumeFile,
    SubmissionReceipt, SubmittedDocument, SubmittedDocuments, UploadReceipt, VerificationStatus,
};
use crate::common::{ConsoleError, Operation};
use crate::services::{CandidateGateway, UploadProgress};

/// Failure reported by the fake backend: HTTP status plus optional message.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub status: u16,
    pub message: Option<String>,
}

impl Failure {
    fn new(status: u16, message: &str) -> Self {
        Self {
            status,
            message: Some(message.to_string()),
        }
    }
}

pub fn jane_doe() -> ExtractedData {
    ExtractedData {
        full_name: ExtractedField::scored("Jane Doe".to_string(), 0.95),
        email: ExtractedField::scored("jane@example.com".to_string(), 0.92),
        phone: ExtractedField::scored("+91 98765 43210".to_string(), 0.81),
        current_company: ExtractedField::scored("Acme Corp".to_string(), 0.66),
        designation: ExtractedField::scored("Backend Engineer".to_string(), 0.74),
        skills: ExtractedField::scored(vec!["Rust".to_string(), "SQL".to_string()], 0.88),
        years_of_experience: ExtractedField::bare(6.0),
        education: Some("B.Tech".to_string()),
    }
}

#[derive(Default)]
struct BackendState {
    candidates: Vec<CandidateRecord>,
    documents: HashMap<String, Bytes>,
    clock: u32,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, Failure>,
    stalls: HashMap<Operation, StdDuration>,
    auto_request_on_upload: bool,
    extract_on_upload: Option<ExtractedData>,
    scheduled_extractions: HashMap<String, (usize, ExtractedData)>,
}

impl BackendState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        let origin = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        origin + Duration::minutes(i64::from(self.clock))
    }

    fn enter(&mut self, operation: Operation) -> Result<(), Failure> {
        *self.calls.entry(operation).or_insert(0) += 1;
        match self.failures.remove(&operation) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn candidate_mut(&mut self, id: &str) -> Result<&mut CandidateRecord, Failure> {
        self.candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Failure::new(404, "Candidate not found"))
    }
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Test controls
    // ------------------------------------------------------------------

    pub fn auto_request_on_upload(&self, enabled: bool) {
        self.lock().auto_request_on_upload = enabled;
    }

    pub fn extract_on_upload(&self, data: Option<ExtractedData>) {
        self.lock().extract_on_upload = data;
    }

    pub fn fail_next(&self, operation: Operation, status: u16, message: Option<&str>) {
        self.lock().failures.insert(
            operation,
            Failure {
                status,
                message: message.map(str::to_string),
            },
        );
    }

    /// Makes the next call of `operation` wait `delay` before answering.
    pub fn stall_next(&self, operation: Operation, delay: StdDuration) {
        self.lock().stalls.insert(operation, delay);
    }

    async fn stall(&self, operation: Operation) {
        let delay = self.lock().stalls.remove(&operation);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn seed(&self, filename: &str, status: ExtractionStatus) -> String {
        let data = match status {
            ExtractionStatus::Completed => Some(jane_doe()),
            _ => None,
        };
        self.seed_with(filename, status, data)
    }

    pub fn seed_with(
        &self,
        filename: &str,
        status: ExtractionStatus,
        data: Option<ExtractedData>,
    ) -> String {
        let mut state = self.lock();
        let upload_date = state.tick();
        let id = uuid::Uuid::new_v4().to_string();
        state.candidates.push(CandidateRecord {
            id: id.clone(),
            resume_filename: filename.to_string(),
            upload_date,
            extraction: extraction_for(status, data),
            document_requests: RequestHistory::default(),
            submitted_documents: SubmittedDocuments::default(),
        });
        id
    }

    /// Simulates the external extractor finishing.
    pub fn complete_extraction(&self, id: &str, data: ExtractedData) {
        let mut state = self.lock();
        if let Ok(candidate) = state.candidate_mut(id) {
            candidate.extraction = Extraction::Completed(Box::new(data));
        }
    }

    /// Completes extraction on the `fetches`-th fetch from now.
    pub fn complete_extraction_after(&self, id: &str, fetches: usize, data: ExtractedData) {
        self.lock()
            .scheduled_extractions
            .insert(id.to_string(), (fetches, data));
    }

    pub fn set_extraction_status(&self, id: &str, status: ExtractionStatus) {
        let mut state = self.lock();
        if let Ok(candidate) = state.candidate_mut(id) {
            candidate.extraction = extraction_for(status, Some(jane_doe()));
        }
    }

    /// Simulates the external verification process.
    pub fn set_verification(&self, id: &str, document_id: &str, status: VerificationStatus) {
        let mut state = self.lock();
        if let Ok(candidate) = state.candidate_mut(id) {
            if let Some(mut document) = candidate.submitted_documents.get(document_id).cloned() {
                document.verification_status = status;
                candidate.submitted_documents.insert(document);
            }
        }
    }

    pub fn record(&self, id: &str) -> Option<CandidateRecord> {
        self.lock().candidates.iter().find(|c| c.id == id).cloned()
    }

    // ------------------------------------------------------------------
    // Backend operations
    // ------------------------------------------------------------------

    pub fn list(
        &self,
        page: u32,
        limit: u32,
        status: Option<ExtractionStatus>,
    ) -> Result<CandidatePage, Failure> {
        let mut state = self.lock();
        state.enter(Operation::ListCandidates)?;

        let mut matching: Vec<&CandidateRecord> = state
            .candidates
            .iter()
            .filter(|c| status.map_or(true, |s| c.extraction_status() == s))
            .collect();
        matching.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));

        let limit = limit.max(1);
        let total = matching.len() as u64;
        let pages = ((total + u64::from(limit) - 1) / u64::from(limit)) as u32;
        let start = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);

        let candidates = matching
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .map(summarize)
            .collect();

        Ok(CandidatePage {
            candidates,
            pages,
            total: Some(total),
            page: Some(page),
            limit: Some(limit),
        })
    }

    pub fn get(&self, id: &str) -> Result<CandidateRecord, Failure> {
        let mut state = self.lock();
        state.enter(Operation::LoadCandidate)?;

        let due = match state.scheduled_extractions.get_mut(id) {
            Some((remaining, _)) if *remaining <= 1 => true,
            Some((remaining, _)) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        let completed = if due {
            state.scheduled_extractions.remove(id).map(|(_, data)| data)
        } else {
            None
        };

        let candidate = state.candidate_mut(id)?;
        if let Some(data) = completed {
            candidate.extraction = Extraction::Completed(Box::new(data));
        }
        Ok(candidate.clone())
    }

    pub fn request_documents(&self, id: &str) -> Result<DocumentRequestReceipt, Failure> {
        let mut state = self.lock();
        state.enter(Operation::RequestDocuments)?;
        let requested_at = state.tick();

        let candidate = state.candidate_mut(id)?;
        let name = candidate
            .extracted_data()
            .ok_or_else(|| Failure::new(400, "No extracted data available for this candidate"))?
            .full_name
            .value()
            .cloned()
            .unwrap_or_else(|| "Candidate".to_string());

        let number = candidate.document_requests.len() + 1;
        let message = format!(
            "Dear {}, please share your PAN and Aadhaar cards to continue verification. (request {})",
            name, number
        );
        let request_id = uuid::Uuid::new_v4().to_string();
        candidate.document_requests.push(DocumentRequest {
            id: request_id.clone(),
            request_message: message.clone(),
            request_status: RequestOrigin::Manual,
            request_type: Some("email".to_string()),
            requested_at,
        });

        Ok(DocumentRequestReceipt {
            request_preview: message,
            request_id: Some(request_id),
            message: Some("Document request generated successfully".to_string()),
        })
    }

    pub fn submit(
        &self,
        id: &str,
        filename: &str,
        bytes: Bytes,
        document_type: &str,
    ) -> Result<SubmissionReceipt, Failure> {
        let mut state = self.lock();
        state.enter(Operation::SubmitDocument)?;
        let submitted_at = state.tick();

        let document_type: DocumentType = document_type.parse().map_err(|_| {
            Failure::new(400, "Invalid document type. Must be \"pan\" or \"aadhaar\"")
        })?;
        if filename.is_empty() {
            return Err(Failure::new(400, "No file selected"));
        }

        let document_id = uuid::Uuid::new_v4().to_string();
        let file_size = bytes.len() as u64;
        let candidate = state.candidate_mut(id)?;
        candidate.submitted_documents.insert(SubmittedDocument {
            id: document_id.clone(),
            document_type,
            document_filename: filename.to_string(),
            file_size: Some(file_size),
            verification_status: VerificationStatus::Pending,
            submitted_at,
        });
        state.documents.insert(document_id.clone(), bytes);

        Ok(SubmissionReceipt {
            document_id: Some(document_id),
            document_type: Some(document_type),
            verification_status: Some(VerificationStatus::Pending),
            message: Some("Document uploaded successfully".to_string()),
        })
    }

    pub fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadReceipt, Failure> {
        let mut state = self.lock();
        state.enter(Operation::UploadResume)?;
        if filename.is_empty() || bytes.is_empty() {
            return Err(Failure::new(400, "No file provided"));
        }

        let upload_date = state.tick();
        let data = state.extract_on_upload.clone();
        let status = if data.is_some() {
            ExtractionStatus::Completed
        } else {
            ExtractionStatus::Pending
        };

        let mut document_requests = RequestHistory::default();
        let mut auto_request_preview = None;
        if state.auto_request_on_upload {
            let message = "Hello, thank you for applying. To proceed with verification we need \
                           a clear copy of your PAN card and your Aadhaar card. Please reply to \
                           this message with both documents attached as PDF, JPG or PNG files, \
                           each no larger than 10MB. Regards, the hiring team."
                .to_string();
            auto_request_preview = Some(format!("{}...", message.chars().take(200).collect::<String>()));
            document_requests.push(DocumentRequest {
                id: uuid::Uuid::new_v4().to_string(),
                request_message: message,
                request_status: RequestOrigin::AutoGenerated,
                request_type: Some("email".to_string()),
                requested_at: upload_date,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        state.candidates.push(CandidateRecord {
            id: id.clone(),
            resume_filename: filename.to_string(),
            upload_date,
            extraction: extraction_for(status, data),
            document_requests,
            submitted_documents: SubmittedDocuments::default(),
        });

        Ok(UploadReceipt {
            candidate_id: id,
            auto_request_generated: auto_request_preview.is_some(),
            auto_request_preview,
            extraction_status: Some(status),
            message: Some("Resume uploaded successfully".to_string()),
        })
    }

    pub fn document(&self, id: &str, document_id: &str) -> Result<(String, Bytes), Failure> {
        let mut state = self.lock();
        state.enter(Operation::FetchDocument)?;
        let filename = state
            .candidate_mut(id)?
            .submitted_documents
            .get(document_id)
            .map(|d| d.document_filename.clone())
            .ok_or_else(|| Failure::new(404, "Document not found"))?;
        let bytes = state
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| Failure::new(404, "Document file not found"))?;
        Ok((filename, bytes))
    }
}

fn extraction_for(status: ExtractionStatus, data: Option<ExtractedData>) -> Extraction {
    match status {
        ExtractionStatus::Pending => Extraction::Pending,
        ExtractionStatus::Processing => Extraction::Processing,
        ExtractionStatus::Failed => Extraction::Failed,
        ExtractionStatus::Completed => Extraction::Completed(Box::new(data.unwrap_or_default())),
    }
}

fn summarize(record: &CandidateRecord) -> CandidateSummary {
    let data = record.extracted_data();
    CandidateSummary {
        id: record.id.clone(),
        resume_filename: record.resume_filename.clone(),
        upload_date: record.upload_date,
        extraction_status: record.extraction_status(),
        name: data.and_then(|d| d.full_name.value().cloned()),
        email: data.and_then(|d| d.email.value().cloned()),
        company: data.and_then(|d| d.current_company.value().cloned()),
    }
}

// ============================================================================
// In-memory gateway
// ============================================================================

pub struct InMemoryGateway {
    pub backend: Arc<FakeBackend>,
}

impl InMemoryGateway {
    pub fn new(backend: Arc<FakeBackend>) -> Self {
        Self { backend }
    }
}

fn to_console_error(operation: Operation, failure: Failure) -> ConsoleError {
    let targets_resource = !matches!(
        operation,
        Operation::ListCandidates | Operation::UploadResume
    );
    if failure.status == 404 && targets_resource {
        ConsoleError::NotFound {
            operation,
            message: failure.message,
        }
    } else {
        ConsoleError::Transport {
            operation,
            status: Some(failure.status),
            message: failure.message,
        }
    }
}

#[async_trait]
impl CandidateGateway for InMemoryGateway {
    async fn list_candidates(&self, query: ListQuery) -> Result<CandidatePage, ConsoleError> {
        self.backend
            .list(query.page, query.limit, query.status)
            .map_err(|f| to_console_error(Operation::ListCandidates, f))
    }

    async fn get_candidate(&self, candidate_id: &str) -> Result<CandidateRecord, ConsoleError> {
        self.backend.stall(Operation::LoadCandidate).await;
        self.backend
            .get(candidate_id)
            .map_err(|f| to_console_error(Operation::LoadCandidate, f))
    }

    async fn request_documents(
        &self,
        candidate_id: &str,
    ) -> Result<DocumentRequestReceipt, ConsoleError> {
        self.backend.stall(Operation::RequestDocuments).await;
        self.backend
            .request_documents(candidate_id)
            .map_err(|f| to_console_error(Operation::RequestDocuments, f))
    }

    async fn submit_document(
        &self,
        candidate_id: &str,
        file: &IdentityDocumentFile,
        document_type: DocumentType,
    ) -> Result<SubmissionReceipt, ConsoleError> {
        self.backend.stall(Operation::SubmitDocument).await;
        let upload = file.file();
        self.backend
            .submit(
                candidate_id,
                &upload.filename,
                upload.bytes.clone(),
                document_type.as_str(),
            )
            .map_err(|f| to_console_error(Operation::SubmitDocument, f))
    }

    async fn upload_resume(
        &self,
        file: &ResumeFile,
        progress: &UploadProgress,
    ) -> Result<UploadReceipt, ConsoleError> {
        let upload = file.file();
        let total = upload.size();
        for quarter in 1..=4u64 {
            progress.record(total * quarter / 4, total);
        }
        self.backend
            .upload(&upload.filename, &upload.bytes)
            .map_err(|f| to_console_error(Operation::UploadResume, f))
    }

    async fn fetch_document(
        &self,
        candidate_id: &str,
        document_id: &str,
    ) -> Result<Bytes, ConsoleError> {
        self.backend.stall(Operation::FetchDocument).await;
        self.backend
            .document(candidate_id, document_id)
            .map(|(_, bytes)| bytes)
            .map_err(|f| to_console_error(Operation::FetchDocument, f))
    }
}

// ============================================================================
// HTTP fake
// ============================================================================

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.message {
            Some(message) => (status, Json(json!({ "error": message }))).into_response(),
            None => status.into_response(),
        }
    }
}

type Shared = axum::extract::State<Arc<FakeBackend>>;

async fn upload_handler(
    axum::extract::State(backend): Shared,
    mut multipart: Multipart,
) -> Result<Response, Failure> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| Failure::new(400, "Invalid multipart body"))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| Failure::new(400, "Invalid file"))?;
            let receipt = backend.upload(&filename, &data)?;
            return Ok((StatusCode::CREATED, Json(receipt)).into_response());
        }
    }
    Err(Failure::new(400, "No file provided"))
}

async fn list_handler(
    axum::extract::State(backend): Shared,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CandidatePage>, Failure> {
    let page = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let status = match params.get("status") {
        Some(raw) => Some(
            raw.parse::<ExtractionStatus>()
                .map_err(|e| Failure::new(400, &e))?,
        ),
        None => None,
    };
    backend.list(page, limit, status).map(Json)
}

async fn get_handler(
    axum::extract::State(backend): Shared,
    Path(id): Path<String>,
) -> Result<Json<CandidateRecord>, Failure> {
    backend.stall(Operation::LoadCandidate).await;
    backend.get(&id).map(Json)
}

async fn request_documents_handler(
    axum::extract::State(backend): Shared,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    backend.stall(Operation::RequestDocuments).await;
    let receipt = backend.request_documents(&id)?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

async fn submit_handler(
    axum::extract::State(backend): Shared,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, Failure> {
    let mut file: Option<(String, Bytes)> = None;
    let mut document_type = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| Failure::new(400, "Invalid multipart body"))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| Failure::new(400, "Invalid file"))?;
                file = Some((filename, data));
            }
            Some("document_type") => {
                document_type = field
                    .text()
                    .await
                    .map_err(|_| Failure::new(400, "Invalid document type"))?;
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| Failure::new(400, "No file provided"))?;
    let receipt = backend.submit(&id, &filename, data, &document_type)?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

async fn document_handler(
    axum::extract::State(backend): Shared,
    Path((id, document_id)): Path<(String, String)>,
) -> Result<Response, Failure> {
    let (filename, bytes) = backend.document(&id, &document_id)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type_for_extension(&filename))],
        bytes,
    )
        .into_response())
}

pub fn fake_router(backend: Arc<FakeBackend>) -> Router {
    Router::new()
        .route("/api/candidates", get(list_handler))
        .route("/api/candidates/upload", post(upload_handler))
        .route("/api/candidates/:id", get(get_handler))
        .route(
            "/api/candidates/:id/request-documents",
            post(request_documents_handler),
        )
        .route("/api/candidates/:id/submit-documents", post(submit_handler))
        .route(
            "/api/candidates/:id/documents/:document_id",
            get(document_handler),
        )
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .with_state(backend)
}

/// Serves the fake backend on an ephemeral port and returns its API base URL.
pub async fn spawn_fake_server(backend: Arc<FakeBackend>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let app = fake_router(backend);
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}/api", addr)
}
