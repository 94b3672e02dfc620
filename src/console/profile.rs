// src/console/profile.rs
//! Candidate profile controller.
//!
//! The record shown is always the one last fetched from the backend.
//! Mutations only acknowledge; every successful one is followed by a
//! re-fetch, and a failed one leaves the loaded record as it was.

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::view::ViewState;
use crate::candidates::{
    CandidateRecord, DocumentPreview, DocumentRequestReceipt, DocumentType,
    IdentityDocumentFile, SubmissionReceipt, UploadFile,
};
use crate::common::{ConsoleError, Operation, RequestSequence, Ticket};
use crate::services::CandidateGateway;

/// Mutating operator actions on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAction {
    RequestDocuments,
    SubmitDocument(DocumentType),
    OpenDocument,
}

#[derive(Debug)]
pub struct CandidateProfile {
    candidate_id: String,
    view: ViewState<CandidateRecord>,
    sequence: RequestSequence,
    actions: RequestSequence,
    action_in_flight: Option<ProfileAction>,
    action_error: Option<String>,
    refresh_error: Option<String>,
    request_preview: Option<String>,
    preview: Option<DocumentPreview>,
}

impl CandidateProfile {
    pub fn new(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            view: ViewState::Idle,
            sequence: RequestSequence::new(),
            actions: RequestSequence::new(),
            action_in_flight: None,
            action_error: None,
            refresh_error: None,
            request_preview: None,
            preview: None,
        }
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn view(&self) -> &ViewState<CandidateRecord> {
        &self.view
    }

    pub fn record(&self) -> Option<&CandidateRecord> {
        self.view.ready()
    }

    /// The action currently awaiting the backend, if any.
    pub fn action_in_flight(&self) -> Option<ProfileAction> {
        self.action_in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.action_in_flight.is_some() || self.view.is_in_flight()
    }

    /// Message of the last failed action, cleared when an action succeeds.
    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    /// Set when a re-fetch failed while an older record stayed on screen.
    pub fn refresh_error(&self) -> Option<&str> {
        self.refresh_error.as_deref()
    }

    /// Preview text from the last document request. Display-only; the
    /// stored request message may differ.
    pub fn request_preview(&self) -> Option<&str> {
        self.request_preview.as_deref()
    }

    pub fn document_preview(&self) -> Option<&DocumentPreview> {
        self.preview.as_ref()
    }

    pub fn close_document_preview(&mut self) {
        self.preview = None;
    }

    pub fn is_detached(&self) -> bool {
        self.sequence.is_closed()
    }

    /// Abandons the profile. Responses still in flight are ignored.
    pub fn detach(&mut self) {
        debug!(candidate_id = %self.candidate_id, "Detaching candidate profile");
        self.sequence.close();
        self.actions.close();
        self.action_in_flight = None;
        self.preview = None;
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Issues a fetch. A record already on screen stays visible meanwhile.
    pub fn begin_load(&mut self) -> Ticket {
        let ticket = self.sequence.issue();
        if self.view.ready().is_none() {
            self.view = ViewState::Loading;
        }
        debug!(candidate_id = %self.candidate_id, ticket = %ticket, "Candidate fetch issued");
        ticket
    }

    /// Applies a fetch result if it answers the latest fetch. Returns
    /// whether it was applied.
    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: Result<CandidateRecord, ConsoleError>,
    ) -> bool {
        if !self.sequence.is_current(ticket) {
            warn!(
                candidate_id = %self.candidate_id,
                ticket = %ticket,
                "Discarding stale candidate response"
            );
            return false;
        }

        match result {
            Ok(record) => {
                debug!(
                    candidate_id = %self.candidate_id,
                    status = %record.extraction_status(),
                    requests = record.document_requests.len(),
                    documents = record.submitted_documents.len(),
                    "Candidate loaded"
                );
                self.refresh_error = None;
                self.view = ViewState::Ready(record);
            }
            Err(e) if self.view.ready().is_some() => {
                warn!(candidate_id = %self.candidate_id, error = %e, "Candidate refresh failed");
                self.refresh_error = Some(e.user_message());
            }
            Err(e) if e.is_not_found() => {
                warn!(candidate_id = %self.candidate_id, "Candidate not found");
                self.view = ViewState::NotFound(e.user_message());
            }
            Err(e) => {
                warn!(candidate_id = %self.candidate_id, error = %e, "Failed to load candidate");
                self.view = ViewState::Failed(e.user_message());
            }
        }
        true
    }

    pub async fn load(&mut self, gateway: &dyn CandidateGateway) -> bool {
        let ticket = self.begin_load();
        let result = gateway.get_candidate(&self.candidate_id).await;
        self.apply(ticket, result)
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Marks `action` as in flight. The caller sends it to the backend and
    /// hands the answer to the matching `apply_*` method, or to
    /// `cancel_action` if it gave up waiting.
    pub fn begin_action(&mut self, action: ProfileAction) -> PendingAction {
        let ticket = self.actions.issue();
        self.action_in_flight = Some(action);
        debug!(
            candidate_id = %self.candidate_id,
            ticket = %ticket,
            action = ?action,
            "Profile action issued"
        );
        PendingAction { ticket, action }
    }

    /// Clears the in-flight flag of an action whose answer will never be
    /// applied.
    pub fn cancel_action(&mut self, pending: PendingAction) {
        if self.actions.is_current(pending.ticket) {
            self.action_in_flight = None;
        }
    }

    /// Applies a document request answer. Returns whether it was applied.
    pub fn apply_request_documents(
        &mut self,
        pending: PendingAction,
        result: &Result<DocumentRequestReceipt, ConsoleError>,
    ) -> bool {
        if !self.settle(pending) {
            return false;
        }
        match result {
            Ok(receipt) => {
                info!(candidate_id = %self.candidate_id, "Document request sent");
                self.action_error = None;
                self.request_preview = Some(receipt.request_preview.clone());
            }
            Err(e) => self.record_failure(e),
        }
        true
    }

    /// Applies a document submission answer. Returns whether it was applied.
    pub fn apply_submission(
        &mut self,
        pending: PendingAction,
        result: &Result<SubmissionReceipt, ConsoleError>,
    ) -> bool {
        if !self.settle(pending) {
            return false;
        }
        match result {
            Ok(_) => {
                info!(
                    candidate_id = %self.candidate_id,
                    action = ?pending.action,
                    "Identity document submitted"
                );
                self.action_error = None;
            }
            Err(e) => self.record_failure(e),
        }
        true
    }

    /// Applies a document download. `Ok(None)` means the answer was stale
    /// and nothing changed.
    pub fn apply_document(
        &mut self,
        pending: PendingAction,
        filename: String,
        result: Result<Bytes, ConsoleError>,
    ) -> Result<Option<&DocumentPreview>, ConsoleError> {
        if !self.settle(pending) {
            return Ok(None);
        }
        match result {
            Ok(bytes) => {
                debug!(
                    candidate_id = %self.candidate_id,
                    filename = %filename,
                    size = bytes.len(),
                    "Document loaded for preview"
                );
                Ok(Some(self.preview.insert(DocumentPreview::new(filename, bytes))))
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Asks the backend to send the candidate another document request.
    /// Every call appends a request; repeated calls are not collapsed.
    pub async fn request_documents(
        &mut self,
        gateway: &dyn CandidateGateway,
    ) -> Result<DocumentRequestReceipt, ConsoleError> {
        let pending = self.begin_action(ProfileAction::RequestDocuments);
        let result = {
            let _in_flight = InFlight(&mut self.action_in_flight);
            gateway.request_documents(&self.candidate_id).await
        };

        if self.apply_request_documents(pending, &result) && result.is_ok() {
            self.load(gateway).await;
        }
        result
    }

    /// Validates and submits an identity document. An invalid file never
    /// reaches the gateway.
    pub async fn submit_document(
        &mut self,
        gateway: &dyn CandidateGateway,
        file: UploadFile,
        document_type: DocumentType,
    ) -> Result<SubmissionReceipt, ConsoleError> {
        let file = match IdentityDocumentFile::validate(file) {
            Ok(file) => file,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };

        let pending = self.begin_action(ProfileAction::SubmitDocument(document_type));
        let result = {
            let _in_flight = InFlight(&mut self.action_in_flight);
            gateway
                .submit_document(&self.candidate_id, &file, document_type)
                .await
        };

        if self.apply_submission(pending, &result) && result.is_ok() {
            self.load(gateway).await;
        }
        result
    }

    /// Downloads a submitted document and keeps it as the open preview.
    pub async fn open_document(
        &mut self,
        gateway: &dyn CandidateGateway,
        document_id: &str,
    ) -> Result<&DocumentPreview, ConsoleError> {
        let filename = match self
            .record()
            .and_then(|record| record.submitted_documents.get(document_id))
        {
            Some(document) => document.document_filename.clone(),
            None => {
                return Err(ConsoleError::NotFound {
                    operation: Operation::FetchDocument,
                    message: Some("Document not found".to_string()),
                })
            }
        };

        let pending = self.begin_action(ProfileAction::OpenDocument);
        let result = {
            let _in_flight = InFlight(&mut self.action_in_flight);
            gateway
                .fetch_document(&self.candidate_id, document_id)
                .await
        };

        self.apply_document(pending, filename, result)?
            .ok_or_else(|| {
                ConsoleError::transport(Operation::FetchDocument, "Candidate profile was closed")
            })
    }

    /// Clears the in-flight flag if `pending` is the latest live action.
    fn settle(&mut self, pending: PendingAction) -> bool {
        if !self.actions.is_current(pending.ticket) {
            warn!(
                candidate_id = %self.candidate_id,
                ticket = %pending.ticket,
                "Discarding stale action response"
            );
            return false;
        }
        self.action_in_flight = None;
        true
    }

    fn record_failure(&mut self, error: &ConsoleError) {
        warn!(candidate_id = %self.candidate_id, error = %error, "Profile action failed");
        self.action_error = Some(error.user_message());
    }
}

/// An action issued by `begin_action` and not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAction {
    ticket: Ticket,
    action: ProfileAction,
}

impl PendingAction {
    pub fn action(&self) -> ProfileAction {
        self.action
    }
}

/// Clears the in-flight flag when dropped, so an action future abandoned
/// mid-await does not leave the profile busy.
struct InFlight<'a>(&'a mut Option<ProfileAction>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = None;
    }
}
