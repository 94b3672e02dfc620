// src/console/upload.rs
//! Resume upload flow and extraction polling.

use tracing::{debug, info, warn};

use crate::candidates::{CandidateRecord, ResumeFile, UploadFile, UploadReceipt};
use crate::common::{ConsoleConfig, ConsoleError, PollConfig};
use crate::services::{CandidateGateway, UploadProgress};

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Uploading,
    Uploaded(UploadReceipt),
    Failed(String),
}

#[derive(Debug)]
pub struct ResumeUploader {
    poll: PollConfig,
    state: UploadState,
}

impl ResumeUploader {
    pub fn new(poll: PollConfig) -> Self {
        Self {
            poll,
            state: UploadState::Idle,
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config.poll)
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.state, UploadState::Uploading)
    }

    /// Validates the resume, then uploads it, reporting transfer progress
    /// through `progress`. Nothing is sent for an invalid file.
    pub async fn upload(
        &mut self,
        gateway: &dyn CandidateGateway,
        file: UploadFile,
        progress: &UploadProgress,
    ) -> Result<UploadReceipt, ConsoleError> {
        let resume = match ResumeFile::validate(file) {
            Ok(resume) => resume,
            Err(e) => {
                warn!(error = %e, "Resume rejected before upload");
                self.state = UploadState::Failed(e.user_message());
                return Err(e);
            }
        };

        self.state = UploadState::Uploading;
        match gateway.upload_resume(&resume, progress).await {
            Ok(receipt) => {
                info!(
                    candidate_id = %receipt.candidate_id,
                    auto_request_generated = receipt.auto_request_generated,
                    "Resume accepted"
                );
                self.state = UploadState::Uploaded(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, "Resume upload failed");
                self.state = UploadState::Failed(e.user_message());
                Err(e)
            }
        }
    }

    /// Re-fetches the candidate until extraction has finished or the
    /// attempts run out, returning the last record seen either way. At
    /// least one fetch is always made.
    pub async fn await_extraction(
        &self,
        gateway: &dyn CandidateGateway,
        candidate_id: &str,
    ) -> Result<CandidateRecord, ConsoleError> {
        let attempts = self.poll.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let record = gateway.get_candidate(candidate_id).await?;
            let status = record.extraction_status();
            debug!(
                candidate_id = %candidate_id,
                attempt,
                status = %status,
                "Polled extraction status"
            );

            if status.is_finished() || attempt >= attempts {
                if !status.is_finished() {
                    warn!(
                        candidate_id = %candidate_id,
                        attempts,
                        status = %status,
                        "Extraction still running after polling"
                    );
                }
                return Ok(record);
            }

            attempt += 1;
            tokio::time::sleep(self.poll.interval).await;
        }
    }
}
