// src/main.rs
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use traqcheck::candidates::confidence::confidence_label;
use traqcheck::candidates::{
    CandidateRecord, DocumentType, ExtractionStatus, PreviewKind, UploadFile,
};
use traqcheck::common::ConsoleConfig;
use traqcheck::console::{CandidateListing, CandidateProfile, ResumeUploader, ViewState};
use traqcheck::services::{HttpCandidateService, UploadProgress};

// ============================================================================
// COMMAND LINE
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "traqcheck",
    about = "Operator console for candidate intake and document verification",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List candidates, newest first
    List {
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Only show candidates with this extraction status
        #[arg(long)]
        status: Option<ExtractionStatus>,
    },
    /// Show a candidate profile with extracted data, requests and documents
    Show { candidate_id: String },
    /// Upload a resume (PDF or DOCX, up to 10MB)
    Upload {
        path: PathBuf,
        /// Poll until extraction completes or fails
        #[arg(long)]
        wait: bool,
    },
    /// Send the candidate another request for PAN and Aadhaar
    RequestDocs { candidate_id: String },
    /// Submit an identity document on behalf of a candidate
    Submit {
        candidate_id: String,
        path: PathBuf,
        /// Document type: pan or aadhaar
        #[arg(long = "type")]
        document_type: DocumentType,
    },
    /// Download a submitted document
    Document {
        candidate_id: String,
        document_id: String,
        /// Where to write the file (defaults to its original name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ConsoleConfig::from_env().context("Invalid console configuration")?;
    info!("Using candidate API at {}", config.api_base_url);
    let gateway = HttpCandidateService::new(&config).context("Failed to start HTTP client")?;

    match cli.command {
        Command::List { page, status } => {
            let mut listing = CandidateListing::from_config(&config);
            listing.set_status_filter(status);
            let pending = listing.set_page(page);
            listing.fetch(&gateway, pending).await;

            match listing.view() {
                ViewState::Ready(candidates) => {
                    for candidate in candidates {
                        println!(
                            "{:<38} {:<11} {:<24} {}",
                            candidate.id,
                            candidate.extraction_status,
                            candidate.name.as_deref().unwrap_or("-"),
                            candidate.resume_filename
                        );
                    }
                    println!("Page {} of {}", listing.page(), listing.total_pages());
                }
                ViewState::Empty => {
                    println!("No candidates found. Upload a resume to get started.");
                }
                other => bail!(other
                    .error_message()
                    .unwrap_or("Failed to load candidates")
                    .to_string()),
            }
        }

        Command::Show { candidate_id } => {
            let mut profile = CandidateProfile::new(candidate_id);
            profile.load(&gateway).await;
            match profile.view() {
                ViewState::Ready(record) => print_record(record),
                other => bail!(other
                    .error_message()
                    .unwrap_or("Failed to load candidate")
                    .to_string()),
            }
        }

        Command::Upload { path, wait } => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut uploader = ResumeUploader::from_config(&config);

            let (progress, mut receiver) = UploadProgress::channel();
            let reporter = tokio::spawn(async move {
                while receiver.changed().await.is_ok() {
                    let percent = *receiver.borrow_and_update();
                    eprint!("\rUploading... {:>3}%", percent);
                    if percent == 100 {
                        break;
                    }
                }
                eprintln!();
            });

            let result = uploader.upload(&gateway, file, &progress).await;
            drop(progress);
            reporter.await.ok();
            let receipt = result.map_err(|e| anyhow::anyhow!(e.user_message()))?;

            println!("Candidate created: {}", receipt.candidate_id);
            if let Some(status) = receipt.extraction_status {
                println!("Extraction status: {}", status);
            }
            if let Some(preview) = receipt
                .auto_request_preview
                .as_deref()
                .filter(|_| receipt.auto_request_generated)
            {
                println!("Document request sent automatically:\n  {}", preview);
            }

            if wait {
                let record = uploader
                    .await_extraction(&gateway, &receipt.candidate_id)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
                if !record.extraction_status().is_finished() {
                    warn!("Extraction has not finished yet; check again later");
                }
                print_record(&record);
            }
        }

        Command::RequestDocs { candidate_id } => {
            let mut profile = CandidateProfile::new(candidate_id);
            profile.load(&gateway).await;
            if let Some(message) = profile.view().error_message() {
                bail!(message.to_string());
            }

            profile
                .request_documents(&gateway)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if let Some(preview) = profile.request_preview() {
                println!("Document request generated:\n  {}", preview);
            }
            if let Some(record) = profile.record() {
                println!("Requests sent so far: {}", record.document_requests.len());
            }
        }

        Command::Submit {
            candidate_id,
            path,
            document_type,
        } => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut profile = CandidateProfile::new(candidate_id);
            profile.load(&gateway).await;
            if let Some(message) = profile.view().error_message() {
                bail!(message.to_string());
            }

            let receipt = profile
                .submit_document(&gateway, file, document_type)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!(
                "{} submitted ({}), verification pending",
                document_type.label(),
                receipt.document_id.as_deref().unwrap_or("id not returned")
            );
            if let Some(message) = profile.refresh_error() {
                warn!("Could not refresh candidate: {}", message);
            }
        }

        Command::Document {
            candidate_id,
            document_id,
            out,
        } => {
            let mut profile = CandidateProfile::new(candidate_id);
            profile.load(&gateway).await;
            if let Some(message) = profile.view().error_message() {
                bail!(message.to_string());
            }

            let preview = profile
                .open_document(&gateway, &document_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let target =
                out.unwrap_or_else(|| default_download_path(&preview.filename, &document_id));
            tokio::fs::write(&target, &preview.bytes)
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;

            let kind = match preview.kind {
                PreviewKind::Image => "image",
                PreviewKind::Pdf => "pdf",
                PreviewKind::Download => "download only",
            };
            println!(
                "Saved {} ({} bytes, {}, {})",
                target.display(),
                preview.size(),
                preview.content_type,
                kind
            );
        }
    }

    Ok(())
}

/// File name to save a download under when `--out` is not given. Only the
/// final component of the backend's filename is used, so the file always
/// lands in the working directory.
fn default_download_path(filename: &str, document_id: &str) -> PathBuf {
    match Path::new(filename).file_name() {
        Some(name) => PathBuf::from(name),
        None => PathBuf::from(document_id),
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn print_record(record: &CandidateRecord) {
    println!("{}", record.display_name());
    println!("  Resume:     {}", record.resume_filename);
    println!("  Uploaded:   {}", record.upload_date.format("%Y-%m-%d %H:%M"));
    println!("  Extraction: {}", record.extraction_status());

    if let Some(data) = record.extracted_data() {
        println!();
        for row in data.display_rows() {
            let confidence = if row.confidence.is_some() {
                format!("[{}]", confidence_label(row.confidence))
            } else {
                String::new()
            };
            println!(
                "  {:<20} {:<40} {}",
                row.label,
                row.value.as_deref().unwrap_or("Not found"),
                confidence
            );
        }
        if let Some(education) = &data.education {
            println!("  {:<20} {}", "Education", education);
        }
    }

    println!();
    match record.document_requests.latest() {
        Some(latest) => {
            println!(
                "Latest document request ({}, {}):",
                latest.request_status,
                latest.requested_at.format("%Y-%m-%d %H:%M")
            );
            println!("  {}", latest.request_message);
            let earlier = record.document_requests.earlier();
            if !earlier.is_empty() {
                println!("Earlier requests: {}", earlier.len());
                for request in earlier.iter().rev() {
                    println!(
                        "  {} {}",
                        request.requested_at.format("%Y-%m-%d %H:%M"),
                        request.request_status
                    );
                }
            }
        }
        None => println!("No document requests yet."),
    }

    println!();
    if record.submitted_documents.is_empty() {
        println!("No documents submitted.");
    }
    for document_type in [DocumentType::Pan, DocumentType::Aadhaar] {
        for document in record.submitted_documents.of_type(document_type) {
            println!(
                "{:<13} {:<30} {:<9} {}",
                document_type.label(),
                document.document_filename,
                document.verification_status,
                document.id
            );
        }
    }
}
