// src/candidates/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::confidence::{classify, BadgeVariant, ConfidenceTier};
use crate::common::helpers::{
    deserialize_opaque_id, deserialize_optional_opaque_id, deserialize_timestamp,
};

// ============================================================================
// Status Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExtractionStatus {
    pub const ALL: [ExtractionStatus; 4] = [
        ExtractionStatus::Pending,
        ExtractionStatus::Processing,
        ExtractionStatus::Completed,
        ExtractionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "pending",
            ExtractionStatus::Processing => "processing",
            ExtractionStatus::Completed => "completed",
            ExtractionStatus::Failed => "failed",
        }
    }

    /// Completed or failed; no further backend progress is expected.
    pub fn is_finished(&self) -> bool {
        matches!(self, ExtractionStatus::Completed | ExtractionStatus::Failed)
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            ExtractionStatus::Pending => BadgeVariant::Warning,
            ExtractionStatus::Processing => BadgeVariant::Info,
            ExtractionStatus::Completed => BadgeVariant::Success,
            ExtractionStatus::Failed => BadgeVariant::Error,
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtractionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown extraction status '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pan,
    Aadhaar,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pan => "pan",
            DocumentType::Aadhaar => "aadhaar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Pan => "PAN Card",
            DocumentType::Aadhaar => "Aadhaar Card",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pan" => Ok(DocumentType::Pan),
            "aadhaar" => Ok(DocumentType::Aadhaar),
            _ => Err(format!(
                "invalid document type '{}': must be \"pan\" or \"aadhaar\"",
                s
            )),
        }
    }
}

/// Outcome of identity-document verification. Only the external
/// verification process moves a document out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            VerificationStatus::Pending => BadgeVariant::Warning,
            VerificationStatus::Verified => BadgeVariant::Success,
            VerificationStatus::Rejected => BadgeVariant::Error,
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a document request was produced automatically at upload time or
/// by an operator. Older backends label operator requests `sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestOrigin {
    #[serde(rename = "auto-generated")]
    AutoGenerated,
    #[serde(rename = "manual", alias = "sent")]
    Manual,
}

impl RequestOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOrigin::AutoGenerated => "auto-generated",
            RequestOrigin::Manual => "manual",
        }
    }
}

impl fmt::Display for RequestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Extracted Data Models
// ============================================================================

/// A field the extractor scored. Either part may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ScoredField<T> {
    #[serde(default)]
    pub value: Option<T>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Extracted fields arrive either scored (`{"value": .., "confidence": ..}`)
/// or bare (a plain value, as years of experience does). A bare field has no
/// confidence; none is invented for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedField<T> {
    Scored(ScoredField<T>),
    Bare(Option<T>),
}

impl<T> Default for ExtractedField<T> {
    fn default() -> Self {
        ExtractedField::Bare(None)
    }
}

impl<T> ExtractedField<T> {
    pub fn scored(value: T, confidence: f64) -> Self {
        ExtractedField::Scored(ScoredField {
            value: Some(value),
            confidence: Some(confidence),
        })
    }

    pub fn bare(value: T) -> Self {
        ExtractedField::Bare(Some(value))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ExtractedField::Scored(field) => field.value.as_ref(),
            ExtractedField::Bare(value) => value.as_ref(),
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            ExtractedField::Scored(field) => field.confidence,
            ExtractedField::Bare(_) => None,
        }
    }

    pub fn tier(&self) -> ConfidenceTier {
        classify(self.confidence())
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, ExtractedField::Scored(_))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub full_name: ExtractedField<String>,
    #[serde(default)]
    pub email: ExtractedField<String>,
    #[serde(default)]
    pub phone: ExtractedField<String>,
    #[serde(default)]
    pub current_company: ExtractedField<String>,
    #[serde(default)]
    pub designation: ExtractedField<String>,
    #[serde(default)]
    pub skills: ExtractedField<Vec<String>>,
    #[serde(default)]
    pub years_of_experience: ExtractedField<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
}

/// One renderable row of extracted data.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub label: &'static str,
    pub value: Option<String>,
    pub confidence: Option<f64>,
    pub tier: ConfidenceTier,
}

impl ExtractedData {
    pub fn display_rows(&self) -> Vec<FieldRow> {
        fn text_row(label: &'static str, field: &ExtractedField<String>) -> FieldRow {
            FieldRow {
                label,
                value: field.value().filter(|v| !v.trim().is_empty()).cloned(),
                confidence: field.confidence(),
                tier: field.tier(),
            }
        }

        let skills = self
            .skills
            .value()
            .filter(|skills| !skills.is_empty())
            .map(|skills| skills.join(", "));
        let years = self.years_of_experience.value().map(|years| {
            if years.fract() == 0.0 {
                format!("{} years", *years as i64)
            } else {
                format!("{:.1} years", years)
            }
        });

        vec![
            text_row("Full Name", &self.full_name),
            text_row("Email", &self.email),
            text_row("Phone", &self.phone),
            text_row("Current Company", &self.current_company),
            text_row("Designation", &self.designation),
            FieldRow {
                label: "Skills",
                value: skills,
                confidence: self.skills.confidence(),
                tier: self.skills.tier(),
            },
            FieldRow {
                label: "Years of Experience",
                value: years,
                confidence: self.years_of_experience.confidence(),
                tier: self.years_of_experience.tier(),
            },
        ]
    }
}

/// Where a candidate's resume extraction stands. Extracted data exists only
/// in the `Completed` state.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Pending,
    Processing,
    Failed,
    Completed(Box<ExtractedData>),
}

impl Extraction {
    pub fn status(&self) -> ExtractionStatus {
        match self {
            Extraction::Pending => ExtractionStatus::Pending,
            Extraction::Processing => ExtractionStatus::Processing,
            Extraction::Failed => ExtractionStatus::Failed,
            Extraction::Completed(_) => ExtractionStatus::Completed,
        }
    }

    pub fn data(&self) -> Option<&ExtractedData> {
        match self {
            Extraction::Completed(data) => Some(data),
            _ => None,
        }
    }
}

// ============================================================================
// Document Request Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequest {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    pub request_message: String,
    pub request_status: RequestOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub requested_at: DateTime<Utc>,
}

/// Append-only history of document requests, in append order. The last
/// entry is the current request; everything before it is history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestHistory(Vec<DocumentRequest>);

impl RequestHistory {
    pub fn new(requests: Vec<DocumentRequest>) -> Self {
        Self(requests)
    }

    pub fn latest(&self) -> Option<&DocumentRequest> {
        self.0.last()
    }

    /// Requests superseded by the latest one, oldest first.
    pub fn earlier(&self) -> &[DocumentRequest] {
        match self.0.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentRequest> {
        self.0.iter()
    }

    pub fn push(&mut self, request: DocumentRequest) {
        self.0.push(request);
    }
}

// ============================================================================
// Submitted Document Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedDocument {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    pub document_type: DocumentType,
    pub document_filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub verification_status: VerificationStatus,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub submitted_at: DateTime<Utc>,
}

/// Submitted documents keyed by id. Ordering carries no meaning.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct SubmittedDocuments(Vec<SubmittedDocument>);

impl SubmittedDocuments {
    /// Builds the set, keeping the first document seen for each id.
    pub fn new(documents: Vec<SubmittedDocument>) -> Self {
        let mut unique: Vec<SubmittedDocument> = Vec::with_capacity(documents.len());
        for document in documents {
            if !unique.iter().any(|d| d.id == document.id) {
                unique.push(document);
            }
        }
        Self(unique)
    }

    pub fn get(&self, id: &str) -> Option<&SubmittedDocument> {
        self.0.iter().find(|d| d.id == id)
    }

    pub fn of_type(&self, document_type: DocumentType) -> impl Iterator<Item = &SubmittedDocument> {
        self.0
            .iter()
            .filter(move |d| d.document_type == document_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubmittedDocument> {
        self.0.iter()
    }

    pub fn insert(&mut self, document: SubmittedDocument) {
        self.0.retain(|d| d.id != document.id);
        self.0.push(document);
    }
}

impl<'de> Deserialize<'de> for SubmittedDocuments {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<SubmittedDocument>::deserialize(deserializer).map(SubmittedDocuments::new)
    }
}

// ============================================================================
// Candidate Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CandidateRecordWire", into = "CandidateRecordWire")]
pub struct CandidateRecord {
    pub id: String,
    pub resume_filename: String,
    pub upload_date: DateTime<Utc>,
    pub extraction: Extraction,
    pub document_requests: RequestHistory,
    pub submitted_documents: SubmittedDocuments,
}

impl CandidateRecord {
    pub fn extraction_status(&self) -> ExtractionStatus {
        self.extraction.status()
    }

    pub fn extracted_data(&self) -> Option<&ExtractedData> {
        self.extraction.data()
    }

    /// Heading for the profile: the extracted name when there is one.
    pub fn display_name(&self) -> &str {
        self.extracted_data()
            .and_then(|data| data.full_name.value())
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Candidate Profile")
    }
}

/// Shape of a candidate on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandidateRecordWire {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    id: String,
    resume_filename: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    upload_date: DateTime<Utc>,
    extraction_status: ExtractionStatus,
    #[serde(default)]
    extracted_data: Option<ExtractedData>,
    #[serde(default)]
    document_requests: RequestHistory,
    #[serde(default)]
    submitted_documents: SubmittedDocuments,
}

impl TryFrom<CandidateRecordWire> for CandidateRecord {
    type Error = String;

    fn try_from(wire: CandidateRecordWire) -> Result<Self, Self::Error> {
        let extraction = match (wire.extraction_status, wire.extracted_data) {
            (ExtractionStatus::Completed, Some(data)) => Extraction::Completed(Box::new(data)),
            (ExtractionStatus::Completed, None) => {
                return Err(format!(
                    "candidate {} is completed but carries no extracted_data",
                    wire.id
                ))
            }
            (status, data) => {
                if data.is_some() {
                    tracing::warn!(
                        candidate_id = %wire.id,
                        status = %status,
                        "Ignoring extracted_data on a candidate whose extraction is not completed"
                    );
                }
                match status {
                    ExtractionStatus::Pending => Extraction::Pending,
                    ExtractionStatus::Processing => Extraction::Processing,
                    _ => Extraction::Failed,
                }
            }
        };

        Ok(CandidateRecord {
            id: wire.id,
            resume_filename: wire.resume_filename,
            upload_date: wire.upload_date,
            extraction,
            document_requests: wire.document_requests,
            submitted_documents: wire.submitted_documents,
        })
    }
}

impl From<CandidateRecord> for CandidateRecordWire {
    fn from(record: CandidateRecord) -> Self {
        let extraction_status = record.extraction.status();
        let extracted_data = match record.extraction {
            Extraction::Completed(data) => Some(*data),
            _ => None,
        };
        CandidateRecordWire {
            id: record.id,
            resume_filename: record.resume_filename,
            upload_date: record.upload_date,
            extraction_status,
            extracted_data,
            document_requests: record.document_requests,
            submitted_documents: record.submitted_documents,
        }
    }
}

/// A row of the candidate listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    pub resume_filename: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub upload_date: DateTime<Utc>,
    pub extraction_status: ExtractionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePage {
    #[serde(default)]
    pub candidates: Vec<CandidateSummary>,
    #[serde(default)]
    pub pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CandidatePage {
    /// Page count, never less than one even for an empty listing.
    pub fn total_pages(&self) -> u32 {
        self.pages.max(1)
    }
}

/// Parameters of one listing request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<ExtractionStatus>,
}

impl ListQuery {
    pub fn new(page: u32, limit: u32, status: Option<ExtractionStatus>) -> Self {
        Self {
            page,
            limit,
            status,
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}

// ============================================================================
// Gateway Acknowledgments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    pub candidate_id: String,
    #[serde(default)]
    pub auto_request_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_request_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_status: Option<ExtractionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Acknowledgment of a document request. The preview is display text for
/// the moment; the persisted message may differ from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequestReceipt {
    pub request_preview: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_opaque_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_opaque_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
