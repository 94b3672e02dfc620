// src/console/mod.rs
//
// State controllers driven by an operator front end. They own no I/O of
// their own; every backend call goes through a `CandidateGateway`.

pub mod listing;
pub mod profile;
pub mod upload;
pub mod view;


pub use listing::{CandidateListing, PendingQuery};
pub use profile::{CandidateProfile, PendingAction, ProfileAction};
pub use upload::{ResumeUploader, UploadState};
pub use view::ViewState;
