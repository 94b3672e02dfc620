// src/console/listing.rs
//! Candidate listing controller: pagination, status filter and the
//! currently shown page.

use tracing::{debug, warn};

use super::view::ViewState;
use crate::candidates::validators::ListQueryValidator;
use crate::candidates::{CandidatePage, CandidateSummary, ExtractionStatus, ListQuery};
use crate::common::{ConsoleConfig, ConsoleError, RequestSequence, Ticket, Validator};
use crate::services::CandidateGateway;

/// A listing request that has been issued but not yet answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingQuery {
    pub ticket: Ticket,
    pub query: ListQuery,
}

#[derive(Debug)]
pub struct CandidateListing {
    page: u32,
    page_size: u32,
    status_filter: Option<ExtractionStatus>,
    total_pages: u32,
    view: ViewState<Vec<CandidateSummary>>,
    sequence: RequestSequence,
}

impl CandidateListing {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            status_filter: None,
            total_pages: 1,
            view: ViewState::Idle,
            sequence: RequestSequence::new(),
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config.page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn status_filter(&self) -> Option<ExtractionStatus> {
        self.status_filter
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn view(&self) -> &ViewState<Vec<CandidateSummary>> {
        &self.view
    }

    /// Rows of the page currently shown, empty unless the view is ready.
    pub fn candidates(&self) -> &[CandidateSummary] {
        self.view.ready().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.page, self.page_size, self.status_filter)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Re-issues the current query.
    pub fn refresh(&mut self) -> PendingQuery {
        let ticket = self.sequence.issue();
        self.view = ViewState::Loading;
        let query = self.query();
        debug!(
            ticket = %ticket,
            page = query.page,
            limit = query.limit,
            status = query.status.map(|s| s.as_str()).unwrap_or("all"),
            "Listing query issued"
        );
        PendingQuery { ticket, query }
    }

    /// Changes the filter. The page always goes back to 1, even when the
    /// filter is unchanged.
    pub fn set_status_filter(&mut self, status: Option<ExtractionStatus>) -> PendingQuery {
        self.status_filter = status;
        self.page = 1;
        self.refresh()
    }

    /// Moves to `page`. A page past the end is allowed and shows as empty.
    pub fn set_page(&mut self, page: u32) -> PendingQuery {
        self.page = page.max(1);
        self.refresh()
    }

    pub fn next_page(&mut self) -> Option<PendingQuery> {
        if !self.has_next_page() {
            return None;
        }
        Some(self.set_page(self.page + 1))
    }

    pub fn previous_page(&mut self) -> Option<PendingQuery> {
        if !self.has_previous_page() {
            return None;
        }
        Some(self.set_page((self.page - 1).min(self.total_pages)))
    }

    /// Applies a response if it answers the latest query. Returns whether
    /// it was applied.
    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: Result<CandidatePage, ConsoleError>,
    ) -> bool {
        if !self.sequence.is_current(ticket) {
            warn!(ticket = %ticket, "Discarding stale candidate listing response");
            return false;
        }

        match result {
            Ok(page) => {
                self.total_pages = page.total_pages();
                debug!(
                    ticket = %ticket,
                    count = page.candidates.len(),
                    total_pages = self.total_pages,
                    "Candidate page loaded"
                );
                self.view = if page.candidates.is_empty() {
                    ViewState::Empty
                } else {
                    ViewState::Ready(page.candidates)
                };
            }
            Err(e) => {
                warn!(ticket = %ticket, error = %e, "Failed to load candidate listing");
                self.view = ViewState::Failed(e.user_message());
            }
        }
        true
    }

    /// Runs an issued query against the gateway and applies the answer.
    pub async fn fetch(&mut self, gateway: &dyn CandidateGateway, pending: PendingQuery) -> bool {
        let result = match ListQueryValidator.validate(&pending.query).into_result() {
            Ok(()) => gateway.list_candidates(pending.query).await,
            Err(validation) => Err(ConsoleError::from(validation)),
        };
        self.apply(pending.ticket, result)
    }

    /// Refreshes the current page.
    pub async fn load(&mut self, gateway: &dyn CandidateGateway) -> bool {
        let pending = self.refresh();
        self.fetch(gateway, pending).await
    }
}
