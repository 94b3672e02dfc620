// src/console/view.rs

/// What a console screen currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    /// Nothing requested yet.
    Idle,
    /// A request is outstanding and nothing is loaded to show meanwhile.
    Loading,
    Ready(T),
    /// The request succeeded with nothing to show. Not an error.
    Empty,
    /// Terminal state for a missing resource.
    NotFound(String),
    Failed(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

impl<T> ViewState<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Message of a failed or not-found view.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::NotFound(message) | ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
