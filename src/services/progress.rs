// src/services/progress.rs
//! Upload progress side channel.
//!
//! Progress is a whole percentage in `0..=100` that never decreases. It is
//! for operator feedback only; nothing depends on it for correctness.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct UploadProgress {
    sender: Arc<watch::Sender<u8>>,
}

impl UploadProgress {
    /// Creates a reporter and the receiver a UI can watch.
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (sender, receiver) = watch::channel(0);
        (
            Self {
                sender: Arc::new(sender),
            },
            receiver,
        )
    }

    /// A reporter nobody observes.
    pub fn unobserved() -> Self {
        Self::channel().0
    }

    /// Records `loaded` of `total` bytes transferred.
    pub fn record(&self, loaded: u64, total: u64) {
        self.advance(percent_of(loaded, total));
    }

    pub fn complete(&self) {
        self.advance(100);
    }

    pub fn current(&self) -> u8 {
        *self.sender.borrow()
    }

    fn advance(&self, percent: u8) {
        self.sender.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }
}

/// Rounded percentage, clamped to 100. An empty transfer counts as done.
pub fn percent_of(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (loaded as f64 * 100.0 / total as f64).round();
    percent.clamp(0.0, 100.0) as u8
}
