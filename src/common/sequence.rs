// src/common/sequence.rs
//! Per-resource request tokens. Only the response to the most recently
//! issued request for a resource may update that resource's view.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: u64,
    closed: bool,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new ticket, superseding every earlier one.
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        !self.closed && ticket.0 == self.issued
    }

    /// Makes every outstanding and future ticket stale.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let mut sequence = RequestSequence::new();
        let first = sequence.issue();
        let second = sequence.issue();

        assert!(first < second);
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }

    #[test]
    fn test_closed_sequence_rejects_everything() {
        let mut sequence = RequestSequence::new();
        let ticket = sequence.issue();
        sequence.close();

        assert!(!sequence.is_current(ticket));
        let later = sequence.issue();
        assert!(!sequence.is_current(later));
    }
}
