//! Validation context
//!
//! Carried from the proxy's dispatch layer into every validation call for
//! tracing. Validation always runs to completion; the deadline is only
//! reported, never enforced.

use std::time::{Duration, Instant};

use uuid::Uuid;

/// Per-write context handed to the validators
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Deadline propagated from the client, if any
    deadline: Option<Instant>,

    /// Start time for duration tracking
    started_at: Instant,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            started_at: Instant::now(),
        }
    }

    /// Reuse the request ID assigned by the caller
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(self.started_at + timeout);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the propagated deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Get elapsed time in microseconds
    pub fn elapsed_us(&self) -> u128 {
        self.started_at.elapsed().as_micros()
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_get_distinct_ids() {
        assert_ne!(ValidationContext::new().request_id, ValidationContext::new().request_id);
    }

    #[test]
    fn test_caller_request_id_kept() {
        let id = Uuid::new_v4();
        assert_eq!(ValidationContext::new().with_request_id(id).request_id, id);
    }

    #[test]
    fn test_deadline() {
        let ctx = ValidationContext::new();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_expired());

        let ctx = ValidationContext::new().with_timeout(Duration::ZERO);
        assert!(ctx.is_expired());

        let ctx = ValidationContext::new().with_timeout(Duration::from_secs(3600));
        assert!(!ctx.is_expired());
    }
}
