//! Per-request correlation context
//!
//! An explicit context value threaded through call sites, including into
//! worker tasks at submission time. Carries the correlation id for the life
//! of a request and an optional deadline for outbound calls.

use std::time::{Duration, Instant};

use uuid::Uuid;

/// Correlation context for one external request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id (X-Request-ID header or synthesized)
    pub request_id: String,
    /// Absolute deadline for the request, when one applies
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Create a context with a caller-supplied correlation id
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: None,
        }
    }

    /// Create a context with a synthesized correlation id
    pub fn synthesized() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Create from an optional header value, synthesizing when absent or empty
    pub fn from_header(header: Option<&str>) -> Self {
        match header {
            Some(id) if !id.trim().is_empty() => Self::new(id.trim()),
            _ => Self::synthesized(),
        }
    }

    /// Attach a deadline relative to now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Same correlation id, no deadline. Worker tasks outlive the request
    /// that spawned them: once intent is persisted, application proceeds
    /// regardless of the original request's deadline.
    pub fn detached(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            deadline: None,
        }
    }

    /// Time left until the deadline. `None` when no deadline applies,
    /// `Some(ZERO)` when it has already passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has elapsed
    pub fn expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_present() {
        let ctx = RequestContext::from_header(Some("req-42"));
        assert_eq!(ctx.request_id, "req-42");
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn test_from_header_absent_synthesizes() {
        let ctx = RequestContext::from_header(None);
        assert!(!ctx.request_id.is_empty());

        let blank = RequestContext::from_header(Some("   "));
        assert!(!blank.request_id.is_empty());
        assert_ne!(blank.request_id, "   ");
    }

    #[test]
    fn test_detached_keeps_id_drops_deadline() {
        let ctx = RequestContext::new("req-7").with_timeout(Duration::ZERO);
        assert!(ctx.expired());

        let detached = ctx.detached();
        assert_eq!(detached.request_id, "req-7");
        assert!(detached.remaining().is_none());
        assert!(!detached.expired());
    }

    #[test]
    fn test_deadline() {
        let ctx = RequestContext::synthesized().with_timeout(Duration::from_secs(60));
        assert!(!ctx.expired());
        let remaining = ctx.remaining().unwrap();
        assert!(remaining <= Duration::from_secs(60));

        let expired = RequestContext::synthesized().with_timeout(Duration::ZERO);
        assert!(expired.expired());
    }
}
