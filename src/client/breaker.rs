//! Circuit breaker
//!
//! A stateful gate in front of the outbound ledger call. Tracks a rolling
//! window of call outcomes; once the failure rate crosses the configured
//! threshold the breaker opens and calls fail fast without touching the
//! network. After `open_duration` a bounded number of half-open probes are
//! allowed through: one success closes the breaker, one failure re-opens it.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::BreakerConfig;

/// Observable breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

enum State {
    Closed,
    Open { until: Instant },
    HalfOpen { permits_left: u32 },
}

struct Inner {
    state: State,
    /// Rolling outcome window; `true` marks a failure
    window: VecDeque<bool>,
}

pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        let window = VecDeque::with_capacity(config.window_size);
        Self {
            config,
            inner: Mutex::new(Inner {
                state: State::Closed,
                window,
            }),
        }
    }

    /// Ask permission for one outbound call.
    ///
    /// Returns `false` when the call must fail fast (`Unavailable`).
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            State::Closed => true,
            State::Open { until } => {
                if Instant::now() >= until {
                    // Open interval elapsed: move to half-open and admit a probe
                    info!("Circuit breaker half-open, probing");
                    inner.state = State::HalfOpen {
                        permits_left: self.config.half_open_probes - 1,
                    };
                    true
                } else {
                    false
                }
            }
            State::HalfOpen { permits_left } => {
                if permits_left > 0 {
                    inner.state = State::HalfOpen {
                        permits_left: permits_left - 1,
                    };
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call outcome (deterministic 4xx rejections count
    /// here too: the service answered)
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            State::HalfOpen { .. } => {
                info!("Circuit breaker closed after successful probe");
                inner.state = State::Closed;
                inner.window.clear();
            }
            State::Closed => {
                Self::push_outcome(&mut inner.window, self.config.window_size, false);
            }
            State::Open { .. } => {}
        }
    }

    /// Record a failed call outcome (5xx, connect error, timeout)
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            State::HalfOpen { .. } => {
                warn!("Circuit breaker re-opened after failed probe");
                inner.window.clear();
                inner.state = State::Open {
                    until: Instant::now() + self.config.open_duration(),
                };
            }
            State::Closed => {
                Self::push_outcome(&mut inner.window, self.config.window_size, true);
                if inner.window.len() >= self.config.window_size {
                    let failures = inner.window.iter().filter(|f| **f).count();
                    let rate = failures as f64 / inner.window.len() as f64;
                    if rate >= self.config.failure_rate_threshold {
                        warn!(
                            failure_rate = rate,
                            threshold = self.config.failure_rate_threshold,
                            "Circuit breaker opened"
                        );
                        inner.window.clear();
                        inner.state = State::Open {
                            until: Instant::now() + self.config.open_duration(),
                        };
                    }
                }
            }
            State::Open { .. } => {}
        }
    }

    pub fn state(&self) -> BreakerState {
        match self.inner.lock().unwrap().state {
            State::Closed => BreakerState::Closed,
            State::Open { .. } => BreakerState::Open,
            State::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }

    fn push_outcome(window: &mut VecDeque<bool>, capacity: usize, failed: bool) {
        if window.len() == capacity {
            window.pop_front();
        }
        window.push_back(failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn breaker(window_size: usize, threshold: f64, open_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(BreakerConfig {
            failure_rate_threshold: threshold,
            window_size,
            open_duration_ms: open_ms,
            half_open_probes: 1,
        })
    }

    #[test]
    fn test_stays_closed_under_threshold() {
        let cb = breaker(4, 0.75, 1_000);

        for _ in 0..10 {
            assert!(cb.try_acquire());
            cb.record_success();
        }
        // Two failures in a window of four: rate 0.5 < 0.75
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert!(cb.try_acquire());
    }

    #[test]
    fn test_opens_at_threshold_and_fails_fast() {
        let cb = breaker(4, 0.5, 60_000);

        cb.record_success();
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
        cb.record_failure();

        assert_eq!(cb.state(), BreakerState::Open);
        assert!(!cb.try_acquire());
        assert!(!cb.try_acquire());
    }

    #[test]
    fn test_half_open_probe_closes_on_success() {
        let cb = breaker(2, 0.5, 10);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);

        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.try_acquire()); // the probe
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        assert!(!cb.try_acquire()); // permits exhausted

        cb.record_success();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert!(cb.try_acquire());
    }

    #[test]
    fn test_half_open_probe_reopens_on_failure() {
        let cb = breaker(2, 0.5, 10);

        cb.record_failure();
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.try_acquire());

        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);
        assert!(!cb.try_acquire());
    }

    #[test]
    fn test_window_is_rolling() {
        let cb = breaker(4, 1.0, 60_000);

        // Four failures trip a 1.0 threshold...
        cb.record_failure();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);

        // ...but successes roll the old failures out first
        cb.record_success();
        cb.record_success();
        cb.record_success();
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
    }
}
