//! Bounded retry with a fixed pause between attempts.
//!
//! The retry decision is a pure function of the error's classification:
//! transport faults are retried, structural and configuration errors never
//! are. Pauses are blocking sleeps; this tool is a short-lived process.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// Classifies whether an error is worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `op` up to `max_retries + 1` times, sleeping `pause` between
/// attempts. A success or a non-retryable error returns immediately;
/// exhausting the budget returns the last fault.
pub fn with_retry<T, E>(
    label: &str,
    max_retries: u32,
    pause: Duration,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, E>
where
    E: Retryable + Display,
{
    let attempts = max_retries + 1;
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => {
                debug!("{label}: attempt {attempt}/{attempts} succeeded");
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < attempts => {
                warn!("{label}: attempt {attempt}/{attempts} failed: {err}; retrying in {pause:?}");
                thread::sleep(pause);
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("attempt loop always returns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn transient_faults_then_success() {
        let mut calls = 0;
        let result = with_retry("test", 2, Duration::ZERO, || {
            calls += 1;
            if calls < 3 {
                Err(Error::Transport("connection refused".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn success_short_circuits() {
        let mut calls = 0;
        let result: Result<_, Error> = with_retry("test", 5, Duration::ZERO, || {
            calls += 1;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(calls, 1);
    }

    #[test]
    fn structural_error_is_never_retried() {
        let mut calls = 0;
        let result: Result<(), Error> = with_retry("test", 5, Duration::ZERO, || {
            calls += 1;
            Err(Error::MissingHost)
        });
        assert!(matches!(result, Err(Error::MissingHost)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn exhaustion_surfaces_last_fault() {
        let mut calls = 0;
        let result: Result<(), Error> = with_retry("test", 2, Duration::ZERO, || {
            calls += 1;
            Err(Error::Transport(format!("fault {calls}")))
        });
        assert_eq!(calls, 3);
        match result {
            Err(Error::Transport(msg)) => assert_eq!(msg, "fault 3"),
            other => panic!("expected transport fault, got {other:?}"),
        }
    }

    #[test]
    fn pauses_happen_between_attempts_only() {
        let pause = Duration::from_millis(20);
        let started = std::time::Instant::now();
        let mut calls = 0;
        let result = with_retry("test", 2, pause, || {
            calls += 1;
            if calls < 3 {
                Err(Error::Transport("timeout".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        // Two failures -> exactly two pauses; the success consumes none.
        assert!(started.elapsed() >= pause * 2);
    }
}
