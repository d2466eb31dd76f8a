use std::fmt::Display;
use std::time::Duration;
use log::warn;

use crate::delay_manager;

/// Runs `operation` until it succeeds or `max_attempts` calls have failed.
///
/// The operation receives the 1-based attempt number. Between attempts the
/// controller sleeps for the same fixed `delay`. When every attempt fails the
/// last error is returned. A `max_attempts` of zero still makes one call.
///
/// Side effects of failed attempts are not rolled back; a navigation that timed
/// out half way may have left the page in any state.
pub fn attempt<T, E, F>(mut operation: F, max_attempts: u32, delay: Duration) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt_no = 1;
    loop {
        match operation(attempt_no) {
            Ok(value) => return Ok(value),
            Err(e) if attempt_no < max_attempts => {
                warn!("Attempt {}/{} failed: {}", attempt_no, max_attempts, e);
                delay_manager::retry_delay(delay);
                attempt_no += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_on_third_attempt() {
        let mut calls = 0;
        let result: Result<&str, String> = attempt(
            |n| {
                calls += 1;
                if n < 3 {
                    Err(format!("failure {}", n))
                } else {
                    Ok("loaded")
                }
            },
            3,
            Duration::ZERO,
        );
        assert_eq!(result, Ok("loaded"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), String> = attempt(
            |n| {
                calls += 1;
                Err(format!("failure {}", n))
            },
            3,
            Duration::ZERO,
        );
        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn first_success_stops_immediately() {
        let mut calls = 0;
        let result: Result<u32, String> = attempt(
            |n| {
                calls += 1;
                Ok(n)
            },
            3,
            Duration::ZERO,
        );
        assert_eq!(result, Ok(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_attempts_still_calls_once() {
        let mut calls = 0;
        let result: Result<(), &str> = attempt(
            |_| {
                calls += 1;
                Err("nope")
            },
            0,
            Duration::ZERO,
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
