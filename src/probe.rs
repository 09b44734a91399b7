//! Smoke-test probes
//!
//! A probe repeats one API call a fixed number of times and stops at the
//! first failure. It is a connectivity check, not a retry policy.

use anyhow::Result;
use std::future::Future;
use std::io::{self, Write};

/// Calls made per probe
pub const PROBE_ATTEMPTS: usize = 5;

const SUCCESS_MARKER: &str = "✅";
const ERROR_MARKER: &str = "‼️ ";

/// One probe target
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub label: &'static str,
    pub error_prefix: &'static str,
}

pub const BILLING_PROBE: Probe = Probe {
    label: "billing",
    error_prefix: "Error listing cloud billing accounts",
};

pub const ORGANIZATIONS_PROBE: Probe = Probe {
    label: "org",
    error_prefix: "Error listing organizations",
};

/// Outcome of a probe run
#[derive(Debug)]
pub struct ProbeReport {
    pub attempts: usize,
    pub successes: usize,
    /// The error that stopped the probe, if any
    pub error: Option<anyhow::Error>,
}

impl ProbeReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Call `call` up to `attempts` times, stopping at the first error.
/// `on_success` is invoked with the 1-based attempt number after each success.
pub async fn run_probe<T, F, Fut, S>(attempts: usize, mut call: F, mut on_success: S) -> ProbeReport
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: FnMut(usize),
{
    let mut successes = 0;

    for attempt in 1..=attempts {
        match call().await {
            Ok(_) => {
                successes += 1;
                on_success(attempt);
            }
            Err(err) => {
                tracing::warn!("Probe failed on attempt {}/{}: {:#}", attempt, attempts, err);
                return ProbeReport {
                    attempts,
                    successes,
                    error: Some(err),
                };
            }
        }
    }

    ProbeReport {
        attempts,
        successes,
        error: None,
    }
}

/// Run a probe, writing a marker per success as it happens and the error,
/// if any, at the end of the line
pub async fn probe_and_print<W, T, F, Fut>(
    out: &mut W,
    probe: &Probe,
    attempts: usize,
    call: F,
) -> io::Result<ProbeReport>
where
    W: Write,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    write!(out, "Trying {} API... ", probe.label)?;
    out.flush()?;

    let report = run_probe(attempts, call, |_| {
        // Progress output is best effort; the report still carries the result
        let _ = write!(out, "{}", SUCCESS_MARKER);
        let _ = out.flush();
    })
    .await;

    if let Some(err) = &report.error {
        write!(out, "{} {}: {:#}", ERROR_MARKER, probe.error_prefix, err)?;
    }
    writeln!(out)?;
    out.flush()?;

    tracing::info!(
        "{} probe: {}/{} calls succeeded",
        probe.label,
        report.successes,
        report.attempts
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    #[test]
    fn test_all_attempts_succeed() {
        let calls = Cell::new(0);
        let report = tokio_test::block_on(run_probe(
            PROBE_ATTEMPTS,
            || {
                calls.set(calls.get() + 1);
                async { Ok(()) }
            },
            |_| {},
        ));

        assert_eq!(calls.get(), 5);
        assert_eq!(report.successes, 5);
        assert!(report.is_success());
    }

    #[test]
    fn test_stops_at_first_error() {
        let calls = Cell::new(0);
        let report = tokio_test::block_on(run_probe(
            PROBE_ATTEMPTS,
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 3 {
                        Err(anyhow!("boom"))
                    } else {
                        Ok(n)
                    }
                }
            },
            |_| {},
        ));

        assert_eq!(calls.get(), 3);
        assert_eq!(report.successes, 2);
        assert_eq!(report.error.unwrap().to_string(), "boom");
    }

    #[test]
    fn test_success_callback_sees_attempt_numbers() {
        let mut seen = Vec::new();
        tokio_test::block_on(run_probe(3, || async { Ok(()) }, |n| seen.push(n)));
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_attempts() {
        let report = tokio_test::block_on(run_probe(
            0,
            || async { Err::<(), _>(anyhow!("never called")) },
            |_| {},
        ));
        assert_eq!(report.successes, 0);
        assert!(report.is_success());
    }

    #[test]
    fn test_print_all_success() {
        let mut out = Vec::new();
        let report = tokio_test::block_on(probe_and_print(
            &mut out,
            &BILLING_PROBE,
            PROBE_ATTEMPTS,
            || async { Ok(()) },
        ))
        .unwrap();

        assert!(report.is_success());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Trying billing API... ✅✅✅✅✅\n"
        );
    }

    #[test]
    fn test_print_first_call_fails() {
        let mut out = Vec::new();
        let report = tokio_test::block_on(probe_and_print(
            &mut out,
            &ORGANIZATIONS_PROBE,
            PROBE_ATTEMPTS,
            || async { Err::<(), _>(anyhow!("API request failed: 403 Forbidden")) },
        ))
        .unwrap();

        assert_eq!(report.successes, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Trying org API... ‼️  Error listing organizations: API request failed: 403 Forbidden\n"
        );
    }

    #[test]
    fn test_print_includes_error_context() {
        let mut out = Vec::new();
        tokio_test::block_on(probe_and_print(&mut out, &BILLING_PROBE, 2, || async {
            Err::<(), _>(anyhow!("connection refused").context("Failed to send request"))
        }))
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Failed to send request: connection refused"));
    }
}
