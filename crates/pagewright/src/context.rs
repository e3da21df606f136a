//! Per-test context.
//!
//! A `TestContext` is created at the start of a test and passed to whatever
//! needs to log or verify. It owns the test's [`Verify`] and collects log
//! lines; `finish` turns it into a [`TestReport`].

use crate::verify::{AggregateVerificationFailure, Verify};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

/// Final state of a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { failure: String },
    Inconclusive { reason: String },
}

/// Summary produced by [`TestContext::finish`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub name: String,
    pub outcome: Outcome,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub log: Vec<String>,
}

impl TestReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Explicit replacement for a thread-local "current test"
#[derive(Debug)]
pub struct TestContext {
    name: String,
    started: Instant,
    verify: Verify,
    log: Vec<String>,
    inconclusive: Option<String>,
}

impl TestContext {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
            verify: Verify::new(),
            log: Vec::new(),
            inconclusive: None,
        }
    }

    /// Use a pre-configured verifier
    #[must_use]
    pub fn with_verify(mut self, verify: Verify) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The test's soft assertions
    pub fn verify(&mut self) -> &mut Verify {
        &mut self.verify
    }

    /// Append a line to the test log
    pub fn write_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(test = %self.name, "{line}");
        self.log.push(line);
    }

    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Mark the test inconclusive; the first reason wins
    pub fn inconclusive(&mut self, reason: impl Into<String>) {
        if self.inconclusive.is_none() {
            let reason = reason.into();
            self.write_line(format!("Inconclusive: {reason}"));
            self.inconclusive = Some(reason);
        }
    }

    /// Check soft assertions now, without ending the test
    pub fn check(&mut self) -> Result<(), AggregateVerificationFailure> {
        self.verify.check()
    }

    /// End the test.
    ///
    /// Failed verifications take precedence over an inconclusive mark.
    #[must_use]
    pub fn finish(mut self) -> TestReport {
        let outcome = match (self.verify.check(), self.inconclusive.take()) {
            (Err(failure), _) => Outcome::Failed {
                failure: failure.to_string(),
            },
            (Ok(()), Some(reason)) => Outcome::Inconclusive { reason },
            (Ok(()), None) => Outcome::Passed,
        };
        TestReport {
            name: self.name,
            outcome,
            duration: self.started.elapsed(),
            log: self.log,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_report() {
        let mut ctx = TestContext::new("login works");
        ctx.write_line("Open login page");
        ctx.verify().is_true(true, "");
        let report = ctx.finish();
        assert!(report.passed());
        assert_eq!(report.log, vec!["Open login page"]);
    }

    #[test]
    fn test_failed_verification_wins_over_inconclusive() {
        let mut ctx = TestContext::new("t");
        ctx.inconclusive("environment not ready");
        ctx.verify().fail("broken");
        let report = ctx.finish();
        let Outcome::Failed { failure } = &report.outcome else {
            panic!("expected a failure, got {:?}", report.outcome);
        };
        assert!(failure.contains("broken"));
    }

    #[test]
    fn test_inconclusive_keeps_first_reason() {
        let mut ctx = TestContext::new("t");
        ctx.inconclusive("first");
        ctx.inconclusive("second");
        let report = ctx.finish();
        assert_eq!(
            report.outcome,
            Outcome::Inconclusive {
                reason: "first".to_string()
            }
        );
        assert_eq!(report.log, vec!["Inconclusive: first"]);
    }

    #[test]
    fn test_report_serializes_duration_in_ms() {
        let report = TestReport {
            name: "t".into(),
            outcome: Outcome::Passed,
            duration: Duration::from_millis(1500),
            log: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["duration"], 1500);
        assert_eq!(json["outcome"]["status"], "passed");
    }
}
