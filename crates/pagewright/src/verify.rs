//! Soft assertions.
//!
//! [`Verify`] records failed assertions instead of stopping the test. Every
//! assertion runs even after earlier ones failed; [`Verify::check`] reports
//! all failures at once, in the order they were recorded, with the call site
//! of each.
//!
//! ```
//! use pagewright::Verify;
//!
//! let mut verify = Verify::new();
//! verify.are_equal(2, 1 + 1, "arithmetic");
//! verify.is_true(true, "still fine");
//! assert!(verify.check().is_ok());
//! ```

use std::fmt::{self, Debug, Display};
use std::panic::{self, AssertUnwindSafe, Location};

/// One recorded soft-assertion failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyFailure {
    /// Position in recording order, starting at 1
    pub index: usize,
    /// Assertion message
    pub message: String,
    /// Call site as `file:line:column`
    pub location: String,
}

impl Display for VerifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}) {} (at {})", self.index, self.message, self.location)
    }
}

/// All failures collected by one [`Verify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateVerificationFailure {
    /// Failures in recording order
    pub failures: Vec<VerifyFailure>,
}

impl Display for AggregateVerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} verification(s) failed:", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateVerificationFailure {}

type FailureHook = Box<dyn Fn(&VerifyFailure) + Send + Sync>;

/// Soft-assertion accumulator
#[derive(Default)]
pub struct Verify {
    failures: Vec<VerifyFailure>,
    on_failure: Option<FailureHook>,
}

impl Debug for Verify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verify")
            .field("failures", &self.failures)
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

fn with_message(base: String, message: &str) -> String {
    if message.is_empty() {
        base
    } else {
        format!("{base} {message}")
    }
}

impl Verify {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `hook` for every failure as it is recorded
    #[must_use]
    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&VerifyFailure) + Send + Sync + 'static,
    {
        self.on_failure = Some(Box::new(hook));
        self
    }

    /// Whether any assertion failed so far
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Failures recorded so far
    #[must_use]
    pub fn failures(&self) -> &[VerifyFailure] {
        &self.failures
    }

    fn record(&mut self, message: String, location: &Location<'_>) {
        let failure = VerifyFailure {
            index: self.failures.len() + 1,
            message,
            location: location.to_string(),
        };
        tracing::warn!(location = %failure.location, "{}", failure.message);
        if let Some(hook) = &self.on_failure {
            hook(&failure);
        }
        self.failures.push(failure);
    }

    /// Record `base` plus the caller's message at the caller's location
    #[track_caller]
    fn record_here(&mut self, base: String, message: &str) {
        self.record(with_message(base, message), Location::caller());
    }

    /// Record an unconditional failure
    #[track_caller]
    pub fn fail(&mut self, message: &str) {
        self.record_here("Assert.Fail failed.".to_string(), message);
    }

    #[track_caller]
    pub fn is_true(&mut self, condition: bool, message: &str) {
        if !condition {
            self.record_here("Assert.IsTrue failed.".to_string(), message);
        }
    }

    #[track_caller]
    pub fn is_false(&mut self, condition: bool, message: &str) {
        if condition {
            self.record_here("Assert.IsFalse failed.".to_string(), message);
        }
    }

    #[track_caller]
    pub fn are_equal<T: PartialEq + Debug>(&mut self, expected: T, actual: T, message: &str) {
        if expected != actual {
            let base = format!(
                "Assert.AreEqual failed. Expected:<{expected:?}>. Actual:<{actual:?}>."
            );
            self.record_here(base, message);
        }
    }

    #[track_caller]
    pub fn are_not_equal<T: PartialEq + Debug>(
        &mut self,
        not_expected: T,
        actual: T,
        message: &str,
    ) {
        if not_expected == actual {
            let base = format!(
                "Assert.AreNotEqual failed. \
                 Expected any value except:<{not_expected:?}>. Actual:<{actual:?}>."
            );
            self.record_here(base, message);
        }
    }

    /// Equality of two floats within `delta`
    #[track_caller]
    pub fn are_approx_equal(&mut self, expected: f64, actual: f64, delta: f64, message: &str) {
        if (expected - actual).abs() > delta {
            let base = format!(
                "Assert.AreEqual failed. Expected a difference no greater than <{delta}> \
                 between expected value <{expected}> and actual value <{actual}>."
            );
            self.record_here(base, message);
        }
    }

    /// String equality ignoring case
    #[track_caller]
    pub fn are_equal_ignore_case(&mut self, expected: &str, actual: &str, message: &str) {
        if expected.to_lowercase() != actual.to_lowercase() {
            let base = format!(
                "Assert.AreEqual failed. \
                 Expected:<{expected}>. Case is ignored. Actual:<{actual}>."
            );
            self.record_here(base, message);
        }
    }

    #[track_caller]
    pub fn is_some<T>(&mut self, value: &Option<T>, message: &str) {
        if value.is_none() {
            self.record_here("Assert.IsNotNull failed.".to_string(), message);
        }
    }

    #[track_caller]
    pub fn is_none<T: Debug>(&mut self, value: &Option<T>, message: &str) {
        if let Some(v) = value {
            self.record_here(format!("Assert.IsNull failed. Actual:<{v:?}>."), message);
        }
    }

    #[track_caller]
    pub fn is_ok<T, E: Display>(&mut self, result: &Result<T, E>, message: &str) {
        if let Err(err) = result {
            self.record_here(format!("Operation failed: {err}."), message);
        }
    }

    /// Record the error of a fallible step, passing its value through
    #[track_caller]
    pub fn that<T, E: Display>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.record(err.to_string(), Location::caller());
                None
            }
        }
    }

    #[track_caller]
    pub fn string_contains(&mut self, expected_segment: &str, actual: &str, message: &str) {
        if !actual.contains(expected_segment) {
            let base = format!(
                "The actual string '{actual}' does not contain \
                 expected string segment '{expected_segment}'."
            );
            self.record_here(base, message);
        }
    }

    /// Every expected value is present in `actual`
    #[track_caller]
    pub fn collection_contains<T: PartialEq + Debug>(
        &mut self,
        expected: &[T],
        actual: &[T],
        message: &str,
    ) {
        let missing: Vec<String> = expected
            .iter()
            .filter(|value| !actual.contains(value))
            .map(|value| format!("The following value is missing: {value:?}"))
            .collect();
        if !missing.is_empty() {
            let text = format!(
                "{}\n{message}\nActual values are: {actual:?}",
                missing.join("\n")
            );
            self.record(text, Location::caller());
        }
    }

    /// Collections hold the same items, optionally in any order
    #[track_caller]
    pub fn are_collections_equal<T: PartialEq + Debug>(
        &mut self,
        expected: &[T],
        actual: &[T],
        ignore_order: bool,
        message: &str,
    ) {
        let equal = if ignore_order {
            expected.len() == actual.len() && {
                let mut used = vec![false; actual.len()];
                expected.iter().all(|item| {
                    let slot = actual
                        .iter()
                        .enumerate()
                        .position(|(i, candidate)| !used[i] && candidate == item);
                    slot.map(|i| used[i] = true).is_some()
                })
            }
        } else {
            expected == actual
        };
        if !equal {
            let base = format!(
                "Collections differ. Expected:<{expected:?}>. Actual:<{actual:?}>."
            );
            self.record_here(base, message);
        }
    }

    #[track_caller]
    pub fn is_collection_empty<T: Debug>(&mut self, actual: &[T], message: &str) {
        if !actual.is_empty() {
            let base = format!(
                "Assert.AreEqual failed. Expected:<0>. Actual:<{}>.",
                actual.len()
            );
            self.record_here(base, message);
        }
    }

    #[track_caller]
    pub fn is_collection_not_empty<T>(&mut self, actual: &[T], message: &str) {
        if actual.is_empty() {
            let base = "Assert.AreNotEqual failed. Expected any value except:<0>. Actual:<0>.";
            self.record_here(base.to_string(), message);
        }
    }

    /// Run a block of hard assertions, recording a panic as a failure
    #[track_caller]
    pub fn catching<F: FnOnce()>(&mut self, block: F) {
        let location = Location::caller();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(block)) {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "assertion panicked".to_string());
            self.record(message, location);
        }
    }

    /// Report and clear every recorded failure
    pub fn check(&mut self) -> Result<(), AggregateVerificationFailure> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(AggregateVerificationFailure {
            failures: std::mem::take(&mut self.failures),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    mod check_tests {
        use super::*;

        #[test]
        fn test_check_without_failures_is_noop() {
            let mut verify = Verify::new();
            verify.is_true(true, "");
            verify.are_equal("a", "a", "");
            assert!(verify.check().is_ok());
        }

        #[test]
        fn test_check_reports_all_failures_in_order() {
            let mut verify = Verify::new();
            verify.is_true(false, "first");
            verify.are_equal(1, 2, "second");
            verify.string_contains("xyz", "abc", "third");
            let aggregate = verify.check().unwrap_err();
            assert_eq!(aggregate.failures.len(), 3);
            assert!(aggregate.failures[0].message.ends_with("first"));
            assert!(aggregate.failures[1]
                .message
                .contains("Expected:<1>. Actual:<2>."));
            assert!(aggregate.failures[2].message.contains("third"));
            let indices: Vec<usize> = aggregate.failures.iter().map(|f| f.index).collect();
            assert_eq!(indices, vec![1, 2, 3]);
        }

        #[test]
        fn test_check_drains() {
            let mut verify = Verify::new();
            verify.fail("boom");
            assert!(verify.check().is_err());
            assert!(verify.check().is_ok());
        }

        #[test]
        fn test_failure_records_call_site() {
            let mut verify = Verify::new();
            verify.is_false(true, "");
            let aggregate = verify.check().unwrap_err();
            assert!(aggregate.failures[0].location.contains("verify.rs"));
        }

        #[test]
        fn test_aggregate_display_lists_every_failure() {
            let mut verify = Verify::new();
            verify.fail("one");
            verify.fail("two");
            let text = verify.check().unwrap_err().to_string();
            assert!(text.starts_with("2 verification(s) failed:"));
            assert!(text.contains("1) Assert.Fail failed. one"));
            assert!(text.contains("2) Assert.Fail failed. two"));
        }
    }

    mod assertion_tests {
        use super::*;

        #[test]
        fn test_collections_order_insensitive() {
            let mut verify = Verify::new();
            verify.are_collections_equal(&[1, 2, 2, 3], &[3, 2, 1, 2], true, "");
            assert!(!verify.has_failures());
            verify.are_collections_equal(&[1, 2, 2], &[1, 1, 2], true, "");
            verify.are_collections_equal(&[1, 2], &[2, 1], false, "");
            assert_eq!(verify.failures().len(), 2);
        }

        #[test]
        fn test_collection_contains_lists_missing() {
            let mut verify = Verify::new();
            verify.collection_contains(&["a", "b", "c"], &["a"], "menu items");
            let failure = &verify.failures()[0];
            assert!(failure.message.contains("missing: \"b\""));
            assert!(failure.message.contains("missing: \"c\""));
        }

        #[test]
        fn test_option_and_result_assertions() {
            let mut verify = Verify::new();
            verify.is_some(&Some(1), "");
            verify.is_none::<i32>(&None, "");
            verify.is_ok(&Ok::<_, String>(()), "");
            assert!(!verify.has_failures());
            verify.is_some::<i32>(&None, "");
            verify.is_ok(&Err::<(), _>("nope"), "");
            assert_eq!(verify.failures().len(), 2);
        }

        #[test]
        fn test_that_passes_value_through() {
            let mut verify = Verify::new();
            assert_eq!(verify.that(Ok::<_, String>(5)), Some(5));
            assert_eq!(verify.that(Err::<i32, _>("bad".to_string())), None);
            assert_eq!(verify.failures()[0].message, "bad");
        }

        #[test]
        fn test_catching_records_panic_and_continues() {
            let mut verify = Verify::new();
            verify.catching(|| assert_eq!(1, 2, "hard failure"));
            verify.is_true(false, "after");
            let aggregate = verify.check().unwrap_err();
            assert_eq!(aggregate.failures.len(), 2);
            assert!(aggregate.failures[0].message.contains("hard failure"));
        }

        #[test]
        fn test_approx_and_ignore_case() {
            let mut verify = Verify::new();
            verify.are_approx_equal(1.0, 1.05, 0.1, "");
            verify.are_equal_ignore_case("Hello", "hELLO", "");
            assert!(!verify.has_failures());
        }

        #[test]
        fn test_on_failure_hook_sees_each_failure() {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let hook = move |f: &VerifyFailure| sink.lock().unwrap().push(f.index);
            let mut verify = Verify::new().on_failure(hook);
            verify.fail("a");
            verify.is_true(true, "");
            verify.fail("b");
            assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        }
    }
}
