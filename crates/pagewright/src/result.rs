//! Result and error types for Pagewright.

use crate::verify::AggregateVerificationFailure;
use thiserror::Error;

/// Result type for Pagewright operations
pub type PagewrightResult<T> = Result<T, PagewrightError>;

/// Errors that can occur in Pagewright
#[derive(Debug, Error)]
pub enum PagewrightError {
    /// No element matched before the locator gave up
    #[error("Unable to locate element {selector} within {timeout_ms}ms")]
    NotFound {
        /// Selector description
        selector: String,
        /// Time spent polling
        timeout_ms: u64,
    },

    /// A previously resolved element is no longer attached to the DOM
    #[error("Stale element reference: {selector}")]
    StaleReference {
        /// Selector or element id
        selector: String,
    },

    /// Element exists but was rejected by a usability check
    #[error("Element {selector} is not usable: {reason}")]
    Unusable {
        /// Selector or element id
        selector: String,
        /// Why the element was rejected
        reason: String,
    },

    /// Index outside the bounds of a radio group, select or table
    #[error("Cannot locate {what} with index {index} (count {len})")]
    IndexOutOfRange {
        /// What was indexed
        what: String,
        /// Requested index
        index: usize,
        /// Number of items available
        len: usize,
    },

    /// Table row width differs from heading count
    #[error("Headings count {headings} is not equal to number of cells {cells} in row {row}")]
    HeadingCountMismatch {
        /// Row index
        row: usize,
        /// Number of headings
        headings: usize,
        /// Number of cells in the row
        cells: usize,
    },

    /// No option, radio button or record matched the criterion
    #[error("Cannot locate {what} with {criterion}")]
    NoMatch {
        /// What was searched for
        what: String,
        /// Criterion used
        criterion: String,
    },

    /// Test data resource does not exist
    #[error("Resource '{name}' doesn't exist")]
    ResourceMissing {
        /// Resource name
        name: String,
    },

    /// No record carries the requested test data id
    #[error("No test data with TestDataId '{id}' in {file}")]
    TestDataNotFound {
        /// Resource name
        file: String,
        /// Requested id
        id: String,
    },

    /// More than one record carries the requested test data id
    #[error("TestDataId '{id}' is not unique in {file} ({count} records)")]
    TestDataNotUnique {
        /// Resource name
        file: String,
        /// Requested id
        id: String,
        /// Number of records found
        count: usize,
    },

    /// Soft assertions collected by `Verify` failed
    #[error(transparent)]
    AggregateVerificationFailure(#[from] AggregateVerificationFailure),

    /// Wait condition was not satisfied in time
    #[error("Timed out after {ms}ms: {message}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was waited for
        message: String,
    },

    /// Page object member without any selector
    #[error("Field '{field}' has no resolvable selector")]
    Unresolvable {
        /// Field name
        field: String,
    },

    /// Selector the driver cannot evaluate
    #[error("Invalid selector {selector}: {message}")]
    InvalidSelector {
        /// Selector description
        selector: String,
        /// Error message
        message: String,
    },

    /// Alert operation without an open alert
    #[error("No alert is present")]
    NoAlertPresent,

    /// Argument rejected by an element operation
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Failure reported by the underlying driver
    #[error("WebDriver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PagewrightError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a stale reference error
    #[must_use]
    pub fn stale(selector: impl Into<String>) -> Self {
        Self::StaleReference {
            selector: selector.into(),
        }
    }

    /// Create a no-match error
    #[must_use]
    pub fn no_match(what: impl Into<String>, criterion: impl Into<String>) -> Self {
        Self::NoMatch {
            what: what.into(),
            criterion: criterion.into(),
        }
    }

    /// Failures that mean "not located yet": polling continues and
    /// error handlers are consulted.
    #[must_use]
    pub const fn is_locate_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::StaleReference { .. } | Self::Unusable { .. }
        )
    }

    /// Whether the element handle went stale
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = PagewrightError::NotFound {
            selector: "By.id: login".to_string(),
            timeout_ms: 500,
        };
        assert!(err.to_string().contains("By.id: login"));
        assert!(err.to_string().contains("500ms"));
    }

    #[test]
    fn test_locate_failure_classification() {
        assert!(PagewrightError::stale("node-1").is_locate_failure());
        assert!(PagewrightError::Unusable {
            selector: "x".into(),
            reason: "hidden".into()
        }
        .is_locate_failure());
        assert!(!PagewrightError::driver("boom").is_locate_failure());
        assert!(!PagewrightError::NoAlertPresent.is_locate_failure());
    }

    #[test]
    fn test_heading_mismatch_message() {
        let err = PagewrightError::HeadingCountMismatch {
            row: 0,
            headings: 3,
            cells: 2,
        };
        let text = err.to_string();
        assert!(text.contains('3'));
        assert!(text.contains('2'));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PagewrightError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
