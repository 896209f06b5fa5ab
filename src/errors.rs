//! Suite Tooth error handling.
//!
//! Two kinds of failure flow through the engine and they are kept apart:
//!
//! - [`SuiteError`] is fatal. The specification tree has an invalid shape
//!   (or the runtime could not be built) and no context is returned at all.
//! - [`TestError`] is the payload of a failing test or hook. It never
//!   escapes [`execute_suite`](crate::engine::execute_suite): a failing test
//!   is reported as `not ok` in its own scope, a failing hook aborts its group
//!   and is reported one level up.

use miette::Diagnostic;
use std::fmt;
use std::panic::Location;
use thiserror::Error;

// ============================================================================
// FATAL ERRORS
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum SuiteError {
    #[error("Structure error: `{path}` is a list, but element {index} is a {found}")]
    #[diagnostic(
        code(suite_tooth::structure::list_element),
        help("lists may only hold tests; wrap nested groups in a group instead")
    )]
    ListElementNotTest {
        path: String,
        index: usize,
        found: &'static str,
    },

    #[error("Structure error: `{path}` is not a test, list or group (found {found})")]
    #[diagnostic(
        code(suite_tooth::structure::invalid_node),
        help("a node must be a test function, an array of tests, or an object of named children")
    )]
    InvalidNode { path: String, found: &'static str },

    #[error("Structure error: reserved key `{key}` in `{path}` expects {expected}")]
    #[diagnostic(code(suite_tooth::structure::reserved_key))]
    InvalidReservedKey {
        path: String,
        key: String,
        expected: &'static str,
    },

    #[error("Runtime error: could not start the suite runtime")]
    #[diagnostic(code(suite_tooth::runtime::start))]
    Runtime(#[from] std::io::Error),
}

impl SuiteError {
    pub fn is_structural(&self) -> bool {
        !matches!(self, SuiteError::Runtime(_))
    }
}

// ============================================================================
// TEST AND HOOK FAILURES
// ============================================================================

/// Why a test or hook failed.
///
/// Any `std::error::Error` converts into a `TestError`, so test bodies can use
/// `?` freely. The conversion records the caller location and the full
/// `source()` chain, which together make up the reported stack.
pub struct TestError {
    name: String,
    message: String,
    location: Option<&'static Location<'static>>,
    causes: Vec<String>,
}

impl TestError {
    /// Creates an ad-hoc failure named `Error`.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
            location: Some(Location::caller()),
            causes: Vec::new(),
        }
    }

    /// A failure raised by the engine itself, with no caller location.
    pub(crate) fn detached(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
            location: None,
            causes: Vec::new(),
        }
    }

    /// Builds a failure from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "test panicked".to_string()
        };
        Self {
            name: "Panic".to_string(),
            message,
            location: None,
            causes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message, the capture location and every cause, one per line.
    pub fn stack(&self) -> String {
        let mut stack = self.message.clone();
        if let Some(loc) = self.location {
            stack.push_str(&format!("\n  at {}:{}:{}", loc.file(), loc.line(), loc.column()));
        }
        for cause in &self.causes {
            stack.push_str(&format!("\n  caused by: {}", cause));
        }
        stack
    }
}

impl<E> From<E> for TestError
where
    E: std::error::Error + 'static,
{
    #[track_caller]
    fn from(err: E) -> Self {
        let name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error")
            .to_string();
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            name,
            message: err.to_string(),
            location: Some(Location::caller()),
            causes,
        }
    }
}

impl fmt::Debug for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestError")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("causes", &self.causes)
            .finish()
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Shorthand for failing a test with a formatted message.
///
/// ```rust
/// use suite_tooth::{test_error, errors::TestError};
/// let err: TestError = test_error!("expected {} rows", 3);
/// assert_eq!(err.message(), "expected 3 rows");
/// ```
#[macro_export]
macro_rules! test_error {
    ($($arg:tt)*) => {
        $crate::errors::TestError::new(format!($($arg)*))
    };
}
