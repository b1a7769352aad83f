//! Install stage errors
//!
//! Each constructor takes the package being installed, a short description of
//! what was being attempted and the underlying error, so the message always
//! reads as `<stage> <package>: <context>: <cause>`.

use std::fmt::Display;

use super::LibrarianError;

fn reason(context: impl Display, cause: impl Display) -> String {
    format!("{context}: {cause}")
}

/// Creates a prerequisite check failed error
pub fn prerequisite_failed(
    package: impl Into<String>,
    context: impl Display,
    cause: impl Display,
) -> LibrarianError {
    LibrarianError::PrerequisiteFailed {
        package: package.into(),
        reason: reason(context, cause),
    }
}

/// Creates a fetch failed error
pub fn fetch_failed(
    package: impl Into<String>,
    context: impl Display,
    cause: impl Display,
) -> LibrarianError {
    LibrarianError::FetchFailed {
        package: package.into(),
        reason: reason(context, cause),
    }
}

/// Creates a materialize failed error
pub fn materialize_failed(
    package: impl Into<String>,
    context: impl Display,
    cause: impl Display,
) -> LibrarianError {
    LibrarianError::MaterializeFailed {
        package: package.into(),
        reason: reason(context, cause),
    }
}

/// Creates a rescan failed error
pub fn rescan_failed(package: impl Into<String>, cause: impl Display) -> LibrarianError {
    LibrarianError::RescanFailed {
        package: package.into(),
        reason: cause.to_string(),
    }
}
