//! Index lookup errors

use super::LibrarianError;

/// Creates a release not found error
pub fn not_found(selector: impl Into<String>) -> LibrarianError {
    LibrarianError::NotFound {
        selector: selector.into(),
    }
}
