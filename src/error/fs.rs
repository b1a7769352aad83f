//! File system errors

use super::LibrarianError;

/// Creates a file read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> LibrarianError {
    LibrarianError::FileReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> LibrarianError {
    LibrarianError::IoError {
        message: message.into(),
    }
}
