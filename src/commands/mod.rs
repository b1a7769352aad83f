//! Command implementations for the Librarian CLI

pub mod completions;
pub mod install;
pub mod list;
