//! Transfer result types
//!
//! Defines result structures returned by transfer operations.

use crate::protocol::Reply;

/// Result of a completed RETR
#[derive(Debug)]
pub struct RetrieveOutcome {
    pub bytes_written: u64,
    pub preliminary: Reply,
    pub completion: Reply,
}

/// Result of a completed LIST
#[derive(Debug)]
pub struct Listing {
    pub lines: Vec<String>,
    pub preliminary: Reply,
    pub completion: Reply,
}
