//! Transfer module for the FTP client
//!
//! Handles data channel negotiation (passive/active, standard/extended),
//! the per-transfer data connection, and RETR/LIST transfers.

pub mod data_channel;
pub mod engine;
pub mod modes;
pub mod negotiator;
pub mod results;

// Re-export key types and functions
pub use data_channel::{DataConnection, DataEndpoint};
pub use engine::{TransferEngine, TransferOptions, TransferState};
pub use modes::{AddressFamily, DataChannelMode};
pub use negotiator::negotiate;
pub use results::{Listing, RetrieveOutcome};
