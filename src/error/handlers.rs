//! Error handlers
//!
//! Logging and reply extraction for errors surfaced to the front end.

use crate::error::types::{FtpClientError, NegotiationError, TransferError};
use crate::protocol::Reply;
use log::error;

/// Log an FTP client error
pub fn handle_error(err: &FtpClientError) {
    error!("FTP Client Error: {}", err);
}

/// Returns the raw server reply behind an error, if the server sent one.
pub fn server_reply(err: &FtpClientError) -> Option<&Reply> {
    match err {
        FtpClientError::Transfer(e) => transfer_reply(e),
        FtpClientError::Connection(_) | FtpClientError::Config(_) => None,
    }
}

fn negotiation_reply(err: &NegotiationError) -> Option<&Reply> {
    match err {
        NegotiationError::Rejected(reply) | NegotiationError::MalformedReply(reply) => Some(reply),
        _ => None,
    }
}

fn transfer_reply(err: &TransferError) -> Option<&Reply> {
    match err {
        TransferError::NotFound { reply, .. } | TransferError::UnexpectedReply(reply) => {
            Some(reply)
        }
        TransferError::Negotiation(e) => negotiation_reply(e),
        _ => None,
    }
}
