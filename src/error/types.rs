//! Error types
//!
//! Defines the error types for each layer of the FTP client: the control
//! connection, data channel negotiation and file transfers.

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};

use crate::protocol::Reply;

/// Control connection errors
#[derive(Debug)]
pub enum ConnectionError {
    Connect { target: String, source: io::Error },
    Closed,
    Timeout,
    MalformedReply(String),
    Io(io::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Connect { target, source } => {
                write!(f, "Could not connect to {}: {}", target, source)
            }
            ConnectionError::Closed => write!(f, "Control connection closed by server"),
            ConnectionError::Timeout => write!(f, "Timed out waiting for server reply"),
            ConnectionError::MalformedReply(line) => write!(f, "Malformed reply: {}", line),
            ConnectionError::Io(e) => write!(f, "Control connection I/O error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<io::Error> for ConnectionError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::TimedOut {
            ConnectionError::Timeout
        } else {
            ConnectionError::Io(error)
        }
    }
}

/// Data channel negotiation errors (PASV/EPSV/PORT/EPRT)
#[derive(Debug)]
pub enum NegotiationError {
    Rejected(Reply),
    MalformedReply(Reply),
    ListenerFailed(io::Error),
    DataConnectFailed(SocketAddr, io::Error),
    UnsupportedAddress(IpAddr),
    Control(ConnectionError),
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::Rejected(reply) => {
                write!(f, "Server rejected data channel setup: {}", reply)
            }
            NegotiationError::MalformedReply(reply) => {
                write!(f, "Could not parse data channel reply: {}", reply)
            }
            NegotiationError::ListenerFailed(e) => {
                write!(f, "Failed to open local data port: {}", e)
            }
            NegotiationError::DataConnectFailed(addr, e) => {
                write!(f, "Failed to connect data channel to {}: {}", addr, e)
            }
            NegotiationError::UnsupportedAddress(ip) => {
                write!(f, "PORT cannot advertise non-IPv4 address {}", ip)
            }
            NegotiationError::Control(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for NegotiationError {}

impl From<ConnectionError> for NegotiationError {
    fn from(error: ConnectionError) -> Self {
        NegotiationError::Control(error)
    }
}

/// File transfer errors (RETR/LIST)
#[derive(Debug)]
pub enum TransferError {
    NotFound { path: String, reply: Reply },
    UnexpectedReply(Reply),
    InvalidLocalName(String),
    Negotiation(NegotiationError),
    Control(ConnectionError),
    DataConnection(io::Error),
    Io(io::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NotFound { path, .. } => {
                write!(f, "{} could not be found on the FTP server", path)
            }
            TransferError::UnexpectedReply(reply) => {
                write!(f, "Unexpected reply from FTP server: {}", reply)
            }
            TransferError::InvalidLocalName(path) => {
                write!(f, "Cannot derive a local file name from {}", path)
            }
            TransferError::Negotiation(e) => write!(f, "Data channel setup failed: {}", e),
            TransferError::Control(e) => write!(f, "{}", e),
            TransferError::DataConnection(e) => write!(f, "Data connection failed: {}", e),
            TransferError::Io(e) => write!(f, "Local file error: {}", e),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<NegotiationError> for TransferError {
    fn from(error: NegotiationError) -> Self {
        TransferError::Negotiation(error)
    }
}

impl From<ConnectionError> for TransferError {
    fn from(error: ConnectionError) -> Self {
        TransferError::Control(error)
    }
}

/// General FTP client error that encompasses all error types
#[derive(Debug)]
pub enum FtpClientError {
    Connection(ConnectionError),
    Transfer(TransferError),
    Config(config::ConfigError),
}

impl fmt::Display for FtpClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpClientError::Connection(e) => write!(f, "Connection error: {}", e),
            FtpClientError::Transfer(e) => write!(f, "Transfer error: {}", e),
            FtpClientError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for FtpClientError {}

impl From<ConnectionError> for FtpClientError {
    fn from(error: ConnectionError) -> Self {
        FtpClientError::Connection(error)
    }
}

impl From<TransferError> for FtpClientError {
    fn from(error: TransferError) -> Self {
        FtpClientError::Transfer(error)
    }
}

impl From<config::ConfigError> for FtpClientError {
    fn from(error: config::ConfigError) -> Self {
        FtpClientError::Config(error)
    }
}
