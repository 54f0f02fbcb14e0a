//! Control connection
//!
//! Command/reply exchange with the FTP server.

pub mod channel;

pub use channel::ControlChannel;
