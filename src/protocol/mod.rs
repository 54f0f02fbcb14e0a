//! FTP Protocol implementation
//!
//! Outbound commands, reply parsing, and data channel argument encoding.

pub mod commands;
pub mod parser;
pub mod responses;

pub use commands::Command;
pub use responses::Reply;
