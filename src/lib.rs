pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod protocol;
pub mod transfer;
pub mod utils;

pub use client::FtpSession;
pub use config::ClientConfig;
