//! Client session
//!
//! The collaborator-facing session API and interactive input parsing.

pub mod input;
pub mod session;

pub use input::{UserCommand, parse_user_input};
pub use session::FtpSession;
