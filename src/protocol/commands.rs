//! Module `commands`
//!
//! Defines the closed set of FTP commands the client sends on the control
//! connection and their wire representation.

use std::fmt;

use crate::transfer::modes::AddressFamily;

/// An outbound FTP command.
///
/// Commands that carry arguments store them pre-formatted; `PORT` and
/// `EPRT` arguments are produced by `protocol::parser`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User(String),
    Pass(String),
    Quit,
    List,
    Port(String),
    Pasv,
    Retr(String),
    Pwd,
    Cwd(String),
    Cdup,
    Eprt(String),
    Epsv(AddressFamily),
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Command::User(_) => "USER",
            Command::Pass(_) => "PASS",
            Command::Quit => "QUIT",
            Command::List => "LIST",
            Command::Port(_) => "PORT",
            Command::Pasv => "PASV",
            Command::Retr(_) => "RETR",
            Command::Pwd => "PWD",
            Command::Cwd(_) => "CWD",
            Command::Cdup => "CDUP",
            Command::Eprt(_) => "EPRT",
            Command::Epsv(_) => "EPSV",
        }
    }

    /// Line to write on the control connection, CRLF terminated.
    pub fn to_wire(&self) -> String {
        format!("{}\r\n", self)
    }

    /// Same as `Display`, with the password masked.
    pub fn loggable(&self) -> String {
        match self {
            Command::Pass(_) => "PASS ****".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::User(arg)
            | Command::Pass(arg)
            | Command::Port(arg)
            | Command::Retr(arg)
            | Command::Cwd(arg)
            | Command::Eprt(arg) => write!(f, "{} {}", self.verb(), arg),
            Command::Epsv(family) => write!(f, "{} {}", self.verb(), family.protocol_number()),
            _ => f.write_str(self.verb()),
        }
    }
}
