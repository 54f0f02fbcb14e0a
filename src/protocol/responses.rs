//! FTP Reply handling
//!
//! Defines reply codes recognized by the client and the parsed `Reply` type.

use std::fmt;

use crate::error::ConnectionError;

/// FTP reply codes the client acts on
pub const OPENING_DATA_CONNECTION: u16 = 150;
pub const ENTERING_PASSIVE: u16 = 227;
pub const ENTERING_EXTENDED_PASSIVE: u16 = 229;
pub const FILE_NOT_FOUND: u16 = 550;

/// A single-line server reply: a three digit code plus free text.
///
/// The code always comes from the first three characters of the line.
/// Continuation lines of multi-line replies are not aggregated; each line is
/// read as its own reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    line: String,
}

impl Reply {
    /// Parses one reply line (without its line terminator).
    pub fn parse(line: &str) -> Result<Self, ConnectionError> {
        let code = line
            .get(..3)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u16>().ok())
            .ok_or_else(|| ConnectionError::MalformedReply(line.to_string()))?;

        Ok(Self {
            code,
            line: line.to_string(),
        })
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// Message text following the code and its separator.
    pub fn text(&self) -> &str {
        let rest = &self.line[3..];
        rest.strip_prefix([' ', '-']).unwrap_or(rest)
    }

    /// The reply exactly as received.
    pub fn raw(&self) -> &str {
        &self.line
    }

    /// 2xx
    pub fn is_completion(&self) -> bool {
        self.code / 100 == 2
    }

    /// 4xx or 5xx
    pub fn is_negative(&self) -> bool {
        matches!(self.code / 100, 4 | 5)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}
