//! FTP data channel modes
//!
//! Passive/active selection together with the extended (EPSV/EPRT) and IPv6
//! preferences.

use std::fmt;

/// Address family tag sent with EPSV/EPRT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// RFC 2428 network protocol number.
    pub fn protocol_number(self) -> u8 {
        match self {
            AddressFamily::V4 => 1,
            AddressFamily::V6 => 2,
        }
    }
}

/// How the data channel of a single transfer is negotiated.
///
/// Exactly one mode applies per transfer. The extended commands are used
/// when either preference asks for them, since PASV/PORT cannot express
/// IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelMode {
    Passive { extended: bool, ipv6: bool },
    Active { extended: bool, ipv6: bool },
}

impl Default for DataChannelMode {
    fn default() -> Self {
        DataChannelMode::Passive {
            extended: true,
            ipv6: false,
        }
    }
}

impl DataChannelMode {
    pub fn new(passive: bool, extended: bool, ipv6: bool) -> Self {
        if passive {
            DataChannelMode::Passive { extended, ipv6 }
        } else {
            DataChannelMode::Active { extended, ipv6 }
        }
    }

    pub fn is_passive(&self) -> bool {
        matches!(self, DataChannelMode::Passive { .. })
    }

    /// Whether EPSV/EPRT replace PASV/PORT.
    pub fn uses_extended(&self) -> bool {
        let (extended, ipv6) = self.preferences();
        extended || ipv6
    }

    pub fn address_family(&self) -> AddressFamily {
        if self.preferences().1 {
            AddressFamily::V6
        } else {
            AddressFamily::V4
        }
    }

    /// Same extended/IPv6 preferences, passive or active as requested.
    pub fn with_passive(self, passive: bool) -> Self {
        let (extended, ipv6) = self.preferences();
        Self::new(passive, extended, ipv6)
    }

    pub fn with_extended(self, extended: bool) -> Self {
        Self::new(self.is_passive(), extended, self.preferences().1)
    }

    fn preferences(&self) -> (bool, bool) {
        match *self {
            DataChannelMode::Passive { extended, ipv6 }
            | DataChannelMode::Active { extended, ipv6 } => (extended, ipv6),
        }
    }
}

impl fmt::Display for DataChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match (self.is_passive(), self.uses_extended()) {
            (true, true) => "passive (EPSV)",
            (true, false) => "passive (PASV)",
            (false, true) => "active (EPRT)",
            (false, false) => "active (PORT)",
        };
        f.write_str(name)
    }
}
