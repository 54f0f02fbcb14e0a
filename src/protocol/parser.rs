//! Data channel argument parsing
//!
//! Extracts data ports from PASV/EPSV replies and formats PORT/EPRT
//! arguments.

use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};

use crate::transfer::modes::AddressFamily;

/// Parses the six comma separated fields of a `227` reply.
///
/// The address is returned for logging only; callers connect to the control
/// connection's peer. Anything trailing the last digit of the final field
/// (usually `)` or `).`) is ignored.
pub fn parse_passive_reply(text: &str) -> Option<SocketAddrV4> {
    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != 6 {
        return None;
    }

    let first = trailing_digits(fields[0]);
    let last = leading_digits(fields[5]);

    let mut octets = [0u8; 4];
    for (slot, field) in octets
        .iter_mut()
        .zip([first, fields[1].trim(), fields[2].trim(), fields[3].trim()])
    {
        *slot = field.parse().ok()?;
    }

    let p1: u8 = fields[4].trim().parse().ok()?;
    let p2: u8 = last.parse().ok()?;

    Some(SocketAddrV4::new(
        Ipv4Addr::from(octets),
        combine_port(p1, p2),
    ))
}

/// Port carried by a `229` reply: the fourth `|` delimited field.
pub fn parse_extended_passive_port(text: &str) -> Option<u16> {
    text.split('|').nth(3)?.trim().parse().ok()
}

/// `a1,a2,a3,a4,p1,p2`
pub fn encode_port_argument(addr: SocketAddrV4) -> String {
    let [a1, a2, a3, a4] = addr.ip().octets();
    let (p1, p2) = split_port(addr.port());
    format!("{a1},{a2},{a3},{a4},{p1},{p2}")
}

/// Inverse of `encode_port_argument`.
pub fn decode_port_argument(arg: &str) -> Option<SocketAddrV4> {
    let fields = arg
        .trim()
        .split(',')
        .map(|f| f.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;

    match fields.as_slice() {
        [a1, a2, a3, a4, p1, p2] => Some(SocketAddrV4::new(
            Ipv4Addr::new(*a1, *a2, *a3, *a4),
            combine_port(*p1, *p2),
        )),
        _ => None,
    }
}

/// `|<1|2>|<address>|<port>|`
pub fn encode_eprt_argument(family: AddressFamily, ip: IpAddr, port: u16) -> String {
    format!("|{}|{}|{}|", family.protocol_number(), ip, port)
}

pub fn split_port(port: u16) -> (u8, u8) {
    ((port / 256) as u8, (port % 256) as u8)
}

pub fn combine_port(p1: u8, p2: u8) -> u16 {
    u16::from(p1) * 256 + u16::from(p2)
}

/// Decodes one received line, dropping its `\n` or `\r\n` terminator.
/// Bytes that are not valid UTF-8 become U+FFFD instead of failing the read.
pub fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

fn leading_digits(field: &str) -> &str {
    let field = field.trim_start();
    let end = field
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(field.len());
    &field[..end]
}

fn trailing_digits(field: &str) -> &str {
    let field = field.trim_end();
    let start = field
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    &field[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passive_reply_port() {
        let addr =
            parse_passive_reply("227 Entering Passive Mode (192,168,1,20,19,136).").unwrap();
        assert_eq!(*addr.ip(), Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(addr.port(), 19 * 256 + 136);
    }

    #[test]
    fn test_passive_reply_terminators_are_ignored() {
        for text in [
            "227 Entering Passive Mode (10,0,0,1,200,7)",
            "227 Entering Passive Mode (10,0,0,1,200,7).",
            "227 Entering Passive Mode (10,0,0,1,200,7",
            "227 =10,0,0,1,200,7 ok",
        ] {
            assert_eq!(parse_passive_reply(text).unwrap().port(), 200 * 256 + 7, "{text}");
        }
    }

    #[test]
    fn test_passive_reply_malformed() {
        assert!(parse_passive_reply("227 Entering Passive Mode").is_none());
        assert!(parse_passive_reply("227 (10,0,0,1,200)").is_none());
        assert!(parse_passive_reply("227 (10,0,0,1,300,7)").is_none());
        assert!(parse_passive_reply("227 (10,0,0,1,2,)").is_none());
    }

    #[test]
    fn test_extended_passive_port() {
        assert_eq!(
            parse_extended_passive_port("229 Entering Extended Passive Mode (|||6446|)"),
            Some(6446)
        );
        assert_eq!(
            parse_extended_passive_port("229 Extended Passive (|1|10.1.1.1|40001|)"),
            Some(40001)
        );
        assert_eq!(parse_extended_passive_port("229 Entering Passive Mode"), None);
        assert_eq!(parse_extended_passive_port("229 (|||port|)"), None);
    }

    #[test]
    fn test_port_split_round_trips_for_every_port() {
        for port in 0..=u16::MAX {
            let (p1, p2) = split_port(port);
            assert_eq!(combine_port(p1, p2), port);
        }
    }

    #[test]
    fn test_port_argument() {
        let addr = SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 50021);
        assert_eq!(encode_port_argument(addr), "127,0,0,1,195,101");
        assert_eq!(decode_port_argument("127,0,0,1,195,101"), Some(addr));
        assert_eq!(decode_port_argument("127,0,0,1,195"), None);
    }

    #[test]
    fn test_eprt_argument() {
        assert_eq!(
            encode_eprt_argument(AddressFamily::V4, "10.0.0.5".parse().unwrap(), 2121),
            "|1|10.0.0.5|2121|"
        );
        assert_eq!(
            encode_eprt_argument(AddressFamily::V6, "::1".parse().unwrap(), 2121),
            "|2|::1|2121|"
        );
    }

    #[test]
    fn test_decode_line_terminators() {
        assert_eq!(decode_line(b"226 Transfer complete\r\n"), "226 Transfer complete");
        assert_eq!(decode_line(b"a.txt\n"), "a.txt");
        assert_eq!(decode_line(b"last line without newline"), "last line without newline");
        assert_eq!(decode_line(b"\r\n"), "");
    }

    #[test]
    fn test_decode_line_replaces_invalid_utf8() {
        assert_eq!(decode_line(b"caf\xe9.txt\r\n"), "caf\u{FFFD}.txt");
        assert_eq!(decode_line("café.txt\n".as_bytes()), "café.txt");
    }
}
