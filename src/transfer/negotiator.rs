//! Data channel negotiation
//!
//! Issues PASV/EPSV or PORT/EPRT on the control connection and produces the
//! endpoint the next transfer command will use.

use log::{debug, info, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

use crate::control::ControlChannel;
use crate::error::NegotiationError;
use crate::protocol::Command;
use crate::protocol::parser::{
    encode_eprt_argument, encode_port_argument, parse_extended_passive_port, parse_passive_reply,
};
use crate::protocol::responses::{ENTERING_EXTENDED_PASSIVE, ENTERING_PASSIVE};
use crate::transfer::data_channel::DataEndpoint;
use crate::transfer::modes::DataChannelMode;
use crate::utils::network::{local_host_address, with_deadline};

/// Negotiates the data channel for one transfer using `mode`.
///
/// # Returns
///
/// * `DataEndpoint::Connected` - passive mode, already connected to the server
/// * `DataEndpoint::Listening` - active mode, the server connects back once
///   the transfer command is accepted
pub async fn negotiate(
    control: &mut ControlChannel,
    mode: DataChannelMode,
    connect_deadline: Option<Duration>,
) -> Result<DataEndpoint, NegotiationError> {
    if mode.is_passive() {
        negotiate_passive(control, mode, connect_deadline).await
    } else {
        negotiate_active(control, mode).await
    }
}

async fn negotiate_passive(
    control: &mut ControlChannel,
    mode: DataChannelMode,
    connect_deadline: Option<Duration>,
) -> Result<DataEndpoint, NegotiationError> {
    info!("Starting a {} data transfer", mode);
    let extended = mode.uses_extended();

    let (command, expected) = if extended {
        (Command::Epsv(mode.address_family()), ENTERING_EXTENDED_PASSIVE)
    } else {
        (Command::Pasv, ENTERING_PASSIVE)
    };

    let reply = control.send(&command).await?;
    if reply.code() != expected {
        return Err(NegotiationError::Rejected(reply));
    }

    let port = if extended {
        parse_extended_passive_port(reply.raw())
    } else {
        parse_passive_reply(reply.raw()).map(|advertised| {
            debug!("Server advertised {}, using control peer address", advertised);
            advertised.port()
        })
    };
    let Some(port) = port else {
        return Err(NegotiationError::MalformedReply(reply));
    };

    // The control connection's peer is authoritative for the data host.
    let target = SocketAddr::new(control.peer_addr().ip(), port);
    let stream = with_deadline(connect_deadline, TcpStream::connect(target))
        .await
        .map_err(|e| NegotiationError::DataConnectFailed(target, e))?;

    info!("Passive data connection open to {}", target);
    Ok(DataEndpoint::Connected(stream))
}

async fn negotiate_active(
    control: &mut ControlChannel,
    mode: DataChannelMode,
) -> Result<DataEndpoint, NegotiationError> {
    info!("Starting an {} data transfer", mode);
    let local = control.local_addr();

    let unspecified = match local.ip() {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    let listener = TcpListener::bind(SocketAddr::new(unspecified, 0))
        .await
        .map_err(NegotiationError::ListenerFailed)?;
    let port = listener
        .local_addr()
        .map_err(NegotiationError::ListenerFailed)?
        .port();

    let command = if mode.uses_extended() {
        // Resolved independently of the control connection; may differ on
        // multi-homed hosts.
        let ip = match local_host_address(control.peer_addr()).await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Could not find local ip address: {}, using {}", e, local.ip());
                local.ip()
            }
        };
        Command::Eprt(encode_eprt_argument(mode.address_family(), ip, port))
    } else {
        let ip = match local.ip() {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => v6
                .to_ipv4_mapped()
                .ok_or(NegotiationError::UnsupportedAddress(local.ip()))?,
        };
        Command::Port(encode_port_argument(SocketAddrV4::new(ip, port)))
    };

    let reply = control.send(&command).await?;
    info!("{} -> {}", command, reply);
    if reply.is_negative() {
        return Err(NegotiationError::Rejected(reply));
    }

    Ok(DataEndpoint::Listening(listener))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parser::decode_port_argument;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::task::JoinHandle;

    /// Control channel whose server answers each received line with the next reply.
    async fn scripted_control(replies: Vec<String>) -> (ControlChannel, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut received = Vec::new();
            for reply in replies {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                received.push(line.trim_end().to_string());
                reader
                    .get_mut()
                    .write_all(format!("{}\r\n", reply).as_bytes())
                    .await
                    .unwrap();
            }
            received
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        (ControlChannel::from_stream(stream, None).unwrap(), handle)
    }

    #[tokio::test]
    async fn test_pasv_connects_to_control_peer() {
        let data = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = data.local_addr().unwrap().port();
        let reply = format!(
            "227 Entering Passive Mode (203,0,113,9,{},{}).",
            port / 256,
            port % 256
        );
        let (mut control, server) = scripted_control(vec![reply]).await;

        let endpoint = negotiate(&mut control, DataChannelMode::new(true, false, false), None)
            .await
            .unwrap();

        let (_, peer) = data.accept().await.unwrap();
        assert!(matches!(endpoint, DataEndpoint::Connected(_)));
        assert_eq!(endpoint.local_addr().unwrap(), peer);
        assert_eq!(server.await.unwrap(), vec!["PASV"]);
    }

    #[tokio::test]
    async fn test_epsv_uses_fourth_field() {
        let data = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = data.local_addr().unwrap().port();
        let reply = format!("229 Entering Extended Passive Mode (|1|198.51.100.7|{}|)", port);
        let (mut control, server) = scripted_control(vec![reply]).await;

        let endpoint = negotiate(&mut control, DataChannelMode::default(), None)
            .await
            .unwrap();

        assert!(matches!(endpoint, DataEndpoint::Connected(_)));
        assert_eq!(server.await.unwrap(), vec!["EPSV 1"]);
    }

    #[tokio::test]
    async fn test_passive_wrong_code_is_rejected() {
        let (mut control, _server) =
            scripted_control(vec!["500 PASV not understood".to_string()]).await;

        let err = negotiate(&mut control, DataChannelMode::new(true, false, false), None)
            .await
            .unwrap_err();

        match err {
            NegotiationError::Rejected(reply) => {
                assert_eq!(reply.raw(), "500 PASV not understood")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_passive_garbled_reply_is_malformed() {
        let (mut control, _server) =
            scripted_control(vec!["227 Entering Passive Mode".to_string()]).await;

        let err = negotiate(&mut control, DataChannelMode::new(true, false, false), None)
            .await
            .unwrap_err();
        assert!(matches!(err, NegotiationError::MalformedReply(_)));
    }

    #[tokio::test]
    async fn test_port_advertises_listener() {
        let (mut control, server) =
            scripted_control(vec!["200 PORT command successful".to_string()]).await;

        let endpoint = negotiate(&mut control, DataChannelMode::new(false, false, false), None)
            .await
            .unwrap();
        let listening_port = endpoint.local_addr().unwrap().port();

        let received = server.await.unwrap();
        let arg = received[0].strip_prefix("PORT ").unwrap();
        let advertised = decode_port_argument(arg).unwrap();
        assert_eq!(*advertised.ip(), Ipv4Addr::LOCALHOST);
        assert_eq!(advertised.port(), listening_port);
        assert!(matches!(endpoint, DataEndpoint::Listening(_)));
    }

    #[tokio::test]
    async fn test_active_positive_non_200_is_accepted() {
        let (mut control, _server) =
            scripted_control(vec!["250 whatever you say".to_string()]).await;

        let endpoint = negotiate(&mut control, DataChannelMode::new(false, true, false), None).await;
        assert!(matches!(endpoint, Ok(DataEndpoint::Listening(_))));
    }

    #[tokio::test]
    async fn test_active_negative_reply_is_rejected() {
        let (mut control, server) =
            scripted_control(vec!["522 Network protocol not supported".to_string()]).await;

        let err = negotiate(&mut control, DataChannelMode::new(false, true, false), None)
            .await
            .unwrap_err();

        assert!(matches!(err, NegotiationError::Rejected(_)));
        let received = server.await.unwrap();
        assert!(received[0].starts_with("EPRT |1|"));
        assert!(received[0].ends_with('|'));
    }
}
