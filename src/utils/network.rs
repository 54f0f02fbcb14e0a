//! Network utilities
//!
//! Deadlines for socket operations and local address discovery.

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Awaits `fut`, failing with `TimedOut` once `deadline` elapses.
///
/// `None` waits indefinitely.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(limit) => timeout(limit, fut)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "operation timed out"))?,
        None => fut.await,
    }
}

/// Converts a seconds setting into an optional deadline; zero disables it.
pub fn deadline_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Resolves the address this host uses to reach `peer`.
///
/// This is a route lookup independent of any existing connection, so on
/// multi-homed hosts it may differ from the control connection's local
/// address. No packets are sent.
pub async fn local_host_address(peer: SocketAddr) -> io::Result<IpAddr> {
    let unspecified: IpAddr = match peer {
        SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    };
    let probe = UdpSocket::bind(SocketAddr::new(unspecified, 0)).await?;
    probe.connect(peer).await?;
    Ok(probe.local_addr()?.ip())
}
