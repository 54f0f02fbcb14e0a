//! Module `data_channel`
//!
//! The per-transfer data connection: either a stream already connected to
//! the server (passive) or a local listener the server connects back to
//! (active).

use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use crate::utils::network::with_deadline;

/// Endpoint produced by negotiation, consumed once by the transfer engine.
#[derive(Debug)]
pub enum DataEndpoint {
    /// Passive: connection to the server's data port is already open.
    Connected(TcpStream),
    /// Active: awaiting the server's inbound connection.
    Listening(TcpListener),
}

impl DataEndpoint {
    /// Turns the endpoint into a usable data connection.
    ///
    /// In active mode this accepts the server's connection, so it must only
    /// be called after the server confirmed the transfer command.
    pub async fn open(self, deadline: Option<Duration>) -> io::Result<DataConnection> {
        match self {
            DataEndpoint::Connected(stream) => Ok(DataConnection {
                stream,
                listener: None,
            }),
            DataEndpoint::Listening(listener) => {
                debug!("Waiting for server data connection on {:?}", listener.local_addr());
                let (stream, peer) = with_deadline(deadline, listener.accept()).await?;
                info!("Data connection accepted from {}", peer);
                Ok(DataConnection {
                    stream,
                    listener: Some(listener),
                })
            }
        }
    }

    /// Releases the endpoint without transferring anything.
    pub fn release(self) {
        match self {
            DataEndpoint::Connected(stream) => {
                debug!("Releasing unused data connection to {:?}", stream.peer_addr());
            }
            DataEndpoint::Listening(listener) => {
                debug!("Releasing unused data listener {:?}", listener.local_addr());
            }
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            DataEndpoint::Connected(stream) => stream.local_addr(),
            DataEndpoint::Listening(listener) => listener.local_addr(),
        }
    }
}

/// An open data connection. In active mode it also holds the listener so
/// both are closed together.
pub struct DataConnection {
    stream: TcpStream,
    listener: Option<TcpListener>,
}

impl DataConnection {
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Closes the data stream and, for active mode, the listening socket.
    pub async fn teardown(mut self) {
        debug!("Closing the data transfer");
        if let Err(e) = self.stream.shutdown().await {
            // Servers commonly reset the connection right after sending.
            if e.kind() != io::ErrorKind::NotConnected {
                warn!("Error closing the data connection: {}", e);
            }
        }
        if let Some(listener) = self.listener.take() {
            debug!("Closing data listener {:?}", listener.local_addr());
        }
    }
}
