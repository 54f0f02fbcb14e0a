//! Module `channel`
//!
//! The FTP control connection: one command line out, one reply line in.

use log::{debug, info};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::ConnectionError;
use crate::protocol::parser::decode_line;
use crate::protocol::{Command, Reply};
use crate::utils::network::with_deadline;

/// Owns the command connection to the FTP server.
///
/// Commands are strictly sequential: every `send` reads exactly one reply
/// line before returning. Server-side state (login, working directory) is
/// not tracked locally.
pub struct ControlChannel {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    reply_timeout: Option<Duration>,
}

impl ControlChannel {
    /// Connects to `host:port` and returns the channel with the server's greeting.
    pub async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
        reply_timeout: Option<Duration>,
    ) -> Result<(Self, Reply), ConnectionError> {
        let target = format!("{}:{}", host, port);
        info!("Opening connection on {}", target);

        let stream = with_deadline(connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|source| ConnectionError::Connect {
                target: target.clone(),
                source,
            })?;

        let mut channel = Self::from_stream(stream, reply_timeout)?;
        let greeting = channel.read_reply().await?;
        info!("Connected to {} ({})", target, channel.peer_addr);
        Ok((channel, greeting))
    }

    /// Wraps an already connected stream.
    pub fn from_stream(
        stream: TcpStream,
        reply_timeout: Option<Duration>,
    ) -> Result<Self, ConnectionError> {
        let peer_addr = stream.peer_addr()?;
        let local_addr = stream.local_addr()?;
        let (read_half, writer) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
            peer_addr,
            local_addr,
            reply_timeout,
        })
    }

    /// Writes one command line and reads the single reply line it produces.
    pub async fn send(&mut self, command: &Command) -> Result<Reply, ConnectionError> {
        debug!("Sending: {}", command.loggable());
        self.writer.write_all(command.to_wire().as_bytes()).await?;
        self.writer.flush().await?;
        self.read_reply().await
    }

    /// Reads the next reply line.
    pub async fn read_reply(&mut self) -> Result<Reply, ConnectionError> {
        let mut raw = Vec::new();
        let n = with_deadline(self.reply_timeout, self.reader.read_until(b'\n', &mut raw)).await?;
        if n == 0 {
            return Err(ConnectionError::Closed);
        }

        let line = decode_line(&raw);
        debug!("Received: {}", line);
        Reply::parse(&line)
    }

    /// Sends QUIT, reads its reply and releases the connection.
    pub async fn close(mut self) -> Result<Reply, ConnectionError> {
        info!("Closing connection to FTP server");
        let reply = self.send(&Command::Quit).await?;
        if let Err(e) = self.writer.shutdown().await {
            debug!("Error shutting down control connection: {}", e);
        }
        Ok(reply)
    }

    /// Remote address of the control connection; data connections in passive
    /// mode always target this host.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
