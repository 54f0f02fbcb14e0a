//! Module `engine`
//!
//! Runs a single RETR or LIST: negotiate the data channel, send the transfer
//! command, check the preliminary reply, pump the data, tear the channel down
//! and read the completion reply.

use log::{debug, error, info, warn};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::control::ControlChannel;
use crate::error::TransferError;
use crate::protocol::parser::decode_line;
use crate::protocol::responses::{FILE_NOT_FOUND, OPENING_DATA_CONNECTION};
use crate::protocol::{Command, Reply};
use crate::transfer::data_channel::{DataConnection, DataEndpoint};
use crate::transfer::modes::DataChannelMode;
use crate::transfer::negotiator::negotiate;
use crate::transfer::results::{Listing, RetrieveOutcome};
use crate::utils::network::with_deadline;

pub const DEFAULT_BUFFER_SIZE: usize = 512;

/// Tunables applied to every transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Chunk size for the byte copy loop.
    pub buffer_size: usize,
    /// Bound on data connects, accepts and reads. `None` waits forever.
    pub data_timeout: Option<Duration>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            data_timeout: None,
        }
    }
}

/// Lifecycle of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Negotiating,
    AwaitingPreliminaryReply,
    Transferring,
    ClosingChannel,
    Aborted,
}

/// Drives transfers over a borrowed control channel, one at a time.
pub struct TransferEngine<'a> {
    control: &'a mut ControlChannel,
    options: TransferOptions,
    state: TransferState,
}

impl<'a> TransferEngine<'a> {
    pub fn new(control: &'a mut ControlChannel, options: TransferOptions) -> Self {
        Self {
            control,
            options,
            state: TransferState::Idle,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Retrieves `remote_path` into the sink returned by `open_sink`.
    ///
    /// The sink is only opened once the server confirmed the transfer with
    /// `150`, so a missing file never creates local output. Bytes already
    /// written are left in place if the transfer fails midway.
    pub async fn retrieve_file<W, F>(
        &mut self,
        mode: DataChannelMode,
        remote_path: &str,
        open_sink: F,
    ) -> Result<RetrieveOutcome, TransferError>
    where
        W: AsyncWrite + Unpin,
        F: FnOnce() -> io::Result<W>,
    {
        info!("Retrieving {} from FTP server", remote_path);
        let result = self.run_retrieve(mode, remote_path, open_sink).await;
        self.settle(&result);
        result
    }

    /// Lists the server's working directory, returning every line in order.
    pub async fn list_directory(
        &mut self,
        mode: DataChannelMode,
    ) -> Result<Listing, TransferError> {
        info!("Sending list to server");
        let result = self.run_list(mode).await;
        self.settle(&result);
        result
    }

    async fn run_retrieve<W, F>(
        &mut self,
        mode: DataChannelMode,
        remote_path: &str,
        open_sink: F,
    ) -> Result<RetrieveOutcome, TransferError>
    where
        W: AsyncWrite + Unpin,
        F: FnOnce() -> io::Result<W>,
    {
        let command = Command::Retr(remote_path.to_string());
        let (endpoint, preliminary) = self.begin(mode, &command, Some(remote_path)).await?;
        let mut connection = self.open(endpoint).await?;

        self.enter(TransferState::Transferring);
        let copied = copy_to_sink(
            connection.stream_mut(),
            open_sink,
            self.options.buffer_size,
            self.options.data_timeout,
        )
        .await;

        let completion = self.close(connection).await;
        let bytes_written = copied?;
        let completion = completion?;

        info!("Retrieved {} ({} bytes)", remote_path, bytes_written);
        Ok(RetrieveOutcome {
            bytes_written,
            preliminary,
            completion,
        })
    }

    async fn run_list(&mut self, mode: DataChannelMode) -> Result<Listing, TransferError> {
        let (endpoint, preliminary) = self.begin(mode, &Command::List, None).await?;
        let mut connection = self.open(endpoint).await?;

        self.enter(TransferState::Transferring);
        let read = read_lines(connection.stream_mut(), self.options.data_timeout).await;

        let completion = self.close(connection).await;
        let lines = read?;
        let completion = completion?;

        info!("Finished retrieving list from server ({} lines)", lines.len());
        Ok(Listing {
            lines,
            preliminary,
            completion,
        })
    }

    /// Negotiates, sends the transfer command and checks for `150`.
    async fn begin(
        &mut self,
        mode: DataChannelMode,
        command: &Command,
        not_found_path: Option<&str>,
    ) -> Result<(DataEndpoint, Reply), TransferError> {
        self.enter(TransferState::Negotiating);
        let endpoint = negotiate(self.control, mode, self.options.data_timeout).await?;

        self.enter(TransferState::AwaitingPreliminaryReply);
        let reply = self.control.send(command).await?;

        match (reply.code(), not_found_path) {
            (OPENING_DATA_CONNECTION, _) => Ok((endpoint, reply)),
            (FILE_NOT_FOUND, Some(path)) => {
                warn!("{} could not be found on the FTP server", path);
                endpoint.release();
                Err(TransferError::NotFound {
                    path: path.to_string(),
                    reply,
                })
            }
            _ => {
                warn!("Invalid response from FTP server for {}: {}", command.verb(), reply);
                endpoint.release();
                Err(TransferError::UnexpectedReply(reply))
            }
        }
    }

    /// Opens the data connection announced by `150`. On failure the server's
    /// follow-up reply (usually 425) is consumed so the next command lines up
    /// with its own reply.
    async fn open(&mut self, endpoint: DataEndpoint) -> Result<DataConnection, TransferError> {
        match endpoint.open(self.options.data_timeout).await {
            Ok(connection) => Ok(connection),
            Err(e) => {
                warn!("Data connection could not be opened: {}", e);
                match self.control.read_reply().await {
                    Ok(reply) => warn!("Server reply after failed data connection: {}", reply),
                    Err(read_err) => warn!("No reply after failed data connection: {}", read_err),
                }
                Err(TransferError::DataConnection(e))
            }
        }
    }

    /// Tears down the data channel, then reads the completion reply.
    async fn close(&mut self, connection: DataConnection) -> Result<Reply, TransferError> {
        self.enter(TransferState::ClosingChannel);
        connection.teardown().await;

        let completion = self.control.read_reply().await?;
        if !completion.is_completion() {
            return Err(TransferError::UnexpectedReply(completion));
        }
        Ok(completion)
    }

    fn settle<T>(&mut self, result: &Result<T, TransferError>) {
        match result {
            Ok(_) => self.enter(TransferState::Idle),
            Err(e) => {
                error!("Transfer aborted: {}", e);
                self.enter(TransferState::Aborted);
            }
        }
    }

    fn enter(&mut self, next: TransferState) {
        debug!("Transfer state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

async fn copy_to_sink<W, F>(
    stream: &mut TcpStream,
    open_sink: F,
    buffer_size: usize,
    deadline: Option<Duration>,
) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin,
    F: FnOnce() -> io::Result<W>,
{
    let mut sink = open_sink().map_err(TransferError::Io)?;
    let copied = pump(stream, &mut sink, buffer_size, deadline).await;

    // Partial output is kept on failure, so flush it either way.
    let flushed = sink.flush().await.map_err(TransferError::Io);
    let total = copied?;
    flushed?;
    Ok(total)
}

async fn pump<W>(
    stream: &mut TcpStream,
    sink: &mut W,
    buffer_size: usize,
    deadline: Option<Duration>,
) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = with_deadline(deadline, stream.read(&mut buffer))
            .await
            .map_err(TransferError::DataConnection)?;
        if n == 0 {
            return Ok(total);
        }
        sink.write_all(&buffer[..n]).await.map_err(TransferError::Io)?;
        total += n as u64;
    }
}

async fn read_lines(
    stream: &mut TcpStream,
    deadline: Option<Duration>,
) -> Result<Vec<String>, TransferError> {
    let mut reader = BufReader::new(stream);
    let mut collected = Vec::new();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        let n = with_deadline(deadline, reader.read_until(b'\n', &mut raw))
            .await
            .map_err(TransferError::DataConnection)?;
        if n == 0 {
            break;
        }
        collected.push(decode_line(&raw));
    }

    Ok(collected)
}
