//! Client session management
//!
//! `FtpSession` is the surface a front end drives: login, navigation,
//! transfer mode selection, RETR and LIST.

use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::control::ControlChannel;
use crate::error::{ConnectionError, TransferError};
use crate::protocol::{Command, Reply};
use crate::transfer::{DataChannelMode, Listing, RetrieveOutcome, TransferEngine, TransferOptions};

/// One logged-in (or logging-in) conversation with an FTP server.
pub struct FtpSession {
    control: ControlChannel,
    mode: DataChannelMode,
    options: TransferOptions,
    download_dir: PathBuf,
}

impl FtpSession {
    /// Opens the control connection and returns the session with the greeting.
    pub async fn connect(config: &ClientConfig) -> Result<(Self, Reply), ConnectionError> {
        let (control, greeting) = ControlChannel::connect(
            &config.host,
            config.control_port,
            config.connect_timeout(),
            config.reply_timeout(),
        )
        .await?;

        let session = Self {
            control,
            mode: config.data_channel_mode(),
            options: config.transfer_options(),
            download_dir: config.download_dir_path(),
        };
        Ok((session, greeting))
    }

    /// Sends USER then PASS, returning both replies.
    pub async fn login(
        &mut self,
        user: &str,
        pass: &str,
    ) -> Result<(Reply, Reply), ConnectionError> {
        info!("Logging in for {}", user);
        let user_reply = self.control.send(&Command::User(user.to_string())).await?;
        let pass_reply = self.control.send(&Command::Pass(pass.to_string())).await?;
        Ok((user_reply, pass_reply))
    }

    /// Selects the data channel mode for subsequent transfers.
    pub fn set_transfer_mode(&mut self, mode: DataChannelMode) {
        info!("Data channel mode set to {}", mode);
        self.mode = mode;
    }

    pub fn transfer_mode(&self) -> DataChannelMode {
        self.mode
    }

    /// Retrieves `remote_path` into the download directory, named after the
    /// path's final segment.
    pub async fn retrieve_file(
        &mut self,
        remote_path: &str,
    ) -> Result<RetrieveOutcome, TransferError> {
        let local_path = self.local_path_for(remote_path)?;
        let mode = self.mode;

        TransferEngine::new(&mut self.control, self.options)
            .retrieve_file(mode, remote_path, || {
                File::create(&local_path).map(tokio::fs::File::from_std)
            })
            .await
    }

    pub async fn list_directory(&mut self) -> Result<Listing, TransferError> {
        let mode = self.mode;
        TransferEngine::new(&mut self.control, self.options)
            .list_directory(mode)
            .await
    }

    pub async fn print_working_directory(&mut self) -> Result<Reply, ConnectionError> {
        self.control.send(&Command::Pwd).await
    }

    pub async fn change_directory(&mut self, path: &str) -> Result<Reply, ConnectionError> {
        self.control.send(&Command::Cwd(path.to_string())).await
    }

    pub async fn change_to_parent_directory(&mut self) -> Result<Reply, ConnectionError> {
        self.control.send(&Command::Cdup).await
    }

    /// Sends QUIT and closes the connection.
    pub async fn disconnect(self) -> Result<Reply, ConnectionError> {
        self.control.close().await
    }

    fn local_path_for(&self, remote_path: &str) -> Result<PathBuf, TransferError> {
        local_file_name(remote_path)
            .map(|name| self.download_dir.join(name))
            .ok_or_else(|| TransferError::InvalidLocalName(remote_path.to_string()))
    }
}

/// Final segment of a remote path, if it can name a local file.
pub fn local_file_name(remote_path: &str) -> Option<&str> {
    let name = remote_path.rsplit(['/', '\\']).next()?;
    match name {
        "" | "." | ".." => None,
        name => Path::new(name).file_name().and_then(|n| n.to_str()),
    }
}
