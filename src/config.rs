//! Configuration management for RAX FTP Client
//!
//! Layers built-in defaults, an optional `config.toml` and `RAX_FTP_CLIENT_*`
//! environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::transfer::{DataChannelMode, TransferOptions};
use crate::utils::network::deadline_from_secs;

/// Complete client configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientConfig {
    // ═══ SERVER (Environment Override Supported) ═══
    /// FTP server host name or address
    pub host: String,

    /// FTP control port
    pub control_port: u16,

    // ═══ DATA CHANNEL ═══
    /// Passive (true) or active (false) data connections
    pub passive: bool,

    /// Use EPSV/EPRT instead of PASV/PORT
    pub extended: bool,

    /// Request IPv6 data connections (implies the extended commands)
    pub ipv6: bool,

    // ═══ TRANSFER BEHAVIOR ═══
    /// Buffer size for file transfers
    pub buffer_size: usize,

    /// Seconds to wait for the control connection; 0 waits indefinitely
    pub connect_timeout_secs: u64,

    /// Seconds to wait for each server reply; 0 waits indefinitely
    pub reply_timeout_secs: u64,

    /// Seconds to wait on data connects, accepts and reads; 0 waits indefinitely
    pub data_timeout_secs: u64,

    /// Directory retrieved files are written to
    pub download_dir: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            control_port: 21,
            passive: true,
            extended: true,
            ipv6: false,
            buffer_size: 512,
            connect_timeout_secs: 30,
            reply_timeout_secs: 0,
            data_timeout_secs: 0,
            download_dir: ".".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from config.toml with environment overrides.
    ///
    /// A missing config file is not an error; defaults apply.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("host", defaults.host.clone())?
            .set_default("control_port", i64::from(defaults.control_port))?
            .set_default("passive", defaults.passive)?
            .set_default("extended", defaults.extended)?
            .set_default("ipv6", defaults.ipv6)?
            .set_default("buffer_size", defaults.buffer_size as i64)?
            .set_default("connect_timeout_secs", defaults.connect_timeout_secs as i64)?
            .set_default("reply_timeout_secs", defaults.reply_timeout_secs as i64)?
            .set_default("data_timeout_secs", defaults.data_timeout_secs as i64)?
            .set_default("download_dir", defaults.download_dir.clone())?
            .add_source(File::with_name("rax-ftp-client/config").required(false))
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RAX_FTP_CLIENT").try_parsing(true))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.host.trim().is_empty() {
            return Err(config::ConfigError::Message("host cannot be empty".into()));
        }

        if self.control_port == 0 {
            return Err(config::ConfigError::Message(
                "Control port cannot be 0".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.download_dir.is_empty() {
            return Err(config::ConfigError::Message(
                "download_dir cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Data channel mode for the first transfer of a session
    pub fn data_channel_mode(&self) -> DataChannelMode {
        DataChannelMode::new(self.passive, self.extended, self.ipv6)
    }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            buffer_size: self.buffer_size,
            data_timeout: self.data_timeout(),
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        deadline_from_secs(self.connect_timeout_secs)
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        deadline_from_secs(self.reply_timeout_secs)
    }

    pub fn data_timeout(&self) -> Option<Duration> {
        deadline_from_secs(self.data_timeout_secs)
    }

    /// Get download directory as PathBuf
    pub fn download_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.download_dir)
    }
}
