//! CLI configuration module
//!
//! Manages configuration for the CLI application.

use crate::cli::args::{CliArgs, Command};
use crate::crypto::SharedKey;
use crate::error::ShareError;
use crate::transfer::SessionOptions;
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Configuration for the file-sharing client
#[derive(Debug, Clone)]
pub struct Config {
    /// Server base URL
    pub server: Url,
    /// Shared AES-256 key
    pub key: SharedKey,
    /// Request timeout (None waits indefinitely)
    pub timeout: Option<Duration>,
    /// Treat list entries without an `encrypted` flag as encrypted
    pub assume_encrypted: bool,
    /// Download directory
    pub download_dir: PathBuf,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Config {
    /// Create configuration from CLI arguments
    pub fn from_args(args: &CliArgs) -> std::result::Result<Self, ShareError> {
        let server = Url::parse(&args.server)?;

        let key = match &args.key {
            Some(hex) => SharedKey::from_hex(hex)?,
            None => SharedKey::default(),
        };

        let download_dir = match &args.command {
            Command::Download { output_dir: Some(dir), .. } => dir.clone(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            server,
            key,
            timeout: args.timeout.map(Duration::from_secs),
            assume_encrypted: !args.plaintext_server,
            download_dir,
            verbose: args.verbose,
            quiet: args.quiet,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.server.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!(
                "Server URL must use http or https, got '{}'",
                self.server.scheme()
            ));
        }

        if self.server.host_str().is_none() {
            return Err(anyhow::anyhow!("Server URL has no host"));
        }

        if self.timeout == Some(Duration::ZERO) {
            return Err(anyhow::anyhow!("timeout must be at least 1 second"));
        }

        if self.download_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("download directory cannot be empty"));
        }

        if self.verbose && self.quiet {
            return Err(anyhow::anyhow!("--verbose and --quiet cannot be combined"));
        }

        Ok(())
    }

    /// Session settings derived from this configuration
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            key: self.key,
            download_dir: self.download_dir.clone(),
        }
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_config_from_args() {
        let args = parse(&[
            "lanshare",
            "--server",
            "http://192.168.1.5:5000",
            "--timeout",
            "30",
            "download",
            "report.pdf",
            "-o",
            "/tmp/downloads",
        ]);

        let config = Config::from_args(&args).unwrap();

        assert_eq!(config.server.as_str(), "http://192.168.1.5:5000/");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/downloads"));
        assert_eq!(config.key, SharedKey::default());
        assert!(config.assume_encrypted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_custom_key() {
        let hex = "00".repeat(32);
        let args = parse(&["lanshare", "--key", hex.as_str(), "--plaintext-server", "peers"]);

        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.key, SharedKey::new([0u8; 32]));
        assert!(!config.assume_encrypted);
        assert_eq!(config.session_options().key, config.key);
    }

    #[test]
    fn test_config_rejects_bad_key() {
        let args = parse(&["lanshare", "--key", "abcd", "peers"]);
        let err = Config::from_args(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_config_rejects_bad_url() {
        let args = parse(&["lanshare", "--server", "not a url", "peers"]);
        assert!(Config::from_args(&args).is_err());
    }

    #[test]
    fn test_config_validate() {
        let args = parse(&["lanshare", "--server", "ftp://files.local", "peers"]);
        let config = Config::from_args(&args).unwrap();
        assert!(config.validate().is_err());

        let args = parse(&["lanshare", "--timeout", "0", "peers"]);
        let config = Config::from_args(&args).unwrap();
        assert!(config.validate().is_err());

        let args = parse(&["lanshare", "-v", "-q", "peers"]);
        let config = Config::from_args(&args).unwrap();
        assert!(config.validate().is_err());
    }
}
