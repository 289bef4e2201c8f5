//! CLI arguments module
//!
//! Defines command-line argument parsing using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the file-sharing client
#[derive(Debug, Parser)]
#[command(name = "lanshare")]
#[command(about = "Share encrypted files with other machines on the LAN", long_about = None)]
pub struct CliArgs {
    /// Server base URL
    #[arg(short, long, global = true, env = "LANSHARE_SERVER", default_value = "http://127.0.0.1:5000")]
    pub server: String,

    /// Shared AES-256 key as 64 hex characters (defaults to the built-in key)
    #[arg(long, global = true, env = "LANSHARE_KEY", value_name = "HEX", hide_env_values = true)]
    pub key: Option<String>,

    /// Request timeout in seconds (no timeout when omitted)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Treat files the server does not flag as encrypted as plaintext
    #[arg(long, global = true)]
    pub plaintext_server: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List files visible to this machine
    List {
        /// Column to sort by
        #[arg(long, default_value = "name", value_parser = ["name", "size", "modified"])]
        sort: String,

        /// Sort direction
        #[arg(long, default_value = "asc", value_parser = ["asc", "desc"])]
        order: String,
    },

    /// List peers that can be targeted with --to
    Peers,

    /// Upload a file
    Upload {
        /// File to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Recipient address (defaults to Everyone)
        #[arg(long, value_name = "ADDR")]
        to: Option<String>,
    },

    /// Download and decrypt a file
    Download {
        /// Storage name, display name, or row number from `list`
        #[arg(value_name = "FILE")]
        file: String,

        /// Directory to save into
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Encrypt a local file into the stored format
    Encrypt {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Decrypt a local file in the stored format
    Decrypt {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Get the log level based on verbosity settings
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let args = CliArgs::try_parse_from(["lanshare", "peers"]).unwrap();
        assert_eq!(args.server, "http://127.0.0.1:5000");
        assert!(args.timeout.is_none());
        assert!(!args.plaintext_server);
        assert_eq!(args.log_level(), tracing::Level::INFO);
        assert!(matches!(args.command, Command::Peers));
    }

    #[test]
    fn test_list_sort_options() {
        let args = CliArgs::try_parse_from(["lanshare", "list", "--sort", "size", "--order", "desc"]).unwrap();
        match args.command {
            Command::List { sort, order } => {
                assert_eq!(sort, "size");
                assert_eq!(order, "desc");
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(CliArgs::try_parse_from(["lanshare", "list", "--sort", "created"]).is_err());
    }

    #[test]
    fn test_upload_with_recipient_and_globals() {
        let args = CliArgs::try_parse_from([
            "lanshare", "upload", "notes.txt", "--to", "192.168.1.42", "-v", "--server", "http://10.0.0.1:5000",
        ])
        .unwrap();
        assert!(args.is_verbose());
        assert_eq!(args.server, "http://10.0.0.1:5000");
        match args.command {
            Command::Upload { file, to } => {
                assert_eq!(file, PathBuf::from("notes.txt"));
                assert_eq!(to.as_deref(), Some("192.168.1.42"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_quiet_log_level() {
        let args = CliArgs::try_parse_from(["lanshare", "-q", "peers"]).unwrap();
        assert!(args.is_quiet());
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
