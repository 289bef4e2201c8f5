//! Console output module
//!
//! Prints tables, transfer results and messages for the CLI.

use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::catalog::{format_size, FileTable};
use crate::recipient::RecipientTarget;
use crate::transfer::Notice;

/// Format duration to human readable string
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else if total_secs > 0 {
        format!("{}s", seconds)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Console output for the CLI
pub struct Console {
    /// Start of the current command
    start_time: Instant,
    /// Quiet mode (errors only)
    quiet: bool,
}

impl Console {
    /// Create a new console
    pub fn new(quiet: bool) -> Self {
        Self {
            start_time: Instant::now(),
            quiet,
        }
    }

    /// Print the file table. A listing error goes to stderr even in quiet mode.
    pub fn print_table(&self, table: &FileTable) -> io::Result<()> {
        if self.quiet {
            if let Some(error) = table.error() {
                self.print_error(&format!("Error loading files: {}", error))?;
            }
            return Ok(());
        }

        let mut out = io::stdout().lock();
        for line in table.render_lines() {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }

    /// Print the recipient selector options
    pub fn print_recipients(&self, options: &[RecipientTarget]) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut out = io::stdout().lock();
        for option in options {
            writeln!(out, "  {}", option)?;
        }
        out.flush()
    }

    /// Print a session notice on stdout, or stderr when it reports a problem
    pub fn print_notice(&self, notice: &Notice) -> io::Result<()> {
        if notice.is_error() {
            self.print_error(&notice.to_string())
        } else {
            self.print_status(&notice.to_string())
        }
    }

    /// Print completion message for a transfer
    pub fn print_complete(&self, action: &str, path: &Path, bytes: u64) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        println!("{} complete!", action);
        println!("  File: {}", path.display());
        println!("  Size: {}", format_size(bytes));
        println!("  Elapsed Time: {}", format_duration(self.start_time.elapsed()));

        Ok(())
    }

    /// Print a status message
    pub fn print_status(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        println!("{}", message);
        Ok(())
    }

    /// Print an error message
    pub fn print_error(&self, message: &str) -> io::Result<()> {
        eprintln!("Error: {}", message);
        Ok(())
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        println!("Info: {}", message);
        Ok(())
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_console_quiet() {
        let console = Console::new(true);
        assert!(console.is_quiet());
        assert!(console.print_status("hidden").is_ok());
        assert!(console.print_table(&FileTable::new()).is_ok());
    }

    #[test]
    fn test_print_notice() {
        let console = Console::new(true);
        let failure = Notice::ListingFailed("connection refused".to_string());
        assert!(failure.is_error());
        assert!(console.print_notice(&failure).is_ok());
        assert!(console
            .print_notice(&Notice::RecipientSelected(RecipientTarget::Everyone))
            .is_ok());
    }

    #[test]
    fn test_console_new() {
        let console = Console::new(false);
        assert!(!console.is_quiet());
        assert!(console.elapsed() < Duration::from_secs(5));
    }
}
