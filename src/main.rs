//! lanshare - Main entry point
//!
//! Command-line client for a LAN file-sharing server: list, upload,
//! download and decrypt shared files.

use anyhow::{Context, Result};
use lanshare::{
    crypto, CliArgs, Command, Config, Console, HttpTransport, Intent, Notice, RecipientTarget, SortSpec,
    StoredFile, TransferSession,
};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Set up panic handler for unexpected errors
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let backtrace = std::backtrace::Backtrace::capture();

        match panic_info.location() {
            Some(location) => error!(
                "PANIC occurred at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => error!("PANIC occurred at an unknown location"),
        }
        let payload = panic_info.payload();
        if let Some(s) = payload.downcast_ref::<&str>() {
            error!("Panic message: {}", s);
        } else if let Some(s) = payload.downcast_ref::<String>() {
            error!("Panic message: {}", s);
        } else {
            error!("Panic message: unknown");
        }
        error!("Backtrace:\n{:?}", backtrace);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_panic_handler();

    let args = CliArgs::parse_args();
    init_logging(&args);
    debug!("CLI arguments: {:?}", args);

    let config = Config::from_args(&args).context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;

    let console = Console::new(config.is_quiet());

    let result = match args.command.clone() {
        Command::List { sort, order } => list_files(&config, &sort, &order, &console).await,
        Command::Peers => list_peers(&config, &console).await,
        Command::Upload { file, to } => upload_file(&config, &file, to.as_deref(), &console).await,
        Command::Download { file, .. } => download_file(&config, &file, &console).await,
        Command::Encrypt { input, output } => encrypt_file(&config, &input, &output, &console).await,
        Command::Decrypt { input, output } => decrypt_file(&config, &input, &output, &console).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
        console.print_error(&format!("{:#}", e))?;
    }
    result
}

/// Initialize logging based on verbosity settings
fn init_logging(args: &CliArgs) {
    let level = args.log_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if args.is_verbose() {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    debug!("Logging initialized with level: {:?}", level);
}

/// Open a session against the configured server
fn connect(config: &Config) -> Result<TransferSession<HttpTransport>> {
    let transport = HttpTransport::new(config.server.clone(), config.timeout, config.assume_encrypted)
        .context("Failed to create HTTP client")?;
    info!("Using server {}", config.server);
    Ok(TransferSession::new(transport, config.session_options()))
}

/// List files visible to this machine
async fn list_files(config: &Config, sort: &str, order: &str, console: &Console) -> Result<()> {
    let session = connect(config)?;
    session.set_sort(SortSpec::from_query(Some(sort), Some(order)));

    let notice = session.dispatch(Intent::RefreshFiles).await;
    console.print_table(&session.table())?;
    if notice.is_error() {
        anyhow::bail!("{}", notice);
    }
    Ok(())
}

/// List the recipient options
async fn list_peers(config: &Config, console: &Console) -> Result<()> {
    let session = connect(config)?;

    let notice = session.dispatch(Intent::RefreshRecipients).await;
    if notice.is_error() {
        anyhow::bail!("{}", notice);
    }
    console.print_notice(&notice)?;
    console.print_recipients(&session.recipients().options())?;
    Ok(())
}

/// Upload a local file, optionally to a single recipient
async fn upload_file(config: &Config, file: &Path, to: Option<&str>, console: &Console) -> Result<()> {
    let session = connect(config)?;
    session
        .choose_file_path(file)
        .await
        .with_context(|| format!("Cannot upload {}", file.display()))?;

    if let Some(to) = to {
        choose_recipient(&session, to, console).await?;
    }

    let notice = session.dispatch(Intent::UploadRequested).await;
    match &notice {
        Notice::Uploaded(receipt) => {
            console.print_notice(&notice)?;
            if let Some(name) = &receipt.storage_name {
                console.print_info(&format!("Stored as {}", name))?;
            }
            Ok(())
        }
        _ => anyhow::bail!("{}", notice),
    }
}

/// Download, decrypt and save one listed file
async fn download_file(config: &Config, query: &str, console: &Console) -> Result<()> {
    let session = connect(config)?;

    let notice = session.dispatch(Intent::RefreshFiles).await;
    if notice.is_error() {
        anyhow::bail!("{}", notice);
    }

    let target = find_file(&session, query)
        .with_context(|| format!("No file matching '{}' is visible to this machine", query))?;
    debug!("Resolved '{}' to {}", query, target.storage_name);

    match session.dispatch(Intent::DownloadRequested(target)).await {
        Notice::Downloaded { path, bytes } => {
            console.print_complete("Download", &path, bytes)?;
            Ok(())
        }
        notice => anyhow::bail!("{}", notice),
    }
}

/// Select `to` as the upload recipient, warning when it falls back to Everyone
async fn choose_recipient(
    session: &TransferSession<HttpTransport>,
    to: &str,
    console: &Console,
) -> Result<()> {
    // Without a fresh directory the address falls back to Everyone; say so but carry on
    let notice = session.dispatch(Intent::RefreshRecipients).await;
    if notice.is_error() {
        warn!("{}", notice);
        console.print_notice(&notice)?;
    }

    let requested = RecipientTarget::from_form(Some(to));
    let selected = match session.dispatch(Intent::RecipientChosen(requested.clone())).await {
        Notice::RecipientSelected(target) => target,
        notice => anyhow::bail!("{}", notice),
    };

    if selected != requested {
        console.print_info(&format!("{} is not an active peer, sending to {}", to, selected))?;
    }
    Ok(())
}

/// Find a listed file by storage name, display name, or 1-based row number
fn find_file(session: &TransferSession<HttpTransport>, query: &str) -> Option<StoredFile> {
    let table = session.table();
    table
        .find(query)
        .or_else(|| table.rows().iter().find(|f| f.display_name == query))
        .or_else(|| query.parse::<usize>().ok().and_then(|n| table.get(n)))
        .cloned()
}

/// Encrypt a local file into the stored `IV || ciphertext` format
async fn encrypt_file(config: &Config, input: &Path, output: &Path, console: &Console) -> Result<()> {
    let plaintext = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let blob = crypto::encrypt(&plaintext, &config.key);
    tokio::fs::write(output, blob.to_bytes())
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Encrypted {} bytes into {}", plaintext.len(), output.display());
    console.print_complete("Encryption", output, blob.encoded_len() as u64)?;
    Ok(())
}

/// Decrypt a local file in the stored format
async fn decrypt_file(config: &Config, input: &Path, output: &Path, console: &Console) -> Result<()> {
    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let plaintext = crypto::decrypt(&data, &config.key)
        .with_context(|| format!("Failed to decrypt {}", input.display()))?;
    tokio::fs::write(output, &plaintext)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Decrypted {} into {} bytes", input.display(), plaintext.len());
    console.print_complete("Decryption", output, plaintext.len() as u64)?;
    Ok(())
}
