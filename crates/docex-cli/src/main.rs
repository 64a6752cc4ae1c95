//! docex CLI: upload a PDF or PNG to the extraction service and show the
//! name and email found in it.
//!
//! Reads DOCEX_API_URL (or API_URL), DOCEX_API_PREFIX and
//! DOCEX_REQUEST_TIMEOUT_SECS; `--api-url` and `--timeout-secs` take precedence.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docex_api_client::ApiClient;
use docex_cli::{init_tracing, load_selection, print_json};
use docex_controller::{ControllerConfig, ControllerHandle};
use docex_core::{ClientConfig, SelectionSource, UploadState, View};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "docex", about = "Extract name and email from PDF or PNG documents")]
struct Cli {
    /// Base URL of the extraction service
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a file and extract its contact details
    Extract(UploadArgs),
    /// Same as extract, as if the files were dropped onto the upload area
    Drop(UploadArgs),
    /// Interactive session: enter paths, `reset` or `quit`, one per line
    Session,
    /// Check that the extraction service is up
    Health,
}

#[derive(Args)]
struct UploadArgs {
    /// Files to upload; only the first one is sent
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Override the content type derived from the file extension
    #[arg(long)]
    content_type: Option<String>,
    /// Print the raw extraction result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env().context("Failed to load client configuration")?;
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.validate().context("Invalid client configuration")?;
        Ok(config)
    }
}

fn start(config: &ClientConfig) -> Result<ControllerHandle> {
    let client = ApiClient::new(config).context(
        "Failed to create API client. Set DOCEX_API_URL (or API_URL) or pass --api-url",
    )?;
    let (handle, _join) = docex_controller::spawn(
        Arc::new(client),
        ControllerConfig {
            request_timeout: config.request_timeout,
            ..Default::default()
        },
    );
    Ok(handle)
}

fn exit_code(state: &UploadState) -> ExitCode {
    match state {
        UploadState::Error { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

async fn upload(config: &ClientConfig, source: SelectionSource, args: UploadArgs) -> Result<ExitCode> {
    let files = load_selection(&args.files, args.content_type.as_deref())?;
    let handle = start(config)?;

    let after = handle.select(source, files).await?;
    if !args.json && matches!(after, UploadState::Loading { .. }) {
        println!("{}", View::of(&after));
    }

    let state = handle.settled(after).await?;
    match (&state, args.json) {
        (UploadState::Success { result, .. }, true) => print_json(result)?,
        (UploadState::Error { message, .. }, true) => {
            print_json(&serde_json::json!({ "error": message }))?
        }
        _ => println!("{}", View::of(&state)),
    }

    Ok(exit_code(&state))
}

async fn session(config: &ClientConfig) -> Result<ExitCode> {
    let handle = start(config)?;
    println!("{}", View::of(&handle.state()));

    let mut updates = handle.subscribe();
    let renderer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let view = View::of(&updates.borrow_and_update());
            println!("\n{}", view);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "reset" => {
                handle.reset().await?;
            }
            input => {
                let paths: Vec<PathBuf> = input.split_whitespace().map(PathBuf::from).collect();
                match load_selection(&paths, None) {
                    Ok(files) => {
                        handle.select(SelectionSource::DragDrop, files).await?;
                    }
                    Err(e) => eprintln!("{:#}", e),
                }
            }
        }
    }

    // Let an in-flight request finish before the renderer shuts down.
    let state = handle.settled(handle.state()).await?;
    drop(handle);
    renderer.await.context("Renderer task failed")?;

    Ok(exit_code(&state))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.client_config()?;
    tracing::debug!(api_url = %config.api_url, timeout = ?config.request_timeout, "Client configured");

    match cli.command {
        Commands::Extract(args) => upload(&config, SelectionSource::FilePicker, args).await,
        Commands::Drop(args) => upload(&config, SelectionSource::DragDrop, args).await,
        Commands::Session => session(&config).await,
        Commands::Health => {
            let client = ApiClient::new(&config).context("Failed to create API client")?;
            let health = client.health().await?;
            print_json(&health)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
