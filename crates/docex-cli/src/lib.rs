use anyhow::{Context, Result};
use docex_core::SelectedFile;
use serde::Serialize;
use std::path::PathBuf;

/// Turn a list of paths into a selection. Only the first path has to be
/// readable: later entries are dropped by the controller anyway, so any that
/// cannot be described are skipped.
pub fn load_selection(paths: &[PathBuf], content_type: Option<&str>) -> Result<Vec<SelectedFile>> {
    let mut paths = paths.iter();
    let first = match paths.next() {
        Some(path) => path,
        None => return Ok(Vec::new()),
    };

    let mut files = vec![SelectedFile::from_path(first, content_type)
        .with_context(|| format!("Failed to open file: {}", first.display()))?];

    for path in paths {
        match SelectedFile::from_path(path, content_type) {
            Ok(file) => files.push(file),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping extra file"),
        }
    }

    Ok(files)
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing for the CLI. Logs go to stderr so rendered output stays
/// on stdout.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
