//! drive_archiver CLI - Export Google Docs from a Drive folder to local disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use drive_archiver::{archive_document, build_tree, walk, Authenticator, DriveClient, NodeKind};

/// Output directory used when no positional argument is given.
const DEFAULT_OUT: &str = "/tmp/buf/archiver/out";

/// Export every document under a Drive folder to local disk.
#[derive(Parser)]
#[command(name = "drive_archiver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output directory for exported documents.
    #[arg(default_value = DEFAULT_OUT)]
    output: PathBuf,

    /// Display name of the Drive folder to archive.
    #[arg(long, env = "DRIVE_ARCHIVER_ROOT", default_value = "My Writings")]
    root: String,

    /// Path to the OAuth client secrets file (defaults to ~/.archiver/credentials.json).
    #[arg(long, env = "DRIVE_ARCHIVER_CREDENTIALS")]
    credentials: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create output directory: {:?}", cli.output))?;

    let auth = match &cli.credentials {
        Some(path) => Authenticator::from_secrets_file(path)
            .with_context(|| format!("Failed to load client secrets from {:?}", path))?,
        None => Authenticator::from_default_files().context("Failed to load client secrets")?,
    };

    let client = DriveClient::new(auth);

    let records = client
        .list_all()
        .await
        .context("Failed to list Drive files")?;

    let tree = build_tree(&records, &cli.root)?;

    // Collect documents in pre-order, then export them one at a time.
    let mut documents = Vec::new();
    walk(&tree, &mut |node| {
        if node.kind == NodeKind::Document {
            documents.push(node.clone());
        }
    });

    println!(
        "Archiving {} document(s) from '{}' to {:?}",
        documents.len(),
        cli.root,
        cli.output
    );

    for document in &documents {
        archive_document(&client, &cli.output, document)
            .await
            .with_context(|| format!("Failed to export {}/{}", document.path, document.name))?;
    }

    println!("Done.");

    Ok(())
}
