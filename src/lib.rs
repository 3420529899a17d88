//! drive_archiver - Export Google Docs from a Drive folder to local disk.
//!
//! This library provides functionality to:
//! - Authenticate with an installed-app OAuth flow (tokens persisted under `~/.archiver`)
//! - List the full non-trashed Drive corpus through the paginated files.list endpoint
//! - Rebuild the folder hierarchy under a named root folder from the flat listing
//! - Walk the tree and export every document in a fixed set of formats
//!
//! # Example
//!
//! ```no_run
//! use drive_archiver::{build_tree, walk, Authenticator, DriveClient, NodeKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::from_default_files()?;
//!     let client = DriveClient::new(auth);
//!
//!     let records = client.list_all().await?;
//!     let root = build_tree(&records, "My Writings")?;
//!
//!     walk(&root, &mut |node| {
//!         if node.kind == NodeKind::Document {
//!             println!("{}/{}", node.path, node.name);
//!         }
//!     });
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod tree;

// Re-exports for convenience
pub use archive::{archive_document, ExportFormat, DOC_EXPORT_FORMATS};
pub use auth::Authenticator;
pub use client::DriveClient;
pub use error::{ArchiverError, Result};
pub use models::DriveFile;
pub use tree::{build_tree, walk, DriveNode, NodeKind};
