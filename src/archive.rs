//! Export of document nodes to local disk.

use std::path::{Path, PathBuf};

use crate::client::DriveClient;
use crate::error::Result;
use crate::tree::{DriveNode, NodeKind};

/// One export target: the MIME type requested from the API and the file
/// extension used on disk.
#[derive(Debug, Clone, Copy)]
pub struct ExportFormat {
    pub mime: &'static str,
    pub ext: &'static str,
}

/// Formats every document is exported in.
pub const DOC_EXPORT_FORMATS: [ExportFormat; 3] = [
    ExportFormat { mime: "text/plain", ext: "txt" },
    ExportFormat { mime: "application/rtf", ext: "rtf" },
    ExportFormat { mime: "application/pdf", ext: "pdf" },
];

/// Directory a document's exports land in: `<base>/<path>/<name>/`.
pub fn document_out_dir(base_out: &Path, node: &DriveNode) -> PathBuf {
    base_out.join(&node.path).join(&node.name)
}

/// Export `node` in every configured format, creating its output directory.
///
/// Nodes that are not documents are skipped. Any export or filesystem
/// failure propagates to the caller and aborts the remaining run.
pub async fn archive_document(
    client: &DriveClient,
    base_out: &Path,
    node: &DriveNode,
) -> Result<()> {
    if node.kind != NodeKind::Document {
        return Ok(());
    }

    let out_dir = document_out_dir(base_out, node);
    std::fs::create_dir_all(&out_dir)?;

    for format in DOC_EXPORT_FORMATS {
        println!("Downloading {}/{}.{}", node.path, node.name, format.ext);
        let destination = out_dir.join(format!("{}.{}", node.name, format.ext));
        client
            .export_file(&node.id, format.mime, &destination)
            .await?;
    }

    Ok(())
}
