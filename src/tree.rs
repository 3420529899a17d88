//! Reconstruction of a Drive folder hierarchy from the flat file listing.
//!
//! The files.list endpoint returns one flat record per remote object, each
//! carrying the IDs of its parent folders. [`build_tree`] turns that listing
//! into a rooted tree under a named folder, and [`walk`] traverses it in
//! pre-order. Both are pure; all I/O lives in the client and archive layers.

use std::collections::HashMap;

use crate::error::{ArchiverError, Result};
use crate::models::DriveFile;

/// MIME type tag for Drive folders.
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME type tag for Google Docs documents.
const DOCUMENT_MIME: &str = "application/vnd.google-apps.document";

/// Classification of a remote file into the kinds the archiver handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Document,
    Other,
}

impl NodeKind {
    /// Map a raw Drive MIME type tag to a kind.
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type {
            FOLDER_MIME => NodeKind::Folder,
            DOCUMENT_MIME => NodeKind::Document,
            _ => NodeKind::Other,
        }
    }
}

/// One node of the reconstructed folder tree.
///
/// `path` is the slash-joined chain of ancestor names: the root's path is
/// empty, a node directly under the root has the root's name as its path,
/// and deeper nodes accumulate one segment per ancestor folder.
#[derive(Debug, Clone)]
pub struct DriveNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub path: String,
    pub children: Vec<DriveNode>,
}

/// Build the folder tree rooted at the first record named `root_name`.
///
/// The root record is matched by exact name and always becomes a folder
/// node with an empty path. Records whose MIME type is neither a folder nor
/// a document are dropped along with everything filed under them. A record
/// listing several parents is attached under each parent that survives
/// construction. Within one parent, children keep the listing order.
pub fn build_tree(records: &[DriveFile], root_name: &str) -> Result<DriveNode> {
    let root = records
        .iter()
        .find(|record| record.name == root_name)
        .ok_or_else(|| ArchiverError::RootNotFound(root_name.to_string()))?;

    let mut by_parent: HashMap<&str, Vec<&DriveFile>> = HashMap::new();
    for record in records {
        for parent in &record.parents {
            by_parent.entry(parent.as_str()).or_default().push(record);
        }
    }

    Ok(DriveNode {
        id: root.id.clone(),
        name: root.name.clone(),
        kind: NodeKind::Folder,
        path: String::new(),
        children: children_of(&by_parent, &root.id, &root.name),
    })
}

/// Assemble the child nodes filed under `parent_id`.
///
/// `path` is the path value assigned to the children, i.e. the parent's own
/// path extended with the parent's name. Only folders are recursed into, so
/// a document claimed as someone's parent still ends up with no children.
fn children_of(
    by_parent: &HashMap<&str, Vec<&DriveFile>>,
    parent_id: &str,
    path: &str,
) -> Vec<DriveNode> {
    let Some(records) = by_parent.get(parent_id) else {
        return Vec::new();
    };

    let mut children = Vec::new();
    for record in records {
        let kind = NodeKind::from_mime(&record.mime_type);
        if kind == NodeKind::Other {
            continue;
        }

        let grandchildren = if kind == NodeKind::Folder {
            children_of(by_parent, &record.id, &format!("{}/{}", path, record.name))
        } else {
            Vec::new()
        };

        children.push(DriveNode {
            id: record.id.clone(),
            name: record.name.clone(),
            kind,
            path: path.to_string(),
            children: grandchildren,
        });
    }
    children
}

/// Visit every node in pre-order.
///
/// A node is visited before any of its children, and a subtree is finished
/// before the next sibling starts. The visitor's side effects are the
/// caller's concern; the walker itself performs no I/O.
pub fn walk<F: FnMut(&DriveNode)>(root: &DriveNode, visit: &mut F) {
    visit(root);
    for child in &root.children {
        walk(child, visit);
    }
}
