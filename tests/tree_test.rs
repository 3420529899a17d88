//! End-to-end tree construction and traversal scenario.

use drive_archiver::{build_tree, walk, ArchiverError, DriveFile, NodeKind};

fn record(id: &str, name: &str, mime: &str, parents: &[&str]) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime.to_string(),
        parents: parents.iter().map(|p| p.to_string()).collect(),
    }
}

fn scenario_records() -> Vec<DriveFile> {
    vec![
        record("1", "Root", "application/vnd.google-apps.folder", &[]),
        record("2", "Doc1", "application/vnd.google-apps.document", &["1"]),
        record("3", "Sub", "application/vnd.google-apps.folder", &["1"]),
        record("4", "Doc2", "application/vnd.google-apps.document", &["3"]),
        record("5", "Ignore", "application/vnd.google-apps.shortcut", &["1"]),
    ]
}

#[test]
fn test_archive_scenario() {
    let root = build_tree(&scenario_records(), "Root").unwrap();

    assert_eq!(root.name, "Root");
    assert_eq!(root.path, "");
    assert_eq!(root.kind, NodeKind::Folder);

    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Doc1", "Sub"]);
    assert!(root.children.iter().all(|c| c.path == "Root"));

    let sub = &root.children[1];
    assert_eq!(sub.children.len(), 1);
    assert_eq!(sub.children[0].name, "Doc2");
    assert_eq!(sub.children[0].path, "Root/Sub");

    // The shortcut never makes it into the tree.
    let mut all_names = Vec::new();
    walk(&root, &mut |node| all_names.push(node.name.clone()));
    assert!(!all_names.contains(&"Ignore".to_string()));

    // Pre-order visit: parent before children, subtree before next sibling.
    assert_eq!(all_names, vec!["Root", "Doc1", "Sub", "Doc2"]);
}

#[test]
fn test_each_node_visited_exactly_once() {
    let root = build_tree(&scenario_records(), "Root").unwrap();

    let mut visits = std::collections::HashMap::new();
    walk(&root, &mut |node| {
        *visits.entry(node.id.clone()).or_insert(0) += 1;
    });

    assert_eq!(visits.len(), 4);
    assert!(visits.values().all(|count| *count == 1));
}

#[test]
fn test_missing_root_is_fatal() {
    let err = build_tree(&scenario_records(), "Nonexistent").unwrap_err();
    assert!(matches!(err, ArchiverError::RootNotFound(_)));
    assert!(format!("{err}").contains("Nonexistent"));
}
