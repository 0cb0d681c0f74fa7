//! Tests for virtual host resolution

use std::path::{Path, PathBuf};

use vhttpd::vhost::{ResolveError, VirtualHosts, clean_path};

fn hosts() -> VirtualHosts {
    let mut hosts = VirtualHosts::new();
    hosts.insert("website1", "/srv/docroot_dirs/htdocs1");
    hosts.insert("website2", "/srv/docroot_dirs/htdocs2/");
    hosts
}

#[test]
fn test_resolve_known_host() {
    let hosts = hosts();
    assert_eq!(
        hosts.resolve("website1"),
        Some(Path::new("/srv/docroot_dirs/htdocs1"))
    );
    assert_eq!(hosts.len(), 2);
}

#[test]
fn test_resolve_unknown_host() {
    let hosts = hosts();
    assert_eq!(hosts.resolve("website3"), None);
    assert_eq!(
        hosts.candidate_path("website3", "/index.html"),
        Err(ResolveError::UnknownHost("website3".to_string()))
    );
}

#[test]
fn test_unknown_host_never_yields_absolute_url_path() {
    let hosts = VirtualHosts::new();
    assert!(hosts.candidate_path("", "/etc/passwd").is_err());
}

#[test]
fn test_candidate_path_inside_root() {
    let hosts = hosts();
    assert_eq!(
        hosts.candidate_path("website1", "/images/cat.jpg").unwrap(),
        PathBuf::from("/srv/docroot_dirs/htdocs1/images/cat.jpg")
    );
    assert_eq!(
        hosts.candidate_path("website2", "/./a/../b.html").unwrap(),
        PathBuf::from("/srv/docroot_dirs/htdocs2/b.html")
    );
}

#[test]
fn test_candidate_path_escape() {
    let hosts = hosts();
    let err = hosts
        .candidate_path("website1", "/../htdocs2/index.html")
        .unwrap_err();
    assert!(matches!(err, ResolveError::PathEscape { .. }));

    let err = hosts
        .candidate_path("website1", "/../../../../etc/passwd")
        .unwrap_err();
    assert!(matches!(err, ResolveError::PathEscape { .. }));
}

#[test]
fn test_candidate_path_sibling_with_common_prefix_escapes() {
    let mut hosts = VirtualHosts::new();
    hosts.insert("a", "/srv/htdocs1");
    let err = hosts.candidate_path("a", "/../htdocs10/index.html").unwrap_err();
    assert!(matches!(err, ResolveError::PathEscape { .. }));
}

#[test]
fn test_candidate_path_returning_to_root() {
    let hosts = hosts();
    assert_eq!(
        hosts
            .candidate_path("website1", "/../htdocs2/../htdocs1/kitten.jpg")
            .unwrap(),
        PathBuf::from("/srv/docroot_dirs/htdocs1/kitten.jpg")
    );
}

#[test]
fn test_clean_path() {
    assert_eq!(clean_path(Path::new("/a/b/../../c")), PathBuf::from("/c"));
    assert_eq!(clean_path(Path::new("/a//b/./c/")), PathBuf::from("/a/b/c"));
    assert_eq!(clean_path(Path::new("/..")), PathBuf::from("/"));
    assert_eq!(clean_path(Path::new("")), PathBuf::from("."));
}

#[test]
fn test_verify_missing_docroot() {
    let mut hosts = VirtualHosts::new();
    hosts.insert("ghost", "/definitely/not/a/real/docroot");
    assert!(hosts.verify().is_err());
}

#[test]
fn test_verify_docroot_is_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, "x").unwrap();

    let mut hosts = VirtualHosts::new();
    hosts.insert("file", &file);
    assert!(hosts.verify().is_err());

    let mut hosts = VirtualHosts::new();
    hosts.insert("dir", dir.path());
    assert!(hosts.verify().is_ok());
}
