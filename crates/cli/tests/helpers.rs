use std::fs;
use std::path::Path;

use stablemap::{canonicalize_or_current, infer_project_name, sha256_file};
use tempfile::tempdir;

// Both cases change the process cwd, so they share one test to avoid racing.
#[test]
fn canonicalize_or_current_handles_dot_and_relative_paths() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    let nested = canonicalize_or_current("nested").expect("canonicalize nested");
    assert_eq!(nested, subdir.canonicalize().expect("canonicalize subdir"));

    // Paths that do not exist yet are joined onto the cwd.
    let pending = canonicalize_or_current("not-yet").expect("pending path");
    assert!(pending.ends_with("not-yet"));

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("C:/work/stablemap")), "stablemap");
    assert_eq!(infer_project_name(Path::new("/tmp/project-root")), "project-root");
}

#[test]
fn infer_project_name_falls_back_when_missing() {
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn sha256_file_matches_known_hash() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("abc.txt");
    fs::write(&path, b"abc").unwrap();
    assert_eq!(
        sha256_file(&path).unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    let err = sha256_file(&tmp.path().join("missing")).unwrap_err();
    assert!(err.to_string().contains("Failed to open file for hashing"));
}
