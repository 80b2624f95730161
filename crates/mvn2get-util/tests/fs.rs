use mvn2get_util::fs::{ensure_dir, write_atomic};

#[test]
fn test_ensure_dir_creates_parents() {
    let tmp = tempfile::tempdir().unwrap();
    let nested = tmp.path().join("a/b/c");
    ensure_dir(&nested).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn test_ensure_dir_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    ensure_dir(tmp.path()).unwrap();
    ensure_dir(tmp.path()).unwrap();
}

#[test]
fn test_write_atomic_creates_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_atomic(tmp.path(), "lib-1.0.jar", b"jar bytes").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"jar bytes");
}

#[test]
fn test_write_atomic_creates_missing_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("out");
    write_atomic(&dir, "file.pom", b"<project/>").unwrap();
    assert!(dir.join("file.pom").is_file());
}

#[test]
fn test_write_atomic_replaces_existing() {
    let tmp = tempfile::tempdir().unwrap();
    write_atomic(tmp.path(), "f", b"old").unwrap();
    write_atomic(tmp.path(), "f", b"new").unwrap();
    assert_eq!(std::fs::read(tmp.path().join("f")).unwrap(), b"new");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let tmp = tempfile::tempdir().unwrap();
    write_atomic(tmp.path(), "f", b"data").unwrap();
    let names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["f".to_string()]);
}
