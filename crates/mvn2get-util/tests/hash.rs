use mvn2get_util::hash::{md5_bytes, sha1_bytes};

#[test]
fn test_md5_empty() {
    assert_eq!(md5_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
}

#[test]
fn test_md5_hello_world() {
    assert_eq!(md5_bytes(b"hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
}

#[test]
fn test_sha1_empty() {
    assert_eq!(sha1_bytes(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
}

#[test]
fn test_sha1_hello_world() {
    assert_eq!(
        sha1_bytes(b"hello world"),
        "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
    );
}

#[test]
fn test_deterministic() {
    assert_eq!(sha1_bytes(b"mvn2get"), sha1_bytes(b"mvn2get"));
    assert_eq!(md5_bytes(b"mvn2get"), md5_bytes(b"mvn2get"));
}
