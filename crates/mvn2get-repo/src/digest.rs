//! Checksum sidecar verification (MD5, SHA-1).

use mvn2get_util::hash;

/// Digest algorithms published alongside Maven 2 artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Md5,
    Sha1,
}

impl DigestKind {
    /// Filename suffix of this kind's sidecar, including the dot.
    pub fn suffix(self) -> &'static str {
        match self {
            DigestKind::Md5 => ".md5",
            DigestKind::Sha1 => ".sha1",
        }
    }

    /// Compute the digest of `data` as lowercase hex.
    pub fn compute(self, data: &[u8]) -> String {
        match self {
            DigestKind::Md5 => hash::md5_bytes(data),
            DigestKind::Sha1 => hash::sha1_bytes(data),
        }
    }

    /// Both kinds, in the order sidecars are checked.
    pub fn all() -> [DigestKind; 2] {
        [DigestKind::Md5, DigestKind::Sha1]
    }
}

impl std::fmt::Display for DigestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestKind::Md5 => f.write_str("MD5"),
            DigestKind::Sha1 => f.write_str("SHA-1"),
        }
    }
}

/// Extract the hex digest from a sidecar file's bytes.
///
/// Sidecars may contain just the hash, or `hash  filename`, with arbitrary
/// surrounding whitespace.
pub fn extract_hex(content: &[u8]) -> String {
    String::from_utf8_lossy(content)
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

/// Compare payload bytes against an expected hex digest, case-insensitively.
pub fn verify_digest(data: &[u8], kind: DigestKind, expected_hex: &str) -> bool {
    let expected = expected_hex.trim();
    if expected.is_empty() {
        return false;
    }
    kind.compute(data).eq_ignore_ascii_case(expected)
}
