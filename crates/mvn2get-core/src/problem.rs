//! The problem ledger: structured, deduplicated records of everything that
//! went wrong during a resolution run.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use mvn2get_util::errors::Mvn2getError;

/// Category of a recorded problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    NotFound,
    HttpError,
    XmlParseError,
    DigestMismatch,
    SignatureInvalid,
    SignatureKeyMissing,
    UnresolvedProperty,
    LicenseRejected,
    VersionRangeUnsupported,
}

impl ProblemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemKind::NotFound => "not_found",
            ProblemKind::HttpError => "http_error",
            ProblemKind::XmlParseError => "xml_parse_error",
            ProblemKind::DigestMismatch => "digest_mismatch",
            ProblemKind::SignatureInvalid => "signature_invalid",
            ProblemKind::SignatureKeyMissing => "signature_key_missing",
            ProblemKind::UnresolvedProperty => "unresolved_property",
            ProblemKind::LicenseRejected => "license_rejected",
            ProblemKind::VersionRangeUnsupported => "version_range_unsupported",
        }
    }
}

/// A single problem observed while resolving.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub kind: ProblemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub message: String,
    pub recoverable: bool,
}

impl Problem {
    pub fn new(kind: ProblemKind, message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            kind,
            coordinate: None,
            url: None,
            message: message.into(),
            recoverable,
        }
    }

    pub fn with_coordinate(mut self, coordinate: impl Into<String>) -> Self {
        self.coordinate = Some(coordinate.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Default)]
struct LedgerInner {
    problems: Vec<Problem>,
    seen: HashSet<(ProblemKind, Option<String>, Option<String>)>,
}

/// Thread-safe accumulator of problems for the process lifetime.
///
/// Recording the same `(kind, coordinate, url)` triple twice is a no-op.
#[derive(Default)]
pub struct ProblemLedger {
    inner: Mutex<LedgerInner>,
}

impl ProblemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a problem unless an identical triple is already recorded.
    pub fn record(&self, problem: Problem) {
        let mut inner = self.inner.lock().expect("ledger lock");
        let triple = (
            problem.kind,
            problem.coordinate.clone(),
            problem.url.clone(),
        );
        if inner.seen.insert(triple) {
            inner.problems.push(problem);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("ledger lock").problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("ledger lock").problems.len()
    }

    /// A point-in-time copy of every recorded problem.
    pub fn snapshot(&self) -> Vec<Problem> {
        self.inner.lock().expect("ledger lock").problems.clone()
    }

    /// Serialise the ledger as pretty JSON to the given file.
    pub fn write_report(&self, path: &Path) -> miette::Result<()> {
        let problems = self.snapshot();
        let json = serde_json::to_string_pretty(&problems).map_err(|e| Mvn2getError::Generic {
            message: format!("Failed to serialise problem report: {e}"),
        })?;
        std::fs::write(path, json).map_err(|e| Mvn2getError::Generic {
            message: format!("Failed to write {}: {e}", path.display()),
        })?;
        Ok(())
    }
}
