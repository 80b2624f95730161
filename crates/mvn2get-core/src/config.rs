//! Configuration loading for mvn2get.
//!
//! The tool is configured through a strict-JSON file discovered in this
//! order: an explicit `--config` path, `./.mvn2get.json`, then
//! `$HOME/.mvn2get.json`. Missing files fall through to defaults; a file
//! that exists but fails to parse is a fatal error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mvn2get_util::errors::Mvn2getError;

/// Maven Central base URL, the default remote repository.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2/";

/// Configuration file name searched for in the working directory and `$HOME`.
pub const CONFIG_FILE_NAME: &str = ".mvn2get.json";

/// Verbosity of the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The `tracing` filter directive equivalent to this level.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Warn
    }
}

/// Rewrite target for a mislabeled artifact group: the corrected group and
/// a prefix prepended to the artifact name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRewrite(pub String, pub String);

impl GroupRewrite {
    pub fn group(&self) -> &str {
        &self.0
    }

    pub fn artifact_prefix(&self) -> &str {
        &self.1
    }
}

/// The typed configuration value consumed by the resolver.
///
/// Every field has a default, so an absent or empty configuration file
/// yields a usable fetch-from-Maven-Central setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    /// Emit progress events while resolving.
    #[serde(default)]
    pub show_progress: bool,

    /// Event filtering level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Where to write the problem report at shutdown, if anywhere.
    #[serde(default)]
    pub problem_file: Option<PathBuf>,

    /// Follow compile/runtime dependencies transitively.
    #[serde(default)]
    pub recursive: bool,

    /// Overwrite files already present in the output directory.
    #[serde(default)]
    pub overwrite: bool,

    /// Persist fetched bytes. When false, everything is verified but
    /// nothing is written.
    #[serde(default = "default_true")]
    pub do_remote_download: bool,

    /// Also enqueue dependencyManagement entries during recursion.
    #[serde(default)]
    pub include_dep_management: bool,

    /// Probe local repositories before downloading from remotes.
    #[serde(default = "default_true")]
    pub check_in_local: bool,

    /// Skip detached-signature verification entirely.
    #[serde(default)]
    pub no_pgp: bool,

    /// Spinner glyphs, one frame per character.
    #[serde(default = "default_progress_indicators")]
    pub progress_indicators: String,

    /// Ordered remote fallback list. Base URLs are normalised to end in `/`.
    #[serde(default = "default_remote_repo_urls")]
    pub remote_repo_urls: Vec<String>,

    /// Local repositories, same URL format as the remotes.
    #[serde(default)]
    pub local_repo_urls: Vec<String>,

    /// Key servers handed to the signature verifier.
    #[serde(default)]
    pub pgp_key_servers: Vec<String>,

    /// License URL whitelist.
    #[serde(default)]
    pub acceptable_license_urls: Vec<String>,

    /// License name whitelist.
    #[serde(default)]
    pub acceptable_license_names: Vec<String>,

    /// Persist artifacts whose licenses match nothing in the whitelists.
    #[serde(default = "default_true")]
    pub allow_unacceptable_licenses: bool,

    /// Persist artifacts that declare no license at all.
    #[serde(default = "default_true")]
    pub allow_no_license: bool,

    /// Reject artifacts that declare no license, regardless of
    /// `allow_no_license`.
    #[serde(default)]
    pub require_license: bool,

    /// Canonicalisation rewrites applied to seed and dependency groups.
    /// Keys are group prefixes; values are `[new_group, artifact_prefix]`.
    #[serde(default)]
    pub mislabeled_artifact_groups: BTreeMap<String, GroupRewrite>,

    /// Directory all fetched files land in, flat.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_progress_indicators() -> String {
    "|/-\\".to_string()
}

fn default_remote_repo_urls() -> Vec<String> {
    vec![MAVEN_CENTRAL_URL.to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Configuration {
    fn default() -> Self {
        serde_json::from_str("{}").expect("defaults deserialize")
    }
}

/// Where a repository lives; local hits suppress remote downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryKind {
    Remote,
    Local,
}

/// A repository base URL with its kind. Base URLs always end in `/`.
#[derive(Debug, Clone)]
pub struct Repository {
    pub base_url: String,
    pub kind: RepositoryKind,
}

impl Repository {
    pub fn new(base_url: &str, kind: RepositoryKind) -> Self {
        Self {
            base_url: normalise_base_url(base_url),
            kind,
        }
    }
}

/// Append a trailing `/` to a repository base URL if it is missing.
pub fn normalise_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

impl Configuration {
    /// Load a configuration file from an explicit path.
    pub fn load(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Mvn2getError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let mut config: Configuration =
            serde_json::from_str(&content).map_err(|e| Mvn2getError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            })?;
        config.normalise();
        Ok(config)
    }

    /// Discover the configuration: explicit path, `./.mvn2get.json`,
    /// `$HOME/.mvn2get.json`, then defaults.
    ///
    /// An explicit path that does not exist is an error; the search
    /// locations fall through silently.
    pub fn discover(explicit: Option<&Path>) -> miette::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let cwd_config = Path::new(CONFIG_FILE_NAME);
        if cwd_config.is_file() {
            return Self::load(cwd_config);
        }
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_FILE_NAME);
            if home_config.is_file() {
                return Self::load(&home_config);
            }
        }
        Ok(Self::default())
    }

    /// Normalise repository base URLs so path derivation can append blindly.
    pub fn normalise(&mut self) {
        for url in self
            .remote_repo_urls
            .iter_mut()
            .chain(self.local_repo_urls.iter_mut())
        {
            *url = normalise_base_url(url);
        }
    }

    /// All configured repositories: locals first, then the ordered remotes.
    pub fn repositories(&self) -> Vec<Repository> {
        let locals = self
            .local_repo_urls
            .iter()
            .map(|u| Repository::new(u, RepositoryKind::Local));
        let remotes = self
            .remote_repo_urls
            .iter()
            .map(|u| Repository::new(u, RepositoryKind::Remote));
        locals.chain(remotes).collect()
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Configuration::default();
        assert!(!config.recursive);
        assert!(config.do_remote_download);
        assert!(config.check_in_local);
        assert!(config.allow_unacceptable_licenses);
        assert!(config.allow_no_license);
        assert!(!config.require_license);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.progress_indicators, "|/-\\");
        assert_eq!(config.remote_repo_urls, vec![MAVEN_CENTRAL_URL.to_string()]);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let parsed: Configuration = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.remote_repo_urls, vec![MAVEN_CENTRAL_URL.to_string()]);
    }

    #[test]
    fn base_urls_are_normalised() {
        let mut config: Configuration = serde_json::from_str(
            r#"{"remote_repo_urls": ["https://repo.example.com/maven2"]}"#,
        )
        .unwrap();
        config.normalise();
        assert_eq!(config.remote_repo_urls[0], "https://repo.example.com/maven2/");
    }

    #[test]
    fn group_rewrite_shape() {
        let config: Configuration = serde_json::from_str(
            r#"{"mislabeled_artifact_groups": {"org.old": ["org.new", "legacy-"]}}"#,
        )
        .unwrap();
        let rewrite = config.mislabeled_artifact_groups.get("org.old").unwrap();
        assert_eq!(rewrite.group(), "org.new");
        assert_eq!(rewrite.artifact_prefix(), "legacy-");
    }

    #[test]
    fn load_rejects_malformed_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".mvn2get.json");
        std::fs::write(&path, "{ recursive: true, }").unwrap();
        assert!(Configuration::load(&path).is_err());
    }

    #[test]
    fn load_reads_options() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".mvn2get.json");
        std::fs::write(
            &path,
            r#"{"recursive": true, "log_level": "debug", "no_pgp": true}"#,
        )
        .unwrap();
        let config = Configuration::load(&path).unwrap();
        assert!(config.recursive);
        assert!(config.no_pgp);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn repositories_are_locals_then_remotes() {
        let mut config = Configuration::default();
        config.local_repo_urls = vec!["http://localhost:8081/maven".to_string()];
        config.normalise();
        let repos = config.repositories();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].kind, RepositoryKind::Local);
        assert!(repos[0].base_url.ends_with('/'));
        assert_eq!(repos[1].kind, RepositoryKind::Remote);
    }
}
