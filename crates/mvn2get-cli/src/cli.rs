//! CLI argument definitions for mvn2get.
//!
//! Every configuration option has an equivalent flag; flags win over
//! values loaded from `.mvn2get.json`.

use std::path::PathBuf;

use clap::Parser;

use mvn2get_core::config::{Configuration, GroupRewrite, LogLevel};
use mvn2get_util::errors::Mvn2getError;

#[derive(Parser, Debug)]
#[command(
    name = "mvn2get",
    version,
    about = "Fetch Maven 2 artifacts with checksum and signature verification",
    long_about = "mvn2get downloads all published files of the given artifact coordinates \
                  from an ordered list of Maven 2 repositories, verifies checksums and \
                  detached PGP signatures, and can walk the transitive dependency closure."
)]
pub struct Cli {
    /// Artifact coordinates (group:artifact:version[:classifier[:packaging]])
    /// or full repository URLs
    #[arg(required = true, value_name = "COORDINATE")]
    pub coordinates: Vec<String>,

    /// Explicit configuration file (default: ./.mvn2get.json, then ~/.mvn2get.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory downloaded files are written to, flat
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Follow compile/runtime dependencies transitively
    #[arg(short, long)]
    pub recursive: bool,

    /// Overwrite files already present in the output directory
    #[arg(long)]
    pub overwrite: bool,

    /// Verify everything but write nothing
    #[arg(long)]
    pub no_remote_download: bool,

    /// Also enqueue dependencyManagement entries during recursion
    #[arg(long)]
    pub include_dep_management: bool,

    /// Skip the local-repository probe
    #[arg(long)]
    pub no_local: bool,

    /// Skip detached-signature verification
    #[arg(long)]
    pub no_pgp: bool,

    /// Show a progress spinner
    #[arg(short, long)]
    pub progress: bool,

    /// Event verbosity: warn, info, debug, or trace
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write the problem report to this file at shutdown
    #[arg(long, value_name = "PATH")]
    pub problem_file: Option<PathBuf>,

    /// Remote repository base URL; repeatable, tried in order
    #[arg(long = "remote-repo", value_name = "URL")]
    pub remote_repos: Vec<String>,

    /// Local repository base URL; repeatable
    #[arg(long = "local-repo", value_name = "URL")]
    pub local_repos: Vec<String>,

    /// Reject artifacts whose licenses match no whitelist entry
    #[arg(long)]
    pub strict_licenses: bool,

    /// Reject artifacts that declare no license at all
    #[arg(long)]
    pub require_license: bool,

    /// Treat a missing license declaration as unacceptable
    #[arg(long)]
    pub disallow_missing_license: bool,

    /// Whitelisted license URL; repeatable
    #[arg(long = "acceptable-license-url", value_name = "URL")]
    pub acceptable_license_urls: Vec<String>,

    /// Whitelisted license name; repeatable
    #[arg(long = "acceptable-license-name", value_name = "NAME")]
    pub acceptable_license_names: Vec<String>,

    /// PGP key server passed to the signature verifier; repeatable
    #[arg(long = "pgp-key-server", value_name = "URL")]
    pub pgp_key_servers: Vec<String>,

    /// Spinner glyphs, one frame per character
    #[arg(long, value_name = "GLYPHS")]
    pub progress_indicators: Option<String>,

    /// Group rewrite as `prefix=new-group,artifact-prefix`; repeatable
    #[arg(long = "mislabeled-group", value_name = "REWRITE")]
    pub mislabeled_groups: Vec<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

impl Cli {
    /// Discover the configuration file and overlay the flags onto it.
    pub fn build_configuration(&self) -> miette::Result<Configuration> {
        let mut config = Configuration::discover(self.config.as_deref())?;

        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.recursive {
            config.recursive = true;
        }
        if self.overwrite {
            config.overwrite = true;
        }
        if self.no_remote_download {
            config.do_remote_download = false;
        }
        if self.include_dep_management {
            config.include_dep_management = true;
        }
        if self.no_local {
            config.check_in_local = false;
        }
        if self.no_pgp {
            config.no_pgp = true;
        }
        if self.progress {
            config.show_progress = true;
        }
        if let Some(level) = &self.log_level {
            config.log_level = parse_level(level)?;
        }
        if let Some(path) = &self.problem_file {
            config.problem_file = Some(path.clone());
        }
        if !self.remote_repos.is_empty() {
            config.remote_repo_urls = self.remote_repos.clone();
        }
        if !self.local_repos.is_empty() {
            config.local_repo_urls = self.local_repos.clone();
        }
        if self.strict_licenses {
            config.allow_unacceptable_licenses = false;
        }
        if self.require_license {
            config.require_license = true;
        }
        if self.disallow_missing_license {
            config.allow_no_license = false;
        }
        config
            .acceptable_license_urls
            .extend(self.acceptable_license_urls.iter().cloned());
        config
            .acceptable_license_names
            .extend(self.acceptable_license_names.iter().cloned());
        config
            .pgp_key_servers
            .extend(self.pgp_key_servers.iter().cloned());
        if let Some(glyphs) = &self.progress_indicators {
            config.progress_indicators = glyphs.clone();
        }
        for rewrite in &self.mislabeled_groups {
            let (prefix, target) = parse_group_rewrite(rewrite)?;
            config.mislabeled_artifact_groups.insert(prefix, target);
        }

        config.normalise();
        Ok(config)
    }
}

/// Parse a `prefix=new-group,artifact-prefix` rewrite argument.
fn parse_group_rewrite(spec: &str) -> miette::Result<(String, GroupRewrite)> {
    let invalid = || Mvn2getError::Config {
        message: format!("invalid group rewrite {spec:?}; expected prefix=new-group,artifact-prefix"),
    };
    let (prefix, target) = spec.split_once('=').ok_or_else(invalid)?;
    let (group, artifact_prefix) = target.split_once(',').unwrap_or((target, ""));
    if prefix.is_empty() || group.is_empty() {
        return Err(invalid().into());
    }
    Ok((
        prefix.to_string(),
        GroupRewrite(group.to_string(), artifact_prefix.to_string()),
    ))
}

fn parse_level(level: &str) -> miette::Result<LogLevel> {
    match level {
        "warn" => Ok(LogLevel::Warn),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        "trace" => Ok(LogLevel::Trace),
        other => Err(Mvn2getError::Config {
            message: format!("unknown log level {other:?}; expected warn, info, debug, or trace"),
        }
        .into()),
    }
}
