//! The worklist-driven resolution engine.
//!
//! A single coordinator owns the worklist, the resolution map, and the
//! problem ledger. Coordinates move monotonically through
//! `Queued -> InProgress -> (Resolved | NotFound | Failed)`; terminal
//! states are never revisited, which also breaks dependency cycles.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, VecDeque};

use mvn2get_core::config::{Configuration, RepositoryKind};
use mvn2get_core::coordinate::Coordinate;
use mvn2get_core::events::EventSink;
use mvn2get_core::problem::{Problem, ProblemKind, ProblemLedger};
use mvn2get_repo::digest::{extract_hex, verify_digest, DigestKind};
use mvn2get_repo::fetch::{fetch_optional, HttpFetcher};
use mvn2get_repo::index::list_files;
use mvn2get_repo::pom::{parse_pom, Pom};
use mvn2get_repo::signature::{SignatureVerdict, SignatureVerifier};
use mvn2get_repo::store::ArtifactStore;

use crate::effective::{effective_pom, EffectivePom, PomResolver};
use crate::license::{LicenseDecision, LicensePolicy};
use crate::version;

/// Where a coordinate stands in the resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionRecord {
    Queued,
    InProgress,
    Resolved { repo: String, files: Vec<String> },
    NotFound,
    Failed { reason: String },
}

impl ResolutionRecord {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResolutionRecord::Resolved { .. }
                | ResolutionRecord::NotFound
                | ResolutionRecord::Failed { .. }
        )
    }
}

/// Outcome of verifying one downloaded file against its sidecars.
enum FileVerdict {
    /// The file passed; its fetched sidecars come along for persistence.
    Accepted { sidecars: Vec<(String, Vec<u8>)> },
    Rejected { reason: String },
}

/// A verified content file waiting for the license gate.
struct PendingFile {
    name: String,
    bytes: Vec<u8>,
    sidecars: Vec<(String, Vec<u8>)>,
}

/// The resolver: seeds in, verified files and a problem ledger out.
pub struct Resolver<'a> {
    config: &'a Configuration,
    fetcher: &'a dyn HttpFetcher,
    verifier: &'a dyn SignatureVerifier,
    sink: &'a dyn EventSink,
    store: ArtifactStore,
    policy: LicensePolicy,
    ledger: ProblemLedger,
    poms: PomResolver<'a>,
    records: HashMap<String, ResolutionRecord>,
    queue: VecDeque<Coordinate>,
    /// First version seen per `group:artifact`, for duplicate reporting.
    versions_seen: HashMap<String, String>,
    pgp_enabled: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        config: &'a Configuration,
        fetcher: &'a dyn HttpFetcher,
        verifier: &'a dyn SignatureVerifier,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            config,
            fetcher,
            verifier,
            sink,
            store: ArtifactStore::new(&config.output_dir),
            policy: LicensePolicy::from_config(config),
            ledger: ProblemLedger::new(),
            poms: PomResolver::new(fetcher, config.remote_repo_urls.clone()),
            records: HashMap::new(),
            queue: VecDeque::new(),
            versions_seen: HashMap::new(),
            pgp_enabled: !config.no_pgp && verifier.enabled(),
        }
    }

    /// The ledger accumulated so far; non-empty means a non-zero exit.
    pub fn problems(&self) -> &ProblemLedger {
        &self.ledger
    }

    /// The resolution map, keyed by identity coordinate.
    pub fn records(&self) -> &HashMap<String, ResolutionRecord> {
        &self.records
    }

    /// Resolve the seed set and, when configured, its transitive closure.
    ///
    /// Only fatal conditions (an unwritable output directory) return an
    /// error; everything else lands in the problem ledger.
    pub async fn resolve(&mut self, seeds: Vec<Coordinate>) -> miette::Result<()> {
        for seed in seeds {
            self.enqueue(seed);
        }

        while let Some(coordinate) = self.queue.pop_front() {
            let key = coordinate.key();
            if self.records.get(&key).is_some_and(ResolutionRecord::is_terminal) {
                continue;
            }
            self.records.insert(key.clone(), ResolutionRecord::InProgress);
            self.sink.progress(&key);

            let record = self.resolve_one(&coordinate).await?;
            match &record {
                ResolutionRecord::Resolved { repo, files } => {
                    self.sink
                        .info(&format!("{key}: {} files from {repo}", files.len()));
                }
                ResolutionRecord::Failed { reason } => {
                    self.sink.warn(&format!("{key} failed: {reason}"));
                }
                _ => {}
            }
            self.records.insert(key, record);
        }
        Ok(())
    }

    /// Canonicalise and enqueue a coordinate unless it is already tracked.
    fn enqueue(&mut self, coordinate: Coordinate) {
        let canonical = coordinate.canonicalise(&self.config.mislabeled_artifact_groups);
        let key = canonical.key();
        if self.records.contains_key(&key) {
            return;
        }
        self.report_version_spread(&canonical);
        self.sink.debug(&format!("queueing {key}"));
        self.records.insert(key, ResolutionRecord::Queued);
        self.queue.push_back(canonical);
    }

    /// Warn when the closure pulls in the same artifact at several
    /// versions; both get fetched, but the spread is worth knowing about.
    fn report_version_spread(&mut self, coordinate: &Coordinate) {
        let ga = format!("{}:{}", coordinate.group, coordinate.artifact);
        let Some(existing) = self.versions_seen.get(&ga).cloned() else {
            self.versions_seen.insert(ga, coordinate.version.clone());
            return;
        };
        if existing != coordinate.version {
            let newest = match version::compare(&existing, &coordinate.version) {
                Ordering::Less => coordinate.version.as_str(),
                _ => existing.as_str(),
            };
            self.sink.warn(&format!(
                "{ga} requested at both {existing} and {}; {newest} is the newest",
                coordinate.version
            ));
        }
    }

    fn note(&self, problem: Problem) {
        self.sink.problem(&problem);
        self.ledger.record(problem);
    }

    async fn resolve_one(&mut self, coordinate: &Coordinate) -> miette::Result<ResolutionRecord> {
        for repo in self.config.repositories() {
            match repo.kind {
                RepositoryKind::Local => {
                    if !self.config.check_in_local {
                        continue;
                    }
                    if let Some(record) = self.try_local(coordinate, &repo.base_url).await {
                        return Ok(record);
                    }
                }
                RepositoryKind::Remote => {
                    if let Some(record) = self.try_remote(coordinate, &repo.base_url).await? {
                        return Ok(record);
                    }
                }
            }
        }

        self.note(
            Problem::new(
                ProblemKind::NotFound,
                format!("{coordinate} not found in any repository"),
                false,
            )
            .with_coordinate(coordinate.key()),
        );
        Ok(ResolutionRecord::NotFound)
    }

    /// Probe one local repository. A hit suppresses all downloads; the POM
    /// is still read from the local repository so recursion stays
    /// transitive across local and remote artifacts.
    async fn try_local(&mut self, coordinate: &Coordinate, base: &str) -> Option<ResolutionRecord> {
        let dir_url = coordinate.directory_url(base);
        match self.fetcher.head(&dir_url).await {
            Ok(status) if (200..300).contains(&status) => {}
            _ => return None,
        }
        let files = match list_files(self.fetcher, &dir_url).await {
            Ok(Some(files)) => files,
            _ => return None,
        };

        let pom_name = coordinate.pom_filename();
        let pom = if files.contains(&pom_name) {
            match fetch_optional(self.fetcher, &format!("{dir_url}{pom_name}")).await {
                Ok(Some(bytes)) => parse_pom(&String::from_utf8_lossy(&bytes)).ok(),
                _ => None,
            }
        } else {
            None
        };

        let packaging = coordinate
            .packaging
            .clone()
            .or_else(|| pom.as_ref().and_then(|p| p.packaging.clone()))
            .unwrap_or_else(|| "jar".to_string());
        if packaging != "pom" && !files.contains(&coordinate.primary_filename(&packaging)) {
            return None;
        }

        self.sink
            .info(&format!("{coordinate} found in local repository {base}"));

        if self.config.recursive {
            if let Some(pom) = pom {
                self.poms.insert(coordinate, pom.clone());
                let effective =
                    effective_pom(&mut self.poms, coordinate, &pom, &self.ledger, self.sink).await;
                self.enqueue_parent(&pom);
                self.enqueue_dependencies(&effective);
            }
        }

        Some(ResolutionRecord::Resolved {
            repo: base.to_string(),
            files: files.into_iter().collect(),
        })
    }

    /// Attempt one remote repository.
    ///
    /// `Ok(None)` means this repository does not carry the mandatory files
    /// and the fallback should continue. `Ok(Some(..))` is a terminal
    /// record; `Err` is fatal.
    async fn try_remote(
        &mut self,
        coordinate: &Coordinate,
        base: &str,
    ) -> miette::Result<Option<ResolutionRecord>> {
        let config = self.config;
        let key = coordinate.key();
        let dir_url = coordinate.directory_url(base);

        let files = match list_files(self.fetcher, &dir_url).await {
            Ok(Some(files)) => files,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.note(
                    Problem::new(ProblemKind::HttpError, format!("{e}"), true)
                        .with_coordinate(&key)
                        .with_url(&dir_url),
                );
                return Ok(None);
            }
        };

        let pom_name = coordinate.pom_filename();
        if !files.contains(&pom_name) {
            return Ok(None);
        }

        // The POM decides the packaging, and with it the primary filename.
        let pom_url = format!("{dir_url}{pom_name}");
        let pom_bytes = match fetch_optional(self.fetcher, &pom_url).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.note(
                    Problem::new(ProblemKind::HttpError, format!("{e}"), true)
                        .with_coordinate(&key)
                        .with_url(&pom_url),
                );
                return Ok(None);
            }
        };
        let pom = match parse_pom(&String::from_utf8_lossy(&pom_bytes)) {
            Ok(pom) => pom,
            Err(e) => {
                self.note(
                    Problem::new(ProblemKind::XmlParseError, format!("{e}"), false)
                        .with_coordinate(&key)
                        .with_url(&pom_url),
                );
                return Ok(Some(ResolutionRecord::Failed {
                    reason: format!("unparseable POM: {e}"),
                }));
            }
        };

        let packaging = coordinate
            .packaging
            .clone()
            .unwrap_or_else(|| pom.effective_packaging().to_string());
        let primary_name = coordinate.primary_filename(&packaging);
        if packaging != "pom" && !files.contains(&primary_name) {
            return Ok(None);
        }

        let mut persisted: Vec<String> = Vec::new();

        // The POM is persisted before the license gate; dependency
        // expansion needs it on disk even for rejected artifacts.
        match self
            .verify_file(coordinate, &dir_url, &pom_name, &pom_bytes, &files, true)
            .await
        {
            FileVerdict::Accepted { sidecars } => {
                if config.do_remote_download {
                    self.persist(&pom_name, &pom_bytes, &mut persisted)?;
                    for (name, bytes) in &sidecars {
                        self.persist(name, bytes, &mut persisted)?;
                    }
                }
            }
            FileVerdict::Rejected { reason } => {
                return Ok(Some(ResolutionRecord::Failed { reason }));
            }
        }

        // Remaining content files: the primary is mandatory, the rest are
        // best-effort. Persistence waits for the license decision.
        let mut pending: Vec<PendingFile> = Vec::new();
        for name in files.iter().filter(|f| !is_sidecar(f)) {
            if *name == pom_name {
                continue;
            }
            let mandatory = *name == primary_name && packaging != "pom";

            if self.store.has(name) && !config.overwrite {
                self.sink.debug(&format!("{name} already in output; skipping"));
                persisted.push(name.clone());
                continue;
            }

            let url = format!("{dir_url}{name}");
            let bytes = match fetch_optional(self.fetcher, &url).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) | Err(_) if !mandatory => {
                    self.note(
                        Problem::new(
                            ProblemKind::HttpError,
                            format!("auxiliary file {name} could not be fetched"),
                            true,
                        )
                        .with_coordinate(&key)
                        .with_url(&url),
                    );
                    continue;
                }
                Ok(None) => {
                    self.note(
                        Problem::new(
                            ProblemKind::HttpError,
                            format!("primary file {name} vanished from listing"),
                            false,
                        )
                        .with_coordinate(&key)
                        .with_url(&url),
                    );
                    return Ok(Some(ResolutionRecord::Failed {
                        reason: format!("{name} not downloadable"),
                    }));
                }
                Err(e) => {
                    self.note(
                        Problem::new(ProblemKind::HttpError, format!("{e}"), false)
                            .with_coordinate(&key)
                            .with_url(&url),
                    );
                    return Ok(Some(ResolutionRecord::Failed {
                        reason: format!("{name} not downloadable"),
                    }));
                }
            };

            match self
                .verify_file(coordinate, &dir_url, name, &bytes, &files, mandatory)
                .await
            {
                FileVerdict::Accepted { sidecars } => pending.push(PendingFile {
                    name: name.clone(),
                    bytes,
                    sidecars,
                }),
                FileVerdict::Rejected { reason } if mandatory => {
                    return Ok(Some(ResolutionRecord::Failed { reason }));
                }
                FileVerdict::Rejected { .. } => {
                    self.sink.warn(&format!("{name} rejected; not persisted"));
                }
            }
        }

        // Effective POM, license gate, then the deferred persistence.
        self.poms.insert(coordinate, pom.clone());
        let effective =
            effective_pom(&mut self.poms, coordinate, &pom, &self.ledger, self.sink).await;

        let decision = self.policy.evaluate(&effective.licenses);
        if decision == LicenseDecision::Rejected {
            self.note(
                Problem::new(
                    ProblemKind::LicenseRejected,
                    format!("license of {coordinate} not acceptable; files not persisted"),
                    true,
                )
                .with_coordinate(&key),
            );
        } else if decision == LicenseDecision::Tolerated {
            self.sink
                .warn(&format!("{coordinate} has no acceptable license; allowed by policy"));
        }

        if config.do_remote_download && decision.allows_persistence() {
            for file in &pending {
                self.persist(&file.name, &file.bytes, &mut persisted)?;
                for (name, bytes) in &file.sidecars {
                    self.persist(name, bytes, &mut persisted)?;
                }
            }
        }

        if config.recursive {
            self.enqueue_parent(&pom);
            self.enqueue_dependencies(&effective);
        }

        Ok(Some(ResolutionRecord::Resolved {
            repo: base.to_string(),
            files: persisted,
        }))
    }

    /// Check a downloaded file against its digest and signature sidecars.
    async fn verify_file(
        &self,
        coordinate: &Coordinate,
        dir_url: &str,
        name: &str,
        bytes: &[u8],
        listing: &BTreeSet<String>,
        mandatory: bool,
    ) -> FileVerdict {
        let key = coordinate.key();
        let mut sidecars: Vec<(String, Vec<u8>)> = Vec::new();

        for kind in DigestKind::all() {
            let sidecar_name = format!("{name}{}", kind.suffix());
            if !listing.contains(&sidecar_name) {
                self.sink.debug(&format!("no {kind} sidecar for {name}"));
                continue;
            }
            let url = format!("{dir_url}{sidecar_name}");
            match fetch_optional(self.fetcher, &url).await {
                Ok(Some(content)) => {
                    if verify_digest(bytes, kind, &extract_hex(&content)) {
                        sidecars.push((sidecar_name, content));
                    } else {
                        self.note(
                            Problem::new(
                                ProblemKind::DigestMismatch,
                                format!("{kind} mismatch for {name}"),
                                !mandatory,
                            )
                            .with_coordinate(&key)
                            .with_url(&url),
                        );
                        return FileVerdict::Rejected {
                            reason: format!("{kind} mismatch for {name}"),
                        };
                    }
                }
                Ok(None) | Err(_) => {
                    // A listed-but-unfetchable digest is a warning only.
                    self.note(
                        Problem::new(
                            ProblemKind::HttpError,
                            format!("digest sidecar {sidecar_name} could not be fetched"),
                            true,
                        )
                        .with_coordinate(&key)
                        .with_url(&url),
                    );
                }
            }
        }

        let sig_name = format!("{name}.asc");
        if listing.contains(&sig_name) {
            let sig_url = format!("{dir_url}{sig_name}");
            match fetch_optional(self.fetcher, &sig_url).await {
                Ok(Some(sig)) => {
                    // The signature file has digest sidecars of its own; a
                    // mismatch there is recoverable, the signature verdict
                    // is what gates acceptance.
                    for kind in DigestKind::all() {
                        let sig_digest_name = format!("{sig_name}{}", kind.suffix());
                        if !listing.contains(&sig_digest_name) {
                            continue;
                        }
                        let url = format!("{dir_url}{sig_digest_name}");
                        if let Ok(Some(content)) = fetch_optional(self.fetcher, &url).await {
                            if verify_digest(&sig, kind, &extract_hex(&content)) {
                                sidecars.push((sig_digest_name, content));
                            } else {
                                self.note(
                                    Problem::new(
                                        ProblemKind::DigestMismatch,
                                        format!("{kind} mismatch for {sig_name}"),
                                        true,
                                    )
                                    .with_coordinate(&key)
                                    .with_url(&url),
                                );
                            }
                        }
                    }

                    if self.pgp_enabled {
                        match self
                            .verifier
                            .verify(bytes, &sig, &self.config.pgp_key_servers)
                            .await
                        {
                            SignatureVerdict::Valid | SignatureVerdict::Skipped => {}
                            SignatureVerdict::InvalidSignature => {
                                self.note(
                                    Problem::new(
                                        ProblemKind::SignatureInvalid,
                                        format!("invalid signature for {name}"),
                                        false,
                                    )
                                    .with_coordinate(&key)
                                    .with_url(&sig_url),
                                );
                                return FileVerdict::Rejected {
                                    reason: format!("invalid signature for {name}"),
                                };
                            }
                            SignatureVerdict::KeyNotFound => {
                                self.note(
                                    Problem::new(
                                        ProblemKind::SignatureKeyMissing,
                                        format!("signing key for {name} not found on any key server"),
                                        true,
                                    )
                                    .with_coordinate(&key)
                                    .with_url(&sig_url),
                                );
                            }
                            SignatureVerdict::Unavailable => {
                                self.note(
                                    Problem::new(
                                        ProblemKind::HttpError,
                                        format!("signature backend unavailable for {name}"),
                                        true,
                                    )
                                    .with_coordinate(&key)
                                    .with_url(&sig_url),
                                );
                            }
                        }
                    }
                    sidecars.push((sig_name, sig));
                }
                Ok(None) | Err(_) => {
                    self.note(
                        Problem::new(
                            ProblemKind::HttpError,
                            format!("signature {sig_name} could not be fetched"),
                            true,
                        )
                        .with_coordinate(&key)
                        .with_url(&sig_url),
                    );
                }
            }
        }

        FileVerdict::Accepted { sidecars }
    }

    fn persist(
        &self,
        name: &str,
        bytes: &[u8],
        persisted: &mut Vec<String>,
    ) -> miette::Result<()> {
        match self.store.write(name, bytes, self.config.overwrite)? {
            Some(path) => self.sink.trace(&format!("wrote {}", path.display())),
            None => self.sink.debug(&format!("{name} already present; kept")),
        }
        persisted.push(name.to_string());
        Ok(())
    }

    /// Parents are ordinary coordinates too; enqueue them so their files
    /// are persisted like anything else the closure touches.
    fn enqueue_parent(&mut self, pom: &Pom) {
        if let Some(parent) = &pom.parent {
            self.enqueue(Coordinate::new(
                &parent.group_id,
                &parent.artifact_id,
                &parent.version,
            ));
        }
    }

    /// Enqueue the dependency edges recursion should follow.
    fn enqueue_dependencies(&mut self, effective: &EffectivePom) {
        for dep in &effective.dependencies {
            if dep.optional {
                continue;
            }
            let expand = matches!(dep.scope.as_str(), "compile" | "runtime")
                || (self.config.include_dep_management
                    && matches!(dep.scope.as_str(), "test" | "provided" | "system"));
            if expand {
                self.enqueue(dep.coordinate.clone());
            }
        }
        if self.config.include_dep_management {
            for dep in &effective.managed {
                if !dep.optional {
                    self.enqueue(dep.coordinate.clone());
                }
            }
        }
    }
}

/// Digest and signature companions of a content file.
fn is_sidecar(name: &str) -> bool {
    name.ends_with(".md5") || name.ends_with(".sha1") || name.ends_with(".asc")
}
