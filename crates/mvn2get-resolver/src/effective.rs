//! Effective-POM computation: parent-chain merging, `${property}`
//! substitution, dependencyManagement lookups, and BOM imports.
//!
//! Parent and BOM POMs are fetched synchronously through a shared
//! [`PomResolver`] cache, so each POM is downloaded at most once per run
//! even when the resolver later visits the same coordinate as an artifact.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use mvn2get_core::coordinate::Coordinate;
use mvn2get_core::events::EventSink;
use mvn2get_core::problem::{Problem, ProblemKind, ProblemLedger};
use mvn2get_repo::fetch::{fetch_optional, HttpFetcher};
use mvn2get_repo::pom::{parse_pom, Pom, PomDependency, PomLicense};

use crate::note_problem;
use crate::version::is_version_range;

/// Safety cap on `${...}` re-expansion, against self-referential properties.
const MAX_SUBSTITUTION_PASSES: usize = 32;

/// Parents form a finite chain in practice; anything deeper is a loop.
const MAX_PARENT_DEPTH: usize = 16;

/// A dependency edge recovered from an effective POM.
#[derive(Debug, Clone)]
pub struct EffectiveDependency {
    pub coordinate: Coordinate,
    pub scope: String,
    pub optional: bool,
}

/// The POM after parent merging and property substitution.
#[derive(Debug, Clone)]
pub struct EffectivePom {
    pub packaging: String,
    pub licenses: Vec<PomLicense>,
    /// Declared dependencies with resolved coordinates, all scopes.
    pub dependencies: Vec<EffectiveDependency>,
    /// Managed entries (BOM imports expanded and excluded).
    pub managed: Vec<EffectiveDependency>,
}

/// Fetches and caches parsed POMs across the whole resolution run.
pub struct PomResolver<'a> {
    fetcher: &'a dyn HttpFetcher,
    remote_repos: Vec<String>,
    cache: HashMap<String, Option<Arc<Pom>>>,
}

impl<'a> PomResolver<'a> {
    pub fn new(fetcher: &'a dyn HttpFetcher, remote_repos: Vec<String>) -> Self {
        Self {
            fetcher,
            remote_repos,
            cache: HashMap::new(),
        }
    }

    /// Seed the cache with a POM the caller already downloaded and parsed.
    pub fn insert(&mut self, coordinate: &Coordinate, pom: Pom) {
        self.cache.insert(coordinate.key(), Some(Arc::new(pom)));
    }

    /// Fetch a coordinate's POM from the first repository that has it.
    ///
    /// Negative results are cached too, so a missing parent is only
    /// searched for once.
    pub async fn get(
        &mut self,
        coordinate: &Coordinate,
        base_urls: &[String],
        ledger: &ProblemLedger,
        sink: &dyn EventSink,
    ) -> Option<Arc<Pom>> {
        let key = coordinate.key();
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let mut found = None;
        for base in base_urls {
            let url = format!("{}{}", coordinate.directory_url(base), coordinate.pom_filename());
            match fetch_optional(self.fetcher, &url).await {
                Ok(Some(bytes)) => {
                    match parse_pom(&String::from_utf8_lossy(&bytes)) {
                        Ok(pom) => found = Some(Arc::new(pom)),
                        Err(e) => note_problem(
                            ledger,
                            sink,
                            Problem::new(ProblemKind::XmlParseError, format!("{e}"), true)
                                .with_coordinate(&key)
                                .with_url(url),
                        ),
                    }
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    note_problem(
                        ledger,
                        sink,
                        Problem::new(ProblemKind::HttpError, format!("{e}"), true)
                            .with_coordinate(&key)
                            .with_url(url),
                    );
                    continue;
                }
            }
        }

        self.cache.insert(key, found.clone());
        found
    }

    /// Fetch a coordinate's POM from the configured remote repositories.
    pub async fn get_remote(
        &mut self,
        coordinate: &Coordinate,
        ledger: &ProblemLedger,
        sink: &dyn EventSink,
    ) -> Option<Arc<Pom>> {
        let bases = self.remote_repos.clone();
        self.get(coordinate, &bases, ledger, sink).await
    }
}

/// Compute the effective POM for `coordinate`, given its parsed POM.
pub async fn effective_pom(
    poms: &mut PomResolver<'_>,
    coordinate: &Coordinate,
    pom: &Pom,
    ledger: &ProblemLedger,
    sink: &dyn EventSink,
) -> EffectivePom {
    let mut merged = merge_parent_chain(poms, coordinate, pom, ledger, sink).await;
    expand_bom_imports(&mut merged, poms, coordinate, ledger, sink).await;

    let packaging = merged.effective_packaging().to_string();
    let licenses = merged
        .licenses
        .iter()
        .map(|license| PomLicense {
            name: license.name.as_deref().map(|n| substitute_fixed(&merged, n)),
            url: license.url.as_deref().map(|u| substitute_fixed(&merged, u)),
        })
        .collect();

    // Substitute managed entries in place so version lookups by resolved
    // group:artifact keys succeed.
    let context = merged.clone();
    for entry in &mut merged.dependency_management {
        entry.group_id = substitute_fixed(&context, &entry.group_id);
        entry.artifact_id = substitute_fixed(&context, &entry.artifact_id);
        if let Some(version) = entry.version.take() {
            entry.version = Some(substitute_fixed(&context, &version));
        }
    }

    let mut dependencies = Vec::new();
    for dep in &merged.dependencies {
        if let Some(effective) = effective_dependency(&merged, coordinate, dep, true, ledger, sink)
        {
            dependencies.push(effective);
        }
    }

    let mut managed = Vec::new();
    for entry in merged
        .dependency_management
        .iter()
        .filter(|d| !d.is_bom_import())
    {
        if let Some(effective) =
            effective_dependency(&merged, coordinate, entry, false, ledger, sink)
        {
            managed.push(effective);
        }
    }

    EffectivePom {
        packaging,
        licenses,
        dependencies,
        managed,
    }
}

/// Merge the parent chain into a child POM, parent-first so child wins.
async fn merge_parent_chain(
    poms: &mut PomResolver<'_>,
    coordinate: &Coordinate,
    pom: &Pom,
    ledger: &ProblemLedger,
    sink: &dyn EventSink,
) -> Pom {
    let mut merged = pom.clone();
    let mut visited: HashSet<String> = HashSet::from([coordinate.key()]);
    let mut next_parent = merged.parent.clone();
    let mut depth = 0;

    while let Some(parent_ref) = next_parent {
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            sink.warn(&format!("parent chain of {coordinate} exceeds {MAX_PARENT_DEPTH} levels; stopping"));
            break;
        }
        let parent_coord = Coordinate::new(
            &parent_ref.group_id,
            &parent_ref.artifact_id,
            &parent_ref.version,
        );
        if !visited.insert(parent_coord.key()) {
            sink.warn(&format!("parent cycle at {parent_coord}; stopping"));
            break;
        }
        match poms.get_remote(&parent_coord, ledger, sink).await {
            Some(parent_pom) => {
                apply_parent(&mut merged, &parent_pom);
                next_parent = parent_pom.parent.clone();
            }
            None => {
                note_problem(
                    ledger,
                    sink,
                    Problem::new(
                        ProblemKind::NotFound,
                        format!("parent POM {parent_coord} not found"),
                        true,
                    )
                    .with_coordinate(parent_coord.key()),
                );
                break;
            }
        }
    }

    merged
}

/// Fold one parent into a child POM.
pub fn apply_parent(child: &mut Pom, parent: &Pom) {
    if child.group_id.is_none() {
        child.group_id = parent.effective_group_id().map(str::to_string);
    }
    if child.version.is_none() {
        child.version = parent.effective_version().map(str::to_string);
    }
    for (key, value) in &parent.properties {
        child
            .properties
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
    for entry in &parent.dependency_management {
        let dominated = child
            .dependency_management
            .iter()
            .any(|d| d.group_id == entry.group_id && d.artifact_id == entry.artifact_id);
        if !dominated {
            child.dependency_management.push(entry.clone());
        }
    }
    // A child that declares licenses replaces the parent's entirely.
    if child.licenses.is_empty() {
        child.licenses = parent.licenses.clone();
    }
}

/// Pull managed entries out of `import`-scoped BOMs, transitively.
async fn expand_bom_imports(
    merged: &mut Pom,
    poms: &mut PomResolver<'_>,
    owner: &Coordinate,
    ledger: &ProblemLedger,
    sink: &dyn EventSink,
) {
    let mut queue: VecDeque<Coordinate> = VecDeque::new();
    let mut visited: HashSet<String> = HashSet::new();

    let context = merged.clone();
    for entry in merged.dependency_management.iter().filter(|d| d.is_bom_import()) {
        if let Some(coord) = import_coordinate(&context, owner, entry, ledger, sink) {
            queue.push_back(coord);
        }
    }

    while let Some(bom_coord) = queue.pop_front() {
        if !visited.insert(bom_coord.key()) {
            continue;
        }
        let Some(bom_pom) = poms.get_remote(&bom_coord, ledger, sink).await else {
            note_problem(
                ledger,
                sink,
                Problem::new(
                    ProblemKind::NotFound,
                    format!("imported BOM {bom_coord} not found"),
                    true,
                )
                .with_coordinate(bom_coord.key()),
            );
            continue;
        };
        let bom_merged = merge_parent_chain(poms, &bom_coord, &bom_pom, ledger, sink).await;

        for entry in &bom_merged.dependency_management {
            if entry.is_bom_import() {
                if let Some(coord) =
                    import_coordinate(&bom_merged, &bom_coord, entry, ledger, sink)
                {
                    queue.push_back(coord);
                }
                continue;
            }
            let mut resolved = entry.clone();
            resolved.group_id = substitute_fixed(&bom_merged, &entry.group_id);
            resolved.artifact_id = substitute_fixed(&bom_merged, &entry.artifact_id);
            if let Some(version) = &entry.version {
                resolved.version = Some(substitute_fixed(&bom_merged, version));
            }
            let dominated = merged
                .dependency_management
                .iter()
                .any(|d| d.group_id == resolved.group_id && d.artifact_id == resolved.artifact_id);
            if !dominated {
                merged.dependency_management.push(resolved);
            }
        }
    }
}

/// Resolve an import entry to a fetchable coordinate, or report why not.
fn import_coordinate(
    context: &Pom,
    owner: &Coordinate,
    entry: &PomDependency,
    ledger: &ProblemLedger,
    sink: &dyn EventSink,
) -> Option<Coordinate> {
    let group = substitute_fixed(context, &entry.group_id);
    let artifact = substitute_fixed(context, &entry.artifact_id);
    let version = substitute_fixed(context, entry.version.as_deref()?);
    if group.contains("${") || artifact.contains("${") || version.contains("${") {
        note_problem(
            ledger,
            sink,
            Problem::new(
                ProblemKind::UnresolvedProperty,
                format!("unresolved reference in BOM import {group}:{artifact}:{version}"),
                true,
            )
            .with_coordinate(owner.key()),
        );
        return None;
    }
    Some(Coordinate::new(&group, &artifact, &version))
}

/// Resolve one declared dependency into an effective one, or skip it.
fn effective_dependency(
    merged: &Pom,
    owner: &Coordinate,
    dep: &PomDependency,
    consult_management: bool,
    ledger: &ProblemLedger,
    sink: &dyn EventSink,
) -> Option<EffectiveDependency> {
    let group = substitute_fixed(merged, &dep.group_id);
    let artifact = substitute_fixed(merged, &dep.artifact_id);
    if group.is_empty() || artifact.is_empty() {
        sink.warn(&format!("dependency of {owner} lacks group or artifact; skipping"));
        return None;
    }
    if group.contains("${") || artifact.contains("${") {
        note_problem(
            ledger,
            sink,
            Problem::new(
                ProblemKind::UnresolvedProperty,
                format!("unresolved reference in dependency {group}:{artifact} of {owner}"),
                true,
            )
            .with_coordinate(owner.key()),
        );
        return None;
    }

    let version = match &dep.version {
        Some(version) => Some(substitute_fixed(merged, version)),
        None if consult_management => merged.managed_version(&group, &artifact).map(str::to_string),
        None => None,
    };
    let Some(version) = version else {
        sink.warn(&format!("no version for {group}:{artifact} in {owner}; skipping"));
        return None;
    };
    if version.contains("${") {
        note_problem(
            ledger,
            sink,
            Problem::new(
                ProblemKind::UnresolvedProperty,
                format!("unresolved version {version:?} for {group}:{artifact} in {owner}"),
                true,
            )
            .with_coordinate(owner.key()),
        );
        return None;
    }
    if is_version_range(&version) {
        note_problem(
            ledger,
            sink,
            Problem::new(
                ProblemKind::VersionRangeUnsupported,
                format!("version range {version:?} for {group}:{artifact} in {owner}"),
                true,
            )
            .with_coordinate(owner.key()),
        );
        return None;
    }

    let mut coordinate = Coordinate::new(&group, &artifact, &version);
    coordinate.classifier = dep.classifier.clone();
    Some(EffectiveDependency {
        coordinate,
        scope: dep.effective_scope().to_string(),
        optional: dep.optional,
    })
}

/// Substitute `${...}` references until a fixed point or the pass cap.
///
/// Unresolvable references are left intact, which makes the operation
/// idempotent: a second call over the result changes nothing.
pub fn substitute_fixed(pom: &Pom, input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..MAX_SUBSTITUTION_PASSES {
        let next = substitute_once(pom, &current);
        if next == current {
            return current;
        }
        current = next;
    }
    current
}

fn substitute_once(pom: &Pom, input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated reference: keep it verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match resolve_value(pom, key) {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("${");
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Look up a property key: POM properties first, then the built-in
/// project variables. The environment is never consulted.
fn resolve_value(pom: &Pom, key: &str) -> Option<String> {
    if let Some(value) = pom.properties.get(key) {
        return Some(value.clone());
    }
    match key {
        "project.groupId" | "pom.groupId" => pom.effective_group_id().map(str::to_string),
        "project.artifactId" | "pom.artifactId" => pom.artifact_id.clone(),
        "project.version" | "pom.version" => pom.effective_version().map(str::to_string),
        "project.packaging" | "pom.packaging" => Some(pom.effective_packaging().to_string()),
        "project.parent.groupId" => pom.parent.as_ref().map(|p| p.group_id.clone()),
        "project.parent.artifactId" => pom.parent.as_ref().map(|p| p.artifact_id.clone()),
        "project.parent.version" => pom.parent.as_ref().map(|p| p.version.clone()),
        _ => None,
    }
}
