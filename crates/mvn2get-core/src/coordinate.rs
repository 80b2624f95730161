//! Artifact coordinates and the Maven 2 repository URL layout.

use std::collections::BTreeMap;
use std::fmt;

use mvn2get_util::errors::Mvn2getError;

use crate::config::GroupRewrite;

/// A Maven artifact coordinate.
///
/// Classifier and packaging are carried for URL/filename derivation but do
/// not participate in the identity key used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub packaging: Option<String>,
}

impl Coordinate {
    pub fn new(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            classifier: None,
            packaging: None,
        }
    }

    /// Parse `group:artifact:version[:classifier[:packaging]]`.
    pub fn parse(s: &str) -> miette::Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if !(3..=5).contains(&parts.len()) {
            return Err(Mvn2getError::Coordinate {
                message: format!("expected 3 to 5 `:`-separated fields, got {:?}", s),
            }
            .into());
        }
        if parts[..3].iter().any(|p| p.is_empty()) {
            return Err(Mvn2getError::Coordinate {
                message: format!("group, artifact and version must be non-empty in {:?}", s),
            }
            .into());
        }
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier: parts.get(3).filter(|c| !c.is_empty()).map(|c| c.to_string()),
            packaging: parts.get(4).filter(|p| !p.is_empty()).map(|p| p.to_string()),
        })
    }

    /// Parse a full Maven URL against the configured repository base URLs.
    ///
    /// The URL must point at (or below) an artifact version directory of one
    /// of the given repositories: `<base>/<group-path>/<artifact>/<version>/`.
    /// A trailing filename component is ignored.
    pub fn parse_url(url: &str, repo_bases: &[String]) -> miette::Result<Self> {
        let base = repo_bases
            .iter()
            .find(|base| url.starts_with(base.as_str()))
            .ok_or_else(|| Mvn2getError::Coordinate {
                message: format!("URL {url} does not start with any configured repository"),
            })?;

        let mut segments: Vec<&str> = url[base.len()..]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        // Drop a trailing filename such as `lib-1.0.jar`. A version directory
        // component also contains dots, so only pop when the last segment is
        // named after the artifact/version pair preceding it.
        if segments.len() > 3 {
            let stem = format!("{}-{}", segments[segments.len() - 3], segments[segments.len() - 2]);
            if segments[segments.len() - 1].starts_with(&stem) {
                segments.pop();
            }
        }
        if segments.len() < 3 {
            return Err(Mvn2getError::Coordinate {
                message: format!("URL {url} is too short for group/artifact/version"),
            }
            .into());
        }
        let version = segments.pop().unwrap_or_default();
        let artifact = segments.pop().unwrap_or_default();
        let group = segments.join(".");
        if group.is_empty() {
            return Err(Mvn2getError::Coordinate {
                message: format!("URL {url} has no group segments"),
            }
            .into());
        }
        Ok(Self::new(&group, artifact, version))
    }

    /// Identity key used for deduplication in the resolution map.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group, self.artifact, self.version)
    }

    /// Apply the mislabeled-group rewrite table.
    ///
    /// The first table key that is a prefix of `group + "."` wins: the group
    /// is replaced wholesale and the artifact gains the configured prefix.
    pub fn canonicalise(&self, rewrites: &BTreeMap<String, GroupRewrite>) -> Self {
        let probe = format!("{}.", self.group);
        for (prefix, rewrite) in rewrites {
            if probe.starts_with(prefix.as_str()) {
                let mut rewritten = self.clone();
                rewritten.group = rewrite.group().to_string();
                rewritten.artifact = format!("{}{}", rewrite.artifact_prefix(), self.artifact);
                return rewritten;
            }
        }
        self.clone()
    }

    /// Directory holding all of this coordinate's published files.
    ///
    /// `base_url` must end in `/`; the result does too.
    pub fn directory_url(&self, base_url: &str) -> String {
        format!(
            "{}{}/{}/{}/",
            base_url,
            self.group.replace('.', "/"),
            self.artifact,
            self.version
        )
    }

    /// Filename of the primary artifact file for the given packaging.
    pub fn primary_filename(&self, packaging: &str) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, packaging
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, packaging),
        }
    }

    /// Filename of this coordinate's POM.
    pub fn pom_filename(&self) -> String {
        format!("{}-{}.pom", self.artifact, self.version)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_fields() {
        let coord = Coordinate::parse("org.apache.logging.log4j:log4j-api:2.12.1").unwrap();
        assert_eq!(coord.group, "org.apache.logging.log4j");
        assert_eq!(coord.artifact, "log4j-api");
        assert_eq!(coord.version, "2.12.1");
        assert_eq!(coord.classifier, None);
        assert_eq!(coord.packaging, None);
    }

    #[test]
    fn parse_classifier_and_packaging() {
        let coord = Coordinate::parse("org.example:lib:1.0:sources:jar").unwrap();
        assert_eq!(coord.classifier.as_deref(), Some("sources"));
        assert_eq!(coord.packaging.as_deref(), Some("jar"));
    }

    #[test]
    fn parse_rejects_short_and_empty() {
        assert!(Coordinate::parse("org.example:lib").is_err());
        assert!(Coordinate::parse("org.example::1.0").is_err());
        assert!(Coordinate::parse("").is_err());
    }

    #[test]
    fn parse_url_within_repo() {
        let bases = vec!["https://repo.maven.apache.org/maven2/".to_string()];
        let coord = Coordinate::parse_url(
            "https://repo.maven.apache.org/maven2/org/apache/logging/log4j/log4j-api/2.12.1/",
            &bases,
        )
        .unwrap();
        assert_eq!(coord.key(), "org.apache.logging.log4j:log4j-api:2.12.1");
    }

    #[test]
    fn parse_url_drops_trailing_filename() {
        let bases = vec!["https://repo.maven.apache.org/maven2/".to_string()];
        let coord = Coordinate::parse_url(
            "https://repo.maven.apache.org/maven2/org/example/lib/1.0/lib-1.0.jar",
            &bases,
        )
        .unwrap();
        assert_eq!(coord.key(), "org.example:lib:1.0");
    }

    #[test]
    fn parse_url_outside_repos_fails() {
        let bases = vec!["https://repo.maven.apache.org/maven2/".to_string()];
        assert!(Coordinate::parse_url("https://evil.example.com/org/x/1.0/", &bases).is_err());
    }

    #[test]
    fn identity_key_ignores_classifier() {
        let mut a = Coordinate::new("org.example", "lib", "1.0");
        let b = a.clone();
        a.classifier = Some("sources".to_string());
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn canonicalise_rewrites_prefixed_group() {
        let mut rewrites = BTreeMap::new();
        rewrites.insert(
            "org.old".to_string(),
            GroupRewrite("org.new".to_string(), "legacy-".to_string()),
        );
        let coord = Coordinate::new("org.old", "widget", "1.0");
        let canonical = coord.canonicalise(&rewrites);
        assert_eq!(canonical.group, "org.new");
        assert_eq!(canonical.artifact, "legacy-widget");
        assert_eq!(canonical.version, "1.0");
    }

    #[test]
    fn canonicalise_matches_exact_group() {
        // The key matches against `group + "."`, so an exact group name
        // qualifies without claiming `org.oldish`.
        let mut rewrites = BTreeMap::new();
        rewrites.insert(
            "org.old.".to_string(),
            GroupRewrite("org.new".to_string(), String::new()),
        );
        assert_eq!(
            Coordinate::new("org.old", "w", "1").canonicalise(&rewrites).group,
            "org.new"
        );
        assert_eq!(
            Coordinate::new("org.oldish", "w", "1").canonicalise(&rewrites).group,
            "org.oldish"
        );
    }

    #[test]
    fn directory_url_layout() {
        let coord = Coordinate::new("org.apache.logging.log4j", "log4j-api", "2.12.1");
        assert_eq!(
            coord.directory_url("https://repo.maven.apache.org/maven2/"),
            "https://repo.maven.apache.org/maven2/org/apache/logging/log4j/log4j-api/2.12.1/"
        );
    }

    #[test]
    fn primary_filename_with_classifier() {
        let mut coord = Coordinate::new("org.example", "lib", "1.0");
        assert_eq!(coord.primary_filename("jar"), "lib-1.0.jar");
        coord.classifier = Some("native".to_string());
        assert_eq!(coord.primary_filename("jar"), "lib-1.0-native.jar");
    }

    #[test]
    fn pom_filename_layout() {
        let coord = Coordinate::new("org.example", "lib", "1.0");
        assert_eq!(coord.pom_filename(), "lib-1.0.pom");
    }
}
