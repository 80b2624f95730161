//! License policy gate.
//!
//! Evaluated against the effective POM's declared licenses before any
//! non-POM file is persisted. The POM itself is always kept so dependency
//! expansion can proceed.

use mvn2get_core::config::Configuration;
use mvn2get_repo::pom::PomLicense;

/// Outcome of evaluating an artifact's licenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseDecision {
    /// A declared license (or the absence of one) matched the policy.
    Acceptable,
    /// Nothing matched, but unacceptable licenses are allowed through.
    Tolerated,
    /// Nothing matched and the policy forbids persisting the files.
    Rejected,
}

impl LicenseDecision {
    pub fn allows_persistence(self) -> bool {
        !matches!(self, LicenseDecision::Rejected)
    }
}

/// The configured license whitelists and gates.
#[derive(Debug, Clone)]
pub struct LicensePolicy {
    acceptable_urls: Vec<String>,
    acceptable_names: Vec<String>,
    allow_unacceptable: bool,
    allow_no_license: bool,
    require_license: bool,
}

impl LicensePolicy {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            acceptable_urls: config.acceptable_license_urls.clone(),
            acceptable_names: config.acceptable_license_names.clone(),
            allow_unacceptable: config.allow_unacceptable_licenses,
            allow_no_license: config.allow_no_license,
            require_license: config.require_license,
        }
    }

    /// Decide whether an artifact with these declared licenses may be
    /// persisted.
    pub fn evaluate(&self, licenses: &[PomLicense]) -> LicenseDecision {
        if licenses.is_empty() {
            return if self.allow_no_license && !self.require_license {
                LicenseDecision::Acceptable
            } else {
                LicenseDecision::Rejected
            };
        }

        let acceptable = licenses.iter().any(|license| {
            license
                .url
                .as_deref()
                .is_some_and(|url| matches_any(url, &self.acceptable_urls))
                || license
                    .name
                    .as_deref()
                    .is_some_and(|name| matches_any(name, &self.acceptable_names))
        });

        if acceptable {
            LicenseDecision::Acceptable
        } else if self.allow_unacceptable {
            LicenseDecision::Tolerated
        } else {
            LicenseDecision::Rejected
        }
    }
}

fn matches_any(value: &str, whitelist: &[String]) -> bool {
    let value = value.trim();
    whitelist
        .iter()
        .any(|entry| entry.trim().eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn license(name: Option<&str>, url: Option<&str>) -> PomLicense {
        PomLicense {
            name: name.map(str::to_string),
            url: url.map(str::to_string),
        }
    }

    fn policy(urls: &[&str], names: &[&str]) -> LicensePolicy {
        LicensePolicy {
            acceptable_urls: urls.iter().map(|s| s.to_string()).collect(),
            acceptable_names: names.iter().map(|s| s.to_string()).collect(),
            allow_unacceptable: false,
            allow_no_license: true,
            require_license: false,
        }
    }

    #[test]
    fn url_match_is_acceptable() {
        let policy = policy(&["https://www.apache.org/licenses/LICENSE-2.0.txt"], &[]);
        let decision = policy.evaluate(&[license(
            Some("Apache"),
            Some("https://www.apache.org/licenses/LICENSE-2.0.txt"),
        )]);
        assert_eq!(decision, LicenseDecision::Acceptable);
    }

    #[test]
    fn name_match_when_url_misses() {
        let policy = policy(&["https://elsewhere.example"], &["Apache License, Version 2.0"]);
        let decision = policy.evaluate(&[license(
            Some("Apache License, Version 2.0"),
            Some("https://www.apache.org/licenses/LICENSE-2.0.txt"),
        )]);
        assert_eq!(decision, LicenseDecision::Acceptable);
    }

    #[test]
    fn match_is_case_insensitive() {
        let policy = policy(&[], &["mit"]);
        assert_eq!(
            policy.evaluate(&[license(Some("MIT"), None)]),
            LicenseDecision::Acceptable
        );
    }

    #[test]
    fn unmatched_license_rejected_when_strict() {
        let policy = policy(&[], &["MIT"]);
        assert_eq!(
            policy.evaluate(&[license(Some("Proprietary"), None)]),
            LicenseDecision::Rejected
        );
    }

    #[test]
    fn unmatched_license_tolerated_by_default_gate() {
        let mut policy = policy(&[], &["MIT"]);
        policy.allow_unacceptable = true;
        assert_eq!(
            policy.evaluate(&[license(Some("Proprietary"), None)]),
            LicenseDecision::Tolerated
        );
    }

    #[test]
    fn no_license_allowed_by_default() {
        let policy = policy(&[], &[]);
        assert_eq!(policy.evaluate(&[]), LicenseDecision::Acceptable);
    }

    #[test]
    fn no_license_rejected_when_required() {
        let mut policy = policy(&[], &[]);
        policy.require_license = true;
        assert_eq!(policy.evaluate(&[]), LicenseDecision::Rejected);
    }

    #[test]
    fn no_license_rejected_when_disallowed() {
        let mut policy = policy(&[], &[]);
        policy.allow_no_license = false;
        assert_eq!(policy.evaluate(&[]), LicenseDecision::Rejected);
    }

    #[test]
    fn any_of_several_licenses_suffices() {
        let policy = policy(&[], &["EPL-2.0"]);
        let decision = policy.evaluate(&[
            license(Some("GPL-2.0"), None),
            license(Some("EPL-2.0"), None),
        ]);
        assert_eq!(decision, LicenseDecision::Acceptable);
    }
}
