//! Repository directory index scraping.
//!
//! Maven 2 repositories expose artifact directories as HTML indices. The
//! file list is recovered by extracting every `href` attribute and
//! normalising it back to a bare filename.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::fetch::{fetch_optional, HttpFetcher};

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']*)["']"#).expect("valid href pattern")
});

/// Artifacts signed-then-hashed in every combination leave behind sidecar
/// chains that no tool consumes; repositories list them anyway.
const GARBAGE_SUFFIXES: &[&str] = &[
    ".asc.asc",
    ".md5.asc",
    ".sha1.asc",
    ".asc.asc.md5",
    ".asc.asc.sha1",
    ".md5.asc.md5",
    ".md5.asc.sha1",
    ".sha1.asc.md5",
    ".sha1.asc.sha1",
];

/// Fetch and scrape an artifact directory index.
///
/// Returns `None` when the directory does not exist (404 or empty body).
/// Every returned name appeared as a link target in the fetched HTML.
pub async fn list_files(
    fetcher: &dyn HttpFetcher,
    directory_url: &str,
) -> miette::Result<Option<BTreeSet<String>>> {
    let Some(body) = fetch_optional(fetcher, directory_url).await? else {
        return Ok(None);
    };
    if body.is_empty() {
        return Ok(None);
    }
    let html = String::from_utf8_lossy(&body);
    Ok(Some(scrape_hrefs(&html, directory_url)))
}

/// Extract filenames from an HTML directory index.
pub fn scrape_hrefs(html: &str, directory_url: &str) -> BTreeSet<String> {
    let mut files = BTreeSet::new();
    for capture in HREF_RE.captures_iter(html) {
        let raw = capture[1].trim();
        // Some repository frontends emit a stray leading colon.
        let href = raw.strip_prefix(':').unwrap_or(raw);

        let name = if let Some(tail) = href.strip_prefix(directory_url) {
            tail
        } else if href.contains("://") {
            continue;
        } else {
            href
        };

        if !is_artifact_filename(name) {
            continue;
        }
        files.insert(name.to_string());
    }
    files
}

/// Whether a normalised href names a downloadable file in this directory.
fn is_artifact_filename(name: &str) -> bool {
    if name.is_empty() || name.ends_with('/') || name.ends_with("..") {
        return false;
    }
    // Index decorations (sort links, root-relative navigation) are not files.
    if name.contains('/') || name.starts_with('?') || name.starts_with('#') {
        return false;
    }
    !GARBAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIR_URL: &str = "https://repo.example.com/maven2/org/example/lib/1.0/";

    #[test]
    fn scrape_relative_links() {
        let html = r#"
            <html><body><pre>
            <a href="../">../</a>
            <a href="lib-1.0.jar">lib-1.0.jar</a>
            <a href="lib-1.0.jar.sha1">lib-1.0.jar.sha1</a>
            <a href="lib-1.0.pom">lib-1.0.pom</a>
            </pre></body></html>"#;
        let files = scrape_hrefs(html, DIR_URL);
        assert_eq!(
            files.into_iter().collect::<Vec<_>>(),
            vec!["lib-1.0.jar", "lib-1.0.jar.sha1", "lib-1.0.pom"]
        );
    }

    #[test]
    fn scrape_absolute_links_within_directory() {
        let html = format!(r#"<a href="{DIR_URL}lib-1.0.jar">lib-1.0.jar</a>"#);
        let files = scrape_hrefs(&html, DIR_URL);
        assert!(files.contains("lib-1.0.jar"));
    }

    #[test]
    fn scrape_discards_foreign_absolute_links() {
        let html = r#"<a href="https://other.example.com/elsewhere/x.jar">x.jar</a>"#;
        assert!(scrape_hrefs(html, DIR_URL).is_empty());
    }

    #[test]
    fn scrape_strips_leading_colon() {
        let html = r#"<a href=":lib-1.0.pom">lib-1.0.pom</a>"#;
        let files = scrape_hrefs(html, DIR_URL);
        assert!(files.contains("lib-1.0.pom"));
    }

    #[test]
    fn scrape_discards_directories_and_parents() {
        let html = r#"
            <a href="subdir/">subdir/</a>
            <a href="..">..</a>
            <a href="?C=N;O=D">Name</a>
            <a href="/root/relative">root</a>"#;
        assert!(scrape_hrefs(html, DIR_URL).is_empty());
    }

    #[test]
    fn scrape_discards_garbage_suffixes() {
        let html = r#"
            <a href="lib-1.0.jar.asc.asc">x</a>
            <a href="lib-1.0.jar.md5.asc">x</a>
            <a href="lib-1.0.jar.sha1.asc.sha1">x</a>
            <a href="lib-1.0.jar.asc">keep</a>
            <a href="lib-1.0.jar.asc.md5">keep</a>"#;
        let files = scrape_hrefs(html, DIR_URL);
        assert_eq!(
            files.into_iter().collect::<Vec<_>>(),
            vec!["lib-1.0.jar.asc", "lib-1.0.jar.asc.md5"]
        );
    }

    #[test]
    fn scrape_single_quoted_hrefs() {
        let html = "<a href='lib-1.0.jar'>lib-1.0.jar</a>";
        assert!(scrape_hrefs(html, DIR_URL).contains("lib-1.0.jar"));
    }

    #[test]
    fn every_name_was_a_link() {
        let html = r#"
            <a href="lib-1.0.jar">jar</a>
            plain text lib-1.0.pom mentioned without a link"#;
        let files = scrape_hrefs(html, DIR_URL);
        assert!(files.contains("lib-1.0.jar"));
        assert!(!files.contains("lib-1.0.pom"));
    }
}
