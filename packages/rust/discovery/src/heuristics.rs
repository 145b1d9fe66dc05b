//! Individual repository-context heuristics.
//!
//! Each function inspects one view of the page URL and returns an
//! `(owner, repo)` pair or `None`. They are tried in order by
//! [`ContextResolver::resolve`](crate::ContextResolver::resolve).

use std::sync::LazyLock;

use apidash_shared::RepoRef;
use regex::Regex;
use url::Url;

/// Matches `/<owner>/<repo>` at the start of a path.
static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([^/]+)/([^/?#]+)").expect("path regex"));

/// Strip one trailing `.html` from a repository segment.
fn repo_segment(segment: &str) -> &str {
    segment.strip_suffix(".html").unwrap_or(segment)
}

fn pair(owner: &str, repo: &str) -> Option<RepoRef> {
    let repo = repo_segment(repo);
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(RepoRef::new(owner, repo))
}

/// `<owner>.<pages-domain>` host with at least one non-empty path segment.
pub(crate) fn from_pages_host(url: &Url, pages_domain: &str) -> Option<RepoRef> {
    let host = url.host_str()?;
    let suffix = format!(".{pages_domain}");
    let subdomain = host.strip_suffix(&suffix)?;
    let owner = subdomain.split('.').next()?;

    let first = url.path_segments()?.find(|segment| !segment.is_empty())?;
    pair(owner, first)
}

/// Builds the full-URL pattern for a given pages domain.
pub(crate) fn url_pattern(pages_domain: &str) -> Regex {
    let pattern = format!(
        r"^https?://([^./]+)\.{}/([^/?#]+)",
        regex::escape(pages_domain)
    );
    // The domain is escaped, so the pattern is always well-formed.
    Regex::new(&pattern).expect("escaped pages-domain regex")
}

/// `owner.<pages-domain>/repo` matched against the full URL text.
pub(crate) fn from_url_pattern(url: &Url, pattern: &Regex) -> Option<RepoRef> {
    let caps = pattern.captures(url.as_str())?;
    pair(caps.get(1)?.as_str(), caps.get(2)?.as_str())
}

/// `/<owner>/<repo>` matched against the path alone.
pub(crate) fn from_path(url: &Url) -> Option<RepoRef> {
    let caps = PATH_RE.captures(url.path())?;
    pair(caps.get(1)?.as_str(), caps.get(2)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn pages_host_takes_first_segment() {
        let found = from_pages_host(
            &url("https://octo.github.io/api-catalog/api-management.html"),
            "github.io",
        );
        assert_eq!(found, Some(RepoRef::new("octo", "api-catalog")));
    }

    #[test]
    fn pages_host_strips_html_suffix() {
        let found = from_pages_host(&url("https://octo.github.io/dashboard.html"), "github.io");
        assert_eq!(found, Some(RepoRef::new("octo", "dashboard")));
    }

    #[test]
    fn pages_host_needs_a_segment() {
        assert_eq!(from_pages_host(&url("https://octo.github.io/"), "github.io"), None);
        assert_eq!(from_pages_host(&url("https://octo.gitlab.io/x"), "github.io"), None);
        assert_eq!(from_pages_host(&url("https://github.io/x"), "github.io"), None);
    }

    #[test]
    fn url_pattern_matches_full_text() {
        let re = url_pattern("pages.example.com");
        let found = from_url_pattern(&url("http://team.pages.example.com/catalog?tab=apis"), &re);
        assert_eq!(found, Some(RepoRef::new("team", "catalog")));
        assert_eq!(from_url_pattern(&url("http://team.pagesXexample.com/c"), &re), None);
    }

    #[test]
    fn path_pattern() {
        assert_eq!(
            from_path(&url("http://localhost:8080/octo/api-catalog/index.html")),
            Some(RepoRef::new("octo", "api-catalog"))
        );
        assert_eq!(
            from_path(&url("http://localhost:8080/octo/dashboard.html")),
            Some(RepoRef::new("octo", "dashboard"))
        );
        assert_eq!(from_path(&url("http://localhost:8080/index.html")), None);
    }
}
