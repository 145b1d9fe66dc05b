//! Repository context detection.
//!
//! Works out which `(owner, repo)` backs the catalog from the URL the
//! dashboard is published at. Heuristics are tried in priority order and the
//! first match wins; when none applies the configured default is used, and
//! without a default the session runs in local mode. Resolution never fails.

mod heuristics;

use std::time::Duration;

use apidash_shared::{ApidashError, RepositoryConfig, RepoRef, Result};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// User-Agent string for platform API requests.
pub const USER_AGENT: &str = concat!("apidash/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Owner and repo were given directly.
    Explicit,
    /// `<owner>.<pages-domain>/<repo>` host + path.
    PagesHost,
    /// Full-URL pattern match.
    UrlPattern,
    /// `/<owner>/<repo>` path match.
    PathPattern,
    /// Configured fallback pair.
    ConfiguredDefault,
    /// Nothing matched; documents come from a local directory.
    Local,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Explicit => "explicit",
            Self::PagesHost => "pages host",
            Self::UrlPattern => "url pattern",
            Self::PathPattern => "path pattern",
            Self::ConfiguredDefault => "configured default",
            Self::Local => "local",
        };
        f.write_str(label)
    }
}

/// Outcome of context detection. `repo == None` means local mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub repo: Option<RepoRef>,
    pub source: ResolutionSource,
}

impl Resolution {
    /// A local-mode resolution.
    pub fn local() -> Self {
        Self {
            repo: None,
            source: ResolutionSource::Local,
        }
    }

    /// Whether documents should be read from the remote content API.
    pub fn is_remote(&self) -> bool {
        self.repo.is_some()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves the backing repository from a page URL.
#[derive(Debug, Clone)]
pub struct ContextResolver {
    pages_domain: String,
    url_pattern: Regex,
    explicit: Option<RepoRef>,
    fallback: Option<RepoRef>,
}

impl ContextResolver {
    /// Create a resolver for the given static-pages domain.
    pub fn new(pages_domain: impl Into<String>) -> Self {
        let pages_domain = pages_domain.into();
        let url_pattern = heuristics::url_pattern(&pages_domain);
        Self {
            pages_domain,
            url_pattern,
            explicit: None,
            fallback: None,
        }
    }

    /// Build a resolver from the `[repository]` config section.
    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self::new(config.pages_domain.clone()).with_fallback(config.default_repo_ref())
    }

    /// Short-circuit resolution with a directly supplied pair.
    pub fn with_explicit(mut self, explicit: Option<RepoRef>) -> Self {
        self.explicit = explicit;
        self
    }

    /// Pair used when no heuristic matches. `None` means local mode.
    pub fn with_fallback(mut self, fallback: Option<RepoRef>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Run the heuristics in priority order against `page_url`.
    #[instrument(skip_all, fields(page_url = page_url.map(Url::as_str)))]
    pub fn resolve(&self, page_url: Option<&Url>) -> Resolution {
        if let Some(repo) = &self.explicit {
            return self.found(repo.clone(), ResolutionSource::Explicit);
        }

        if let Some(url) = page_url {
            if let Some(repo) = heuristics::from_pages_host(url, &self.pages_domain) {
                return self.found(repo, ResolutionSource::PagesHost);
            }
            if let Some(repo) = heuristics::from_url_pattern(url, &self.url_pattern) {
                return self.found(repo, ResolutionSource::UrlPattern);
            }
            if let Some(repo) = heuristics::from_path(url) {
                return self.found(repo, ResolutionSource::PathPattern);
            }
            debug!("no heuristic matched the page URL");
        }

        match &self.fallback {
            Some(repo) => self.found(repo.clone(), ResolutionSource::ConfiguredDefault),
            None => {
                info!("no repository context, running in local mode");
                Resolution::local()
            }
        }
    }

    /// Parse `page_url` and resolve. An unparseable URL is logged and treated
    /// as absent.
    pub fn resolve_str(&self, page_url: Option<&str>) -> Resolution {
        let parsed = page_url.and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(page_url = raw, error = %e, "ignoring unparseable page URL");
                None
            }
        });
        self.resolve(parsed.as_ref())
    }

    fn found(&self, repo: RepoRef, source: ResolutionSource) -> Resolution {
        info!(%repo, %source, "repository context detected");
        Resolution {
            repo: Some(repo),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Repository probe
// ---------------------------------------------------------------------------

/// Result of checking that a resolved repository is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable {
        full_name: String,
        description: Option<String>,
    },
    Unreachable {
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
}

/// Build a reqwest client for platform API calls.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ApidashError::Network(format!("failed to build HTTP client: {e}")))
}

/// Check that `repo` exists via `GET {api_base}/repos/{owner}/{repo}`.
///
/// Never fails; problems are logged and reported as [`ProbeOutcome::Unreachable`].
#[instrument(skip_all, fields(%repo))]
pub async fn probe_repository(client: &Client, api_base: &str, repo: &RepoRef) -> ProbeOutcome {
    let url = format!(
        "{}/repos/{}/{}",
        api_base.trim_end_matches('/'),
        repo.owner,
        repo.repo
    );

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "repository probe failed");
            return ProbeOutcome::Unreachable {
                reason: e.to_string(),
            };
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "repository probe returned non-success; context may be wrong");
        return ProbeOutcome::Unreachable {
            reason: format!("HTTP {status}"),
        };
    }

    match response.json::<RepoInfo>().await {
        Ok(info) => {
            info!(full_name = %info.full_name, "repository reachable");
            ProbeOutcome::Reachable {
                full_name: info.full_name,
                description: info.description,
            }
        }
        Err(e) => ProbeOutcome::Unreachable {
            reason: format!("unexpected repository payload: {e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ContextResolver {
        ContextResolver::new("github.io")
    }

    #[test]
    fn pages_host_wins() {
        let res = resolver().resolve_str(Some(
            "https://octo.github.io/api-catalog/api-management.html",
        ));
        assert_eq!(res.repo, Some(RepoRef::new("octo", "api-catalog")));
        assert_eq!(res.source, ResolutionSource::PagesHost);
    }

    #[test]
    fn path_pattern_for_other_hosts() {
        let res = resolver().resolve_str(Some("http://localhost:8000/octo/api-catalog/"));
        assert_eq!(res.repo, Some(RepoRef::new("octo", "api-catalog")));
        assert_eq!(res.source, ResolutionSource::PathPattern);
    }

    #[test]
    fn falls_back_to_configured_default() {
        let res = resolver()
            .with_fallback(Some(RepoRef::new("octo", "fallback")))
            .resolve_str(Some("http://localhost:8000/index.html"));
        assert_eq!(res.repo, Some(RepoRef::new("octo", "fallback")));
        assert_eq!(res.source, ResolutionSource::ConfiguredDefault);
    }

    #[test]
    fn local_mode_without_default() {
        let res = resolver().resolve_str(Some("http://localhost:8000/index.html"));
        assert_eq!(res, Resolution::local());
        assert!(!res.is_remote());

        assert_eq!(resolver().resolve(None), Resolution::local());
    }

    #[test]
    fn unparseable_url_is_treated_as_absent() {
        let res = resolver().resolve_str(Some("not a url"));
        assert_eq!(res.source, ResolutionSource::Local);
    }

    #[test]
    fn explicit_override_short_circuits() {
        let res = resolver()
            .with_explicit(Some(RepoRef::new("me", "mine")))
            .resolve_str(Some("https://octo.github.io/api-catalog/"));
        assert_eq!(res.repo, Some(RepoRef::new("me", "mine")));
        assert_eq!(res.source, ResolutionSource::Explicit);
    }

    #[test]
    fn from_config_uses_domain_and_default() {
        let config = RepositoryConfig {
            pages_domain: "pages.example.com".into(),
            default_owner: Some("octo".into()),
            default_repo: Some("catalog".into()),
            ..RepositoryConfig::default()
        };
        let resolver = ContextResolver::from_config(&config);

        let res = resolver.resolve_str(Some("https://team.pages.example.com/apis/"));
        assert_eq!(res.repo, Some(RepoRef::new("team", "apis")));

        let res = resolver.resolve(None);
        assert_eq!(res.source, ResolutionSource::ConfiguredDefault);
    }

    #[tokio::test]
    async fn probe_reports_reachable_repository() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/repos/octo/api-catalog"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({
                    "full_name": "octo/api-catalog",
                    "description": "API catalog data"
                }),
            ))
            .mount(&server)
            .await;

        let client = build_client(5).unwrap();
        let outcome =
            probe_repository(&client, &server.uri(), &RepoRef::new("octo", "api-catalog")).await;

        assert_eq!(
            outcome,
            ProbeOutcome::Reachable {
                full_name: "octo/api-catalog".into(),
                description: Some("API catalog data".into()),
            }
        );
    }

    #[tokio::test]
    async fn probe_never_raises_on_missing_repository() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_client(5).unwrap();
        let outcome =
            probe_repository(&client, &server.uri(), &RepoRef::new("octo", "missing")).await;

        assert!(matches!(outcome, ProbeOutcome::Unreachable { .. }));
    }
}
