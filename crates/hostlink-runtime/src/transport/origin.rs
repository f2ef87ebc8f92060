//! Inbound origin allow-list.
//!
//! An origin is accepted when any of these holds:
//!
//! 1. it equals the page's own origin and same-origin frames are allowed
//! 2. it matches one of the additional full-origin patterns
//!    (`https://*.contoso.com`)
//! 3. it is `https` and its host matches a trusted host pattern
//!
//! Host patterns are compared label by label. A single `*` label
//! matches any one label, but never the last one.

use crate::config::OriginsConfig;
use tracing::{debug, warn};
use url::Url;

const HTTPS_PREFIX: &str = "https://";

/// Returns `true` if `host` matches `pattern`.
///
/// ```
/// use hostlink_runtime::transport::host_matches_pattern;
///
/// assert!(host_matches_pattern("*.teams.microsoft.com", "eu.teams.microsoft.com"));
/// assert!(host_matches_pattern("test.*.contoso.com", "test.a.contoso.com"));
/// assert!(!host_matches_pattern("teams.microsoft.com", "team.microsoft.com"));
/// assert!(!host_matches_pattern("contoso.*", "contoso.com"));
/// ```
#[must_use]
pub fn host_matches_pattern(pattern: &str, host: &str) -> bool {
    let pattern_labels: Vec<&str> = pattern.split('.').collect();
    let host_labels: Vec<&str> = host.split('.').collect();

    if pattern_labels.len() != host_labels.len() {
        return false;
    }

    let last = pattern_labels.len() - 1;
    let mut used_wildcard = false;
    for (i, (p, h)) in pattern_labels.iter().zip(&host_labels).enumerate() {
        if p == h {
            continue;
        }
        if *p != "*" || i == last || used_wildcard {
            return false;
        }
        used_wildcard = true;
    }
    true
}

/// Host part of `url` including a non-default port, e.g. `local.host:8080`.
fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// A parsed additional-origin pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OriginPattern {
    raw: String,
    host: String,
}

impl OriginPattern {
    fn parse(raw: &str) -> Option<Self> {
        let host = raw.strip_prefix(HTTPS_PREFIX)?.trim_end_matches('/');
        if host.is_empty() || host.contains('/') {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            host: host.to_ascii_lowercase(),
        })
    }

    fn matches(&self, origin: &Url) -> bool {
        origin.scheme() == "https"
            && host_with_port(origin).is_some_and(|h| host_matches_pattern(&self.host, &h))
    }
}

/// Allow-list deciding which inbound origins are trusted.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    trusted_hosts: Vec<String>,
    additional: Vec<OriginPattern>,
    allow_same_origin: bool,
    own_origin: Option<String>,
}

impl OriginPolicy {
    /// Builds a policy from configuration.
    ///
    /// Invalid additional origins are dropped with a warning.
    #[must_use]
    pub fn from_config(config: &OriginsConfig) -> Self {
        let mut policy = Self {
            trusted_hosts: config
                .trusted_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            additional: Vec::new(),
            allow_same_origin: config.allow_same_origin,
            own_origin: config.own_origin.as_deref().and_then(normalize_origin),
        };
        policy.add_origins(&config.additional);
        policy
    }

    /// Appends additional origin patterns.
    ///
    /// Entries must start with `https://`; others are ignored. Duplicates
    /// are skipped. Returns the number of patterns actually added.
    pub fn add_origins<S: AsRef<str>>(&mut self, origins: &[S]) -> usize {
        let mut added = 0;
        for origin in origins {
            let origin = origin.as_ref();
            let Some(pattern) = OriginPattern::parse(origin) else {
                warn!(origin, "Ignoring additional origin: must be an https origin");
                continue;
            };
            if self.additional.iter().any(|p| p.host == pattern.host) {
                continue;
            }
            debug!(origin, "Added additional valid origin");
            self.additional.push(pattern);
            added += 1;
        }
        added
    }

    /// Additional origin patterns currently in effect.
    #[must_use]
    pub fn additional_origins(&self) -> Vec<&str> {
        self.additional.iter().map(|p| p.raw.as_str()).collect()
    }

    /// Returns `true` if frames from `origin` may be processed.
    #[must_use]
    pub fn is_trusted(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin) else {
            debug!(origin, "Rejecting unparseable origin");
            return false;
        };

        if self.allow_same_origin {
            if let Some(own) = &self.own_origin {
                if url.origin().ascii_serialization() == *own {
                    return true;
                }
            }
        }

        if self.additional.iter().any(|p| p.matches(&url)) {
            return true;
        }

        if url.scheme() != "https" {
            debug!(origin, scheme = url.scheme(), "Rejecting non-https origin");
            return false;
        }

        let Some(host) = host_with_port(&url) else {
            return false;
        };
        if self
            .trusted_hosts
            .iter()
            .any(|pattern| host_matches_pattern(pattern, &host))
        {
            return true;
        }

        debug!(origin, "Origin is not in the allow-list");
        false
    }
}

fn normalize_origin(origin: &str) -> Option<String> {
    Url::parse(origin)
        .ok()
        .map(|u| u.origin().ascii_serialization())
}
