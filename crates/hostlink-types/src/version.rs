//! SDK version comparison and API version tags.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// SDK version assumed for hosts that do not report one.
pub const DEFAULT_HOST_SDK_VERSION: &str = "2.0.1";

/// Error returned when a dotted version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sdk version '{0}': expected dot-separated decimal components")]
pub struct VersionParseError(pub String);

/// Dot-separated numeric version such as `2.0.1`.
///
/// Comparison pads the shorter version with zeros, so `2.0` and
/// `2.0.0` are equal. Each component must be one or more ASCII digits;
/// anything else (`1a`, empty segments, a leading `v`) fails to parse.
///
/// # Example
///
/// ```
/// use hostlink_types::SdkVersion;
///
/// let host: SdkVersion = "2.0.5".parse().unwrap();
/// let required: SdkVersion = "2.0.1".parse().unwrap();
/// assert!(host >= required);
/// assert_eq!("2.0".parse::<SdkVersion>().unwrap(), "2.0.0".parse().unwrap());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SdkVersion {
    parts: Vec<u64>,
}

impl SdkVersion {
    /// Version components, most significant first.
    #[must_use]
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Returns `true` if `self` is the same as or newer than `other`.
    #[must_use]
    pub fn is_at_least(&self, other: &SdkVersion) -> bool {
        self >= other
    }
}

/// Compares two version strings.
///
/// Returns `None` when either side is not a valid version, mirroring
/// the "not comparable" outcome callers must treat as "not at least".
#[must_use]
pub fn compare_sdk_versions(left: &str, right: &str) -> Option<Ordering> {
    let l: SdkVersion = left.parse().ok()?;
    let r: SdkVersion = right.parse().ok()?;
    Some(l.cmp(&r))
}

impl FromStr for SdkVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionParseError(s.to_string()));
                }
                part.parse::<u64>()
                    .map_err(|_| VersionParseError(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }
}

impl TryFrom<String> for SdkVersion {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SdkVersion> for String {
    fn from(v: SdkVersion) -> Self {
        v.to_string()
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

impl PartialEq for SdkVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SdkVersion {}

impl PartialOrd for SdkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SdkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let l = self.parts.get(i).copied().unwrap_or(0);
            let r = other.parts.get(i).copied().unwrap_or(0);
            match l.cmp(&r) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

/// Tag attached to each outbound call naming the API surface version
/// and the API that produced it, e.g. `v2_app.initialize`.
///
/// Hosts use the tag for telemetry only; it never changes how a call is
/// routed or answered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersionTag(String);

impl ApiVersionTag {
    /// Builds a tag from an API surface version and an API name.
    ///
    /// ```
    /// use hostlink_types::ApiVersionTag;
    ///
    /// let tag = ApiVersionTag::new(2, "pages.tabs.navigateToTab");
    /// assert_eq!(tag.as_str(), "v2_pages.tabs.navigateToTab");
    /// ```
    #[must_use]
    pub fn new(surface_version: u32, api_name: &str) -> Self {
        Self(format!("v{surface_version}_{api_name}"))
    }

    /// Wraps an already formatted tag.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
