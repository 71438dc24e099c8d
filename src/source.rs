//! Source and Source Group identity.
//!
//! A source is identified by its canonical base URL: scheme, host, port and
//! path with any trailing `/` removed. Two sources are the same entity iff
//! their canonical URLs are equal. The host+port comparison in
//! [`Source::shares_host_port`] is only a pre-check used to warn about likely
//! duplicates; it never redefines identity.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::InvalidSourceUrl;

/// One remote instance exposing the actuator endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Source {
    base_url: String,
}

impl Source {
    /// Parse and canonicalize a base URL such as `http://host:8080/actuator`.
    pub fn parse(raw: &str) -> Result<Self, InvalidSourceUrl> {
        let invalid = |reason: String| InvalidSourceUrl {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme '{}'", other))),
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed".to_string()));
        }

        let mut base_url = url.to_string();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { base_url })
    }

    /// Canonical base URL, also used as the label in aggregated views.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn label(&self) -> String {
        self.base_url.clone()
    }

    /// URL of `segment` below the base, e.g. `metrics/jvm.memory.used`.
    pub fn endpoint_url(&self, segment: &str) -> String {
        format!("{}/{}", self.base_url, segment.trim_start_matches('/'))
    }

    /// Same host and port, regardless of scheme or path.
    pub fn shares_host_port(&self, other: &Source) -> bool {
        match (Url::parse(&self.base_url), Url::parse(&other.base_url)) {
            (Ok(a), Ok(b)) => {
                a.host_str() == b.host_str()
                    && a.port_or_known_default() == b.port_or_known_default()
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base_url)
    }
}

impl TryFrom<String> for Source {
    type Error = InvalidSourceUrl;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Source::parse(&value)
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.base_url
    }
}

/// A named, stable collection of sources managed as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceGroup {
    id: Uuid,
    pub name: String,
    members: Vec<Source>,
}

impl SourceGroup {
    pub fn new(name: impl Into<String>, members: Vec<Source>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members: dedup_members(members),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Members in their configured order.
    pub fn members(&self) -> &[Source] {
        &self.members
    }

    pub fn contains(&self, source: &Source) -> bool {
        self.members.contains(source)
    }

    /// Rename and/or change membership while keeping the group's identity.
    pub fn edited(&self, name: impl Into<String>, members: Vec<Source>) -> Self {
        Self {
            id: self.id,
            name: name.into(),
            members: dedup_members(members),
        }
    }
}

/// Keep the first occurrence of each source, preserving order.
fn dedup_members(members: Vec<Source>) -> Vec<Source> {
    let mut unique: Vec<Source> = Vec::with_capacity(members.len());
    for member in members {
        if !unique.contains(&member) {
            unique.push(member);
        }
    }
    unique
}
