// Star count data model.
// Repository identifiers, timestamped observations, and consumer snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HubError;

/// A GitHub repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct RepoId(String);

impl RepoId {
    /// Parse an identifier, trimming surrounding whitespace.
    /// Returns `None` for blank or malformed input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (owner, name) = raw.split_once('/')?;
        let valid_part =
            |part: &str| !part.is_empty() && !part.contains('/') && !part.contains(char::is_whitespace);
        if valid_part(owner) && valid_part(name) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn owner(&self) -> &str {
        self.0.split_once('/').map(|(owner, _)| owner).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, name)| name).unwrap_or_default()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RepoId> for String {
    fn from(repo: RepoId) -> Self {
        repo.0
    }
}

impl TryFrom<String> for RepoId {
    type Error = HubError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(HubError::InvalidRepo(value))
    }
}

impl<'de> Deserialize<'de> for RepoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RepoId::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Deserialize an optional repository field where blank strings mean "no repository".
pub fn deserialize_optional_repo<'de, D>(deserializer: D) -> Result<Option<RepoId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => RepoId::try_from(raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// A star count observed by a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    pub stars: u64,
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub observed_at: DateTime<Utc>,
}

impl StarRecord {
    pub fn new(stars: u64, observed_at: DateTime<Utc>) -> Self {
        Self { stars, observed_at }
    }

    /// Whether this observation is younger than `ttl` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now.signed_duration_since(self.observed_at);
        match age.to_std() {
            Ok(age) => age < ttl,
            // Observed in the future (clock skew): treat as just observed.
            Err(_) => true,
        }
    }
}

/// Read-only view from repository identifier to star count.
///
/// A missing key means the count is unknown, which is distinct from a
/// confirmed count of zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarsSnapshot {
    counts: BTreeMap<RepoId, u64>,
}

impl StarsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, repo: &RepoId) -> Option<u64> {
        self.counts.get(repo).copied()
    }

    /// Look up by raw identifier string.
    pub fn get_str(&self, repo: &str) -> Option<u64> {
        RepoId::parse(repo).and_then(|repo| self.get(&repo))
    }

    /// Star count for ranking: unknown counts rank as zero.
    pub fn rank_stars(&self, repo: Option<&RepoId>) -> u64 {
        repo.and_then(|repo| self.get(repo)).unwrap_or(0)
    }

    pub fn contains(&self, repo: &RepoId) -> bool {
        self.counts.contains_key(repo)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(RepoId, u64)> for StarsSnapshot {
    fn from_iter<I: IntoIterator<Item = (RepoId, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}
