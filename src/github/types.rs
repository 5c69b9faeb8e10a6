// GitHub API response types.
// Only the repository fields the star lookup needs are deserialized.

use chrono::DateTime;
use serde::Deserialize;

/// GitHub repository metadata from `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub stargazers_count: u64,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Reset time as a Unix timestamp.
    pub reset: u64,
}

impl RateLimit {
    /// Whether any rate limit headers have been seen yet.
    pub fn is_known(&self) -> bool {
        self.limit > 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.is_known() && self.remaining == 0
    }

    /// Reset time formatted as wall-clock time, or "unknown".
    pub fn reset_at(&self) -> String {
        DateTime::from_timestamp(self.reset as i64, 0)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_deserialize() {
        let json = r#"{
            "id": 1,
            "full_name": "vercel/next.js",
            "stargazers_count": 128000,
            "html_url": "https://github.com/vercel/next.js",
            "private": false,
            "pushed_at": "2024-05-01T12:00:00Z"
        }"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.full_name, "vercel/next.js");
        assert_eq!(repo.stargazers_count, 128000);
    }

    #[test]
    fn test_repository_missing_stars_is_error() {
        let json = r#"{"id": 1, "full_name": "octo/foo"}"#;
        assert!(serde_json::from_str::<Repository>(json).is_err());
    }

    #[test]
    fn test_rate_limit_state() {
        let unknown = RateLimit::default();
        assert!(!unknown.is_known());
        assert!(!unknown.is_exhausted());

        let exhausted = RateLimit {
            limit: 60,
            remaining: 0,
            reset: 0,
        };
        assert!(exhausted.is_exhausted());
        assert_eq!(exhausted.reset_at(), "00:00:00");
    }
}
