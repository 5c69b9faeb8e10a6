// GitHub API module.
// Client and types for fetching repository star counts from the GitHub REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::GitHubClient;
pub use types::{RateLimit, Repository};
