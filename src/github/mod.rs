// GitHub API module.
// Provides client and types for interacting with the GitHub Actions REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{GITHUB_API_BASE, GitHubClient};
pub use endpoints::MAX_PER_PAGE;
pub use types::*;
