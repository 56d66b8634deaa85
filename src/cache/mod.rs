// Cache module for local filesystem caching.
// Stores GitHub API responses and job logs between runs, each store with its own freshness rule.

pub mod format;
pub mod freshness;
pub mod paths;
pub mod store;

pub use format::{Json, Text};
pub use freshness::{DEFAULT_TTL, Freshness};
pub use store::Store;
