// Runtime configuration.
// Built once at startup and passed by reference to every component.

use std::path::PathBuf;
#[cfg(test)]
use std::path::Path;
use std::time::Duration;

use crate::parser::ParserRules;

pub struct Token(String);

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}

/// Which workflow to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub owner: String,
    pub repo: String,
    /// Numeric id or workflow file name, e.g. `ci.yml`.
    pub workflow_id: String,
    pub branch: String,
}

#[derive(Debug)]
pub struct Config {
    pub target: Target,
    pub token: Token,
    pub api_url: String,
    pub cache_dir: PathBuf,
    /// Freshness window shared by every cache store.
    pub cache_ttl: Duration,
    /// Name of the job whose logs are downloaded and parsed.
    pub log_job: String,
    pub parser: ParserRules,
    /// Where the heatmap is written.
    pub output: PathBuf,
}

#[cfg(test)]
impl Config {
    /// Configuration against a mock API with caches under `cache_dir`.
    pub fn for_tests(api_url: &str, cache_dir: &Path) -> Self {
        Config {
            target: Target {
                owner: "octo".to_string(),
                repo: "widgets".to_string(),
                workflow_id: "ci.yml".to_string(),
                branch: "main".to_string(),
            },
            token: Token::from("test-token"),
            api_url: api_url.to_string(),
            cache_dir: cache_dir.to_path_buf(),
            cache_ttl: Duration::from_secs(3600),
            log_job: "test".to_string(),
            parser: ParserRules::standard().unwrap(),
            output: cache_dir.join("failure_timeline.txt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_redacts_value() {
        let sensitive_token = "ghp_very_secret_token_do_not_log";
        let token = Token::from(sensitive_token);

        let debug_output = format!("{token:?}");

        assert_eq!(debug_output, "<redacted>");
        assert!(!debug_output.contains(sensitive_token));
    }

    #[test]
    fn test_token_debug_in_config() {
        let mut config = Config::for_tests("https://api.github.com", Path::new(".cache"));
        config.token = Token::from("super_secret_token");

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("<redacted>"));
        assert!(!debug_output.contains("super_secret_token"));
        assert!(debug_output.contains("ci.yml"));
    }
}
