// Command-line interface.
// Declares flags with environment fallbacks and validates them into a Config.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::cache::DEFAULT_TTL;
use crate::cache::paths::default_cache_dir;
use crate::config::{Config, Target, Token};
use crate::error::{FailmapError, Result};
use crate::github::GITHUB_API_BASE;
use crate::parser::{DEFAULT_MARKER, DEFAULT_PACKAGE_PREFIX, DEFAULT_TEST_SUFFIX, ParserRules};

#[derive(Parser, Debug)]
#[command(name = "failmap")]
#[command(author, version, about = "Tally GitHub Actions failures for one workflow branch", long_about = None)]
pub struct Cli {
    /// Repository owner (user or organization)
    #[arg(long, env = "OWNER")]
    owner: Option<String>,

    /// Repository name
    #[arg(long, env = "REPO")]
    repo: Option<String>,

    /// Workflow id or file name (e.g. "ci.yml")
    #[arg(long, env = "WORKFLOW_ID")]
    workflow_id: Option<String>,

    /// Branch whose failed runs are analyzed
    #[arg(long, env = "BRANCH")]
    branch: Option<String>,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL
    #[arg(long, default_value = GITHUB_API_BASE)]
    api_url: String,

    /// Cache directory (defaults to the platform cache directory)
    #[arg(long, env = "FAILMAP_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Seconds before cached runs, jobs, and logs are refetched
    #[arg(long, default_value_t = DEFAULT_TTL.as_secs())]
    cache_ttl: u64,

    /// Job whose logs are downloaded and scanned for failing tests
    #[arg(long, default_value = "test")]
    log_job: String,

    /// Marker that identifies a failed test line
    #[arg(long, default_value = DEFAULT_MARKER)]
    fail_marker: String,

    /// Required prefix of the bracketed package name
    #[arg(long, default_value = DEFAULT_PACKAGE_PREFIX)]
    package_prefix: String,

    /// Required suffix of the failing test file path
    #[arg(long, default_value = DEFAULT_TEST_SUFFIX)]
    test_suffix: String,

    /// Heatmap output file, written as a plain-text table rather than an image
    #[arg(short, long, default_value = "failure_timeline.txt")]
    output: PathBuf,
}

impl Cli {
    /// Validate the arguments into a [`Config`].
    /// Every missing required option is reported at once.
    pub fn into_config(self) -> Result<Config> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &'static str| {
            let value = value.filter(|v| !v.trim().is_empty());
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let owner = require(self.owner, "owner");
        let repo = require(self.repo, "repo");
        let workflow_id = require(self.workflow_id, "workflow_id");
        let branch = require(self.branch, "branch");
        let token = require(self.token, "token");

        if !missing.is_empty() {
            return Err(FailmapError::MissingConfig(missing));
        }
        if self.fail_marker.is_empty() {
            return Err(FailmapError::Config("fail marker must not be empty".to_string()));
        }

        Ok(Config {
            target: Target {
                owner,
                repo,
                workflow_id,
                branch,
            },
            token: Token::from(token.as_str()),
            api_url: self.api_url,
            cache_dir: self.cache_dir.unwrap_or_else(default_cache_dir),
            cache_ttl: Duration::from_secs(self.cache_ttl),
            log_job: self.log_job,
            parser: ParserRules::new(&self.fail_marker, &self.package_prefix, &self.test_suffix)?,
            output: self.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Explicit flags always take precedence over the environment.
    fn full_args() -> Vec<&'static str> {
        vec![
            "failmap",
            "--owner",
            "octo",
            "--repo",
            "widgets",
            "--workflow-id",
            "ci.yml",
            "--branch",
            "main",
            "--token",
            "ghp_abc",
            "--cache-dir",
            "/tmp/failmap-test",
        ]
    }

    #[test]
    fn test_full_arguments_build_config() {
        let config = Cli::parse_from(full_args()).into_config().unwrap();

        assert_eq!(config.target.owner, "octo");
        assert_eq!(config.target.repo, "widgets");
        assert_eq!(config.target.workflow_id, "ci.yml");
        assert_eq!(config.target.branch, "main");
        assert_eq!(config.token.as_str(), "ghp_abc");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/failmap-test"));
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.log_job, "test");
        assert_eq!(config.output, PathBuf::from("failure_timeline.txt"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut args = full_args();
        let branch = args.iter().position(|a| *a == "main").unwrap();
        args[branch] = "  ";

        let err = Cli::parse_from(args).into_config().unwrap_err();
        match err {
            FailmapError::MissingConfig(names) => assert_eq!(names, vec!["branch"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overrides() {
        let mut args = full_args();
        args.extend([
            "--cache-ttl",
            "60",
            "--log-job",
            "unit tests",
            "--api-url",
            "http://localhost:9000",
            "-o",
            "out.txt",
        ]);

        let config = Cli::parse_from(args).into_config().unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.log_job, "unit tests");
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.output, PathBuf::from("out.txt"));
    }

    #[test]
    fn test_output_help_names_text_format() {
        use clap::CommandFactory;

        let command = Cli::command();
        let output = command
            .get_arguments()
            .find(|arg| arg.get_id() == "output")
            .unwrap();
        assert!(output.get_help().unwrap().to_string().contains("plain-text table"));
    }
}
