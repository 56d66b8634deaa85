// Log parser for test failures.
// Extracts (package, test file) pairs from failure marker lines in job logs.

use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use regex::Regex;

use crate::error::{FailmapError, Result};

pub const DEFAULT_MARKER: &str = " FAIL ";
pub const DEFAULT_PACKAGE_PREFIX: &str = "@";
pub const DEFAULT_TEST_SUFFIX: &str = ".test.ts";

/// One failing test file, identified by its package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FailureRecord {
    pub package: String,
    pub test_file: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.package, self.test_file)
    }
}

/// What a failure line looks like.
#[derive(Debug, Clone)]
pub struct ParserRules {
    marker: String,
    prefix: String,
    package: Regex,
    test_file: Regex,
    ansi: Regex,
}

impl ParserRules {
    /// Rules for lines containing `marker`, a `[<prefix>...]` package, and a path ending in `suffix`.
    pub fn new(marker: &str, prefix: &str, suffix: &str) -> Result<Self> {
        let compile = |pattern: String| {
            Regex::new(&pattern)
                .map_err(|e| FailmapError::Config(format!("Invalid log pattern: {}", e)))
        };

        Ok(Self {
            marker: marker.to_string(),
            prefix: prefix.to_string(),
            package: compile(format!(r"\[({}[^\]\s]*)\]", regex::escape(prefix)))?,
            test_file: compile(format!(r"(\S+{})(?:\s|$)", regex::escape(suffix)))?,
            ansi: compile(r"\x1b\[[0-9;]*[A-Za-z]".to_string())?,
        })
    }

    #[cfg(test)]
    pub fn standard() -> Result<Self> {
        Self::new(DEFAULT_MARKER, DEFAULT_PACKAGE_PREFIX, DEFAULT_TEST_SUFFIX)
    }

    /// Parse one line. `Ok(None)` covers non-candidates and partial matches.
    pub fn parse_line(&self, number: usize, raw: &str) -> Result<Option<FailureRecord>> {
        let line = self.ansi.replace_all(raw, "");
        if !line.contains(&self.marker) {
            return Ok(None);
        }

        let package = self.package.captures(&line).and_then(|c| c.get(1));
        let test_file = self.test_file.captures(&line).and_then(|c| c.get(1));
        let (Some(package), Some(test_file)) = (package, test_file) else {
            return Ok(None);
        };

        let malformed = |reason: &str| FailmapError::Parse {
            line: number,
            reason: reason.to_string(),
        };
        if package.as_str().len() == self.prefix.len() {
            return Err(malformed("package name is empty"));
        }
        if test_file.as_str().contains(char::REPLACEMENT_CHARACTER) {
            return Err(malformed("test path contains undecodable bytes"));
        }

        Ok(Some(FailureRecord {
            package: package.as_str().to_string(),
            test_file: test_file.as_str().to_string(),
        }))
    }

    /// Distinct failure records in one log. Malformed lines are skipped.
    pub fn parse_failures(&self, log: &str) -> BTreeSet<FailureRecord> {
        let mut records = BTreeSet::new();
        for (index, line) in log.lines().enumerate() {
            match self.parse_line(index + 1, line) {
                Ok(Some(record)) => {
                    records.insert(record);
                }
                Ok(None) => {}
                Err(e) => debug!("Skipping log line: {}", e),
            }
        }
        records
    }
}
