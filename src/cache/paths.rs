// Cache path utilities.
// Names the cache root and the files that live beneath it.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Key of the cached failed-run list.
pub const RUNS_KEY: &str = "workflow_failures";

/// Key of the cached run-id to failed-jobs map.
pub const JOBS_KEY: &str = "job_failures";

/// Subdirectory holding one log file per job id.
pub const LOGS_DIR: &str = "logs";

/// Get the base cache directory (~/.cache/failmap on Linux).
/// Falls back to `.cache` in the working directory when no home is known.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "failmap")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".cache"))
}

/// Path to the logs directory under a cache root.
pub fn logs_dir(root: &Path) -> PathBuf {
    root.join(LOGS_DIR)
}

/// Path to an entry file inside a store directory.
pub fn entry_path(dir: &Path, key: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", sanitize_name(key), extension))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("simple"), "simple");
        assert_eq!(sanitize_name("with/slash"), "with_slash");
        assert_eq!(sanitize_name("owner:name"), "owner_name");
    }

    #[test]
    fn test_cache_paths() {
        let root = Path::new("/tmp/failmap");

        assert!(entry_path(root, RUNS_KEY, "json").ends_with("failmap/workflow_failures.json"));
        assert!(entry_path(root, JOBS_KEY, "json").ends_with("failmap/job_failures.json"));
        assert!(entry_path(&logs_dir(root), "11111", "txt").ends_with("logs/11111.txt"));
    }

    #[test]
    fn test_default_cache_dir_is_named_for_app() {
        let dir = default_cache_dir();
        assert!(dir.to_string_lossy().contains("failmap") || dir == Path::new(".cache"));
    }
}
