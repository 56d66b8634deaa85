// Cache store for reading and writing cached entries.
// Handles freshness checking, atomic writes, and key enumeration for one directory.

use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{info, warn};

use crate::error::{FailmapError, Result};

use super::format::EntryFormat;
use super::freshness::Freshness;
use super::paths::entry_path;

/// Outcome of a freshness-checked read.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Fresh(T),
    /// Entry exists on disk but is older than the window.
    Expired,
    Missing,
}

/// A directory of entries sharing one format and one freshness window.
#[derive(Debug)]
pub struct Store<F> {
    dir: PathBuf,
    freshness: Freshness,
    format: PhantomData<F>,
}

impl<F: EntryFormat> Store<F> {
    pub fn new(dir: impl Into<PathBuf>, freshness: Freshness) -> Self {
        Self {
            dir: dir.into(),
            freshness,
            format: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        entry_path(&self.dir, key, F::EXTENSION)
    }

    /// Read `key` and check it against the freshness window as of `now`.
    /// Expired entries are left on disk untouched.
    pub fn lookup_at(&self, key: &str, now: SystemTime) -> Result<Lookup<F::Value>> {
        let path = self.path(key);
        let Some(contents) = read_if_exists(&path)? else {
            return Ok(Lookup::Missing);
        };

        let decoded = F::decode(contents)?;
        let written_at = match self.freshness {
            Freshness::Stamped(_) => decoded.written_at,
            Freshness::Modified(_) => {
                Some(modified_at(&path).map_err(|e| FailmapError::cache_io(&path, e))?)
            }
        };

        match written_at {
            Some(at) if self.freshness.is_fresh(at, now) => Ok(Lookup::Fresh(decoded.value)),
            _ => Ok(Lookup::Expired),
        }
    }

    pub fn lookup(&self, key: &str) -> Result<Lookup<F::Value>> {
        self.lookup_at(key, SystemTime::now())
    }

    /// Fresh value for `key`, or `None` on a miss, expiry, or read failure.
    /// Read failures are logged and treated as a miss.
    pub fn load(&self, key: &str) -> Option<F::Value> {
        let name = self.file_name(key);
        match self.lookup(key) {
            Ok(Lookup::Fresh(value)) => {
                info!("Using cached data from {}", name);
                Some(value)
            }
            Ok(Lookup::Expired) => {
                info!("Cache has expired for {}, will fetch fresh data", name);
                None
            }
            Ok(Lookup::Missing) => None,
            Err(e) => {
                warn!("Failed to load cache {}: {}", name, e);
                None
            }
        }
    }

    /// Read `key` regardless of age.
    pub fn peek(&self, key: &str) -> Result<Option<F::Value>> {
        match read_if_exists(&self.path(key))? {
            Some(contents) => Ok(Some(F::decode(contents)?.value)),
            None => Ok(None),
        }
    }

    /// Overwrite `key` with `value`, stamped with the current time.
    /// Creates the store directory if it does not exist yet.
    pub fn save(&self, key: &str, value: &F::Value) -> Result<()> {
        let contents = F::encode(value, SystemTime::now())?;
        let path = self.path(key);
        write_atomic(&path, &contents).map_err(|e| FailmapError::cache_io(&path, e))
    }

    /// Save `key`, logging instead of returning a failure.
    /// Returns whether the entry was persisted.
    pub fn store(&self, key: &str, value: &F::Value) -> bool {
        let name = self.file_name(key);
        match self.save(key, value) {
            Ok(()) => {
                info!("Saved data to {}", name);
                true
            }
            Err(e) => {
                warn!("Failed to save cache {}: {}", name, e);
                false
            }
        }
    }

    /// Keys of every entry in the store, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FailmapError::cache_io(&self.dir, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| FailmapError::cache_io(&self.dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(F::EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn file_name(&self, key: &str) -> String {
        self.path(key)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string())
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FailmapError::cache_io(path, e)),
    }
}

/// Get the modification time of a cache file.
pub fn modified_at(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::format::{Json, Text};
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample() -> TestData {
        TestData {
            name: "test".to_string(),
            value: 42,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Json<TestData>> = Store::new(temp_dir.path(), Freshness::Stamped(HOUR));

        store.save("entry", &sample()).unwrap();

        assert_eq!(store.load("entry"), Some(sample()));
        assert_eq!(store.lookup("entry").unwrap(), Lookup::Fresh(sample()));
    }

    #[test]
    fn test_round_trip_arbitrary_json() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Json<serde_json::Value>> =
            Store::new(temp_dir.path(), Freshness::Stamped(HOUR));
        let payload = serde_json::json!({"101": [{"id": 1, "name": "build"}], "nested": [null, true, 1.5]});

        store.save("map", &payload).unwrap();

        assert_eq!(store.load("map"), Some(payload));
    }

    #[test]
    fn test_stamped_entry_expires_after_window() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Json<TestData>> = Store::new(temp_dir.path(), Freshness::Stamped(HOUR));
        let path = store.path("entry");
        fs::write(
            &path,
            r#"{"timestamp": 1000.0, "data": {"name": "old", "value": 1}}"#,
        )
        .unwrap();
        let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1000);

        let at_edge = store.lookup_at("entry", written + HOUR).unwrap();
        assert!(matches!(at_edge, Lookup::Fresh(_)));

        let past = store
            .lookup_at("entry", written + HOUR + Duration::from_millis(1))
            .unwrap();
        assert_eq!(past, Lookup::Expired);

        // Expiry never removes the bytes.
        assert!(path.exists());
    }

    #[test]
    fn test_modified_entry_uses_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Text> = Store::new(temp_dir.path(), Freshness::Modified(HOUR));
        store.save("42", &"log body".to_string()).unwrap();

        let mtime = modified_at(&store.path("42")).unwrap();
        assert_eq!(
            store.lookup_at("42", mtime + HOUR).unwrap(),
            Lookup::Fresh("log body".to_string())
        );
        assert_eq!(
            store.lookup_at("42", mtime + HOUR + Duration::from_secs(1)).unwrap(),
            Lookup::Expired
        );
    }

    #[test]
    fn test_old_mtime_is_expired() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Text> = Store::new(temp_dir.path(), Freshness::Modified(HOUR));
        store.save("7", &"stale".to_string()).unwrap();

        let file = fs::File::options().write(true).open(store.path("7")).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(7200))
            .unwrap();

        assert_eq!(store.load("7"), None);
        assert_eq!(store.peek("7").unwrap(), Some("stale".to_string()));
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("cache");
        let store: Store<Json<TestData>> = Store::new(&dir, Freshness::Stamped(HOUR));

        assert!(!dir.exists());
        assert!(store.store("entry", &sample()));
        assert!(dir.exists());
        assert_eq!(store.load("entry"), Some(sample()));
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Json<Vec<u32>>> = Store::new(temp_dir.path(), Freshness::Stamped(HOUR));

        store.save("list", &vec![1, 2, 3]).unwrap();
        store.save("list", &vec![9]).unwrap();

        assert_eq!(store.load("list"), Some(vec![9]));
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the store directory should be.
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store: Store<Json<TestData>> = Store::new(&blocker, Freshness::Stamped(HOUR));

        assert!(matches!(
            store.save("entry", &sample()),
            Err(FailmapError::CacheIo { .. })
        ));
        assert!(!store.store("entry", &sample()));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Json<TestData>> = Store::new(temp_dir.path(), Freshness::Stamped(HOUR));
        fs::write(store.path("entry"), "{not json").unwrap();

        assert!(store.lookup("entry").is_err());
        assert_eq!(store.load("entry"), None);
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Text> = Store::new(temp_dir.path(), Freshness::Modified(HOUR));

        assert_eq!(store.lookup("nonexistent").unwrap(), Lookup::Missing);
        assert_eq!(store.peek("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_keys_lists_only_entries() {
        let temp_dir = TempDir::new().unwrap();
        let store: Store<Text> = Store::new(temp_dir.path().join("logs"), Freshness::Modified(HOUR));

        assert!(store.keys().unwrap().is_empty());

        store.save("20", &"b".to_string()).unwrap();
        store.save("10", &"a".to_string()).unwrap();
        fs::write(store.dir().join("notes.md"), "ignored").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["10".to_string(), "20".to_string()]);
    }
}
