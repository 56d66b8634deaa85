// On-disk entry formats.
// JSON payloads are wrapped in a `{timestamp, data}` envelope; logs are raw text.

use std::marker::PhantomData;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Wrapper for cached JSON data with its write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// When the data was cached, in seconds since the Unix epoch.
    pub timestamp: f64,
    /// The cached data.
    pub data: T,
}

impl<T> CachedData<T> {
    pub fn new(data: T, written_at: SystemTime) -> Self {
        Self {
            timestamp: to_epoch_secs(written_at),
            data,
        }
    }

    /// The recorded write time, if the timestamp is representable.
    pub fn written_at(&self) -> Option<SystemTime> {
        let offset = Duration::try_from_secs_f64(self.timestamp).ok()?;
        UNIX_EPOCH.checked_add(offset)
    }
}

/// A decoded entry and the write time it carries, if any.
#[derive(Debug)]
pub struct Decoded<T> {
    pub value: T,
    pub written_at: Option<SystemTime>,
}

/// How a store turns values into file contents and back.
pub trait EntryFormat {
    type Value;

    /// File extension used for entries of this format.
    const EXTENSION: &'static str;

    fn encode(value: &Self::Value, written_at: SystemTime) -> Result<String>;

    fn decode(contents: String) -> Result<Decoded<Self::Value>>;
}

/// JSON payload inside a [`CachedData`] envelope.
#[derive(Debug)]
pub struct Json<T>(PhantomData<T>);

impl<T: Serialize + DeserializeOwned> EntryFormat for Json<T> {
    type Value = T;

    const EXTENSION: &'static str = "json";

    fn encode(value: &T, written_at: SystemTime) -> Result<String> {
        Ok(serde_json::to_string(&CachedData::new(value, written_at))?)
    }

    fn decode(contents: String) -> Result<Decoded<T>> {
        let cached: CachedData<T> = serde_json::from_str(&contents)?;
        let written_at = cached.written_at();
        Ok(Decoded {
            value: cached.data,
            written_at,
        })
    }
}

/// Raw text with no embedded write time (job logs).
#[derive(Debug)]
pub struct Text;

impl EntryFormat for Text {
    type Value = String;

    const EXTENSION: &'static str = "txt";

    fn encode(value: &String, _written_at: SystemTime) -> Result<String> {
        Ok(value.clone())
    }

    fn decode(contents: String) -> Result<Decoded<String>> {
        Ok(Decoded {
            value: contents,
            written_at: None,
        })
    }
}

fn to_epoch_secs(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
