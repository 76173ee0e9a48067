//! Cache blobs: a finished registry plus the options that produced it.

use crate::options::SessionOptions;
use cheader_registry::Registry;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tracing::debug;

/// Current cache format. Blobs written by older formats are rejected.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheBlob {
    pub version: u32,
    pub options: SessionOptions,
    /// Seconds since the Unix epoch at which the blob was written
    pub created_at: u64,
    pub registry: Registry,
}

impl CacheBlob {
    pub fn new(options: SessionOptions, registry: Registry) -> Self {
        Self {
            version: CACHE_VERSION,
            options,
            created_at: unix_secs(SystemTime::now()),
            registry,
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn is_supported(&self) -> bool {
        self.version >= CACHE_VERSION
    }

    /// Whether the blob still describes headers last modified at
    /// `newest_source`, extracted with `options`
    pub fn is_valid_for(&self, options: &SessionOptions, newest_source: u64) -> bool {
        if &self.options != options {
            debug!("cache options differ");
            return false;
        }
        if self.created_at < newest_source {
            debug!(created_at = self.created_at, newest_source, "cache is stale");
            return false;
        }
        true
    }
}

pub(crate) fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_rules() {
        let options = SessionOptions {
            files: vec!["a.h".into()],
            ..Default::default()
        };
        let mut blob = CacheBlob::new(options.clone(), Registry::new());
        blob.created_at = 100;

        assert!(blob.is_supported());
        assert!(blob.is_valid_for(&options, 100));
        assert!(!blob.is_valid_for(&options, 101));
        assert!(!blob.is_valid_for(&SessionOptions::default(), 0));

        blob.version = 0;
        assert!(!blob.is_supported());
    }

    #[test]
    fn test_json_round_trip() {
        let blob = CacheBlob::new(SessionOptions::default(), Registry::new());
        let restored = CacheBlob::from_json(&blob.to_json().unwrap()).unwrap();
        assert_eq!(restored, blob);
    }
}
