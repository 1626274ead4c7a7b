//! Session options

use crate::statement::{DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE};
use crate::Result;
use serde::Deserialize;
use std::time::Duration;

/// Tunables for a [`Session`](crate::Session).
///
/// Every field is optional when deserializing:
///
/// ```
/// use rowmap_core::Options;
///
/// let options = Options::from_json(r#"{ "batch_size": 50, "command_timeout_ms": 2000 }"#).unwrap();
/// assert_eq!(options.batch_size, 50);
/// assert_eq!(options.default_page_size, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Entities per batch round trip
    pub batch_size: usize,
    /// Page size used when a caller asks for zero or fewer rows per page
    pub default_page_size: u64,
    /// Forwarded to every gateway call
    pub command_timeout_ms: Option<u64>,
    /// Run multi-chunk batches inside their own transaction when none is open
    pub atomic_batches: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
            command_timeout_ms: None,
            atomic_batches: false,
        }
    }
}

impl Options {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Options = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self.normalized()
    }

    pub fn default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size;
        self.normalized()
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn atomic_batches(mut self, atomic: bool) -> Self {
        self.atomic_batches = atomic;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    fn normalized(mut self) -> Self {
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.default_page_size == 0 {
            self.default_page_size = DEFAULT_PAGE_SIZE;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.batch_size, 100);
        assert_eq!(options.default_page_size, 20);
        assert_eq!(options.timeout(), None);
        assert!(!options.atomic_batches);
    }

    #[test]
    fn test_from_json() {
        let options = Options::from_json(r#"{"atomic_batches": true, "command_timeout_ms": 1500}"#).unwrap();
        assert!(options.atomic_batches);
        assert_eq!(options.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(options.batch_size, 100);
    }

    #[test]
    fn test_zero_sizes_fall_back() {
        let options = Options::from_json(r#"{"batch_size": 0, "default_page_size": 0}"#).unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(Options::default().batch_size(0).batch_size, 100);
    }

    #[test]
    fn test_invalid_document() {
        let err = Options::from_json(r#"{"batch_size": "many"}"#).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_builder() {
        let options = Options::default()
            .batch_size(10)
            .command_timeout(Duration::from_secs(3))
            .atomic_batches(true);
        assert_eq!(options.batch_size, 10);
        assert_eq!(options.command_timeout_ms, Some(3000));
        assert!(options.atomic_batches);
    }
}
