//! Scan fingerprinting — deterministic identification of variants and datasets.
//!
//! - `ConfigHash`: exact identity of a strategy variant (every parameter value).
//! - `DatasetHash`: identity of the bars a scan ran over.
//!
//! Both are BLAKE3 hex digests, stable across builds and platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Series;

/// BLAKE3 digest of a canonical variant serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for log lines and file names.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BLAKE3 digest over every bar of every series, in the order given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// Hash a universe. Callers pass series in a stable order (by symbol).
    pub fn of_series<'a>(series: impl IntoIterator<Item = &'a Series>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for s in series {
            hasher.update(s.symbol().as_bytes());
            hasher.update(&[0]);
            for bar in s.bars() {
                hasher.update(bar.date.to_string().as_bytes());
                for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                    hasher.update(&value.to_le_bytes());
                }
            }
            hasher.update(&[0xff]);
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
