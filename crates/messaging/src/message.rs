use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message headers (trace propagation and the like).
pub type Headers = HashMap<String, String>;

/// A record stored in the message log.
///
/// `(topic, partition, offset)` identifies a message; offsets are strictly
/// increasing within a partition and start at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: String,
    pub payload: Vec<u8>,
    pub headers: Headers,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Returns a header value, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Deserializes the JSON payload.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.payload)
    }
}

/// Maps a key to a partition.
///
/// Uses 64-bit FNV-1a so the mapping is stable across processes and releases,
/// which `std`'s randomly seeded hasher is not.
pub fn partition_for(key: &str, partitions: u32) -> i32 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = key.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    });
    // partitions is clamped to >= 1 and < 2^31 so the result fits in i32
    (hash % u64::from(partitions.clamp(1, i32::MAX as u32))) as i32
}
