use std::str::FromStr;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

pub const PROCESSED_PREFIX: &str = "processed_";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_CHARS: usize = 15;
const CONTENT_HASH_CHARS: usize = 16;

/// How destination keys are derived from the source object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `processed_<YYYYMMDD_HHMMSS>_<key>`. A redelivered object lands under
    /// a new key unless it is reprocessed within the same second.
    #[default]
    Timestamped,
    /// `processed_<sha256 prefix>_<key>`. Reprocessing the same bytes
    /// overwrites the earlier artifact.
    ContentHash,
}

impl NamingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timestamped => "timestamped",
            Self::ContentHash => "content_hash",
        }
    }

    /// Length of everything in front of the original key.
    pub fn prefix_len(self) -> usize {
        let marker = match self {
            Self::Timestamped => TIMESTAMP_CHARS,
            Self::ContentHash => CONTENT_HASH_CHARS,
        };
        PROCESSED_PREFIX.len() + marker + 1
    }

    /// True when `marker` has the exact shape this policy writes between the
    /// prefix and the original key.
    fn is_marker(self, marker: &str) -> bool {
        let bytes = marker.as_bytes();
        match self {
            Self::Timestamped => {
                bytes.len() == TIMESTAMP_CHARS
                    && bytes.iter().enumerate().all(|(index, byte)| {
                        if index == 8 {
                            *byte == b'_'
                        } else {
                            byte.is_ascii_digit()
                        }
                    })
            }
            Self::ContentHash => {
                bytes.len() == CONTENT_HASH_CHARS
                    && bytes
                        .iter()
                        .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(byte))
            }
        }
    }
}

impl FromStr for NamingPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "timestamped" => Ok(Self::Timestamped),
            "content_hash" => Ok(Self::ContentHash),
            other => Err(format!(
                "unknown naming policy '{other}', expected 'timestamped' or 'content_hash'"
            )),
        }
    }
}

pub fn timestamped_object_key(original_key: &str, processed_at: DateTime<Utc>) -> String {
    format!(
        "{PROCESSED_PREFIX}{}_{original_key}",
        processed_at.format(TIMESTAMP_FORMAT)
    )
}

pub fn content_hash_object_key(bucket: &str, original_key: &str, content: &[u8]) -> String {
    let fingerprint = content_fingerprint(bucket, original_key, content);
    format!(
        "{PROCESSED_PREFIX}{}_{original_key}",
        &fingerprint[..CONTENT_HASH_CHARS]
    )
}

pub fn destination_object_key(
    policy: NamingPolicy,
    bucket: &str,
    original_key: &str,
    content: &[u8],
    processed_at: DateTime<Utc>,
) -> String {
    match policy {
        NamingPolicy::Timestamped => timestamped_object_key(original_key, processed_at),
        NamingPolicy::ContentHash => content_hash_object_key(bucket, original_key, content),
    }
}

/// Recovers the source key from a destination key built under `policy`.
pub fn original_key(destination_key: &str, policy: NamingPolicy) -> Option<&str> {
    if !destination_key.starts_with(PROCESSED_PREFIX) {
        return None;
    }
    let prefix_len = policy.prefix_len();
    let marker = destination_key.get(PROCESSED_PREFIX.len()..prefix_len - 1)?;
    let separated = destination_key.as_bytes().get(prefix_len - 1) == Some(&b'_');
    if !separated || !policy.is_marker(marker) {
        return None;
    }
    destination_key.get(prefix_len..)
}

fn content_fingerprint(bucket: &str, key: &str, content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bucket.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    hasher.update([0u8]);
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
