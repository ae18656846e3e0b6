use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SUCCESS_STATUS_CODE: u16 = 200;
pub const FAILURE_STATUS_CODE: u16 = 500;
pub const SUCCESS_BODY: &str = "Files processed successfully";
pub const FAILURE_BODY_PREFIX: &str = "Error processing files";
pub const SUCCESS_SUBJECT_PREFIX: &str = "File Processed";
pub const ERROR_SUBJECT: &str = "File Processing Error";
/// SNS rejects subjects longer than this.
pub const MAX_SUBJECT_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// One object-creation sub-event, ready to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingTask {
    pub bucket: String,
    pub key: String,
}

impl ProcessingTask {
    pub fn source(&self) -> ObjectLocation {
        ObjectLocation::new(self.bucket.clone(), self.key.clone())
    }
}

/// Transformed payload waiting to be written to the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedArtifact {
    pub destination_key: String,
    pub body: Vec<u8>,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedArtifact {
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeNotification {
    Success {
        original_file: ObjectLocation,
        processed_file: ObjectLocation,
        processed_at: String,
        file_size: usize,
    },
    Error {
        error: String,
        processed_at: String,
    },
}

impl OutcomeNotification {
    pub fn success(
        original_file: ObjectLocation,
        processed_file: ObjectLocation,
        artifact: &ProcessedArtifact,
    ) -> Self {
        Self::Success {
            original_file,
            processed_file,
            processed_at: format_timestamp(artifact.processed_at),
            file_size: artifact.size(),
        }
    }

    pub fn error(description: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::Error {
            error: description.into(),
            processed_at: format_timestamp(at),
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Self::Success { original_file, .. } => sanitize_subject(&format!(
                "{SUCCESS_SUBJECT_PREFIX}: {}",
                original_file.key
            )),
            Self::Error { .. } => ERROR_SUBJECT.to_string(),
        }
    }

    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|error| {
            serde_json::json!({
                "status": "error",
                "error": format!("failed to encode notification: {error}"),
            })
        })
    }
}

/// Value handed back to the invoking platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResult {
    pub fn success() -> Self {
        Self {
            status_code: SUCCESS_STATUS_CODE,
            body: json_string(SUCCESS_BODY),
        }
    }

    pub fn failure(description: &str) -> Self {
        Self {
            status_code: FAILURE_STATUS_CODE,
            body: json_string(&format!("{FAILURE_BODY_PREFIX}: {description}")),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == SUCCESS_STATUS_CODE
    }
}

/// RFC 3339 with microseconds, always UTC.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Replaces anything outside printable ASCII with `?` and clips to the SNS
/// subject limit.
pub fn sanitize_subject(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .take(MAX_SUBJECT_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn json_string(message: &str) -> String {
    Value::String(message.to_string()).to_string()
}
