use thiserror::Error;

/// Structural failure while unwrapping a batch. Aborts the whole batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("batch event must include a Records array")]
    MissingRecords,

    #[error("queue record {index} body must be a string")]
    MissingBody { index: usize },

    #[error("queue record {index} body is not a valid queue envelope: {reason}")]
    QueueEnvelope { index: usize, reason: String },

    #[error("queue record {index} carries a malformed notification message: {reason}")]
    Notification { index: usize, reason: String },
}

/// Fatal failures caught at the batch boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("failed to fetch secret {secret_id}: {message}")]
    SecretAccess { secret_id: String, message: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to retrieve {bucket}/{key}: {message}")]
    Retrieval {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("failed to transform {key}: {message}")]
    Transform { key: String, message: String },

    #[error("failed to store {bucket}/{key}: {message}")]
    Storage {
        bucket: String,
        key: String,
        message: String,
    },
}

impl PipelineError {
    /// Stable short code used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SecretAccess { .. } => "secret_access",
            Self::Decode(_) => "decode",
            Self::Retrieval { .. } => "retrieval",
            Self::Transform { .. } => "transform",
            Self::Storage { .. } => "storage",
        }
    }
}

/// Publishing an outcome notification failed. Logged, never escalated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to publish notification to {channel}: {message}")]
pub struct NotificationError {
    pub channel: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_error_keeps_store_message() {
        let error = PipelineError::Retrieval {
            bucket: "in".to_string(),
            key: "report.txt".to_string(),
            message: "NotFound: no such key".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "failed to retrieve in/report.txt: NotFound: no such key"
        );
        assert_eq!(error.kind(), "retrieval");
    }

    #[test]
    fn decode_error_is_transparent_inside_pipeline_error() {
        let error = PipelineError::from(DecodeError::MissingBody { index: 3 });
        assert_eq!(error.to_string(), "queue record 3 body must be a string");
        assert_eq!(error.kind(), "decode");
    }
}
