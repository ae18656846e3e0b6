//! Unwraps queue records into processing tasks.
//!
//! A batch is `{"Records": [...]}`. Each record's `body` is a queue envelope
//! whose `Message` is a notification envelope whose `Records` list holds the
//! object-creation events. Every level has its own type and parser so a
//! change to one upstream format stays contained.

use serde::Deserialize;
use serde_json::Value;

use crate::contract::ProcessingTask;
use crate::error::DecodeError;

/// Outer level: the body of one queue record.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QueueEnvelope {
    #[serde(rename = "Message")]
    pub message: String,
}

/// Inner level: the pub/sub notification payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NotificationEnvelope {
    #[serde(rename = "Records")]
    pub records: Vec<ObjectCreatedRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ObjectCreatedRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Object {
    pub key: String,
}

impl From<ObjectCreatedRecord> for ProcessingTask {
    fn from(record: ObjectCreatedRecord) -> Self {
        Self {
            bucket: record.s3.bucket.name,
            key: record.s3.object.key,
        }
    }
}

pub fn parse_queue_envelope(index: usize, body: &str) -> Result<QueueEnvelope, DecodeError> {
    serde_json::from_str(body).map_err(|error| DecodeError::QueueEnvelope {
        index,
        reason: error.to_string(),
    })
}

pub fn parse_notification(
    index: usize,
    message: &str,
) -> Result<NotificationEnvelope, DecodeError> {
    serde_json::from_str(message).map_err(|error| DecodeError::Notification {
        index,
        reason: error.to_string(),
    })
}

/// Decodes a single queue record into its tasks, in sub-event order.
pub fn decode_record(index: usize, record: &Value) -> Result<Vec<ProcessingTask>, DecodeError> {
    let body = record
        .get("body")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingBody { index })?;
    let envelope = parse_queue_envelope(index, body)?;
    let notification = parse_notification(index, &envelope.message)?;

    Ok(notification
        .records
        .into_iter()
        .map(ProcessingTask::from)
        .collect())
}

/// Starts decoding a batch. Only the top-level `Records` array is checked
/// here; each record is unwrapped as the stream advances.
pub fn decode_batch(event: &Value) -> Result<TaskStream<'_>, DecodeError> {
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or(DecodeError::MissingRecords)?;

    Ok(TaskStream {
        records: records.iter().enumerate(),
        pending: Vec::new().into_iter(),
        failed: false,
    })
}

/// Lazy task sequence over one batch. Yields at most one `Err`, after which
/// it is exhausted.
#[derive(Debug)]
pub struct TaskStream<'a> {
    records: std::iter::Enumerate<std::slice::Iter<'a, Value>>,
    pending: std::vec::IntoIter<ProcessingTask>,
    failed: bool,
}

impl Iterator for TaskStream<'_> {
    type Item = Result<ProcessingTask, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if let Some(task) = self.pending.next() {
                return Some(Ok(task));
            }

            let (index, record) = self.records.next()?;
            match decode_record(index, record) {
                Ok(tasks) => self.pending = tasks.into_iter(),
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for TaskStream<'_> {}
