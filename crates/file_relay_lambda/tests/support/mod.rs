#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use file_relay_lambda::adapters::notifier::Notifier;
use file_relay_lambda::adapters::object_store::ObjectStore;
use file_relay_lambda::handlers::batch::BatchHandlerConfig;
use file_relay_lambda::runtime::clock::Clock;
use file_relay_lambda::runtime::storage_keys::NamingPolicy;
use serde_json::{json, Value};

/// In-memory object store that records every call in order.
pub struct RecordingStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<String>>,
    failing_reads: HashMap<String, String>,
    failing_writes: HashSet<String>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            failing_reads: HashMap::new(),
            failing_writes: HashSet::new(),
        }
    }

    pub fn seed_object(&self, bucket: &str, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
    }

    /// Reads of `key` fail with `message`.
    pub fn fail_read(mut self, key: &str, message: &str) -> Self {
        self.failing_reads
            .insert(key.to_string(), message.to_string());
        self
    }

    /// Writes whose destination key ends with `suffix` fail.
    pub fn fail_write(mut self, suffix: &str) -> Self {
        self.failing_writes.insert(suffix.to_string());
        self
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().expect("poisoned mutex").clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().expect("poisoned mutex").clone()
    }

    pub fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys_in(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .filter(|(owner, _)| owner == bucket)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl ObjectStore for RecordingStore {
    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        self.reads
            .lock()
            .expect("poisoned mutex")
            .push(format!("{bucket}/{key}"));

        if let Some(message) = self.failing_reads.get(key) {
            return Err(message.clone());
        }
        self.body(bucket, key)
            .ok_or_else(|| format!("NoSuchKey: {bucket}/{key}"))
    }

    fn write_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        if self
            .failing_writes
            .iter()
            .any(|suffix| key.ends_with(suffix.as_str()))
        {
            return Err(format!("simulated write failure for key: {key}"));
        }

        self.writes
            .lock()
            .expect("poisoned mutex")
            .push(format!("{bucket}/{key}"));
        self.seed_object(bucket, key, body);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub channel: String,
    pub subject: String,
    pub message: Value,
}

pub struct RecordingNotifier {
    published: Mutex<Vec<PublishedMessage>>,
    fail_all: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_all: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_all: true,
        }
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().expect("poisoned mutex").clone()
    }

    pub fn with_status(&self, status: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|published| published.message["status"] == status)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, channel: &str, subject: &str, message: &Value) -> Result<(), String> {
        self.published
            .lock()
            .expect("poisoned mutex")
            .push(PublishedMessage {
                channel: channel.to_string(),
                subject: subject.to_string(),
                message: message.clone(),
            });
        if self.fail_all {
            return Err("simulated publish failure".to_string());
        }
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 5).unwrap())
}

pub const PROCESSED_TS: &str = "20260214_093005";

pub fn batch_config(naming: NamingPolicy) -> BatchHandlerConfig {
    BatchHandlerConfig {
        output_bucket: "out".to_string(),
        notification_channel: "arn:aws:sns:eu-west-1:123456789012:file-events".to_string(),
        secret_id: None,
        naming,
    }
}

/// One queue record carrying an SNS-wrapped S3 notification for `objects`.
pub fn queue_record(objects: &[(&str, &str)]) -> Value {
    let s3_records: Vec<Value> = objects
        .iter()
        .map(|(bucket, key)| {
            json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": bucket, "arn": format!("arn:aws:s3:::{bucket}")},
                    "object": {"key": key, "size": 5}
                }
            })
        })
        .collect();

    let sns_envelope = json!({
        "Type": "Notification",
        "TopicArn": "arn:aws:sns:eu-west-1:123456789012:uploads",
        "Subject": "Amazon S3 Notification",
        "Message": json!({ "Records": s3_records }).to_string(),
    });

    json!({
        "messageId": "2e1424d4-f796-459a-8184-9c92662be6da",
        "eventSource": "aws:sqs",
        "body": sns_envelope.to_string(),
    })
}

pub fn batch_event(records: Vec<Value>) -> Value {
    json!({ "Records": records })
}
