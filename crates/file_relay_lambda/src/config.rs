use std::env;

use thiserror::Error;
use tracing::info;

use crate::handlers::batch::BatchHandlerConfig;
use crate::runtime::storage_keys::NamingPolicy;

/// Each setting is read from the first name that is set; later names are
/// accepted for deployments that still use the older variable names.
const OUTPUT_CONTAINER: &[&str] = &["OUTPUT_CONTAINER", "OUTPUT_BUCKET"];
const NOTIFICATION_CHANNEL: &[&str] = &["NOTIFICATION_CHANNEL", "SNS_TOPIC_ARN"];
const SECRET_IDENTIFIER: &[&str] = &["SECRET_IDENTIFIER", "SECRET_ARN"];
const DESTINATION_NAMING: &[&str] = &["DESTINATION_NAMING"];
const REDELIVER_ON_FAILURE: &[&str] = &["REDELIVER_ON_FAILURE"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be configured")]
    Missing { name: &'static str },

    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub batch: BatchHandlerConfig,
    /// Surface a failed batch as a runtime error so the queue redelivers it.
    pub redeliver_on_failure: bool,
}

impl ProcessorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let output_bucket = read(OUTPUT_CONTAINER).ok_or(ConfigError::Missing {
            name: OUTPUT_CONTAINER[0],
        })?;
        let notification_channel = read(NOTIFICATION_CHANNEL).ok_or(ConfigError::Missing {
            name: NOTIFICATION_CHANNEL[0],
        })?;
        let secret_id = read(SECRET_IDENTIFIER);

        let naming = match read(DESTINATION_NAMING) {
            Some(value) => value
                .parse::<NamingPolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    name: DESTINATION_NAMING[0],
                    value,
                    reason,
                })?,
            None => NamingPolicy::default(),
        };

        let redeliver_on_failure = match read(REDELIVER_ON_FAILURE) {
            Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::Invalid {
                name: REDELIVER_ON_FAILURE[0],
                value,
                reason: "expected true or false".to_string(),
            })?,
            None => false,
        };

        Ok(Self {
            batch: BatchHandlerConfig {
                output_bucket,
                notification_channel,
                secret_id,
                naming,
            },
            redeliver_on_failure,
        })
    }

    /// Logs the effective configuration without the secret identifier.
    pub fn log_redacted(&self) {
        info!(
            output_bucket = %self.batch.output_bucket,
            notification_channel = %self.batch.notification_channel,
            secret_configured = self.batch.secret_id.is_some(),
            naming = self.batch.naming.as_str(),
            redeliver_on_failure = self.redeliver_on_failure,
            "processor configured"
        );
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
