use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::secrets::SecretSource;
use crate::runtime::clock::Clock;
use crate::runtime::contract::{
    InvocationResult, ObjectLocation, OutcomeNotification, ProcessedArtifact, ProcessingTask,
};
use crate::runtime::envelope::decode_batch;
use crate::runtime::error::{NotificationError, PipelineError};
use crate::runtime::storage_keys::{destination_object_key, NamingPolicy};
use crate::runtime::transform::{TransformInput, Transformer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHandlerConfig {
    pub output_bucket: String,
    pub notification_channel: String,
    pub secret_id: Option<String>,
    pub naming: NamingPolicy,
}

/// Collaborators for one invocation. The handles may outlive the call; the
/// handler never keeps state in them.
#[derive(Clone, Copy)]
pub struct BatchCollaborators<'a> {
    pub object_store: &'a dyn ObjectStore,
    pub notifier: &'a dyn Notifier,
    pub secrets: Option<&'a dyn SecretSource>,
    pub transformer: &'a dyn Transformer,
    pub clock: &'a dyn Clock,
}

/// Lifecycle of a single invocation. `Failed` and `SuccessReported` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Idle,
    Decoding,
    DecodeFailed,
    Processing,
    TaskFailed,
    AllTasksDone,
    ErrorNotified,
    Failed,
    SuccessReported,
}

impl InvocationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::SuccessReported)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub result: InvocationResult,
    /// Every state the invocation passed through, starting at `Idle`.
    pub states: Vec<InvocationState>,
    /// Artifacts written before the batch finished or failed.
    pub stored: Vec<ObjectLocation>,
    pub error: Option<PipelineError>,
}

impl BatchOutcome {
    pub fn final_state(&self) -> InvocationState {
        self.states
            .last()
            .copied()
            .unwrap_or(InvocationState::Idle)
    }
}

struct StateTrace {
    states: Vec<InvocationState>,
}

impl StateTrace {
    fn new() -> Self {
        Self {
            states: vec![InvocationState::Idle],
        }
    }

    fn enter(&mut self, next: InvocationState) {
        if let Some(previous) = self.states.last() {
            debug!(from = ?previous, to = ?next, "invocation state changed");
        }
        self.states.push(next);
    }
}

/// Processes one queue batch end to end.
///
/// Tasks run one at a time in decode order. The first fatal error stops the
/// batch, publishes a single error notification (best effort), and yields a
/// 500 result. Artifacts already written stay in place.
pub fn handle_batch_event(
    event: &Value,
    config: &BatchHandlerConfig,
    collaborators: &BatchCollaborators<'_>,
) -> BatchOutcome {
    let started_at = Instant::now();
    let mut trace = StateTrace::new();
    let mut stored = Vec::new();

    match run_batch(event, config, collaborators, &mut trace, &mut stored) {
        Ok(()) => {
            trace.enter(InvocationState::SuccessReported);
            info!(
                tasks = stored.len(),
                duration_ms = started_at.elapsed().as_millis() as u64,
                "batch completed"
            );
            BatchOutcome {
                result: InvocationResult::success(),
                states: trace.states,
                stored,
                error: None,
            }
        }
        Err(pipeline_error) => {
            error!(
                kind = pipeline_error.kind(),
                error = %pipeline_error,
                tasks_completed = stored.len(),
                duration_ms = started_at.elapsed().as_millis() as u64,
                "batch failed"
            );

            let description = pipeline_error.to_string();
            let notification =
                OutcomeNotification::error(&description, collaborators.clock.now());
            match publish(config, collaborators.notifier, &notification) {
                Ok(()) => trace.enter(InvocationState::ErrorNotified),
                Err(publish_error) => {
                    error!(error = %publish_error, "failed to publish error notification");
                }
            }
            trace.enter(InvocationState::Failed);

            BatchOutcome {
                result: InvocationResult::failure(&description),
                states: trace.states,
                stored,
                error: Some(pipeline_error),
            }
        }
    }
}

/// Maps a batch result onto the Lambda response. With `redeliver` set, a
/// failed batch becomes a runtime error carrying the failure body so the
/// queue hands the messages back; otherwise the result is returned as is.
pub fn into_lambda_response(
    result: InvocationResult,
    redeliver: bool,
) -> Result<InvocationResult, String> {
    if redeliver && !result.is_success() {
        warn!(status_code = result.status_code, "returning failure for redelivery");
        return Err(result.body);
    }
    Ok(result)
}

fn run_batch(
    event: &Value,
    config: &BatchHandlerConfig,
    collaborators: &BatchCollaborators<'_>,
    trace: &mut StateTrace,
    stored: &mut Vec<ObjectLocation>,
) -> Result<(), PipelineError> {
    let credential = fetch_credential(config, collaborators)?;

    trace.enter(InvocationState::Decoding);
    let tasks = match decode_batch(event).and_then(|stream| stream.collect::<Result<Vec<_>, _>>())
    {
        Ok(tasks) => tasks,
        Err(decode_error) => {
            trace.enter(InvocationState::DecodeFailed);
            return Err(decode_error.into());
        }
    };
    info!(tasks = tasks.len(), "batch decoded");

    trace.enter(InvocationState::Processing);
    for task in &tasks {
        match process_task(task, credential.as_deref(), config, collaborators) {
            Ok(location) => stored.push(location),
            Err(task_error) => {
                trace.enter(InvocationState::TaskFailed);
                return Err(task_error);
            }
        }
    }

    trace.enter(InvocationState::AllTasksDone);
    Ok(())
}

fn fetch_credential(
    config: &BatchHandlerConfig,
    collaborators: &BatchCollaborators<'_>,
) -> Result<Option<String>, PipelineError> {
    let Some(secret_id) = config.secret_id.as_deref() else {
        return Ok(None);
    };

    let Some(secrets) = collaborators.secrets else {
        return Err(PipelineError::SecretAccess {
            secret_id: secret_id.to_string(),
            message: "no secret source is available".to_string(),
        });
    };

    secrets
        .fetch_secret(secret_id)
        .map(Some)
        .map_err(|message| PipelineError::SecretAccess {
            secret_id: secret_id.to_string(),
            message,
        })
}

fn process_task(
    task: &ProcessingTask,
    credential: Option<&str>,
    config: &BatchHandlerConfig,
    collaborators: &BatchCollaborators<'_>,
) -> Result<ObjectLocation, PipelineError> {
    info!(bucket = %task.bucket, key = %task.key, "processing object");

    let content = collaborators
        .object_store
        .read_object(&task.bucket, &task.key)
        .map_err(|message| PipelineError::Retrieval {
            bucket: task.bucket.clone(),
            key: task.key.clone(),
            message,
        })?;

    let processed_at = collaborators.clock.now();
    let body = collaborators
        .transformer
        .transform(&TransformInput {
            content: &content,
            object_key: &task.key,
            credential,
            processed_at,
        })
        .map_err(|message| PipelineError::Transform {
            key: task.key.clone(),
            message,
        })?;

    let artifact = ProcessedArtifact {
        destination_key: destination_object_key(
            config.naming,
            &task.bucket,
            &task.key,
            &content,
            processed_at,
        ),
        body,
        processed_at,
    };

    collaborators
        .object_store
        .write_object(
            &config.output_bucket,
            &artifact.destination_key,
            &artifact.body,
        )
        .map_err(|message| PipelineError::Storage {
            bucket: config.output_bucket.clone(),
            key: artifact.destination_key.clone(),
            message,
        })?;

    let processed_file =
        ObjectLocation::new(config.output_bucket.clone(), artifact.destination_key.clone());
    let notification =
        OutcomeNotification::success(task.source(), processed_file.clone(), &artifact);
    if let Err(publish_error) = publish(config, collaborators.notifier, &notification) {
        warn!(
            key = %task.key,
            error = %publish_error,
            "failed to publish success notification"
        );
    }

    info!(
        source = %task.source(),
        destination = %processed_file,
        size = artifact.size(),
        "object processed"
    );
    Ok(processed_file)
}

fn publish(
    config: &BatchHandlerConfig,
    notifier: &dyn Notifier,
    notification: &OutcomeNotification,
) -> Result<(), NotificationError> {
    notifier
        .publish(
            &config.notification_channel,
            &notification.subject(),
            &notification.to_document(),
        )
        .map_err(|message| NotificationError {
            channel: config.notification_channel.clone(),
            message,
        })
}
