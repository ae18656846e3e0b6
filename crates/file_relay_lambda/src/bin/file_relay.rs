use std::future::Future;
use std::sync::Arc;

use aws_sdk_s3::primitives::ByteStream;
use file_relay_lambda::adapters::notifier::Notifier;
use file_relay_lambda::adapters::object_store::ObjectStore;
use file_relay_lambda::adapters::secrets::SecretSource;
use file_relay_lambda::config::ProcessorConfig;
use file_relay_lambda::handlers::batch::{
    handle_batch_event, into_lambda_response, BatchCollaborators,
};
use file_relay_lambda::logging;
use file_relay_lambda::runtime::clock::SystemClock;
use file_relay_lambda::runtime::contract::InvocationResult;
use file_relay_lambda::runtime::transform::ReportTransformer;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;

struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        block_on(async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(object_key)
                .send()
                .await
                .map_err(|error| {
                    format!(
                        "failed to read object from s3: {}",
                        aws_sdk_s3::error::DisplayErrorContext(&error)
                    )
                })?;
            let body = output
                .body
                .collect()
                .await
                .map_err(|error| format!("failed to read object body from s3: {error}"))?;
            Ok(body.into_bytes().to_vec())
        })
    }

    fn write_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        block_on(async move {
            client
                .put_object()
                .bucket(bucket)
                .key(object_key)
                .body(ByteStream::from(body_bytes))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!(
                        "failed to write object to s3: {}",
                        aws_sdk_s3::error::DisplayErrorContext(&error)
                    )
                })
        })
    }
}

struct SnsNotifier {
    sns_client: aws_sdk_sns::Client,
}

impl Notifier for SnsNotifier {
    fn publish(&self, channel: &str, subject: &str, message: &Value) -> Result<(), String> {
        let topic_arn = channel.to_string();
        let subject = subject.to_string();
        let message = message.to_string();
        let client = self.sns_client.clone();

        block_on(async move {
            client
                .publish()
                .topic_arn(topic_arn)
                .subject(subject)
                .message(message)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!(
                        "failed to publish to sns: {}",
                        aws_sdk_sns::error::DisplayErrorContext(&error)
                    )
                })
        })
    }
}

struct SecretsManagerSource {
    secrets_client: aws_sdk_secretsmanager::Client,
}

impl SecretSource for SecretsManagerSource {
    fn fetch_secret(&self, secret_id: &str) -> Result<String, String> {
        let secret_id = secret_id.to_string();
        let client = self.secrets_client.clone();

        block_on(async move {
            let output = client
                .get_secret_value()
                .secret_id(secret_id)
                .send()
                .await
                .map_err(|error| {
                    format!(
                        "failed to read secret: {}",
                        aws_sdk_secretsmanager::error::DisplayErrorContext(&error)
                    )
                })?;
            output
                .secret_string()
                .map(str::to_string)
                .ok_or_else(|| "secret has no string value".to_string())
        })
    }
}

/// Collaborator calls are blocking by contract; the SDK is async.
fn block_on<T>(future: impl Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Built once per process and shared by every invocation.
struct RuntimeDependencies {
    config: ProcessorConfig,
    object_store: S3ObjectStore,
    notifier: SnsNotifier,
    secrets: SecretsManagerSource,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<InvocationResult, Error> {
    info!(request_id = %event.context.request_id, "invocation started");

    let collaborators = BatchCollaborators {
        object_store: &deps.object_store,
        notifier: &deps.notifier,
        secrets: Some(&deps.secrets as &dyn SecretSource),
        transformer: &ReportTransformer,
        clock: &SystemClock,
    };
    let outcome = handle_batch_event(&event.payload, &deps.config.batch, &collaborators);

    into_lambda_response(outcome.result, deps.config.redeliver_on_failure).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();

    let config = ProcessorConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    config.log_redacted();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = Arc::new(RuntimeDependencies {
        config,
        object_store: S3ObjectStore {
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        notifier: SnsNotifier {
            sns_client: aws_sdk_sns::Client::new(&aws_config),
        },
        secrets: SecretsManagerSource {
            secrets_client: aws_sdk_secretsmanager::Client::new(&aws_config),
        },
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let deps = Arc::clone(&deps);
        async move { handle_request(event, &deps).await }
    }))
    .await
}
