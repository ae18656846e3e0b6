use serde_json::Value;

pub trait Notifier {
    /// Publishes `message` to `channel`. The document is sent as compact JSON.
    fn publish(&self, channel: &str, subject: &str, message: &Value) -> Result<(), String>;
}
