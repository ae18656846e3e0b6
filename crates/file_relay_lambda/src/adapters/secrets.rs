pub trait SecretSource {
    fn fetch_secret(&self, secret_id: &str) -> Result<String, String>;
}
