pub trait ObjectStore {
    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String>;
    fn write_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String>;
}
