use super::store::KeyValueStore;

use anyhow::Result;
use async_trait::async_trait;

/// Key-value access as seen by load generators: a local store or a remote one.
#[async_trait]
pub trait Cache: Send + Sync {
    fn name(&self) -> &str;

    async fn put(&self, key: i64, value: i64) -> Result<()>;

    /// `Ok(None)` is a normal miss, not an error.
    async fn get(&self, key: i64) -> Result<Option<i64>>;
}

#[async_trait]
impl Cache for KeyValueStore {
    fn name(&self) -> &str {
        KeyValueStore::name(self)
    }

    async fn put(&self, key: i64, value: i64) -> Result<()> {
        KeyValueStore::put(self, key, value);
        Ok(())
    }

    async fn get(&self, key: i64) -> Result<Option<i64>> {
        Ok(KeyValueStore::get(self, key))
    }
}
