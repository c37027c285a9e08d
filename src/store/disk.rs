use super::KeyValueBackend;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use std::sync::Arc;
use tracing::debug;

/// A fjall partition. Every write is synced before it is acknowledged.
pub struct DiskBackend {
    keyspace: Arc<Keyspace>,
    partition: PartitionHandle,
}

impl DiskBackend {
    pub fn new(keyspace: Arc<Keyspace>, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }
}

#[async_trait]
impl KeyValueBackend for DiskBackend {
    async fn insert(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.partition.insert(key.as_bytes(), value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store PUT for key: {:?}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let existed = self.partition.contains_key(key.as_bytes())?;
        if existed {
            self.partition.remove(key.as_bytes())?;
            self.keyspace.persist(PersistMode::SyncAll)?;
        }
        debug!("Store REMOVE for key: {:?} (existed: {})", key, existed);
        Ok(existed)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.partition
            .prefix(prefix.as_bytes())
            .map(|entry| -> Result<(String, Vec<u8>)> {
                let (key, value) = entry?;
                Ok((String::from_utf8(key.to_vec())?, value.to_vec()))
            })
            .collect()
    }
}
