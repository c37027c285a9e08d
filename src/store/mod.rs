pub mod collection;
pub mod disk;
pub mod memory;

use crate::core::portfolio::{Document, PortfolioItem, WatchlistItem};
use crate::core::session::{Session, UserId};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use collection::UserCollection;
use disk::DiskBackend;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryBackend;
use std::{
    any::Any,
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};
use tokio::sync::watch;
use tracing::debug;

/// Raw storage for one collection. Keys are UTF-8 and iterate in byte order.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Writes the whole value, replacing any previous one.
    async fn insert(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Returns whether the key existed.
    async fn remove(&self, key: &str) -> Result<bool>;

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;
}

type SnapshotKey = (&'static str, UserId);

/// Holds the `portfolio` and `watchlist` collections of every user.
///
/// Handles opened for the same user and collection share one snapshot channel, so a
/// subscriber sees writes made through any of them.
pub struct DocumentStore {
    collections: Mutex<HashMap<String, Arc<dyn KeyValueBackend>>>,
    snapshots: Mutex<HashMap<SnapshotKey, Arc<dyn Any + Send + Sync>>>,
    keyspace: Option<Arc<Keyspace>>,
}

impl DocumentStore {
    /// Opens (or creates) an on-disk store under `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let store_dir = path.join("store");
        debug!("Opening document store at {}", store_dir.display());
        let keyspace = fjall::Config::new(store_dir).open()?;

        Ok(Self {
            collections: Mutex::new(HashMap::new()),
            snapshots: Mutex::new(HashMap::new()),
            keyspace: Some(Arc::new(keyspace)),
        })
    }

    /// A store that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            snapshots: Mutex::new(HashMap::new()),
            keyspace: None,
        }
    }

    fn backend(&self, name: &str) -> Result<Arc<dyn KeyValueBackend>> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| anyhow!("Document store lock poisoned"))?;
        if let Some(backend) = collections.get(name) {
            return Ok(Arc::clone(backend));
        }

        let backend: Arc<dyn KeyValueBackend> = match &self.keyspace {
            Some(keyspace) => {
                let partition =
                    keyspace.open_partition(name, PartitionCreateOptions::default())?;
                Arc::new(DiskBackend::new(Arc::clone(keyspace), partition))
            }
            None => Arc::new(MemoryBackend::new()),
        };
        collections.insert(name.to_string(), Arc::clone(&backend));
        Ok(backend)
    }

    fn shared_snapshot<T: Document>(
        &self,
        key: SnapshotKey,
        opened: Option<Arc<watch::Sender<Vec<T>>>>,
    ) -> Result<Option<Arc<watch::Sender<Vec<T>>>>> {
        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|_| anyhow!("Document store lock poisoned"))?;
        let shared = if let Some(shared) = snapshots.get(&key) {
            Arc::clone(shared)
        } else if let Some(opened) = opened {
            let shared: Arc<dyn Any + Send + Sync> = opened;
            snapshots.insert(key, Arc::clone(&shared));
            shared
        } else {
            return Ok(None);
        };
        shared
            .downcast::<watch::Sender<Vec<T>>>()
            .map(Some)
            .map_err(|_| anyhow!("Snapshot type mismatch for {}", T::COLLECTION))
    }

    pub async fn collection<T: Document>(&self, user: &UserId) -> Result<UserCollection<T>> {
        let backend = self.backend(T::COLLECTION)?;
        let key = (T::COLLECTION, user.clone());

        if let Some(snapshot) = self.shared_snapshot::<T>(key.clone(), None)? {
            return Ok(UserCollection::with_snapshot(backend, user, snapshot));
        }

        let opened = UserCollection::<T>::open(Arc::clone(&backend), user).await?;
        // Another handle may have been opened while this one was loading; keep the first.
        let snapshot = self
            .shared_snapshot(key, Some(opened.snapshot_handle()))?
            .ok_or_else(|| anyhow!("Missing snapshot for {}", T::COLLECTION))?;
        Ok(UserCollection::with_snapshot(backend, user, snapshot))
    }

    pub async fn user_store(&self, user: &UserId) -> Result<UserStore> {
        Ok(UserStore {
            user: user.clone(),
            portfolio: self.collection(user).await?,
            watchlist: self.collection(user).await?,
        })
    }

    /// The signed-in user's collections, or `None` when signed out.
    pub async fn for_session(&self, session: &Session) -> Result<Option<UserStore>> {
        match session.current_user() {
            Some(user) => Ok(Some(self.user_store(&user).await?)),
            None => Ok(None),
        }
    }
}

/// The collections owned by one account.
pub struct UserStore {
    pub user: UserId,
    pub portfolio: UserCollection<PortfolioItem>,
    pub watchlist: UserCollection<WatchlistItem>,
}
