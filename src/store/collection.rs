use super::KeyValueBackend;
use crate::core::portfolio::{Document, ItemId};
use crate::core::session::UserId;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// One user's documents of type `T`.
///
/// Writes replace whole documents and the last writer wins. Subscribers receive the full
/// current set after every change made through this handle.
pub struct UserCollection<T: Document> {
    backend: Arc<dyn KeyValueBackend>,
    prefix: String,
    snapshot: Arc<watch::Sender<Vec<T>>>,
}

impl<T: Document> UserCollection<T> {
    pub async fn open(backend: Arc<dyn KeyValueBackend>, user: &UserId) -> Result<Self> {
        let items = load(backend.as_ref(), &user_prefix(user)).await?;
        let (snapshot, _) = watch::channel(items);
        Ok(Self::with_snapshot(backend, user, Arc::new(snapshot)))
    }

    /// A handle publishing to `snapshot`, which other handles on the same user's
    /// collection may share.
    pub(crate) fn with_snapshot(
        backend: Arc<dyn KeyValueBackend>,
        user: &UserId,
        snapshot: Arc<watch::Sender<Vec<T>>>,
    ) -> Self {
        Self {
            backend,
            prefix: user_prefix(user),
            snapshot,
        }
    }

    pub(crate) fn snapshot_handle(&self) -> Arc<watch::Sender<Vec<T>>> {
        Arc::clone(&self.snapshot)
    }

    fn key(&self, id: &ItemId) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Stores a new document with a fresh id and returns it.
    pub async fn create(&self, draft: T::Draft) -> Result<T> {
        let doc = T::from_draft(ItemId::new(), Utc::now(), draft);
        let bytes = serde_json::to_vec(&doc)?;
        self.backend
            .insert(&self.key(doc.id()), bytes)
            .await
            .with_context(|| format!("Failed to add item to {}", T::COLLECTION))?;
        debug!("Created {} item {}", T::COLLECTION, doc.id());
        self.refresh().await?;
        Ok(doc)
    }

    /// Deletes by id. Returns `false` when no such document exists.
    pub async fn delete(&self, id: &ItemId) -> Result<bool> {
        let existed = self
            .backend
            .remove(&self.key(id))
            .await
            .with_context(|| format!("Failed to delete {id} from {}", T::COLLECTION))?;
        if existed {
            debug!("Deleted {} item {}", T::COLLECTION, id);
            self.refresh().await?;
        }
        Ok(existed)
    }

    /// Reads the current set from storage, oldest first.
    pub async fn list(&self) -> Result<Vec<T>> {
        load(self.backend.as_ref(), &self.prefix).await
    }

    /// The last published set.
    pub fn current(&self) -> Vec<T> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.snapshot.subscribe()
    }

    async fn refresh(&self) -> Result<()> {
        let items = self.list().await?;
        self.snapshot.send_replace(items);
        Ok(())
    }
}

fn user_prefix(user: &UserId) -> String {
    format!("{user}/")
}

async fn load<T: Document>(backend: &dyn KeyValueBackend, prefix: &str) -> Result<Vec<T>> {
    let entries = backend
        .scan_prefix(prefix)
        .await
        .with_context(|| format!("Failed to read {}", T::COLLECTION))?;

    let mut items: Vec<T> = entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_slice(&value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("Skipping unreadable {} entry {}: {}", T::COLLECTION, key, e);
                None
            }
        })
        .collect();
    items.sort_by(|a, b| created_order(a).cmp(&created_order(b)));
    Ok(items)
}

fn created_order<T: Document>(doc: &T) -> (chrono::DateTime<Utc>, ItemId) {
    (doc.created_at(), doc.id().clone())
}
