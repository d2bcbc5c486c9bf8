//! Locked read-modify-write access to one persisted JSON array.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::Result;

use super::kv_store::{self, KeyValueStore};

/// An ordered collection of records stored under a single key.
///
/// Writers serialize through an async mutex so two concurrent mutations
/// cannot lose each other's update.
pub(crate) struct Collection<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    write_lock: Arc<Mutex<()>>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key,
            write_lock: Arc::clone(&self.write_lock),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            write_lock: Arc::new(Mutex::new(())),
            _marker: std::marker::PhantomData,
        }
    }

    /// Snapshot of the collection in store order.
    pub(crate) async fn load(&self) -> Result<Vec<T>> {
        kv_store::load_or(self.store.as_ref(), self.key, Vec::new).await
    }

    /// Apply `f` to the current contents and persist the result.
    ///
    /// Nothing is written when `f` fails.
    pub(crate) async fn mutate<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        let out = f(&mut items)?;
        kv_store::save(self.store.as_ref(), self.key, &items).await?;
        Ok(out)
    }
}
