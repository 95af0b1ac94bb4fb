//! Persistent user preferences
//!
//! A single-key store for the user's display name, kept in a `fjall`
//! keyspace with `postcard` encoded values.

use std::path::Path;

use fjall::{Database, Keyspace, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::task;

use crate::{Result, WeatherDashError};

pub const USER_NAME_KEY: &str = "userName";
pub const DEFAULT_USER_NAME: &str = "User";

fn store_error(e: impl std::fmt::Display) -> WeatherDashError {
    WeatherDashError::preferences(e.to_string())
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key).map_err(store_error)?.map(|v| v.to_vec()))
}

pub struct PreferenceStore {
    db: Database,
    store: Keyspace,
}

impl PreferenceStore {
    /// Open (or create) the store under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path.as_ref())
            .open()
            .map_err(store_error)?;
        let store = db
            .keyspace("preferences", fjall::KeyspaceCreateOptions::default)
            .map_err(store_error)?;
        Ok(Self { db, store })
    }

    /// The stored display name, `"User"` when none was saved
    pub async fn display_name(&self) -> Result<String> {
        Ok(self
            .get::<String>(USER_NAME_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()))
    }

    /// Save a display name; surrounding whitespace is trimmed and blank
    /// names are rejected
    pub async fn set_display_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherDashError::validation("name cannot be blank"));
        }
        self.put(USER_NAME_KEY, name.to_string()).await?;
        Ok(name.to_string())
    }

    #[tracing::instrument(name = "put_preference", level = "debug", skip(self, value))]
    async fn put<T: Serialize + Send + 'static>(&self, key: &str, value: T) -> Result<()> {
        let db = self.db.clone();
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let bytes = postcard::to_stdvec(&value).map_err(store_error)?;

        // the CLI process exits right after a write
        task::spawn_blocking(move || -> Result<()> {
            store.insert(key, bytes).map_err(store_error)?;
            db.persist(PersistMode::SyncAll).map_err(store_error)?;
            Ok(())
        })
        .await
        .map_err(store_error)??;
        Ok(())
    }

    #[tracing::instrument(name = "query_preference", level = "debug", skip(self))]
    async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key_bytes))
            .await
            .map_err(store_error)??;

        match maybe_bytes {
            Some(bytes) => {
                let value = postcard::from_bytes(&bytes).map_err(store_error)?;
                Ok(Some(value))
            }
            None => {
                tracing::debug!("Key not found");
                Ok(None)
            }
        }
    }
}
