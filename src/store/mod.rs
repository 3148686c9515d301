//! Persistence adapter for the workflow collection and the credential record.
//!
//! Provides an abstraction over different key/value backends:
//! - `MemStore`: In-memory storage for testing
//! - `FileStore`: One JSON document per key in a local directory
//! - `PostgresStore`: PostgreSQL for shared deployments

mod db;

use std::{error::Error, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use strum::AsRefStr;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{Config, PubflowError, Result, StoreType};

pub use db::{FileStore, MemStore, PostgresStore};

/// Maps backend errors to PubflowError.
fn map_db_err(err: impl Error) -> PubflowError {
    PubflowError::Persistence(err.to_string())
}

/// Keys under which the engine persists its state.
#[derive(Debug, Clone, Copy, AsRefStr, PartialEq, Hash, Eq)]
pub enum StoreIden {
    /// The ordered workflow collection.
    #[strum(serialize = "workflows")]
    Workflows,
    /// The storage-provider credential record.
    #[strum(serialize = "credential")]
    Credential,
}

/// Durable key/value save-and-load.
///
/// Values are JSON documents. `load` of a key that was never saved returns
/// `Ok(None)`.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>>;

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()>;
}

/// Opens the backend selected by `config.store`.
pub async fn open(config: &Config) -> Result<Arc<dyn KvStore>> {
    let store: Arc<dyn KvStore> = match config.store.store_type {
        StoreType::Mem => Arc::new(MemStore::new()),
        StoreType::File => {
            let file = config.store.file.as_ref().ok_or_else(|| PubflowError::Config("file configuration is required when store type is file".to_string()))?;
            Arc::new(FileStore::open(&file.dir).await?)
        }
        StoreType::Postgres => {
            let postgres = config
                .store
                .postgres
                .as_ref()
                .ok_or_else(|| PubflowError::Config("postgres configuration is required when store type is postgres".to_string()))?;
            Arc::new(PostgresStore::connect(&postgres.database_url).await?)
        }
    };
    Ok(store)
}

fn into_persistence(err: PubflowError) -> PubflowError {
    match err {
        PubflowError::Persistence(_) => err,
        other => PubflowError::Persistence(other.to_string()),
    }
}

/// Serializes `doc` and saves it under `iden`, bounded by `limit`.
pub(crate) async fn save_doc<T>(
    kv: &dyn KvStore,
    iden: StoreIden,
    doc: &T,
    limit: Duration,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let text = serde_json::to_string(doc)?;
    match timeout(limit, kv.save(iden.as_ref(), &text)).await {
        Ok(Ok(())) => {
            debug!("store::save({}) {} bytes", iden.as_ref(), text.len());
            Ok(())
        }
        Ok(Err(err)) => {
            warn!("store::save({}) failed: {}", iden.as_ref(), err);
            Err(into_persistence(err))
        }
        Err(_) => {
            warn!("store::save({}) timed out after {:?}", iden.as_ref(), limit);
            Err(PubflowError::Persistence(format!("save '{}' timed out after {:?}", iden.as_ref(), limit)))
        }
    }
}

/// Loads and deserializes the document under `iden`, bounded by `limit`.
pub(crate) async fn load_doc<T>(
    kv: &dyn KvStore,
    iden: StoreIden,
    limit: Duration,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let text = match timeout(limit, kv.load(iden.as_ref())).await {
        Ok(res) => res.map_err(into_persistence)?,
        Err(_) => return Err(PubflowError::Persistence(format!("load '{}' timed out after {:?}", iden.as_ref(), limit))),
    };
    match text {
        Some(text) => {
            let doc = serde_json::from_str::<T>(&text).map_err(|err| PubflowError::Persistence(format!("corrupt document '{}': {}", iden.as_ref(), err)))?;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}
