use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Result, store::KvStore};

/// Process-local backend; state is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    docs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemStore {
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.docs.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
