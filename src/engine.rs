//! Engine - the main entry point for Pubflow.
//!
//! The engine owns one workflow store and one credential store, both loaded
//! from the same persistence adapter, and the queue their change events are
//! published on.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    Config, EngineBuilder, Result,
    common::BroadcastQueue,
    credential::CredentialStore,
    events::StoreEvent,
    model::{Platform, PlatformDescriptor},
    registry,
    workflow::WorkflowStore,
};

/// # Example
///
/// ```rust,ignore
/// let engine = Engine::new_with_config(Config::default()).await?;
///
/// let draft = WorkflowDraft::new("Daily clips", "telegram")
///     .api_config("botToken", "123:abc")
///     .api_config("channelId", "@clips");
/// let workflow = engine.workflows().create(&draft).await?;
/// engine.workflows().set_status_many(&[workflow.id], "paused").await?;
/// ```
pub struct Engine {
    workflows: WorkflowStore,
    credential: CredentialStore,
    events: Arc<BroadcastQueue<StoreEvent>>,
}

impl Engine {
    pub(crate) fn new(
        workflows: WorkflowStore,
        credential: CredentialStore,
        events: Arc<BroadcastQueue<StoreEvent>>,
    ) -> Self {
        Self {
            workflows,
            credential,
            events,
        }
    }

    /// Creates an engine with the backend and reachability check named in `config`.
    pub async fn new_with_config(config: Config) -> Result<Self> {
        EngineBuilder::new().config(config).build().await
    }

    pub fn workflows(&self) -> &WorkflowStore {
        &self.workflows
    }

    pub fn credential(&self) -> &CredentialStore {
        &self.credential
    }

    /// Receives every [`StoreEvent`] emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn platforms(&self) -> &'static [Platform] {
        registry::list_platforms()
    }

    pub fn platform(
        &self,
        platform_id: &str,
    ) -> Result<&'static PlatformDescriptor> {
        registry::get_descriptor(platform_id)
    }
}

#[cfg(test)]
mod test {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        CredentialRecord, PubflowError, StoreType, WorkflowDraft, WorkflowStatus,
        credential::{Reachability, ReachabilityCheck},
        store::{KvStore, MemStore},
    };

    struct AlwaysReachable;

    #[async_trait]
    impl ReachabilityCheck for AlwaysReachable {
        async fn check(
            &self,
            _record: &CredentialRecord,
        ) -> Result<Reachability> {
            Ok(Reachability::reachable("ok"))
        }
    }

    async fn engine_on(kv: Arc<dyn KvStore>) -> Engine {
        EngineBuilder::new().store(kv).reachability(Arc::new(AlwaysReachable)).build().await.unwrap()
    }

    fn youtube(name: &str) -> WorkflowDraft {
        WorkflowDraft::new(name, "youtube").api_config("clientId", "id").api_config("clientSecret", "secret").api_config("refreshToken", "rt")
    }

    #[tokio::test]
    async fn test_fresh_engine_is_empty() {
        let engine = Engine::new_with_config(Config::default()).await.unwrap();
        assert!(engine.workflows().list().await.is_empty());
        assert_eq!(engine.credential().get().await, CredentialRecord::default());
        assert_eq!(engine.platforms().len(), 4);
        assert_eq!(engine.platform("youtube").unwrap().name, "YouTube");
        assert!(matches!(engine.platform("vimeo"), Err(PubflowError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let kv: Arc<dyn KvStore> = Arc::new(MemStore::new());
        let engine = engine_on(kv.clone()).await;
        let a = engine.workflows().create(&youtube("a")).await.unwrap();
        let b = engine.workflows().create(&youtube("b")).await.unwrap();
        engine.workflows().set_status_many(&[b.id], WorkflowStatus::Paused).await.unwrap();
        engine.workflows().delete(a.id).await.unwrap();
        engine.credential().update(&CredentialRecord::new("k", "s", "a", "r")).await.unwrap();
        assert!(engine.credential().test(&engine.credential().get().await).await.unwrap().success);

        let restarted = engine_on(kv).await;
        assert_eq!(restarted.workflows().list().await, engine.workflows().list().await);
        assert_eq!(restarted.credential().get().await, engine.credential().get().await);
    }

    #[tokio::test]
    async fn test_file_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store.store_type = StoreType::File;
        config.store.file = Some(crate::config::FileConfig {
            dir: dir.path().to_path_buf(),
        });

        let engine = Engine::new_with_config(config.clone()).await.unwrap();
        let created = engine.workflows().create(&youtube("a")).await.unwrap();
        assert!(dir.path().join("workflows.json").exists());

        let restarted = Engine::new_with_config(config).await.unwrap();
        assert_eq!(restarted.workflows().list().await, vec![created]);
    }

    #[tokio::test]
    async fn test_subscribe_sees_both_stores() {
        let engine = engine_on(Arc::new(MemStore::new())).await;
        let mut rx = engine.subscribe();

        let a = engine.workflows().create(&youtube("a")).await.unwrap();
        engine.credential().update(&CredentialRecord::new("k", "s", "a", "r")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::WorkflowCreated {
            id: a.id
        });
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::CredentialUpdated);
    }
}
