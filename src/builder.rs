use std::sync::Arc;

use crate::{
    Config, Engine, Result,
    common::BroadcastQueue,
    credential::{CredentialStore, HttpReachability, ReachabilityCheck},
    events::EVENT_QUEUE_SIZE,
    store::{self, KvStore},
    workflow::WorkflowStore,
};

/// Assembles an [`Engine`] from a [`Config`], optionally overriding the
/// persistence adapter or the reachability check.
#[derive(Default)]
pub struct EngineBuilder {
    config: Config,
    kv: Option<Arc<dyn KvStore>>,
    reachability: Option<Arc<dyn ReachabilityCheck>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Use `kv` instead of the backend named in the config.
    pub fn store(
        mut self,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Use `check` instead of the HTTP check built from the config.
    pub fn reachability(
        mut self,
        check: Arc<dyn ReachabilityCheck>,
    ) -> Self {
        self.reachability = Some(check);
        self
    }

    /// Opens the adapter and loads both stores from it.
    pub async fn build(self) -> Result<Engine> {
        let config = self.config;
        let kv: Arc<dyn KvStore> = match self.kv {
            Some(kv) => kv,
            None => store::open(&config).await?,
        };
        let reachability: Arc<dyn ReachabilityCheck> = match self.reachability {
            Some(check) => check,
            None => Arc::new(HttpReachability::new(config.reachability.endpoint.clone(), config.reachability_timeout())),
        };

        let events = BroadcastQueue::new(EVENT_QUEUE_SIZE);
        let workflows = WorkflowStore::load(kv.clone(), config.persist_timeout(), events.clone()).await?;
        let credential = CredentialStore::load(kv, config.persist_timeout(), reachability, config.reachability_timeout(), events.clone()).await?;

        Ok(Engine::new(workflows, credential, events))
    }
}
