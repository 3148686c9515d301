use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{Mutex, RwLock},
    time::timeout,
};
use tracing::{debug, info, trace, warn};

use crate::{
    Result,
    common::BroadcastQueue,
    credential::ReachabilityCheck,
    events::StoreEvent,
    model::CredentialRecord,
    store::{self, KvStore, StoreIden},
    validation,
};

/// Result of a credential connection test.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub success: bool,
    pub message: String,
}

/// Owner of the one credential record of a session.
///
/// The record starts with all fields empty and is only ever replaced in
/// place by `update`; `test` never touches it.
pub struct CredentialStore {
    kv: Arc<dyn KvStore>,
    record: RwLock<CredentialRecord>,
    writer: Mutex<()>,
    persist_timeout: Duration,
    reachability: Arc<dyn ReachabilityCheck>,
    reachability_timeout: Duration,
    events: Arc<BroadcastQueue<StoreEvent>>,
}

impl CredentialStore {
    /// Seeds the record from the adapter; a missing document means all-empty fields.
    pub async fn load(
        kv: Arc<dyn KvStore>,
        persist_timeout: Duration,
        reachability: Arc<dyn ReachabilityCheck>,
        reachability_timeout: Duration,
        events: Arc<BroadcastQueue<StoreEvent>>,
    ) -> Result<Self> {
        let record = store::load_doc::<CredentialRecord>(kv.as_ref(), StoreIden::Credential, persist_timeout).await?;
        info!("credential store loaded (stored: {})", record.is_some());

        Ok(Self {
            kv,
            record: RwLock::new(record.unwrap_or_default()),
            writer: Mutex::new(()),
            persist_timeout,
            reachability,
            reachability_timeout,
            events,
        })
    }

    pub async fn get(&self) -> CredentialRecord {
        self.record.read().await.clone()
    }

    /// Validates `candidate`, saves it, then replaces the stored record.
    pub async fn update(
        &self,
        candidate: &CredentialRecord,
    ) -> Result<CredentialRecord> {
        trace!("credential_store::update()");
        validation::validate_credential(candidate).into_result()?;

        let _writer = self.writer.lock().await;
        store::save_doc(self.kv.as_ref(), StoreIden::Credential, candidate, self.persist_timeout).await?;
        *self.record.write().await = candidate.clone();

        debug!("credential record updated");
        self.events.send(StoreEvent::CredentialUpdated);
        Ok(candidate.clone())
    }

    /// Validates `candidate` and runs the reachability check on a private copy.
    ///
    /// Check failures and timeouts come back as `success: false`; only a
    /// validation failure is returned as an error.
    pub async fn test(
        &self,
        candidate: &CredentialRecord,
    ) -> Result<TestResult> {
        trace!("credential_store::test()");
        validation::validate_credential(candidate).into_result()?;

        let snapshot = candidate.clone();
        let result = match timeout(self.reachability_timeout, self.reachability.check(&snapshot)).await {
            Ok(Ok(res)) if res.reachable => TestResult {
                success: true,
                message: res.detail,
            },
            Ok(Ok(res)) => TestResult {
                success: false,
                message: res.detail,
            },
            Ok(Err(err)) => TestResult {
                success: false,
                message: err.to_string(),
            },
            Err(_) => TestResult {
                success: false,
                message: format!("reachability check timed out after {:?}", self.reachability_timeout),
            },
        };
        if !result.success {
            warn!("credential test failed: {}", result.message);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        PubflowError,
        credential::Reachability,
        store::MemStore,
    };

    const TIMEOUT: Duration = Duration::from_millis(200);

    enum Behavior {
        Reachable,
        Unreachable,
        Fail,
        Hang,
    }

    struct FakeCheck {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeCheck {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReachabilityCheck for FakeCheck {
        async fn check(
            &self,
            _record: &CredentialRecord,
        ) -> Result<Reachability> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Reachable => Ok(Reachability::reachable("connection succeeded")),
                Behavior::Unreachable => Ok(Reachability::unreachable("401 Unauthorized")),
                Behavior::Fail => Err(PubflowError::Reachability("dns error".to_string())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Reachability::reachable("too late"))
                }
            }
        }
    }

    struct FailingStore {
        inner: MemStore,
        fail: AtomicBool,
    }

    #[async_trait]
    impl KvStore for FailingStore {
        async fn load(
            &self,
            key: &str,
        ) -> Result<Option<String>> {
            self.inner.load(key).await
        }

        async fn save(
            &self,
            key: &str,
            value: &str,
        ) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PubflowError::Persistence("connection reset".to_string()));
            }
            self.inner.save(key, value).await
        }
    }

    async fn store_with(
        kv: Arc<dyn KvStore>,
        check: Arc<dyn ReachabilityCheck>,
    ) -> CredentialStore {
        CredentialStore::load(kv, TIMEOUT, check, Duration::from_millis(100), BroadcastQueue::new(8)).await.unwrap()
    }

    fn full() -> CredentialRecord {
        CredentialRecord::new("key", "secret", "access", "refresh")
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let store = store_with(Arc::new(MemStore::new()), FakeCheck::new(Behavior::Reachable)).await;
        assert_eq!(store.get().await, CredentialRecord::default());
    }

    #[tokio::test]
    async fn test_update_and_reload() {
        let kv = Arc::new(MemStore::new());
        let store = store_with(kv.clone(), FakeCheck::new(Behavior::Reachable)).await;
        store.update(&full()).await.unwrap();
        assert_eq!(store.get().await, full());

        let reloaded = store_with(kv, FakeCheck::new(Behavior::Reachable)).await;
        assert_eq!(reloaded.get().await, full());
    }

    #[tokio::test]
    async fn test_update_with_empty_field_is_rejected() {
        let store = store_with(Arc::new(MemStore::new()), FakeCheck::new(Behavior::Reachable)).await;
        store.update(&full()).await.unwrap();

        let mut candidate = full();
        candidate.api_secret.clear();
        let Err(PubflowError::Validation(errors)) = store.update(&candidate).await else {
            panic!("empty field must be rejected");
        };
        assert_eq!(errors.get("apiSecret"), Some("required"));
        assert_eq!(store.get().await, full());
    }

    #[tokio::test]
    async fn test_update_persistence_failure_keeps_record() {
        let kv = Arc::new(FailingStore {
            inner: MemStore::new(),
            fail: AtomicBool::new(false),
        });
        let store = store_with(kv.clone(), FakeCheck::new(Behavior::Reachable)).await;
        store.update(&full()).await.unwrap();

        kv.fail.store(true, Ordering::SeqCst);
        let other = CredentialRecord::new("k2", "s2", "a2", "r2");
        assert!(matches!(store.update(&other).await, Err(PubflowError::Persistence(_))));
        assert_eq!(store.get().await, full());
    }

    #[tokio::test]
    async fn test_reachable() {
        let check = FakeCheck::new(Behavior::Reachable);
        let store = store_with(Arc::new(MemStore::new()), check.clone()).await;

        let res = store.test(&full()).await.unwrap();
        assert!(res.success);
        assert_eq!(check.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get().await, CredentialRecord::default());
    }

    #[tokio::test]
    async fn test_failures_are_results() {
        for (behavior, needle) in [(Behavior::Unreachable, "401"), (Behavior::Fail, "dns error"), (Behavior::Hang, "timed out")] {
            let store = store_with(Arc::new(MemStore::new()), FakeCheck::new(behavior)).await;
            let res = store.test(&full()).await.unwrap();
            assert!(!res.success);
            assert!(res.message.contains(needle), "{}", res.message);
        }
    }

    #[tokio::test]
    async fn test_invalid_candidate_skips_check() {
        let check = FakeCheck::new(Behavior::Reachable);
        let store = store_with(Arc::new(MemStore::new()), check.clone()).await;
        let res = store.test(&CredentialRecord::new("key", "", "access", "refresh")).await;
        assert!(matches!(res, Err(PubflowError::Validation(_))));
        assert_eq!(check.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_tests_and_update() {
        let kv = Arc::new(MemStore::new());
        let store = Arc::new(store_with(kv.clone(), FakeCheck::new(Behavior::Reachable)).await);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let candidate = CredentialRecord::new(format!("key-{}", i), "s", "a", "r");
                store.test(&candidate).await.unwrap().success
            }));
        }
        store.update(&full()).await.unwrap();
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(store.get().await, full());
        assert!(kv.load("credential").await.unwrap().is_some());
    }
}
