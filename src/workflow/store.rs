//! In-memory workflow collection backed by the persistence adapter.
//!
//! Every mutation runs under one writer lock for the whole collection:
//! the next collection is built from a snapshot, durably saved, and only
//! then published to readers. A failed or timed out save leaves the
//! in-memory collection untouched.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, trace};

use crate::{
    PubflowError, Result,
    common::BroadcastQueue,
    events::StoreEvent,
    model::{Workflow, WorkflowDraft, WorkflowId, WorkflowStatus},
    store::{self, KvStore, StoreIden},
    utils, validation,
};

/// Hands out strictly increasing, time-derived ids.
#[derive(Debug, Default)]
struct IdClock {
    last: WorkflowId,
}

impl IdClock {
    fn seeded(records: &[Workflow]) -> Self {
        Self {
            last: records.iter().map(|w| w.id).max().unwrap_or(0),
        }
    }

    fn next(&mut self) -> Result<WorkflowId> {
        let now = WorkflowId::try_from(utils::time::time_millis()).unwrap_or(0);
        let after = self
            .last
            .checked_add(1)
            .ok_or_else(|| PubflowError::Persistence(format!("workflow id space exhausted after {}", self.last)))?;
        self.last = now.max(after);
        Ok(self.last)
    }
}

pub struct WorkflowStore {
    kv: Arc<dyn KvStore>,
    /// Published collection, in creation order.
    records: RwLock<Vec<Workflow>>,
    /// Serializes mutations; guards the id clock.
    writer: Mutex<IdClock>,
    persist_timeout: Duration,
    events: Arc<BroadcastQueue<StoreEvent>>,
}

impl WorkflowStore {
    /// Seeds a store from the adapter; a missing document means an empty collection.
    pub async fn load(
        kv: Arc<dyn KvStore>,
        persist_timeout: Duration,
        events: Arc<BroadcastQueue<StoreEvent>>,
    ) -> Result<Self> {
        let records = store::load_doc::<Vec<Workflow>>(kv.as_ref(), StoreIden::Workflows, persist_timeout).await?.unwrap_or_default();

        let mut seen = HashSet::new();
        if let Some(dup) = records.iter().find(|w| !seen.insert(w.id)) {
            return Err(PubflowError::Persistence(format!("corrupt document 'workflows': duplicate id {}", dup.id)));
        }
        for workflow in &records {
            let errors = validation::validate_workflow(&WorkflowDraft::from_workflow(workflow));
            if !errors.is_empty() {
                return Err(PubflowError::Persistence(format!("corrupt document 'workflows': workflow {} is invalid ({})", workflow.id, errors)));
            }
        }
        info!("workflow store loaded {} records", records.len());

        Ok(Self {
            kv,
            writer: Mutex::new(IdClock::seeded(&records)),
            records: RwLock::new(records),
            persist_timeout,
            events,
        })
    }

    /// Snapshot of all records in creation order.
    pub async fn list(&self) -> Vec<Workflow> {
        self.records.read().await.clone()
    }

    pub async fn get(
        &self,
        id: WorkflowId,
    ) -> Result<Workflow> {
        self.records.read().await.iter().find(|w| w.id == id).cloned().ok_or_else(|| not_found(id))
    }

    /// Validates `draft` and appends it as a new `running` workflow.
    pub async fn create(
        &self,
        draft: &WorkflowDraft,
    ) -> Result<Workflow> {
        trace!("workflow_store::create({})", draft.name);
        validation::validate_workflow(draft).into_result()?;

        let mut clock = self.writer.lock().await;
        let now = utils::time::time_millis();
        let workflow = build(clock.next()?, draft, WorkflowStatus::Running, now, now)?;

        let mut next = self.records.read().await.clone();
        next.push(workflow.clone());
        self.commit(next).await?;

        debug!("workflow {} created", workflow.id);
        self.events.send(StoreEvent::WorkflowCreated {
            id: workflow.id,
        });
        Ok(workflow)
    }

    /// Replaces the record `id` with `draft`, keeping its id, status and create time.
    ///
    /// Callers that change the platform must clear `api_config` first
    /// (see [`WorkflowDraft::change_platform`]); stale keys are kept as given.
    pub async fn update(
        &self,
        id: WorkflowId,
        draft: &WorkflowDraft,
    ) -> Result<Workflow> {
        trace!("workflow_store::update({})", id);
        let _writer = self.writer.lock().await;
        let mut next = self.records.read().await.clone();
        let pos = next.iter().position(|w| w.id == id).ok_or_else(|| not_found(id))?;

        validation::validate_workflow(draft).into_result()?;

        let current = &next[pos];
        let workflow = build(id, draft, current.status, current.create_time, utils::time::time_millis())?;
        next[pos] = workflow.clone();
        self.commit(next).await?;

        debug!("workflow {} updated", id);
        self.events.send(StoreEvent::WorkflowUpdated {
            id,
        });
        Ok(workflow)
    }

    /// Removes `id`; returns whether it was present. Unknown ids are not an error.
    pub async fn delete(
        &self,
        id: WorkflowId,
    ) -> Result<bool> {
        Ok(self.delete_many(&[id]).await? == 1)
    }

    /// Removes every listed id that exists and returns how many were removed.
    pub async fn delete_many(
        &self,
        ids: &[WorkflowId],
    ) -> Result<usize> {
        trace!("workflow_store::delete_many({:?})", ids);
        let _writer = self.writer.lock().await;
        let current = self.records.read().await.clone();
        let (removed, kept): (Vec<Workflow>, Vec<Workflow>) = current.into_iter().partition(|w| ids.contains(&w.id));
        if removed.is_empty() {
            return Ok(0);
        }
        self.commit(kept).await?;

        let removed_ids: Vec<WorkflowId> = removed.iter().map(|w| w.id).collect();
        debug!("workflows {:?} deleted", removed_ids);
        let count = removed_ids.len();
        self.events.send(StoreEvent::WorkflowsDeleted {
            ids: removed_ids,
        });
        Ok(count)
    }

    /// Sets `status` on every listed id that exists; returns how many matched.
    ///
    /// `status` is a [`WorkflowStatus`] or its text form; anything other than
    /// `running`/`paused` fails with `InvalidArgument` before any change.
    pub async fn set_status_many<S>(
        &self,
        ids: &[WorkflowId],
        status: S,
    ) -> Result<usize>
    where
        S: TryInto<WorkflowStatus>,
        S::Error: Into<PubflowError>,
    {
        let status: WorkflowStatus = status.try_into().map_err(Into::<PubflowError>::into)?;
        trace!("workflow_store::set_status_many({:?}, {})", ids, status);

        let _writer = self.writer.lock().await;
        let mut next = self.records.read().await.clone();
        let mut matched = Vec::new();
        for workflow in next.iter_mut().filter(|w| ids.contains(&w.id)) {
            workflow.status = status;
            matched.push(workflow.id);
        }
        if matched.is_empty() {
            return Ok(0);
        }
        self.commit(next).await?;

        debug!("workflows {:?} set to {}", matched, status);
        let count = matched.len();
        self.events.send(StoreEvent::WorkflowStatusChanged {
            ids: matched,
            status,
        });
        Ok(count)
    }

    /// Single-record status toggle; fails `NotFound` when `id` is absent.
    pub async fn set_status<S>(
        &self,
        id: WorkflowId,
        status: S,
    ) -> Result<()>
    where
        S: TryInto<WorkflowStatus>,
        S::Error: Into<PubflowError>,
    {
        match self.set_status_many(&[id], status).await? {
            0 => Err(not_found(id)),
            _ => Ok(()),
        }
    }

    /// Saves `next` and, once the write is confirmed, publishes it.
    async fn commit(
        &self,
        next: Vec<Workflow>,
    ) -> Result<()> {
        store::save_doc(self.kv.as_ref(), StoreIden::Workflows, &next, self.persist_timeout).await?;
        *self.records.write().await = next;
        Ok(())
    }
}

fn not_found(id: WorkflowId) -> PubflowError {
    PubflowError::NotFound(format!("workflow {} not found", id))
}

/// Record from a validated draft.
fn build(
    id: WorkflowId,
    draft: &WorkflowDraft,
    status: WorkflowStatus,
    create_time: i64,
    update_time: i64,
) -> Result<Workflow> {
    let interval = draft
        .interval
        .and_then(|i| u32::try_from(i).ok())
        .filter(|i| *i >= 1)
        .ok_or_else(|| PubflowError::InvalidArgument(format!("interval {:?} out of range", draft.interval)))?;

    Ok(Workflow {
        id,
        name: draft.name.clone(),
        platform: draft.platform.clone(),
        api_config: draft.api_config.clone(),
        interval,
        folders: draft.folders.clone(),
        webhook: draft.webhook_value().map(str::to_string),
        status,
        create_time,
        update_time,
    })
}
