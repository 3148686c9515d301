use std::{collections::BTreeMap, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::{PubflowError, Result};

/// Store-assigned workflow identifier.
pub type WorkflowId = u64;

/// Send interval, in minutes, proposed for a fresh draft.
pub const DEFAULT_INTERVAL: i64 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Running,
    Paused,
}

impl FromStr for WorkflowStatus {
    type Err = PubflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(WorkflowStatus::Running),
            "paused" => Ok(WorkflowStatus::Paused),
            other => Err(PubflowError::InvalidArgument(format!("invalid workflow status '{}', expected 'running' or 'paused'", other))),
        }
    }
}

impl TryFrom<&str> for WorkflowStatus {
    type Error = PubflowError;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

/// A stored publishing job.
///
/// Records are only ever produced by the workflow store, which guarantees a
/// unique `id`, a registered `platform` and a complete `api_config`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub api_config: BTreeMap<String, String>,
    /// minutes between two sends, at least 1
    pub interval: u32,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: i64,
}

/// Candidate workflow submitted to `create` or `update`.
///
/// Every field may hold an invalid value; validation reports them all at once.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub api_config: BTreeMap<String, String>,
    /// `None` when absent or not a number
    #[serde(default, deserialize_with = "deserialize_interval")]
    pub interval: Option<i64>,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub webhook: Option<String>,
}

impl Default for WorkflowDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            platform: String::new(),
            api_config: BTreeMap::new(),
            interval: Some(DEFAULT_INTERVAL),
            folders: Vec::new(),
            webhook: None,
        }
    }
}

impl WorkflowDraft {
    pub fn new(
        name: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            platform: platform.into(),
            ..Default::default()
        }
    }

    /// Draft pre-filled from a stored record, for editing.
    pub fn from_workflow(workflow: &Workflow) -> Self {
        Self {
            name: workflow.name.clone(),
            platform: workflow.platform.clone(),
            api_config: workflow.api_config.clone(),
            interval: Some(workflow.interval.into()),
            folders: workflow.folders.clone(),
            webhook: workflow.webhook.clone(),
        }
    }

    pub fn api_config(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.api_config.insert(key.into(), value.into());
        self
    }

    pub fn interval(
        mut self,
        interval: Option<i64>,
    ) -> Self {
        self.interval = interval;
        self
    }

    pub fn folders(
        mut self,
        folders: Vec<String>,
    ) -> Self {
        self.folders = folders;
        self
    }

    pub fn webhook(
        mut self,
        webhook: impl Into<String>,
    ) -> Self {
        self.webhook = Some(webhook.into());
        self
    }

    /// Switches to another platform and drops the now meaningless credential keys.
    ///
    /// The store never clears `api_config` on its own; callers changing the
    /// platform go through here before `create`/`update`.
    pub fn change_platform(
        &mut self,
        platform: impl Into<String>,
    ) {
        let platform = platform.into();
        if platform != self.platform {
            self.api_config.clear();
        }
        self.platform = platform;
    }

    /// Replaces `folders` with whatever the picker returns.
    pub async fn pick_folders(
        &mut self,
        picker: &dyn FolderPicker,
    ) -> Result<()> {
        self.folders = picker.pick_folders().await?;
        Ok(())
    }

    /// Webhook with blank strings treated as absent.
    pub(crate) fn webhook_value(&self) -> Option<&str> {
        self.webhook.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Source of folder paths chosen by the user for a workflow.
#[async_trait]
pub trait FolderPicker: Send + Sync {
    async fn pick_folders(&self) -> Result<Vec<String>>;
}

fn deserialize_interval<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    let interval = match value {
        Some(JsonValue::Number(n)) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i64)),
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(interval)
}
