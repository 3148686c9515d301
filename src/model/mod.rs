mod credential;
mod platform;
mod workflow;

pub use credential::{CREDENTIAL_FIELDS, CredentialRecord};
pub use platform::{FieldDescriptor, FieldType, Platform, PlatformDescriptor};
pub use workflow::{DEFAULT_INTERVAL, FolderPicker, Workflow, WorkflowDraft, WorkflowId, WorkflowStatus};
