//! Workflow store: CRUD and batch mutations over the workflow collection.

mod store;

pub use store::WorkflowStore;
