//! # Pubflow
//!
//! Pubflow is the record engine behind a periodic video-publishing tool.
//! It keeps the "workflow" records that describe each publishing job and the
//! single shared storage-provider credential set, and enforces the rules a
//! scheduler relies on when it consumes them.
//!
//! ## Core Features
//!
//! - **Validation**: Pure field rules that report every violation at once
//! - **Platform Registry**: Static catalog of platforms and the credentials each requires
//! - **Workflow Store**: CRUD and batch status/delete over an ordered collection
//! - **Credential Store**: Singleton credential record with a bounded connection test
//! - **Pluggable Storage**: In-memory (testing), JSON files, or PostgreSQL
//!
//! Every mutation is saved through the persistence adapter before it becomes
//! visible; a failed or timed out save leaves the in-memory state unchanged.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pubflow::{Config, Engine, WorkflowDraft};
//!
//! let engine = Engine::new_with_config(Config::default()).await?;
//!
//! let draft = WorkflowDraft::new("Daily clips", "bunny")
//!     .api_config("apiKey", "...")
//!     .api_config("libraryId", "42");
//! let workflow = engine.workflows().create(&draft).await?;
//! engine.workflows().set_status_many(&[workflow.id], "paused").await?;
//! ```

mod builder;
mod common;
mod config;
pub mod credential;
mod engine;
mod error;
pub mod events;
mod model;
pub mod registry;
pub mod store;
mod utils;
pub mod validation;
pub mod workflow;

pub use builder::EngineBuilder;
pub use common::BroadcastQueue;
pub use config::{Config, FileConfig, PostgresConfig, ReachabilityConfig, StoreConfig, StoreType};
pub use credential::{CredentialStore, TestResult};
pub use engine::Engine;
pub use error::{PubflowError, ValidationErrors};
pub use events::StoreEvent;
pub use model::*;
pub use workflow::WorkflowStore;

/// Result type alias for Pubflow operations.
pub type Result<T> = std::result::Result<T, PubflowError>;
