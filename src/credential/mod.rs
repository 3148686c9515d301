//! Credential store: the single shared storage-provider credential record,
//! plus the reachability check used to test it.

mod reachability;
mod store;

pub use reachability::{HttpReachability, Reachability, ReachabilityCheck};
pub use store::{CredentialStore, TestResult};
