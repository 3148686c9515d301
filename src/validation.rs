//! Field rules for candidate workflow and credential records.
//!
//! Both validators are pure: they collect every violation into a
//! [`ValidationErrors`] map and leave the decision to the caller.

use url::Url;

use crate::{
    ValidationErrors,
    model::{CREDENTIAL_FIELDS, CredentialRecord, WorkflowDraft},
    registry,
};

pub const REQUIRED: &str = "required";
pub const INVALID: &str = "invalid";
pub const INVALID_URL: &str = "invalid_url";

/// Checks a candidate workflow; an empty result means it is valid.
pub fn validate_workflow(candidate: &WorkflowDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if candidate.name.trim().is_empty() {
        errors.add("name", REQUIRED);
    }

    if candidate.platform.is_empty() || !registry::contains(&candidate.platform) {
        errors.add("platform", REQUIRED);
    }

    match candidate.interval {
        Some(interval) if (1..=u32::MAX as i64).contains(&interval) => {}
        _ => errors.add("interval", INVALID),
    }

    if let Some(webhook) = candidate.webhook_value() {
        if !is_absolute_url(webhook) {
            errors.add("webhook", INVALID_URL);
        }
    }

    if let Ok(descriptor) = registry::get_descriptor(&candidate.platform) {
        for field in descriptor.required_fields() {
            let filled = candidate.api_config.get(field.key).is_some_and(|v| !v.trim().is_empty());
            if !filled {
                errors.add(format!("apiConfig.{}", field.key), REQUIRED);
            }
        }
    }

    errors
}

/// Checks the storage credential record; each of the four fields is required.
pub fn validate_credential(candidate: &CredentialRecord) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for key in CREDENTIAL_FIELDS {
        if candidate.field(key).is_none_or(|v| v.trim().is_empty()) {
            errors.add(key, REQUIRED);
        }
    }
    errors
}

/// Absolute URL: a scheme followed by a non-empty host.
fn is_absolute_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}
