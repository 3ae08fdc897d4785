//! Non-fatal diagnostics reported alongside scan results.

use crate::DiscoveryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable issue codes.
pub mod codes {
    /// Process enumeration exceeded `process_timeout`.
    pub const PROCESS_TIMEOUT: &str = "process_timeout";
    /// Process enumeration failed (missing `ps`, permission denied, ...).
    pub const PROCESS_SCAN_FAILED: &str = "process_scan_failed";
    /// A `--version` probe exceeded `process_timeout`.
    pub const VERSION_PROBE_TIMEOUT: &str = "version_probe_timeout";
    /// A `--version` probe failed after all retries.
    pub const VERSION_PROBE_FAILED: &str = "version_probe_failed";
    /// A filesystem signal could not be checked.
    pub const FILESYSTEM_ACCESS_DENIED: &str = "filesystem_access_denied";
    /// A provider call returned a timeout error.
    pub const PROVIDER_TIMEOUT: &str = "provider_timeout";
    /// A provider call returned an error.
    pub const PROVIDER_FAILED: &str = "provider_failed";
    /// A provider call panicked.
    pub const PROVIDER_PANICKED: &str = "provider_panicked";
    /// A target weight override was unusable and the default was kept.
    pub const INVALID_WEIGHT_OVERRIDE: &str = "invalid_weight_override";
}

/// Severity of a [`DiscoveryIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Warn,
    Error,
}

/// A degraded probe, reported instead of failing the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryIssue {
    pub level: IssueLevel,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl DiscoveryIssue {
    pub fn warn(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Warn, code, message)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Error, code, message)
    }

    fn new(level: IssueLevel, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            code: code.into(),
            message: message.into(),
            agent_id: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Build an issue from a failed probe, keeping the error's severity.
    pub fn from_error(code: impl Into<String>, err: &DiscoveryError) -> Self {
        Self::new(err.level(), code, err.to_string())
    }

    /// Tag the issue with a target id unless it already carries one.
    pub fn for_agent(mut self, agent_id: &str) -> Self {
        if self.agent_id.is_none() {
            self.agent_id = Some(agent_id.to_string());
        }
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
