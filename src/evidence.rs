//! Evidence produced by detection providers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A category of host evidence, one per detection provider.
///
/// Variants are declared in provider-invocation order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// A marker file or directory exists.
    Filesystem,
    /// An environment variable name matches.
    Env,
    /// An executable resolves on the search path.
    Binary,
    /// A well-known application install path exists.
    App,
    /// A matching process is running.
    Process,
}

impl ProviderKind {
    /// Whether evidence of this kind proves the tool is on disk.
    pub fn confirms_install(&self) -> bool {
        matches!(self, Self::Filesystem | Self::Binary | Self::App)
    }
}

/// A single weighted signal confirming a target's presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvidence {
    pub provider: ProviderKind,
    pub detail: String,
    pub confidence_weight: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl DetectionEvidence {
    pub fn new(provider: ProviderKind, detail: impl Into<String>, confidence_weight: f64) -> Self {
        Self {
            provider,
            detail: detail.into(),
            confidence_weight,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
