//! Scan result types.

use crate::{DetectionEvidence, DiscoveryIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarse presence classification of a detected agent.
///
/// Ordered from weakest to strongest claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PresenceStatus {
    /// Only configuration was found; presence is unconfirmed.
    Available,
    /// The tool is on disk.
    Installed,
    /// A matching process is running.
    Running,
}

impl PresenceStatus {
    /// Classify a non-empty evidence list.
    ///
    /// `Running` if any evidence came from the process table, `Installed` if
    /// any confirms an install, `Available` otherwise.
    pub fn from_evidence(evidence: &[DetectionEvidence]) -> Self {
        use crate::ProviderKind;
        if evidence.iter().any(|e| e.provider == ProviderKind::Process) {
            Self::Running
        } else if evidence.iter().any(|e| e.provider.confirms_install()) {
            Self::Installed
        } else {
            Self::Available
        }
    }
}

/// An agent that cleared the confidence threshold in one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedAgent {
    pub agent_id: String,
    pub name: String,
    /// Integer in `0..=100`.
    pub confidence: u8,
    pub status: PresenceStatus,
    pub evidence: Vec<DetectionEvidence>,
    /// Distinct version strings reported by any probed binary.
    pub versions: BTreeSet<String>,
    /// When the scan produced this detection (ISO 8601 when serialized).
    pub detected_at: DateTime<Utc>,
}

/// Outcome of a [`DiscoveryEngine::scan`](crate::DiscoveryEngine::scan).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Sorted by confidence, highest first; ties keep target order.
    pub detected: Vec<DetectedAgent>,
    pub issues: Vec<DiscoveryIssue>,
}

impl DiscoveryResult {
    /// Look up a detection by target id.
    pub fn get(&self, agent_id: &str) -> Option<&DetectedAgent> {
        self.detected.iter().find(|a| a.agent_id == agent_id)
    }

    /// Issues tagged with a target id.
    pub fn issues_for<'a>(&'a self, agent_id: &'a str) -> impl Iterator<Item = &'a DiscoveryIssue> + 'a {
        self.issues
            .iter()
            .filter(move |i| i.agent_id.as_deref() == Some(agent_id))
    }
}
