//! Target descriptors: what identifies each detectable tool.

use crate::{ProviderKind, WeightOverrides};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Operating system family used to key app install paths.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    #[serde(alias = "darwin")]
    Macos,
    Linux,
    #[serde(alias = "win32")]
    Windows,
}

impl Platform {
    /// The platform this binary was built for, if it is one we key paths by.
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::Macos)
        } else if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else {
            None
        }
    }
}

/// An environment variable name pattern.
///
/// Serialized as a bare string for a literal prefix, or as
/// `{ "regex": "..." }` for a regular expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvPattern {
    /// Matches names starting with this prefix.
    Prefix(String),
    /// Matches names the expression finds a match in.
    Regex {
        #[serde(with = "crate::serde_ext::regex_str")]
        regex: Regex,
    },
}

impl EnvPattern {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn regex(regex: Regex) -> Self {
        Self::Regex { regex }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Regex { regex } => regex.is_match(name),
        }
    }
}

impl From<&str> for EnvPattern {
    fn from(prefix: &str) -> Self {
        Self::Prefix(prefix.to_string())
    }
}

/// A detectable tool and the signals that identify it.
///
/// Only categories with at least one signal are applicable to the target;
/// the others neither add to nor subtract from its confidence.
///
/// # Example
///
/// ```rust
/// use acp_presence::{DiscoveryTarget, EnvPattern};
///
/// let target = DiscoveryTarget {
///     filesystem_signals: vec![".test-agent-signal".to_string()],
///     env_signals: vec![EnvPattern::prefix("TEST_AGENT_")],
///     ..DiscoveryTarget::new("test-agent", "Test Agent")
/// };
/// assert_eq!(target.id, "test-agent");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryTarget {
    pub id: String,
    pub name: String,
    /// Paths relative to each scan root; a leading `~/` anchors at home.
    #[serde(default)]
    pub filesystem_signals: Vec<String>,
    #[serde(default)]
    pub env_signals: Vec<EnvPattern>,
    /// Matched against each running process's command line.
    #[serde(default, with = "crate::serde_ext::regex_vec")]
    pub process_signals: Vec<Regex>,
    /// Command lines matching any of these never count as signals.
    #[serde(default, with = "crate::serde_ext::regex_vec")]
    pub process_exclusions: Vec<Regex>,
    /// Executable names to resolve on the search path.
    #[serde(default)]
    pub binaries: Vec<String>,
    /// Well-known install locations per platform.
    #[serde(default)]
    pub app_paths: BTreeMap<Platform, Vec<String>>,
    #[serde(default)]
    pub weights: WeightOverrides,
}

impl DiscoveryTarget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// App install paths for the current platform.
    pub fn current_app_paths(&self) -> &[String] {
        Platform::current()
            .and_then(|p| self.app_paths.get(&p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the target configures any signal for `kind`.
    pub fn has_signals(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Filesystem => !self.filesystem_signals.is_empty(),
            ProviderKind::Env => !self.env_signals.is_empty(),
            ProviderKind::Binary => !self.binaries.is_empty(),
            ProviderKind::App => !self.current_app_paths().is_empty(),
            ProviderKind::Process => !self.process_signals.is_empty(),
        }
    }
}
