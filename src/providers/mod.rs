//! Detection providers.
//!
//! Each provider inspects one category of host evidence for one target:
//!
//! - [`FilesystemProvider`]: marker files and directories under the scan roots
//! - [`EnvProvider`]: environment variable names
//! - [`BinaryProvider`]: executables on the search path, plus `--version`
//! - [`AppPathProvider`]: platform-specific install locations
//! - [`ProcessProvider`]: command lines in the process table
//!
//! Providers are strategies behind [`DetectionProvider`]; the engine holds a
//! list of them and any can be replaced with a fake.

mod app;
mod binary;
mod env;
mod filesystem;
mod paths;
mod process;

pub use app::AppPathProvider;
pub use binary::BinaryProvider;
pub use env::EnvProvider;
pub use filesystem::FilesystemProvider;
pub use process::{ProcessEntry, ProcessLister, ProcessProvider, SystemProcessLister};

pub(crate) use process::ProcessSnapshot;

use crate::{
    DetectionEvidence, DiscoveryConfig, DiscoveryError, DiscoveryIssue, DiscoveryTarget, ProviderKind,
    ProviderWeights,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// What a provider observed for one target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOutput {
    pub evidence: Vec<DetectionEvidence>,
    pub versions: Vec<String>,
    pub issues: Vec<DiscoveryIssue>,
}

impl ProviderOutput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_evidence(evidence: DetectionEvidence) -> Self {
        Self {
            evidence: vec![evidence],
            ..Self::default()
        }
    }

    pub fn with_issue(issue: DiscoveryIssue) -> Self {
        Self {
            issues: vec![issue],
            ..Self::default()
        }
    }

    pub fn is_match(&self) -> bool {
        !self.evidence.is_empty()
    }
}

/// Everything a provider may consult while probing one target.
///
/// Built by the engine per target; the process snapshot cell is shared by
/// every target in a scan.
pub struct ProbeContext<'a> {
    cwd: &'a Path,
    config: &'a DiscoveryConfig,
    weights: ProviderWeights,
    processes: &'a OnceCell<ProcessSnapshot>,
}

impl<'a> ProbeContext<'a> {
    pub(crate) fn new(
        cwd: &'a Path,
        config: &'a DiscoveryConfig,
        weights: ProviderWeights,
        processes: &'a OnceCell<ProcessSnapshot>,
    ) -> Self {
        Self {
            cwd,
            config,
            weights,
            processes,
        }
    }

    /// Primary root for filesystem signals.
    pub fn cwd(&self) -> &Path {
        self.cwd
    }

    pub fn config(&self) -> &DiscoveryConfig {
        self.config
    }

    /// Resolved weight of `kind` for the target being probed.
    pub fn weight(&self, kind: ProviderKind) -> f64 {
        self.weights.get(kind)
    }

    /// The scan's process table, captured by `capture` on first use.
    pub(crate) async fn processes<F, Fut>(&self, capture: F) -> &ProcessSnapshot
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ProcessSnapshot>,
    {
        self.processes.get_or_init(capture).await
    }
}

/// One category of host evidence.
#[async_trait]
pub trait DetectionProvider: Send + Sync {
    /// The evidence category this provider reports.
    fn kind(&self) -> ProviderKind;

    /// Whether `target` configures any signal this provider checks.
    ///
    /// Categories that do not apply are not probed and carry no weight.
    fn applies_to(&self, target: &DiscoveryTarget) -> bool {
        target.has_signals(self.kind())
    }

    /// Probe the host for `target`.
    ///
    /// Expected degradations (timeouts, missing tools) should come back as
    /// issues in an `Ok` output; an `Err` is reported by the engine as a
    /// failed provider call.
    async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError>;

    /// Capture host state shared by every target of a scan.
    ///
    /// The engine calls this once per scan, before any target is probed,
    /// when at least one target applies. Anything read here cannot see the
    /// subprocesses other providers start during the scan.
    async fn prepare(&self, _ctx: &ProbeContext<'_>) {}
}

/// The built-in providers in invocation order.
pub fn default_providers() -> Vec<Arc<dyn DetectionProvider>> {
    vec![
        Arc::new(FilesystemProvider),
        Arc::new(EnvProvider::new()),
        Arc::new(BinaryProvider),
        Arc::new(AppPathProvider),
        Arc::new(ProcessProvider::new()),
    ]
}

#[cfg(test)]
pub(crate) use binary::tests as binary_tests;
#[cfg(test)]
pub(crate) use process::tests as process_tests;
