//! The discovery engine.

use crate::aggregate::ConfidenceTally;
use crate::issue::codes;
use crate::providers::{default_providers, DetectionProvider, ProbeContext, ProcessSnapshot, ProviderOutput};
use crate::{
    DetectedAgent, DiscoveryConfig, DiscoveryError, DiscoveryIssue, DiscoveryResult, DiscoveryTarget,
    PresenceStatus, ProviderKind, DEFAULT_WEIGHTS,
};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Outcome of probing a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetScan {
    /// Confidence the target scored, whether or not it was reported.
    pub confidence: u8,
    /// Present only if the target cleared the threshold with evidence.
    pub detected: Option<DetectedAgent>,
    /// Issues raised while probing, tagged with the target id.
    pub issues: Vec<DiscoveryIssue>,
}

/// Scores a fixed list of targets against the host.
///
/// The engine owns its targets, scan root and config; it holds no per-scan
/// state, so [`scan`](Self::scan) can be called repeatedly and concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use acp_presence::{builtin_targets, DiscoveryConfig, DiscoveryEngine};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let engine = DiscoveryEngine::new(builtin_targets(), ".", DiscoveryConfig::default());
///     let result = engine.scan().await;
///     for agent in &result.detected {
///         println!("{}: {}% ({})", agent.name, agent.confidence, agent.status);
///     }
///     for issue in &result.issues {
///         eprintln!("{:?} {}: {}", issue.level, issue.code, issue.message);
///     }
/// }
/// ```
pub struct DiscoveryEngine {
    targets: Vec<DiscoveryTarget>,
    cwd: PathBuf,
    config: DiscoveryConfig,
    providers: Vec<Arc<dyn DetectionProvider>>,
}

impl std::fmt::Debug for DiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryEngine")
            .field("targets", &self.targets.len())
            .field("cwd", &self.cwd)
            .field("config", &self.config)
            .field("providers", &self.providers.iter().map(|p| p.kind()).collect::<Vec<_>>())
            .finish()
    }
}

impl DiscoveryEngine {
    /// Create an engine using the built-in providers.
    pub fn new(targets: Vec<DiscoveryTarget>, cwd: impl Into<PathBuf>, config: DiscoveryConfig) -> Self {
        Self {
            targets,
            cwd: cwd.into(),
            config,
            providers: default_providers(),
        }
    }

    /// Replace the provider list. Providers run in the given order.
    pub fn with_providers(mut self, providers: Vec<Arc<dyn DetectionProvider>>) -> Self {
        self.providers = providers;
        self
    }

    pub fn targets(&self) -> &[DiscoveryTarget] {
        &self.targets
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Replace the config used by subsequent scans.
    pub fn set_config(&mut self, config: DiscoveryConfig) {
        self.config = config;
    }

    /// Probe every target and rank the detections.
    ///
    /// Never fails: degraded probes are reported through `issues` and the
    /// rest of the scan proceeds. `detected` is ordered by confidence,
    /// highest first, with ties in target order.
    pub async fn scan(&self) -> DiscoveryResult {
        let processes = OnceCell::new();
        self.prepare(&self.targets, &processes).await;
        let limit = self.config.max_concurrency.max(1);

        let outcomes: Vec<TargetScan> = stream::iter(&self.targets)
            .map(|target| self.scan_target_with(target, &processes))
            .buffered(limit)
            .collect()
            .await;

        let mut result = DiscoveryResult::default();
        for outcome in outcomes {
            result.issues.extend(outcome.issues);
            result.detected.extend(outcome.detected);
        }
        // stable: equal confidence keeps target order
        result.detected.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        tracing::info!(
            targets = self.targets.len(),
            detected = result.detected.len(),
            issues = result.issues.len(),
            "discovery scan complete"
        );
        result
    }

    /// Probe a single target with a fresh process snapshot.
    pub async fn scan_target(&self, target: &DiscoveryTarget) -> TargetScan {
        let processes = OnceCell::new();
        self.prepare(std::slice::from_ref(target), &processes).await;
        self.scan_target_with(target, &processes).await
    }

    /// Let each provider some target needs capture its shared state.
    async fn prepare(&self, targets: &[DiscoveryTarget], processes: &OnceCell<ProcessSnapshot>) {
        let ctx = ProbeContext::new(&self.cwd, &self.config, DEFAULT_WEIGHTS, processes);
        for provider in &self.providers {
            let kind = provider.kind();
            if !self.is_enabled(kind) || !targets.iter().any(|t| provider.applies_to(t)) {
                continue;
            }
            // a panic here resurfaces from detect and is reported there
            if AssertUnwindSafe(provider.prepare(&ctx)).catch_unwind().await.is_err() {
                tracing::error!(provider = %kind, "provider panicked while preparing scan");
            }
        }
    }

    async fn scan_target_with(&self, target: &DiscoveryTarget, processes: &OnceCell<ProcessSnapshot>) -> TargetScan {
        let mut issues = Vec::new();

        let (weights, rejected) = DEFAULT_WEIGHTS.resolve(&target.weights);
        for (kind, value) in rejected {
            tracing::warn!(target_id = %target.id, provider = %kind, value, "ignoring invalid weight override");
            issues.push(
                DiscoveryIssue::warn(
                    codes::INVALID_WEIGHT_OVERRIDE,
                    format!("weight override {value} for {kind} is invalid; using default"),
                )
                .for_agent(&target.id)
                .with_metadata("provider", kind.as_ref()),
            );
        }

        let ctx = ProbeContext::new(&self.cwd, &self.config, weights, processes);
        let mut tally = ConfidenceTally::new();
        let mut evidence = Vec::new();
        let mut versions = BTreeSet::new();

        for provider in &self.providers {
            let kind = provider.kind();
            if !self.is_enabled(kind) || !provider.applies_to(target) {
                continue;
            }
            tally.consider(weights.get(kind));

            let mut output = match self.run_provider(provider.as_ref(), target, &ctx).await {
                Ok(output) => output,
                Err(issue) => {
                    issues.push(issue.for_agent(&target.id));
                    continue;
                }
            };

            issues.extend(output.issues.drain(..).map(|i| i.for_agent(&target.id)));
            if output.is_match() {
                tally.record_match(weights.get(kind));
                evidence.extend(output.evidence);
            }
            versions.extend(output.versions);
        }

        let confidence = tally.confidence();
        tracing::debug!(
            target_id = %target.id,
            confidence,
            possible = tally.possible(),
            matched = tally.matched(),
            "target scored"
        );

        let detected = if evidence.is_empty() || confidence < self.config.confidence_threshold {
            None
        } else {
            Some(DetectedAgent {
                agent_id: target.id.clone(),
                name: target.name.clone(),
                confidence,
                status: PresenceStatus::from_evidence(&evidence),
                evidence,
                versions,
                detected_at: chrono::Utc::now(),
            })
        };

        TargetScan {
            confidence,
            detected,
            issues,
        }
    }

    fn is_enabled(&self, kind: ProviderKind) -> bool {
        kind != ProviderKind::Process || self.config.check_processes
    }

    /// Call one provider, turning errors and panics into an issue.
    async fn run_provider(
        &self,
        provider: &dyn DetectionProvider,
        target: &DiscoveryTarget,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProviderOutput, DiscoveryIssue> {
        let kind = provider.kind();
        match AssertUnwindSafe(provider.detect(target, ctx)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => {
                tracing::warn!(target_id = %target.id, provider = %kind, "provider failed: {err}");
                Err(provider_issue(kind, &err))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(target_id = %target.id, provider = %kind, "provider panicked: {message}");
                Err(DiscoveryIssue::error(
                    codes::PROVIDER_PANICKED,
                    format!("{kind} provider panicked: {message}"),
                )
                .with_metadata("provider", kind.as_ref()))
            }
        }
    }
}

fn provider_issue(kind: ProviderKind, err: &DiscoveryError) -> DiscoveryIssue {
    DiscoveryIssue::from_error(err.issue_code(), err)
        .with_metadata("provider", kind.as_ref())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProcessProvider;
    use crate::{DetectionEvidence, EnvPattern, IssueLevel, WeightOverrides};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Matches targets whose id is in `hits`.
    struct FakeProvider {
        kind: ProviderKind,
        hits: Vec<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        fn new(kind: ProviderKind, hits: &[&'static str]) -> Self {
            Self {
                kind,
                hits: hits.to_vec(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl DetectionProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hits.contains(&target.id.as_str()) {
                let mut out = ProviderOutput::with_evidence(DetectionEvidence::new(
                    self.kind,
                    format!("fake {}", self.kind),
                    ctx.weight(self.kind),
                ));
                if self.kind == ProviderKind::Binary {
                    out.versions = vec!["1.0.0".to_string(), "1.0.0".to_string(), "2.0.0".to_string()];
                }
                Ok(out)
            } else {
                Ok(ProviderOutput::none())
            }
        }
    }

    struct FailingProvider(ProviderKind, DiscoveryError);

    #[async_trait]
    impl DetectionProvider for FailingProvider {
        fn kind(&self) -> ProviderKind {
            self.0
        }

        async fn detect(&self, _: &DiscoveryTarget, _: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
            Err(self.1.clone())
        }
    }

    struct PanickingProvider(ProviderKind);

    #[async_trait]
    impl DetectionProvider for PanickingProvider {
        fn kind(&self) -> ProviderKind {
            self.0
        }

        async fn detect(&self, target: &DiscoveryTarget, _: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
            panic!("cannot probe {}", target.id);
        }
    }

    /// Records the order targets are probed in.
    struct RecordingProvider(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl DetectionProvider for RecordingProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Filesystem
        }

        async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
            self.0.lock().unwrap().push(target.id.clone());
            Ok(ProviderOutput::with_evidence(DetectionEvidence::new(
                ProviderKind::Filesystem,
                "recorded",
                ctx.weight(ProviderKind::Filesystem),
            )))
        }
    }

    fn fs_env_target(id: &str) -> DiscoveryTarget {
        DiscoveryTarget {
            filesystem_signals: vec![format!(".{id}")],
            env_signals: vec![EnvPattern::prefix(format!("{}_", id.to_uppercase()))],
            ..DiscoveryTarget::new(id, id)
        }
    }

    fn low_threshold() -> DiscoveryConfig {
        DiscoveryConfig {
            confidence_threshold: 1,
            ..Default::default()
        }
    }

    fn engine(targets: Vec<DiscoveryTarget>, config: DiscoveryConfig, providers: Vec<Arc<dyn DetectionProvider>>) -> DiscoveryEngine {
        DiscoveryEngine::new(targets, "/nonexistent", config).with_providers(providers)
    }

    #[tokio::test]
    async fn test_weighted_confidence() {
        let e = engine(
            vec![fs_env_target("alpha")],
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &[])),
            ],
        );
        let result = e.scan().await;
        assert_eq!(result.detected.len(), 1);
        let agent = &result.detected[0];
        assert_eq!(agent.confidence, 60);
        assert_eq!(agent.status, PresenceStatus::Installed);
        assert_eq!(agent.evidence.len(), 1);
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_all_categories_match() {
        let e = engine(
            vec![fs_env_target("alpha")],
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &["alpha"])),
            ],
        );
        let result = e.scan().await;
        assert_eq!(result.detected[0].confidence, 100);
    }

    #[tokio::test]
    async fn test_env_only_is_available() {
        let e = engine(
            vec![fs_env_target("alpha")],
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &[])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &["alpha"])),
            ],
        );
        let agent = &e.scan().await.detected[0];
        assert_eq!(agent.confidence, 40);
        assert_eq!(agent.status, PresenceStatus::Available);
    }

    #[tokio::test]
    async fn test_process_evidence_means_running() {
        let target = DiscoveryTarget {
            process_signals: vec![regex::Regex::new("alpha").unwrap()],
            ..fs_env_target("alpha")
        };
        let e = engine(
            vec![target],
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &[])),
                Arc::new(FakeProvider::new(ProviderKind::Process, &["alpha"])),
            ],
        );
        let agent = &e.scan().await.detected[0];
        assert_eq!(agent.status, PresenceStatus::Running);
        // (6 + 10) / (6 + 4 + 10)
        assert_eq!(agent.confidence, 80);
    }

    #[tokio::test]
    async fn test_threshold_filters() {
        let config = DiscoveryConfig {
            confidence_threshold: 61,
            ..Default::default()
        };
        let e = engine(
            vec![fs_env_target("alpha")],
            config,
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &[])),
            ],
        );
        assert!(e.scan().await.detected.is_empty());

        let scan = e.scan_target(&fs_env_target("alpha")).await;
        assert_eq!(scan.confidence, 60);
        assert!(scan.detected.is_none());
    }

    #[tokio::test]
    async fn test_threshold_zero_still_needs_evidence() {
        let config = DiscoveryConfig {
            confidence_threshold: 0,
            ..Default::default()
        };
        let e = engine(
            vec![fs_env_target("alpha")],
            config,
            vec![Arc::new(FakeProvider::new(ProviderKind::Filesystem, &[]))],
        );
        assert!(e.scan().await.detected.is_empty());
    }

    #[tokio::test]
    async fn test_target_without_signals_never_detected() {
        let fake = FakeProvider::new(ProviderKind::Filesystem, &["empty"]);
        let calls = fake.calls.clone();
        let config = DiscoveryConfig {
            confidence_threshold: 0,
            ..Default::default()
        };
        let e = engine(vec![DiscoveryTarget::new("empty", "Empty")], config, vec![Arc::new(fake)]);
        let scan = e.scan_target(&DiscoveryTarget::new("empty", "Empty")).await;
        assert_eq!(scan.confidence, 0);
        assert!(scan.detected.is_none());
        assert!(e.scan().await.detected.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stable_sort_by_confidence() {
        let targets = vec![
            fs_env_target("low"),
            fs_env_target("tie-a"),
            fs_env_target("high"),
            fs_env_target("tie-b"),
        ];
        let e = engine(
            targets,
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["tie-a", "high", "tie-b"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &["low", "high"])),
            ],
        );
        let result = e.scan().await;
        let order: Vec<_> = result.detected.iter().map(|a| (a.agent_id.as_str(), a.confidence)).collect();
        assert_eq!(order, vec![("high", 100), ("tie-a", 60), ("tie-b", 60), ("low", 40)]);
    }

    #[tokio::test]
    async fn test_stable_sort_with_concurrency() {
        let ids: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
        let targets: Vec<_> = ids.iter().map(|id| fs_env_target(id)).collect();
        let config = DiscoveryConfig {
            max_concurrency: 5,
            ..low_threshold()
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let e = engine(targets, config, vec![Arc::new(RecordingProvider(seen.clone()))]);
        let result = e.scan().await;
        let order: Vec<_> = result.detected.iter().map(|a| a.agent_id.clone()).collect();
        assert_eq!(order, ids);
        assert_eq!(seen.lock().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_versions_deduplicated() {
        let target = DiscoveryTarget {
            binaries: vec!["alpha".to_string()],
            ..DiscoveryTarget::new("alpha", "Alpha")
        };
        let e = engine(
            vec![target],
            low_threshold(),
            vec![Arc::new(FakeProvider::new(ProviderKind::Binary, &["alpha"]))],
        );
        let agent = &e.scan().await.detected[0];
        let versions: Vec<_> = agent.versions.iter().cloned().collect();
        assert_eq!(versions, vec!["1.0.0".to_string(), "2.0.0".to_string()]);
    }

    #[tokio::test]
    async fn test_provider_error_becomes_issue() {
        let e = engine(
            vec![fs_env_target("alpha"), fs_env_target("beta")],
            low_threshold(),
            vec![
                Arc::new(FailingProvider(
                    ProviderKind::Filesystem,
                    DiscoveryError::PermissionDenied { path: "/secret".into() },
                )),
                Arc::new(FakeProvider::new(ProviderKind::Env, &["alpha", "beta"])),
            ],
        );
        let result = e.scan().await;
        assert_eq!(result.detected.len(), 2);
        assert_eq!(result.detected[0].confidence, 40);
        assert_eq!(result.issues.len(), 2);
        for (issue, id) in result.issues.iter().zip(["alpha", "beta"]) {
            assert_eq!(issue.level, IssueLevel::Error);
            assert_eq!(issue.code, codes::PROVIDER_FAILED);
            assert_eq!(issue.agent_id.as_deref(), Some(id));
            assert_eq!(issue.metadata["provider"], "filesystem");
        }
    }

    #[tokio::test]
    async fn test_provider_timeout_error_is_warning() {
        let e = engine(
            vec![fs_env_target("alpha")],
            low_threshold(),
            vec![Arc::new(FailingProvider(
                ProviderKind::Env,
                DiscoveryError::Timeout {
                    probe: "env".to_string(),
                    after: std::time::Duration::from_millis(1),
                },
            ))],
        );
        let result = e.scan().await;
        assert!(result.detected.is_empty());
        assert_eq!(result.issues[0].level, IssueLevel::Warn);
        assert_eq!(result.issues[0].code, codes::PROVIDER_TIMEOUT);
    }

    #[tokio::test]
    async fn test_provider_panic_is_contained() {
        let e = engine(
            vec![fs_env_target("alpha"), fs_env_target("beta")],
            low_threshold(),
            vec![
                Arc::new(PanickingProvider(ProviderKind::Env)),
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["beta"])),
            ],
        );
        let result = e.scan().await;
        assert_eq!(result.detected.len(), 1);
        assert_eq!(result.detected[0].agent_id, "beta");
        assert_eq!(result.issues.len(), 2);
        assert!(result.issues.iter().all(|i| i.code == codes::PROVIDER_PANICKED));
        assert!(result.issues[0].message.contains("cannot probe alpha"));
        assert_eq!(result.issues_for("beta").count(), 1);
    }

    #[tokio::test]
    async fn test_check_processes_off_skips_category() {
        let fake = FakeProvider::new(ProviderKind::Process, &["alpha"]);
        let calls = fake.calls.clone();
        let target = DiscoveryTarget {
            process_signals: vec![regex::Regex::new("alpha").unwrap()],
            ..fs_env_target("alpha")
        };
        let config = DiscoveryConfig {
            check_processes: false,
            ..low_threshold()
        };
        let e = engine(
            vec![target],
            config,
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &[])),
                Arc::new(fake),
            ],
        );
        let agent = &e.scan().await.detected[0];
        assert_eq!(agent.confidence, 60);
        assert_eq!(agent.status, PresenceStatus::Installed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_process_timeout_tagged_per_target() {
        let targets: Vec<_> = ["alpha", "beta"]
            .into_iter()
            .map(|id| DiscoveryTarget {
                process_signals: vec![regex::Regex::new(id).unwrap()],
                ..fs_env_target(id)
            })
            .collect();
        let config = DiscoveryConfig {
            process_timeout: std::time::Duration::from_millis(50),
            ..low_threshold()
        };
        let e = engine(
            targets,
            config,
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(ProcessProvider::with_lister(crate::providers::process_tests::HangingLister)),
            ],
        );
        let result = e.scan().await;
        assert_eq!(result.detected.len(), 1);
        assert_eq!(result.detected[0].status, PresenceStatus::Installed);
        // 6 / (6 + 10)
        assert_eq!(result.detected[0].confidence, 38);
        assert_eq!(result.issues_for("alpha").count(), 1);
        assert_eq!(result.issues_for("beta").count(), 1);
        assert!(result.issues.iter().all(|i| i.code == codes::PROCESS_TIMEOUT));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_own_version_checks_not_seen_as_running() {
        use crate::providers::binary_tests::fake_binary;
        use crate::providers::BinaryProvider;

        let dir = tempfile::tempdir().unwrap();
        let slow = fake_binary(dir.path(), "slow-agent", "sleep 1\necho 'slow-agent 3.1.4'");
        let slow = slow.display().to_string();
        let probed = DiscoveryTarget {
            binaries: vec![slow.clone()],
            process_signals: vec![regex::Regex::new(&format!(r"{}(\s|$)", regex::escape(&slow))).unwrap()],
            ..DiscoveryTarget::new("slow-agent", "Slow Agent")
        };
        let idle = DiscoveryTarget {
            process_signals: vec![regex::Regex::new("^acp-presence-idle-agent$").unwrap()],
            ..DiscoveryTarget::new("idle-agent", "Idle Agent")
        };
        let config = DiscoveryConfig {
            max_concurrency: 2,
            ..Default::default()
        };
        let e = engine(
            vec![probed, idle],
            config,
            vec![Arc::new(BinaryProvider), Arc::new(ProcessProvider::new())],
        );

        let result = e.scan().await;
        assert_eq!(result.detected.len(), 1);
        let agent = &result.detected[0];
        assert_eq!(agent.agent_id, "slow-agent");
        assert_eq!(agent.status, PresenceStatus::Installed);
        assert!(agent.evidence.iter().all(|ev| ev.provider != ProviderKind::Process));
        // 8 / (8 + 10)
        assert_eq!(agent.confidence, 44);
        assert!(agent.versions.contains("3.1.4"));
    }

    #[tokio::test]
    async fn test_snapshot_captured_once_before_targets() {
        let lister = crate::providers::process_tests::StaticLister::new(Vec::new());
        let calls = lister.calls.clone();
        let targets: Vec<_> = ["alpha", "beta", "gamma"]
            .into_iter()
            .map(|id| DiscoveryTarget {
                process_signals: vec![regex::Regex::new(id).unwrap()],
                ..DiscoveryTarget::new(id, id)
            })
            .collect();
        let config = DiscoveryConfig {
            max_concurrency: 3,
            ..low_threshold()
        };
        let e = engine(targets, config, vec![Arc::new(ProcessProvider::with_lister(lister))]);
        assert!(e.scan().await.detected.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_snapshot_when_processes_disabled() {
        let lister = crate::providers::process_tests::StaticLister::new(Vec::new());
        let calls = lister.calls.clone();
        let target = DiscoveryTarget {
            process_signals: vec![regex::Regex::new("alpha").unwrap()],
            ..fs_env_target("alpha")
        };
        let config = DiscoveryConfig {
            check_processes: false,
            ..low_threshold()
        };
        let e = engine(vec![target], config, vec![Arc::new(ProcessProvider::with_lister(lister))]);
        e.scan().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_weight_override_falls_back() {
        let target = DiscoveryTarget {
            weights: WeightOverrides {
                filesystem: Some(-1.0),
                env: Some(6.0),
                ..Default::default()
            },
            ..fs_env_target("alpha")
        };
        let e = engine(
            vec![target],
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &[])),
            ],
        );
        let result = e.scan().await;
        // filesystem keeps its default 6 against env's override 6
        assert_eq!(result.detected[0].confidence, 50);
        assert_eq!(result.detected[0].evidence[0].confidence_weight, 6.0);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, codes::INVALID_WEIGHT_OVERRIDE);
        assert_eq!(result.issues[0].agent_id.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn test_scan_is_repeatable() {
        let e = engine(
            vec![fs_env_target("alpha"), fs_env_target("beta")],
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &["alpha", "beta"])),
            ],
        );
        let first = e.scan().await;
        let second = e.scan().await;
        let strip = |r: &DiscoveryResult| {
            r.detected
                .iter()
                .map(|a| (a.agent_id.clone(), a.confidence, a.status, a.evidence.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(&first), strip(&second));
        assert_eq!(first.issues, second.issues);
    }

    #[tokio::test]
    async fn test_set_config_applies_to_next_scan() {
        let mut e = engine(
            vec![fs_env_target("alpha")],
            low_threshold(),
            vec![
                Arc::new(FakeProvider::new(ProviderKind::Filesystem, &["alpha"])),
                Arc::new(FakeProvider::new(ProviderKind::Env, &[])),
            ],
        );
        assert_eq!(e.scan().await.detected.len(), 1);
        e.set_config(DiscoveryConfig {
            confidence_threshold: 90,
            ..Default::default()
        });
        assert!(e.scan().await.detected.is_empty());
        assert_eq!(e.config().confidence_threshold, 90);
    }
}
