//! Running process detection.
//!
//! The process table is listed at most once per scan, in
//! [`DetectionProvider::prepare`] before any target is probed, so the
//! `--version` probes the scan itself spawns never show up in it. Every
//! target matches its patterns against the same read-only list. A timed-out
//! or failed capture is shared the same way, and each target that wanted the
//! table reports it as its own issue.

use super::{DetectionProvider, ProbeContext, ProviderOutput};
use crate::issue::codes;
use crate::{DetectionEvidence, DiscoveryError, DiscoveryIssue, DiscoveryTarget, ProviderKind};
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Outcome of listing the process table once.
pub(crate) type ProcessSnapshot = Result<Arc<Vec<ProcessEntry>>, DiscoveryError>;

#[cfg(windows)]
const LIST_COMMAND: (&str, &[&str]) = ("tasklist", &["/FO", "CSV", "/NH"]);
#[cfg(not(windows))]
const LIST_COMMAND: (&str, &[&str]) = ("ps", &["-A", "-o", "pid=,args="]);

/// One row of the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    /// Full command line where the platform exposes it, image name otherwise.
    pub command: String,
}

impl ProcessEntry {
    pub fn new(pid: u32, command: impl Into<String>) -> Self {
        Self {
            pid,
            command: command.into(),
        }
    }

    /// File name of the executable, without arguments.
    ///
    /// Arguments can carry tokens or keys, so only this part is quoted in
    /// evidence.
    pub fn program(&self) -> &str {
        let exe = self.command.split_whitespace().next().unwrap_or_default();
        exe.rsplit(['/', '\\']).next().unwrap_or(exe)
    }
}

/// Source of the process table.
#[async_trait]
pub trait ProcessLister: Send + Sync {
    async fn list(&self) -> Result<Vec<ProcessEntry>, DiscoveryError>;
}

/// Lists processes with the platform's own tooling.
///
/// `ps -A -o pid=,args=` on Unix, `tasklist /FO CSV /NH` on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessLister;

#[async_trait]
impl ProcessLister for SystemProcessLister {
    async fn list(&self) -> Result<Vec<ProcessEntry>, DiscoveryError> {
        let (program, args) = LIST_COMMAND;
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DiscoveryError::ProcessListUnavailable {
                    message: format!("{program} not found"),
                },
                _ => DiscoveryError::from_io(format!("running {program}"), program, &e),
            })?;

        if !output.status.success() {
            return Err(DiscoveryError::CommandFailed {
                program: program.to_string(),
                code: output.status.code(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        #[cfg(windows)]
        let entries = parse_tasklist(&stdout);
        #[cfg(not(windows))]
        let entries = parse_ps(&stdout);
        Ok(entries)
    }
}

/// Parse `ps -o pid=,args=` output.
#[cfg_attr(windows, allow(dead_code))]
fn parse_ps(output: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, command) = line.trim().split_once(char::is_whitespace)?;
            let pid = pid.parse().ok()?;
            Some(ProcessEntry::new(pid, command.trim()))
        })
        .collect()
}

/// Parse `tasklist /FO CSV /NH` output.
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_tasklist(output: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().trim_matches('"').split("\",\"");
            let image = fields.next()?;
            let pid = fields.next()?.parse().ok()?;
            Some(ProcessEntry::new(pid, image))
        })
        .collect()
}

/// Matches command lines in the process table against the target's patterns.
///
/// Matches that also hit a target exclusion or
/// `config.process_exclusion_patterns` are discarded, and the scanning
/// process itself never counts.
#[derive(Clone)]
pub struct ProcessProvider {
    lister: Arc<dyn ProcessLister>,
}

impl std::fmt::Debug for ProcessProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessProvider").finish_non_exhaustive()
    }
}

impl Default for ProcessProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProvider {
    pub fn new() -> Self {
        Self::with_lister(SystemProcessLister)
    }

    pub fn with_lister(lister: impl ProcessLister + 'static) -> Self {
        Self {
            lister: Arc::new(lister),
        }
    }

    async fn snapshot<'a>(&self, ctx: &'a ProbeContext<'_>) -> &'a ProcessSnapshot {
        let budget = ctx.config().process_timeout;
        ctx.processes(|| capture(self.lister.as_ref(), budget)).await
    }
}

async fn capture(lister: &dyn ProcessLister, budget: Duration) -> ProcessSnapshot {
    match timeout(budget, lister.list()).await {
        Ok(Ok(processes)) => {
            tracing::debug!(count = processes.len(), "captured process table");
            Ok(Arc::new(processes))
        }
        Ok(Err(err)) => {
            tracing::warn!("process enumeration failed: {err}");
            Err(err)
        }
        Err(_) => {
            tracing::warn!(budget = ?budget, "process enumeration timed out");
            Err(DiscoveryError::Timeout {
                probe: "process enumeration".to_string(),
                after: budget,
            })
        }
    }
}

#[async_trait]
impl DetectionProvider for ProcessProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Process
    }

    async fn prepare(&self, ctx: &ProbeContext<'_>) {
        self.snapshot(ctx).await;
    }

    async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
        let processes = match self.snapshot(ctx).await {
            Ok(processes) => processes,
            Err(err) if err.is_timeout() => {
                return Ok(ProviderOutput::with_issue(DiscoveryIssue::warn(
                    codes::PROCESS_TIMEOUT,
                    err.to_string(),
                )));
            }
            Err(err) => {
                return Ok(ProviderOutput::with_issue(DiscoveryIssue::error(
                    codes::PROCESS_SCAN_FAILED,
                    err.to_string(),
                )));
            }
        };

        let own_pid = std::process::id();
        let exclusions: Vec<&Regex> = target
            .process_exclusions
            .iter()
            .chain(ctx.config().process_exclusion_patterns.iter())
            .collect();

        let matched: Vec<&ProcessEntry> = processes
            .iter()
            .filter(|p| p.pid != own_pid)
            .filter(|p| target.process_signals.iter().any(|re| re.is_match(&p.command)))
            .filter(|p| !exclusions.iter().any(|re| re.is_match(&p.command)))
            .collect();

        let Some(first) = matched.first() else {
            return Ok(ProviderOutput::none());
        };

        let pids: Vec<String> = matched.iter().map(|p| p.pid.to_string()).collect();
        tracing::debug!(target_id = %target.id, pids = ?pids, "process signals found");
        Ok(ProviderOutput::with_evidence(
            DetectionEvidence::new(
                ProviderKind::Process,
                format!("process {} running: {}", first.pid, first.program()),
                ctx.weight(ProviderKind::Process),
            )
            .with_metadata("pids", pids.join(",")),
        ))
    }
}
