//! Executable detection with version probing.
//!
//! - `find_executable`: PATH-based lookup with fallbacks
//! - `check_version`: bounded `--version` run
//! - `parse_version`: regex-based version extraction from CLI output

mod parser;
mod path_finder;
mod version;

use super::{DetectionProvider, ProbeContext, ProviderOutput};
use crate::issue::codes;
use crate::{DetectionEvidence, DiscoveryConfig, DiscoveryError, DiscoveryIssue, DiscoveryTarget, ProviderKind};
use async_trait::async_trait;
use parser::parse_version;
use path_finder::{find_executable, install_method};
use semver::Version;
use std::path::{Path, PathBuf};
use version::check_version;

/// Resolves the target's executables and asks each for its version.
///
/// Any resolved executable yields a single evidence item for the category.
/// Version probes only enrich the result: a slow or failing probe becomes a
/// warning and never removes the evidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryProvider;

#[async_trait]
impl DetectionProvider for BinaryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Binary
    }

    async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
        let mut output = ProviderOutput::none();
        let mut found: Vec<(&str, PathBuf)> = Vec::new();

        for name in &target.binaries {
            let Some(path) = find_executable(name) else {
                tracing::trace!(target_id = %target.id, binary = %name, "not found");
                continue;
            };

            match probe_version(&path, ctx.config()).await {
                Ok(Some(version)) => {
                    let version = version.to_string();
                    if !output.versions.contains(&version) {
                        output.versions.push(version);
                    }
                }
                Ok(None) => {
                    tracing::debug!(target_id = %target.id, binary = %name, "no version in --version output");
                }
                Err(err) => {
                    tracing::warn!(target_id = %target.id, binary = %name, "version probe failed: {err}");
                    let code = if err.is_timeout() {
                        codes::VERSION_PROBE_TIMEOUT
                    } else {
                        codes::VERSION_PROBE_FAILED
                    };
                    output
                        .issues
                        .push(DiscoveryIssue::warn(code, err.to_string()).with_metadata("binary", name.as_str()));
                }
            }
            found.push((name.as_str(), path));
        }

        let Some((first_name, first_path)) = found.first() else {
            return Ok(output);
        };

        let mut evidence = DetectionEvidence::new(
            ProviderKind::Binary,
            format!("{} found at {}", first_name, first_path.display()),
            ctx.weight(ProviderKind::Binary),
        )
        .with_metadata(
            "paths",
            found
                .iter()
                .map(|(_, p)| p.display().to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        if let Some(method) = found.iter().find_map(|(_, p)| install_method(p)) {
            evidence = evidence.with_metadata("installMethod", method);
        }
        tracing::debug!(target_id = %target.id, binaries = found.len(), versions = ?output.versions, "binary signals found");
        output.evidence.push(evidence);
        Ok(output)
    }
}

/// Run the version probe, retrying spawn failures up to `max_retries` times.
///
/// Timeouts, permission failures and unsuccessful exits are returned
/// immediately. Output without a version triple is `Ok(None)`.
async fn probe_version(path: &Path, config: &DiscoveryConfig) -> Result<Option<Version>, DiscoveryError> {
    let mut attempt = 0;
    loop {
        match check_version(path, config.process_timeout).await {
            Ok(out) => return Ok(parse_version(&out).ok()),
            Err(err @ DiscoveryError::Io { .. }) if attempt < config.max_retries => {
                attempt += 1;
                tracing::debug!(path = %path.display(), attempt, "retrying version probe: {err}");
                tokio::time::sleep(config.retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
