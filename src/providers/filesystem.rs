//! Marker file and directory detection.

use super::paths::{expand, is_home_relative};
use super::{DetectionProvider, ProbeContext, ProviderOutput};
use crate::issue::codes;
use crate::{DetectionEvidence, DiscoveryError, DiscoveryIssue, DiscoveryTarget, ProviderKind};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Checks the target's filesystem signals under every scan root.
///
/// Roots are the engine's cwd followed by `config.additional_paths`.
/// Signals starting with `~/` are checked once, under the home directory.
/// Any hit yields a single evidence item for the whole category.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemProvider;

#[async_trait]
impl DetectionProvider for FilesystemProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Filesystem
    }

    async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
        let mut roots: Vec<&Path> = vec![ctx.cwd()];
        roots.extend(ctx.config().additional_paths.iter().map(PathBuf::as_path));

        let mut output = ProviderOutput::none();
        let mut matched: Vec<PathBuf> = Vec::new();
        for candidate in candidates(&target.filesystem_signals, &roots) {
            match probe(&candidate) {
                Ok(true) => {
                    if !matched.contains(&candidate) {
                        matched.push(candidate);
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(target_id = %target.id, path = %candidate.display(), "filesystem signal not checkable: {err}");
                    output.issues.push(
                        DiscoveryIssue::warn(codes::FILESYSTEM_ACCESS_DENIED, err.to_string())
                            .with_metadata("path", candidate.display().to_string()),
                    );
                }
            }
        }

        if matched.is_empty() {
            return Ok(output);
        }

        let listed: Vec<String> = matched.iter().map(|p| p.display().to_string()).collect();
        tracing::debug!(target_id = %target.id, matched = ?listed, "filesystem signals found");
        output.evidence.push(
            DetectionEvidence::new(
                ProviderKind::Filesystem,
                format!("found {}", listed[0]),
                ctx.weight(ProviderKind::Filesystem),
            )
            .with_metadata("matched", listed.join(",")),
        );
        Ok(output)
    }
}

/// Every concrete path a signal list refers to, in signal then root order.
fn candidates(signals: &[String], roots: &[&Path]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for signal in signals {
        if is_home_relative(signal) {
            if let Some(path) = expand(signal) {
                out.push(path);
            }
        } else if Path::new(signal).is_absolute() {
            out.push(PathBuf::from(signal));
        } else {
            out.extend(roots.iter().map(|root| root.join(signal)));
        }
    }
    out
}

/// Whether `path` exists; permission failures are reported, not swallowed.
fn probe(path: &Path) -> Result<bool, DiscoveryError> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(DiscoveryError::from_io("checking filesystem signal", path, &e))
        }
        Err(_) => Ok(false),
    }
}
