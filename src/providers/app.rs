//! Application install location detection.

use super::paths::expand;
use super::{DetectionProvider, ProbeContext, ProviderOutput};
use crate::{DetectionEvidence, DiscoveryError, DiscoveryTarget, ProviderKind};
use async_trait::async_trait;

/// Checks well-known install locations for the current platform only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppPathProvider;

#[async_trait]
impl DetectionProvider for AppPathProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::App
    }

    async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
        let hit = target
            .current_app_paths()
            .iter()
            .filter_map(|p| expand(p))
            .find(|p| p.exists());

        Ok(match hit {
            Some(path) => {
                tracing::debug!(target_id = %target.id, path = %path.display(), "app install found");
                ProviderOutput::with_evidence(
                    DetectionEvidence::new(
                        ProviderKind::App,
                        format!("application installed at {}", path.display()),
                        ctx.weight(ProviderKind::App),
                    )
                    .with_metadata("path", path.display().to_string()),
                )
            }
            None => ProviderOutput::none(),
        })
    }
}
