//! Environment variable detection.

use super::{DetectionProvider, ProbeContext, ProviderOutput};
use crate::{DetectionEvidence, DiscoveryError, DiscoveryTarget, ProviderKind};
use async_trait::async_trait;

/// Matches environment variable names against the target's patterns.
///
/// The target's own patterns are merged with
/// `config.additional_env_patterns`. Only names are inspected and reported;
/// values never leave the process.
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    names: Option<Vec<String>>,
}

impl EnvProvider {
    /// Read names from the live process environment at probe time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed set of names instead of the process environment.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    fn current_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => std::env::vars_os()
                .map(|(name, _)| name.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

#[async_trait]
impl DetectionProvider for EnvProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Env
    }

    async fn detect(&self, target: &DiscoveryTarget, ctx: &ProbeContext<'_>) -> Result<ProviderOutput, DiscoveryError> {
        let patterns: Vec<_> = target
            .env_signals
            .iter()
            .chain(ctx.config().additional_env_patterns.iter())
            .collect();

        let mut matched: Vec<String> = self
            .current_names()
            .into_iter()
            .filter(|name| patterns.iter().any(|p| p.matches(name)))
            .collect();
        if matched.is_empty() {
            return Ok(ProviderOutput::none());
        }
        matched.sort();
        matched.dedup();

        tracing::debug!(target_id = %target.id, variables = ?matched, "env signals found");
        Ok(ProviderOutput::with_evidence(
            DetectionEvidence::new(
                ProviderKind::Env,
                format!("environment variable {} is set", matched[0]),
                ctx.weight(ProviderKind::Env),
            )
            .with_metadata("variables", matched.join(",")),
        ))
    }
}
