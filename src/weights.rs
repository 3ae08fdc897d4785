//! Provider weight table and per-target overrides.

use crate::ProviderKind;
use serde::{Deserialize, Serialize};

/// Default weight of each provider category.
///
/// A live process is the strongest proof of active use, a resolvable binary
/// next; a matching environment variable only shows configuration.
pub const DEFAULT_WEIGHTS: ProviderWeights = ProviderWeights {
    filesystem: 6.0,
    process: 10.0,
    env: 4.0,
    binary: 8.0,
    app: 7.0,
};

/// A fully resolved weight for every provider category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderWeights {
    pub filesystem: f64,
    pub process: f64,
    pub env: f64,
    pub binary: f64,
    pub app: f64,
}

impl Default for ProviderWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl ProviderWeights {
    pub fn get(&self, kind: ProviderKind) -> f64 {
        match kind {
            ProviderKind::Filesystem => self.filesystem,
            ProviderKind::Process => self.process,
            ProviderKind::Env => self.env,
            ProviderKind::Binary => self.binary,
            ProviderKind::App => self.app,
        }
    }

    fn slot(&mut self, kind: ProviderKind) -> &mut f64 {
        match kind {
            ProviderKind::Filesystem => &mut self.filesystem,
            ProviderKind::Process => &mut self.process,
            ProviderKind::Env => &mut self.env,
            ProviderKind::Binary => &mut self.binary,
            ProviderKind::App => &mut self.app,
        }
    }

    /// Apply per-key overrides on top of this table.
    ///
    /// Overrides that are negative or not finite are skipped and returned
    /// alongside the resolved table so the caller can report them; the base
    /// weight stays in effect for those keys.
    pub fn resolve(&self, overrides: &WeightOverrides) -> (ProviderWeights, Vec<(ProviderKind, f64)>) {
        let mut resolved = *self;
        let mut rejected = Vec::new();
        for (kind, value) in overrides.entries() {
            if value.is_finite() && value >= 0.0 {
                *resolved.slot(kind) = value;
            } else {
                rejected.push((kind, value));
            }
        }
        (resolved, rejected)
    }
}

/// Partial weight table supplied by a target.
///
/// Unknown keys are ignored on deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<f64>,
}

impl WeightOverrides {
    pub fn get(&self, kind: ProviderKind) -> Option<f64> {
        match kind {
            ProviderKind::Filesystem => self.filesystem,
            ProviderKind::Process => self.process,
            ProviderKind::Env => self.env,
            ProviderKind::Binary => self.binary,
            ProviderKind::App => self.app,
        }
    }

    fn entries(&self) -> impl Iterator<Item = (ProviderKind, f64)> + '_ {
        use strum::IntoEnumIterator;
        ProviderKind::iter().filter_map(move |kind| self.get(kind).map(|w| (kind, w)))
    }
}
