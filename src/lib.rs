//! # acp-presence
//!
//! Weighted multi-provider presence discovery for AI coding agents.
//!
//! Answers "which of a known set of tools are present on this machine, and
//! how confident are we?" by combining partial, sometimes contradictory host
//! evidence into one reproducible confidence number per tool.
//!
//! ## Features
//!
//! - [`DiscoveryEngine`] scans a list of [`DiscoveryTarget`]s and ranks the
//!   detections by confidence
//! - Five providers: filesystem markers, environment variables, binaries on
//!   `PATH` (with `--version` probing), app install paths, running processes
//! - Degrades gracefully: timeouts, denied probes, even panicking providers
//!   become [`DiscoveryIssue`]s instead of failing the scan
//! - [`builtin_targets`] for Claude Code, Codex, OpenCode, Gemini CLI, Cursor
//!
//! ## Confidence
//!
//! Each provider category a target configures contributes its weight
//! (defaults: filesystem 6, process 10, env 4, binary 8, app 7) to the
//! possible total; categories that produced evidence contribute it to the
//! matched total. Confidence is `round(100 * matched / possible)`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use acp_presence::{builtin_targets, DiscoveryConfig, DiscoveryEngine};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let engine = DiscoveryEngine::new(builtin_targets(), ".", DiscoveryConfig::default());
//!     let result = engine.scan().await;
//!     for agent in &result.detected {
//!         println!("{} ({}): {}%", agent.name, agent.status, agent.confidence);
//!     }
//! }
//! ```

mod agent;
pub mod aggregate;
mod config;
mod engine;
mod error;
mod evidence;
pub mod issue;
pub mod providers;
mod registry;
mod serde_ext;
mod target;
mod weights;

pub use agent::{DetectedAgent, DiscoveryResult, PresenceStatus};
pub use config::DiscoveryConfig;
pub use engine::{DiscoveryEngine, TargetScan};
pub use error::DiscoveryError;
pub use evidence::{DetectionEvidence, ProviderKind};
pub use issue::{DiscoveryIssue, IssueLevel};
pub use providers::{DetectionProvider, ProbeContext, ProviderOutput};
pub use registry::{builtin_targets, KnownAgent};
pub use target::{DiscoveryTarget, EnvPattern, Platform};
pub use weights::{ProviderWeights, WeightOverrides, DEFAULT_WEIGHTS};
