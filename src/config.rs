//! Discovery configuration.
//!
//! This module provides the [`DiscoveryConfig`] struct for configuring a
//! [`DiscoveryEngine`](crate::DiscoveryEngine): the confidence threshold,
//! probe timeouts, extra scan roots and patterns, and concurrency.

use crate::EnvPattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration options for a discovery scan.
///
/// A config is bound to the engine at construction and stays fixed for the
/// duration of a scan; it may be replaced between scans.
///
/// # Default Behavior
///
/// Targets need a confidence of at least 20 to be reported. Process
/// checks are enabled and each blocking probe (process enumeration, a single
/// `--version` run) gets 5 seconds.
///
/// # Example
///
/// ```rust
/// use acp_presence::DiscoveryConfig;
/// use std::time::Duration;
///
/// // Use default options
/// let config = DiscoveryConfig::default();
///
/// // Report anything with any evidence, skip the process table
/// let config = DiscoveryConfig {
///     confidence_threshold: 1,
///     check_processes: false,
///     ..Default::default()
/// };
///
/// // Tighter probe budget
/// let config = DiscoveryConfig {
///     process_timeout: Duration::from_millis(750),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// Extra attempts for a `--version` probe that failed with an I/O error.
    ///
    /// Timeouts are never retried.
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Delay between `--version` probe attempts.
    ///
    /// Default: 500 milliseconds
    #[serde(rename = "retryDelayMs", with = "crate::serde_ext::duration_ms")]
    pub retry_delay: Duration,

    /// Minimum confidence (0-100) for a target to be reported.
    ///
    /// Default: 20
    pub confidence_threshold: u8,

    /// Global switch for the process provider.
    ///
    /// When `false`, process signals are not applicable to any target: they
    /// are neither probed nor counted towards the possible weight.
    ///
    /// Default: `true`
    pub check_processes: bool,

    /// Budget for each blocking probe.
    ///
    /// Applies individually to process enumeration and to every
    /// `--version` run.
    ///
    /// Default: 5 seconds
    #[serde(rename = "processTimeoutMs", with = "crate::serde_ext::duration_ms")]
    pub process_timeout: Duration,

    /// Roots checked for filesystem signals in addition to the engine's cwd.
    pub additional_paths: Vec<PathBuf>,

    /// Env patterns merged into every target that configures env signals.
    pub additional_env_patterns: Vec<EnvPattern>,

    /// Command lines matching any of these never count as process signals.
    #[serde(with = "crate::serde_ext::regex_vec")]
    pub process_exclusion_patterns: Vec<Regex>,

    /// Maximum number of targets probed at once.
    ///
    /// Bounds the number of concurrent `--version` subprocesses. Zero is
    /// treated as one.
    ///
    /// Default: 4
    pub max_concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            confidence_threshold: 20,
            check_processes: true,
            process_timeout: Duration::from_secs(5),
            additional_paths: Vec::new(),
            additional_env_patterns: Vec::new(),
            process_exclusion_patterns: Vec::new(),
            max_concurrency: 4,
        }
    }
}
