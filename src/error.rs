//! Typed probe failures.

use crate::issue::{codes, IssueLevel};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Typed error variants for probe failures.
///
/// Providers return these from [`DetectionProvider::detect`]; the engine never
/// lets one escape a scan. Each variant maps onto a stable issue code and a
/// severity so it can be reported through [`DiscoveryIssue`].
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error types
/// in future versions.
///
/// [`DetectionProvider::detect`]: crate::DetectionProvider::detect
/// [`DiscoveryIssue`]: crate::DiscoveryIssue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// A probe exceeded its time budget.
    #[error("{probe} timed out after {after:?}")]
    Timeout {
        /// What was being probed (e.g. "process enumeration").
        probe: String,
        /// The budget that was exceeded.
        after: Duration,
    },

    /// Permission denied accessing a path or executable.
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        /// The path that could not be accessed.
        path: PathBuf,
    },

    /// I/O error while probing.
    #[error("{context}: {message}")]
    Io {
        /// What the probe was doing.
        context: String,
        /// The underlying error message.
        message: String,
    },

    /// A helper command ran but exited unsuccessfully.
    #[error("{program} exited with code {code:?}")]
    CommandFailed {
        /// The program that was run.
        program: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
    },

    /// Failed to extract a version from probe output.
    #[error("failed to parse version")]
    VersionParseFailed,

    /// The process table could not be read on this host.
    #[error("process list unavailable: {message}")]
    ProcessListUnavailable {
        /// Why the list could not be produced.
        message: String,
    },
}

impl DiscoveryError {
    /// Wrap an [`std::io::Error`], keeping permission failures distinct.
    pub fn from_io(context: impl Into<String>, path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path: path.into() }
        } else {
            Self::Io {
                context: context.into(),
                message: err.to_string(),
            }
        }
    }

    /// Severity this failure is reported with.
    ///
    /// Timeouts are expected on slow hosts and degrade to a warning; every
    /// other failure is an error.
    pub fn level(&self) -> IssueLevel {
        match self {
            Self::Timeout { .. } => IssueLevel::Warn,
            _ => IssueLevel::Error,
        }
    }

    /// Whether the failure is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Stable issue code for a provider call that failed with this error.
    pub fn issue_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => codes::PROVIDER_TIMEOUT,
            _ => codes::PROVIDER_FAILED,
        }
    }
}
