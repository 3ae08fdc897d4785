//! Version output parsing with regex extraction.

use crate::DiscoveryError;
use regex::Regex;
use semver::Version;
use std::sync::OnceLock;

fn semver_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("Invalid regex pattern"))
}

/// Parse a semantic version from CLI output.
///
/// Extracts the first `major.minor.patch` triple from arbitrary output:
///
/// - `2.1.12 (Claude Code)` -> 2.1.12
/// - `codex-cli 0.87.0` -> 0.87.0
/// - `1.1.25` -> 1.1.25
///
/// Returns `Err(DiscoveryError::VersionParseFailed)` if no triple is found
/// or it is not valid semver.
pub(crate) fn parse_version(output: &str) -> Result<Version, DiscoveryError> {
    let found = semver_pattern()
        .find(output)
        .ok_or(DiscoveryError::VersionParseFailed)?;
    Version::parse(found.as_str()).map_err(|_| DiscoveryError::VersionParseFailed)
}
