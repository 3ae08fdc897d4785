//! PATH-based executable lookup with fallback locations.

use crate::providers::paths::home_dir;
use std::path::{Path, PathBuf};

/// System fallback paths to check if executable not found in PATH.
const FALLBACK_PATHS: &[&str] = &["/usr/local/bin", "/usr/bin"];

/// User directories, relative to home, where CLIs are commonly installed.
const HOME_FALLBACKS: &[&str] = &[".local/bin", "bin"];

/// Find an executable by name.
///
/// Tries the search path via the `which` crate first, then common system
/// and per-user install directories that are not always on `PATH`.
pub(crate) fn find_executable(name: &str) -> Option<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Some(path);
    }

    let system = FALLBACK_PATHS.iter().map(PathBuf::from);
    let user = home_dir()
        .into_iter()
        .flat_map(|home| HOME_FALLBACKS.iter().map(move |dir| home.join(dir)));

    system.chain(user).map(|dir| dir.join(name)).find(|p| is_file(p))
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

/// Guess how the executable was installed from its location.
pub(crate) fn install_method(path: &Path) -> Option<&'static str> {
    let path_str = path.to_string_lossy();

    if path_str.contains(".npm") || path_str.contains("node_modules") {
        Some("npm")
    } else if path_str.contains(".cargo") {
        Some("cargo")
    } else if path_str.contains("homebrew") || path_str.contains("linuxbrew") {
        Some("brew")
    } else if path_str.contains("mise") {
        Some("mise")
    } else {
        None
    }
}
