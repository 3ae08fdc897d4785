//! Home and environment expansion for configured paths.

use std::path::PathBuf;

/// The current user's home directory.
pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}
/// Whether `path` is `~` or starts with `~/` or `~\`.
/// Whether `path` is `~` or starts with `~/` or `~\\`.
///
/// Other `~` prefixes such as `~user/x` are ordinary relative names.
pub(crate) fn is_home_relative(path: &str) -> bool {
    path == "~" || path.starts_with("~/") || path.starts_with("~\\")
}

/// Expand a leading `~/`, `%NAME%` or `$NAME` segment.
///
/// Returns `None` when the referenced directory or variable is not set, so
/// the path can never match.
pub(crate) fn expand(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return home_dir();
    }
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        return home_dir().map(|h| h.join(rest));
    }
    if let Some(rest) = path.strip_prefix('%') {
        let (name, tail) = rest.split_once('%')?;
        return var_joined(name, tail);
    }
    if let Some(rest) = path.strip_prefix('$') {
        let end = rest.find(['/', '\\']).unwrap_or(rest.len());
        let (name, tail) = rest.split_at(end);
        return var_joined(name, tail);
    }
    Some(PathBuf::from(path))
}

fn var_joined(name: &str, tail: &str) -> Option<PathBuf> {
    let base = std::env::var_os(name).filter(|v| !v.is_empty())?;
    let tail = tail.trim_start_matches(['/', '\\']);
    let base = PathBuf::from(base);
    Some(if tail.is_empty() { base } else { base.join(tail) })
}
