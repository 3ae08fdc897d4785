//! Bounded `--version` probes.

use crate::DiscoveryError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Run `<path> --version` and capture its output.
///
/// The child is killed if it outlives `budget`.
///
/// Returns stdout (stderr if stdout is empty), or:
/// - `Timeout` if the command takes longer than `budget`
/// - `PermissionDenied` if the executable cannot be run due to permissions
/// - `Io` if the command could not be spawned
/// - `CommandFailed` for non-zero exit codes
/// - `VersionParseFailed` if output is not valid UTF-8
pub(crate) async fn check_version(path: &Path, budget: Duration) -> Result<String, DiscoveryError> {
    let mut command = Command::new(path);
    command
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = timeout(budget, command.output())
        .await
        .map_err(|_| DiscoveryError::Timeout {
            probe: format!("{} --version", path.display()),
            after: budget,
        })?
        .map_err(|e| DiscoveryError::from_io(format!("running {}", path.display()), path, &e))?;

    if !output.status.success() {
        return Err(DiscoveryError::CommandFailed {
            program: path.display().to_string(),
            code: output.status.code(),
        });
    }

    // Some tools write their version to stderr
    let out = if !output.stdout.is_empty() {
        output.stdout
    } else {
        output.stderr
    };

    String::from_utf8(out).map_err(|_| DiscoveryError::VersionParseFailed)
}
