//! Built-in targets for well-known AI coding agents.

use crate::{DiscoveryTarget, EnvPattern, Platform};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// A coding agent with a built-in [`DiscoveryTarget`].
///
/// This enum is marked `#[non_exhaustive]` to allow adding new agents in
/// future versions. When matching on `KnownAgent`, always include a wildcard
/// pattern:
///
/// ```rust
/// use acp_presence::KnownAgent;
///
/// fn describe(agent: KnownAgent) -> &'static str {
///     match agent {
///         KnownAgent::ClaudeCode => "Anthropic",
///         KnownAgent::Gemini => "Google",
///         _ => "other",
///     }
/// }
/// ```
///
/// # Example
///
/// ```rust
/// use acp_presence::KnownAgent;
///
/// for agent in KnownAgent::all() {
///     println!("{}: {}", agent.id(), agent.display_name());
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
#[non_exhaustive]
pub enum KnownAgent {
    /// Anthropic's Claude Code agent (claude CLI)
    ClaudeCode,
    /// OpenAI's Codex agent (codex CLI)
    Codex,
    /// OpenCode agent (opencode CLI)
    OpenCode,
    /// Google's Gemini agent (gemini CLI)
    Gemini,
    /// Cursor editor and its agent CLI
    Cursor,
}

impl KnownAgent {
    /// Stable target id.
    ///
    /// ```rust
    /// use acp_presence::KnownAgent;
    ///
    /// assert_eq!(KnownAgent::ClaudeCode.id(), "claude-code");
    /// ```
    pub fn id(&self) -> &'static str {
        match self {
            Self::ClaudeCode => "claude-code",
            Self::Codex => "codex",
            Self::OpenCode => "opencode",
            Self::Gemini => "gemini",
            Self::Cursor => "cursor",
        }
    }

    /// The executable name to search for in PATH.
    pub fn executable_name(&self) -> &'static str {
        match self {
            Self::ClaudeCode => "claude",
            Self::Codex => "codex",
            Self::OpenCode => "opencode",
            Self::Gemini => "gemini",
            Self::Cursor => "cursor-agent",
        }
    }

    /// Human-readable display name for the agent.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ClaudeCode => "Claude Code",
            Self::Codex => "Codex",
            Self::OpenCode => "OpenCode",
            Self::Gemini => "Gemini CLI",
            Self::Cursor => "Cursor",
        }
    }

    /// Iterator over all known agents.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }

    /// The discovery target describing this agent.
    pub fn target(&self) -> DiscoveryTarget {
        let base = DiscoveryTarget::new(self.id(), self.display_name());
        let exe = self.executable_name();
        match self {
            Self::ClaudeCode => DiscoveryTarget {
                filesystem_signals: strings(&[".claude", "CLAUDE.md", "~/.claude", "~/.claude.json"]),
                env_signals: vec![EnvPattern::prefix("CLAUDE_CODE_"), EnvPattern::prefix("CLAUDECODE")],
                process_signals: vec![command_pattern(exe)],
                // the desktop app bundles a helper with a similar name
                process_exclusions: vec![pattern(r"(?i)Claude\.app/")],
                binaries: strings(&[exe]),
                ..base
            },
            Self::Codex => DiscoveryTarget {
                filesystem_signals: strings(&[".codex", "~/.codex"]),
                env_signals: vec![EnvPattern::prefix("CODEX_")],
                process_signals: vec![command_pattern(exe)],
                binaries: strings(&[exe]),
                ..base
            },
            Self::OpenCode => DiscoveryTarget {
                filesystem_signals: strings(&["opencode.json", ".opencode", "~/.config/opencode"]),
                env_signals: vec![EnvPattern::prefix("OPENCODE_")],
                process_signals: vec![command_pattern(exe)],
                binaries: strings(&[exe]),
                ..base
            },
            Self::Gemini => DiscoveryTarget {
                filesystem_signals: strings(&[".gemini", "GEMINI.md", "~/.gemini"]),
                env_signals: vec![EnvPattern::prefix("GEMINI_CLI_"), EnvPattern::prefix("GEMINI_API_KEY")],
                process_signals: vec![command_pattern(exe)],
                binaries: strings(&[exe]),
                ..base
            },
            Self::Cursor => DiscoveryTarget {
                filesystem_signals: strings(&[".cursor", ".cursorrules", "~/.cursor"]),
                env_signals: vec![EnvPattern::prefix("CURSOR_")],
                process_signals: vec![command_pattern(exe), pattern(r"(?i)(^|[/\\])cursor(\.exe)?(\s|$)")],
                process_exclusions: vec![pattern(r"--type=(crashpad-handler|utility)")],
                binaries: strings(&[exe, "cursor"]),
                app_paths: BTreeMap::from([
                    (Platform::Macos, strings(&["/Applications/Cursor.app", "~/Applications/Cursor.app"])),
                    (Platform::Linux, strings(&["/opt/Cursor", "/usr/share/cursor", "~/Applications/cursor.AppImage"])),
                    (Platform::Windows, strings(&["%LOCALAPPDATA%/Programs/cursor"])),
                ]),
                ..base
            },
        }
    }
}

/// Targets for every [`KnownAgent`], in declaration order.
///
/// ```rust
/// let targets = acp_presence::builtin_targets();
/// assert_eq!(targets.len(), 5);
/// assert_eq!(targets[0].id, "claude-code");
/// ```
pub fn builtin_targets() -> Vec<DiscoveryTarget> {
    KnownAgent::all().map(|a| a.target()).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("Invalid built-in regex pattern")
}

/// Matches `exe` as the program or the script of a command line.
fn command_pattern(exe: &str) -> Regex {
    pattern(&format!(r"(^|[/\\\s]){}(\.exe|\.cmd)?(\s|$)", regex::escape(exe)))
}
