//! Hyprland version detection.

use std::fmt;
use std::process::Command;
use std::str::FromStr;

use tracing::debug;

use crate::error::ConfigError;

/// First release with `match:` based window and layer rules
pub const NEW_RULE_SYNTAX: Version = Version::new(0, 53, 0);

/// A Hyprland release version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Find a version in `hyprctl version` output.
    ///
    /// Each line is tried in turn: first the digits right after its first
    /// `v`, then a `Tag: vX.Y.Z` line. Lines containing `Hyprland l` are
    /// ignored.
    pub fn parse(output: &str) -> Option<Version> {
        output.lines().find_map(|line| {
            if line.contains("Hyprland l") {
                return None;
            }
            let after_v = line.find('v').and_then(|pos| from_numeric_prefix(&line[pos + 1..]));
            after_v.or_else(|| {
                let rest = line.trim().strip_prefix("Tag:")?;
                let word = rest.split_whitespace().next()?;
                from_numeric_prefix(word.trim_start_matches('v'))
            })
        })
    }

    /// Ask the running compositor through `hyprctl version`
    pub fn detect() -> Option<Version> {
        let output = match Command::new("hyprctl").arg("version").output() {
            Ok(output) => output,
            Err(err) => {
                debug!(error = %err, "hyprctl not available");
                return None;
            }
        };
        if !output.status.success() {
            debug!(status = %output.status, "hyprctl version failed");
            return None;
        }
        Version::parse(&String::from_utf8_lossy(&output.stdout))
    }

    /// Whether window and layer rules use the `match:` syntax
    pub fn supports_new_rule_syntax(&self) -> bool {
        *self >= NEW_RULE_SYNTAX
    }
}

/// Parse `X.Y.Z` from the leading run of digits and dots.
fn from_numeric_prefix(text: &str) -> Option<Version> {
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let mut numbers = text[..end].split('.');
    let major = numbers.next()?.parse().ok()?;
    let minor = numbers.next()?.parse().ok()?;
    let patch = numbers.next()?.parse().ok()?;
    Some(Version::new(major, minor, patch))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ConfigError;

    /// Accepts `0.53.1` and `v0.53.1`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        from_numeric_prefix(trimmed.strip_prefix('v').unwrap_or(trimmed))
            .ok_or_else(|| ConfigError::custom(format!("invalid version '{s}'")))
    }
}
