use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Environment variable consulted for the run mode when `--env` is absent.
pub const RUN_MODE_ENV: &str = "ASSETFLOW_ENV";

/// Process-wide run mode, resolved once at startup.
///
/// Unrecognised values are kept verbatim in `Other` so they still show up in
/// logs and dry-run output; they behave like `development` for minification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Production,
    Development,
    Testing,
    Other(String),
}

impl FromStr for RunMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "production" => RunMode::Production,
            "development" => RunMode::Development,
            "testing" => RunMode::Testing,
            other => RunMode::Other(other.to_string()),
        })
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Production => f.write_str("production"),
            RunMode::Development => f.write_str("development"),
            RunMode::Testing => f.write_str("testing"),
            RunMode::Other(s) => f.write_str(s),
        }
    }
}

impl RunMode {
    /// Resolve the run mode from a CLI override and the value of
    /// [`RUN_MODE_ENV`].
    ///
    /// Priority: CLI override, then environment, then `production`.
    /// Blank values are ignored.
    pub fn resolve(cli_override: Option<&str>, env_value: Option<&str>) -> Self {
        cli_override
            .or(env_value)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Resolve using the real process environment.
    pub fn from_env(cli_override: Option<&str>) -> Self {
        let env_value = std::env::var(RUN_MODE_ENV).ok();
        Self::resolve(cli_override, env_value.as_deref())
    }

    /// Minification / pretty-printing policy for this mode.
    pub fn minify_policy(&self) -> MinifyPolicy {
        match self {
            RunMode::Production | RunMode::Testing => MinifyPolicy::Enabled,
            RunMode::Development | RunMode::Other(_) => MinifyPolicy::Disabled,
        }
    }
}

/// Whether outputs are minified (`Enabled`) or left pretty (`Disabled`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyPolicy {
    Enabled,
    Disabled,
}

impl MinifyPolicy {
    pub fn is_enabled(self) -> bool {
        matches!(self, MinifyPolicy::Enabled)
    }

    /// Templates are rendered pretty exactly when minification is off.
    pub fn pretty_output(self) -> bool {
        !self.is_enabled()
    }
}

impl fmt::Display for MinifyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinifyPolicy::Enabled => f.write_str("enabled"),
            MinifyPolicy::Disabled => f.write_str("disabled"),
        }
    }
}

/// Sprite packing layout handed to the sprite tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpriteAlgorithm {
    #[default]
    BinaryTree,
    TopDown,
    LeftRight,
    Diagonal,
}

impl fmt::Display for SpriteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpriteAlgorithm::BinaryTree => "binary-tree",
            SpriteAlgorithm::TopDown => "top-down",
            SpriteAlgorithm::LeftRight => "left-right",
            SpriteAlgorithm::Diagonal => "diagonal",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_disables_minification() {
        assert_eq!(
            RunMode::Development.minify_policy(),
            MinifyPolicy::Disabled
        );
        assert!(MinifyPolicy::Disabled.pretty_output());
    }

    #[test]
    fn production_and_testing_enable_minification() {
        assert_eq!(RunMode::Production.minify_policy(), MinifyPolicy::Enabled);
        assert_eq!(RunMode::Testing.minify_policy(), MinifyPolicy::Enabled);
    }

    #[test]
    fn cli_override_wins_over_environment() {
        let mode = RunMode::resolve(Some("development"), Some("testing"));
        assert_eq!(mode, RunMode::Development);
    }

    #[test]
    fn environment_used_when_no_override() {
        assert_eq!(RunMode::resolve(None, Some("testing")), RunMode::Testing);
    }

    #[test]
    fn defaults_to_production() {
        assert_eq!(RunMode::resolve(None, None), RunMode::Production);
        assert_eq!(RunMode::resolve(Some("  "), None), RunMode::Production);
    }

    #[test]
    fn unknown_modes_are_kept_and_unminified() {
        let mode = RunMode::resolve(None, Some("staging"));
        assert_eq!(mode, RunMode::Other("staging".to_string()));
        assert_eq!(mode.minify_policy(), MinifyPolicy::Disabled);
        assert_eq!(mode.to_string(), "staging");
    }

    #[test]
    fn mode_names_match_exactly() {
        for value in ["Production", "prod", "TESTING", "test"] {
            let mode = RunMode::resolve(Some(value), None);
            assert_eq!(mode, RunMode::Other(value.to_string()));
            assert_eq!(mode.minify_policy(), MinifyPolicy::Disabled, "{value}");
        }
    }
}
