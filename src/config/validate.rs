// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetflowError, Result};
use crate::tools::placeholder::placeholders;

const KNOWN_PLACEHOLDERS: &[&str] = &[
    "input", "inputs", "output", "out_dir", "img_out", "css_out", "algorithm", "pretty",
];

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_globs(cfg)?;
    validate_server(cfg)?;
    validate_watch(cfg)?;
    validate_tools(cfg)?;
    Ok(())
}

fn validate_globs(cfg: &RawConfigFile) -> Result<()> {
    let app = &cfg.paths.app;
    let globs = [
        ("paths.app.styles", &app.styles),
        ("paths.app.sprite", &app.sprite),
        ("paths.app.scripts", &app.scripts),
        ("paths.app.images", &app.images),
        ("paths.app.fonts", &app.fonts),
        ("paths.app.templates", &app.templates),
        ("paths.app.template_entries", &app.template_entries),
        ("vendor.fonts", &cfg.vendor.fonts),
    ];

    for (key, pattern) in globs {
        check_glob(key, pattern)?;
    }

    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.port == 0 {
        return Err(AssetflowError::Config(
            "[server].port must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.server.host.trim().is_empty() {
        return Err(AssetflowError::Config(
            "[server].host must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(AssetflowError::Config(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    for (idx, binding) in cfg.watch.binding.iter().enumerate() {
        if binding.patterns.is_empty() {
            return Err(AssetflowError::Config(format!(
                "[[watch.binding]] #{idx} has no patterns"
            )));
        }
        for pattern in &binding.patterns {
            check_glob(&format!("watch.binding[{idx}].patterns"), pattern)?;
        }
        if binding.tasks.iter().any(|t| t.trim().is_empty()) {
            return Err(AssetflowError::Config(format!(
                "[[watch.binding]] #{idx} contains an empty task name"
            )));
        }
    }

    Ok(())
}

fn validate_tools(cfg: &RawConfigFile) -> Result<()> {
    let required = [
        ("tools.sass", &cfg.tools.sass),
        ("tools.minify_css", &cfg.tools.minify_css),
        ("tools.sprite", &cfg.tools.sprite),
        ("tools.templates", &cfg.tools.templates),
    ];
    for (key, cmd) in required {
        if cmd.trim().is_empty() {
            return Err(AssetflowError::Config(format!("{key} must not be empty")));
        }
    }

    let all = required
        .into_iter()
        .chain([("tools.postprocess", &cfg.tools.postprocess)]);
    for (key, cmd) in all {
        if let Some(unknown) = placeholders(cmd)
            .into_iter()
            .find(|p| !KNOWN_PLACEHOLDERS.contains(p))
        {
            return Err(AssetflowError::Config(format!(
                "{key}: unknown placeholder {{{unknown}}} in '{cmd}'"
            )));
        }
    }
    Ok(())
}

fn check_glob(key: &str, pattern: &str) -> Result<()> {
    Glob::new(pattern).map_err(|e| {
        AssetflowError::Config(format!("{key}: invalid glob pattern '{pattern}': {e}"))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::BindingConfig;

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.server.port = 0;
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, AssetflowError::Config(msg) if msg.contains("port")));
    }

    #[test]
    fn invalid_binding_glob_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.watch.binding.push(BindingConfig {
            patterns: vec!["app/{styles".to_string()],
            tasks: vec!["styles".to_string()],
        });
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, AssetflowError::Config(msg) if msg.contains("invalid glob")));
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.watch.debounce_ms = 0;
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn unknown_tool_placeholder_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.tools.sass = "sass {inptu}".to_string();
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("{inptu}"), "{err}");
    }
}
