// src/tools/placeholder.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"));

/// Value substituted for one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    /// Shell-quoted single path.
    Path(PathBuf),
    /// Shell-quoted paths joined by spaces.
    Paths(Vec<PathBuf>),
    /// Inserted verbatim (flags such as `--pretty`).
    Raw(String),
}

impl VarValue {
    fn render(&self) -> String {
        match self {
            VarValue::Path(p) => shell_quote(&p.to_string_lossy()),
            VarValue::Paths(ps) => ps
                .iter()
                .map(|p| shell_quote(&p.to_string_lossy()))
                .collect::<Vec<_>>()
                .join(" "),
            VarValue::Raw(s) => s.clone(),
        }
    }
}

/// Named values available to a command template.
#[derive(Debug, Clone, Default)]
pub struct ToolVars {
    vars: BTreeMap<String, VarValue>,
}

impl ToolVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: VarValue) -> Self {
        self.vars.insert(name.to_string(), value);
        self
    }

    pub fn path(self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.with(name, VarValue::Path(path.into()))
    }

    pub fn paths(self, name: &str, paths: Vec<PathBuf>) -> Self {
        self.with(name, VarValue::Paths(paths))
    }

    pub fn raw(self, name: &str, value: impl Into<String>) -> Self {
        self.with(name, VarValue::Raw(value.into()))
    }

    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name)
    }
}

/// Expand every `{name}` in `template`. Unknown names are an error so a typo
/// in a config file never reaches the shell.
pub fn expand(template: &str, vars: &ToolVars) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(value) = vars.get(name.as_str()) else {
            bail!("unknown placeholder {{{}}} in command '{template}'", name.as_str());
        };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&value.render());
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Names of the placeholders used by `template`.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

fn shell_quote(s: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
