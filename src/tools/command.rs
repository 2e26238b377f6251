// src/tools/command.rs

//! External tool runner.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::tools::placeholder::{ToolVars, expand, placeholders};

/// Placeholders through which a tool writes its own output files.
const OUTPUT_PLACEHOLDERS: &[&str] = &["output", "out_dir", "img_out", "css_out"];

/// A collaborator implemented by an external command template.
///
/// Templates without an output placeholder are filters: whatever the command
/// prints on stdout is the result, and when there is no `{input}` either,
/// the input bytes are piped to stdin.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: String,
    template: String,
}

impl ExternalTool {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the template writes files itself rather than to stdout.
    pub fn writes_files(&self) -> bool {
        placeholders(&self.template)
            .iter()
            .any(|p| OUTPUT_PLACEHOLDERS.contains(p))
    }

    /// Pipe `input` through the tool and return its stdout.
    pub async fn filter(&self, cwd: &Path, input: &[u8]) -> Result<Vec<u8>> {
        self.invoke(cwd, &ToolVars::new(), Some(input)).await
    }

    /// Expand the template with `vars`, run it in `cwd` and return stdout.
    ///
    /// A non-zero exit status is an error carrying the command line and the
    /// tool's stderr.
    pub async fn invoke(&self, cwd: &Path, vars: &ToolVars, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let command_line = expand(&self.template, vars)
            .with_context(|| format!("expanding command for tool '{}'", self.name))?;

        info!(tool = %self.name, cmd = %command_line, "invoking tool");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&command_line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&command_line);
            c
        };

        cmd.current_dir(cwd)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning tool '{}' ({command_line})", self.name))?;

        // Feed stdin from a separate task so a tool that writes before it
        // finishes reading cannot fill the stdout pipe and stall.
        let writer = match (stdin, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => {
                let bytes = bytes.to_vec();
                Some(tokio::spawn(async move {
                    pipe.write_all(&bytes).await?;
                    pipe.shutdown().await
                }))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for tool '{}'", self.name))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => debug!(tool = %self.name, error = %err, "tool closed stdin early"),
                Err(err) => debug!(tool = %self.name, error = %err, "stdin writer aborted"),
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(tool = %self.name, "stderr: {}", line);
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            bail!(
                "tool '{}' exited with {code} ({command_line}): {}",
                self.name,
                stderr.trim()
            );
        }

        debug!(tool = %self.name, bytes = output.stdout.len(), "tool finished");
        Ok(output.stdout)
    }
}
