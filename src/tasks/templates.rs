// src/tasks/templates.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::exec::{ActionFuture, TaskAction, TaskContext};
use crate::tasks::write_output;
use crate::tools::{ExternalTool, ToolVars, collect_sources};

/// Renders every template entry into the public root, mirroring the entry's
/// directory below the template glob base.
///
/// A renderer template with `{out_dir}`/`{output}` writes the page itself;
/// otherwise its stdout is written to `<out_dir>/<stem>.html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatesAction;

impl TaskAction for TemplatesAction {
    fn run(&self, ctx: Arc<TaskContext>) -> ActionFuture {
        Box::pin(render_templates(ctx))
    }

    fn describe(&self) -> String {
        "render templates".to_string()
    }
}

async fn render_templates(ctx: Arc<TaskContext>) -> Result<()> {
    let paths = ctx.paths();
    let tools = ctx.tools();

    let entries = collect_sources(ctx.root(), &paths.app.template_entries)?;
    if entries.is_empty() {
        info!(glob = %paths.app.template_entries, "no template entries to render");
        return Ok(());
    }

    let renderer = ExternalTool::new("templates", tools.templates.as_str());
    let pretty = if ctx.policy().pretty_output() {
        tools.pretty_flag.clone()
    } else {
        String::new()
    };
    let public_root = ctx.resolve(&paths.public.root);

    for entry in &entries {
        let out_dir = match entry.relative.parent() {
            Some(parent) => public_root.join(parent),
            None => public_root.clone(),
        };
        let stem = entry
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        let output = out_dir.join(format!("{stem}.html"));

        tokio::fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("creating {}", out_dir.display()))?;

        let vars = ToolVars::new()
            .path("input", &entry.path)
            .path("out_dir", &out_dir)
            .path("output", &output)
            .raw("pretty", pretty.clone());

        let rendered = renderer
            .invoke(ctx.root(), &vars, None)
            .await
            .with_context(|| format!("rendering {}", entry.path.display()))?;

        if !renderer.writes_files() {
            write_output(&output, &rendered).await?;
        }
    }

    info!(
        pages = entries.len(),
        pretty = ctx.policy().pretty_output(),
        out = %public_root.display(),
        "templates rendered"
    );
    Ok(())
}
