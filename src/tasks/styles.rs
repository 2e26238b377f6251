// src/tasks/styles.rs

//! Stylesheet pipelines.
//!
//! `styles`: every non-partial source goes through the Sass tool; the
//! compiled sheets are concatenated in path order, post-processed, minified
//! when the policy asks for it, and written as one bundle.
//!
//! `vendor-css`: vendor sheets are concatenated in configured order and
//! always minified.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::exec::{ActionFuture, TaskAction, TaskContext};
use crate::tasks::write_output;
use crate::tools::{ExternalTool, ToolVars, collect_sources};

#[derive(Debug, Clone, Copy, Default)]
pub struct StylesAction;

impl TaskAction for StylesAction {
    fn run(&self, ctx: Arc<TaskContext>) -> ActionFuture {
        Box::pin(build_styles(ctx))
    }

    fn describe(&self) -> String {
        "compile styles into bundle".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VendorCssAction;

impl TaskAction for VendorCssAction {
    fn run(&self, ctx: Arc<TaskContext>) -> ActionFuture {
        Box::pin(build_vendor_css(ctx))
    }

    fn describe(&self) -> String {
        "bundle vendor css".to_string()
    }
}

async fn build_styles(ctx: Arc<TaskContext>) -> Result<()> {
    let tools = ctx.tools();
    let paths = ctx.paths();

    let sources: Vec<_> = collect_sources(ctx.root(), &paths.app.styles)?
        .into_iter()
        .filter(|s| !s.is_partial())
        .collect();

    let out = ctx.resolve(Path::new(&paths.public.styles).join(&paths.public.styles_bundle));

    if sources.is_empty() {
        info!(glob = %paths.app.styles, "no stylesheets to compile");
        remove_stale(&out).await?;
        return Ok(());
    }

    let sass = ExternalTool::new("sass", tools.sass.as_str());
    let mut compiled = Vec::with_capacity(sources.len());
    for source in &sources {
        let vars = ToolVars::new().path("input", &source.path);
        let css = sass
            .invoke(ctx.root(), &vars, None)
            .await
            .with_context(|| format!("compiling {}", source.path.display()))?;
        debug!(source = %source.path.display(), bytes = css.len(), "compiled stylesheet");
        compiled.push(css);
    }

    let mut bundle = concat(compiled);

    if !tools.postprocess.trim().is_empty() {
        let post = ExternalTool::new("postprocess", tools.postprocess.as_str());
        bundle = post.filter(ctx.root(), &bundle).await?;
    }

    if ctx.policy().is_enabled() {
        bundle = minify(&ctx, &bundle).await?;
    }

    write_output(&out, &bundle).await?;

    info!(
        sources = sources.len(),
        minified = ctx.policy().is_enabled(),
        out = %out.display(),
        "styles bundle written"
    );
    Ok(())
}

async fn build_vendor_css(ctx: Arc<TaskContext>) -> Result<()> {
    let vendor = ctx.vendor();
    if vendor.css.is_empty() {
        info!("no vendor stylesheets configured");
        return Ok(());
    }

    let mut sheets = Vec::with_capacity(vendor.css.len());
    for rel in &vendor.css {
        let path = ctx.resolve(rel);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading vendor stylesheet {}", path.display()))?;
        sheets.push(bytes);
    }

    let bundle = minify(&ctx, &concat(sheets)).await?;

    let public = &ctx.paths().public;
    let out = ctx.resolve(Path::new(&public.styles).join(&public.vendor_bundle));
    write_output(&out, &bundle).await?;

    info!(sheets = vendor.css.len(), out = %out.display(), "vendor bundle written");
    Ok(())
}

/// Delete a bundle left over from an earlier run.
async fn remove_stale(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale bundle");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
    }
}

async fn minify(ctx: &TaskContext, css: &[u8]) -> Result<Vec<u8>> {
    ExternalTool::new("minify-css", ctx.tools().minify_css.as_str())
        .filter(ctx.root(), css)
        .await
}

/// Join sheets with a newline between them so a sheet missing its trailing
/// newline cannot glue its last rule onto the next sheet's first line.
fn concat(parts: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for part in parts {
        out.extend_from_slice(&part);
        if !part.ends_with(b"\n") {
            out.push(b'\n');
        }
    }
    out
}
