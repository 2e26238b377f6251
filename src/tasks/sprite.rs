// src/tasks/sprite.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::exec::{ActionFuture, TaskAction, TaskContext};
use crate::tasks::write_if_changed;
use crate::tools::{ExternalTool, ToolVars, collect_sources};

/// Packs the sprite sources into one image plus a Sass stylesheet.
///
/// The stylesheet is produced in the public sprite directory first and only
/// copied into the source tree when it differs, so regenerating an identical
/// sprite does not retrigger the styles watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteAction;

impl TaskAction for SpriteAction {
    fn run(&self, ctx: Arc<TaskContext>) -> ActionFuture {
        Box::pin(build_sprite(ctx))
    }

    fn describe(&self) -> String {
        "pack sprite sheet".to_string()
    }
}

async fn build_sprite(ctx: Arc<TaskContext>) -> Result<()> {
    let paths = ctx.paths();
    let tools = ctx.tools();

    let sources = collect_sources(ctx.root(), &paths.app.sprite)?;
    if sources.is_empty() {
        info!(glob = %paths.app.sprite, "no sprite sources, skipping");
        return Ok(());
    }

    let out_dir = ctx.resolve(&paths.public.sprite);
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let img_out = out_dir.join(&paths.public.sprite_image);
    let staged_css = out_dir.join(format!(".{}.tmp", paths.app.sprite_stylesheet));
    let inputs: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();

    let vars = ToolVars::new()
        .paths("inputs", inputs)
        .path("img_out", &img_out)
        .path("css_out", &staged_css)
        .raw("algorithm", tools.sprite_algorithm.to_string());

    ExternalTool::new("sprite", tools.sprite.as_str())
        .invoke(ctx.root(), &vars, None)
        .await?;

    let stylesheet = tokio::fs::read(&staged_css)
        .await
        .with_context(|| format!("sprite tool did not produce {}", staged_css.display()))?;
    if let Err(err) = tokio::fs::remove_file(&staged_css).await {
        debug!(path = %staged_css.display(), error = %err, "could not remove staged stylesheet");
    }

    let css_out = ctx.resolve(Path::new(&paths.app.sprite_styles).join(&paths.app.sprite_stylesheet));
    let changed = write_if_changed(&css_out, &stylesheet).await?;

    info!(
        images = sources.len(),
        algorithm = %tools.sprite_algorithm,
        image = %img_out.display(),
        stylesheet_changed = changed,
        "sprite written"
    );
    Ok(())
}
