// src/tasks/copy.rs

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::exec::{ActionFuture, TaskAction, TaskContext};
use crate::tools::{collect_sources, copy_sources};

/// Which configured source set a [`CopyAction`] mirrors into the public tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRole {
    Fonts,
    Images,
    VendorFonts,
}

impl CopyRole {
    fn source_glob(self, ctx: &TaskContext) -> String {
        match self {
            CopyRole::Fonts => ctx.paths().app.fonts.clone(),
            CopyRole::Images => ctx.paths().app.images.clone(),
            CopyRole::VendorFonts => ctx.vendor().fonts.clone(),
        }
    }

    fn destination(self, ctx: &TaskContext) -> String {
        match self {
            CopyRole::Fonts | CopyRole::VendorFonts => ctx.paths().public.fonts.clone(),
            CopyRole::Images => ctx.paths().public.images.clone(),
        }
    }
}

impl fmt::Display for CopyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CopyRole::Fonts => "fonts",
            CopyRole::Images => "images",
            CopyRole::VendorFonts => "vendor fonts",
        };
        f.write_str(s)
    }
}

/// Copies a source glob into a public directory unchanged.
#[derive(Debug, Clone, Copy)]
pub struct CopyAction {
    role: CopyRole,
}

impl CopyAction {
    pub fn new(role: CopyRole) -> Self {
        Self { role }
    }
}

impl TaskAction for CopyAction {
    fn run(&self, ctx: Arc<TaskContext>) -> ActionFuture {
        let role = self.role;
        Box::pin(async move {
            let glob = role.source_glob(&ctx);
            let dest = ctx.resolve(role.destination(&ctx));

            let sources = collect_sources(ctx.root(), &glob)?;
            let copied = copy_sources(&sources, &dest).await?;

            info!(%role, copied, dest = %dest.display(), "copied files");
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("copy {}", self.role)
    }
}
