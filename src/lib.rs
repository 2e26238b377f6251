// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod server;
pub mod tasks;
pub mod tools;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::dag::TaskRegistry;
use crate::engine::TaskRunner;
use crate::errors::AssetflowError;
use crate::exec::TaskContext;
use crate::server::{DevServer, ReloadHub};
use crate::tasks::builtin_registry;
use crate::types::RunMode;
use crate::watch::{WatchBinding, WatchOrchestrator, bindings_from_config, spawn_watcher};

/// How long the dev server gets to close connections on shutdown. Open
/// event streams never end on their own.
const SERVER_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and run-mode resolution
/// - the built-in task registry and runner
/// - the initial build
/// - (optional) watch session: file watcher, orchestrator, dev server
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_or_default(&config_path)?;
    if let Some(port) = args.port {
        cfg = cfg.with_port(port);
    }

    let mode = RunMode::from_env(args.env.as_deref());
    let root = config_root_dir(&config_path);
    info!(%mode, policy = %mode.minify_policy(), root = %root.display(), "assetflow starting");

    let registry = Arc::new(builtin_registry()?);
    let ctx = Arc::new(TaskContext::new(root, mode, cfg));
    let runner = Arc::new(TaskRunner::new(registry, ctx));

    if args.dry_run {
        print_dry_run(&runner, &args)?;
        return Ok(());
    }

    let watching = args.watch_requested();
    let initial_failure = match args.build_task() {
        Some(task) => initial_build(&runner, task, watching).await?,
        None => None,
    };

    if watching {
        watch_session(runner).await?;
    }

    match initial_failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Run the build requested on the command line.
///
/// When a watch session follows, a failed build is logged and handed back
/// instead of aborting, so a later fix can still be picked up.
async fn initial_build(
    runner: &TaskRunner,
    task: &str,
    watching: bool,
) -> crate::errors::Result<Option<AssetflowError>> {
    match runner.run(task).await {
        Ok(report) => {
            info!(
                task = %report.target,
                tasks = report.completed.len(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "build finished"
            );
            Ok(None)
        }
        Err(AssetflowError::TaskExecution { task: failed, source }) if watching => {
            error!(task = %failed, "initial build failed, watching anyway: {source:#}");
            Ok(Some(AssetflowError::TaskExecution { task: failed, source }))
        }
        Err(err) => Err(err),
    }
}

/// Run the watch session until Ctrl-C.
async fn watch_session(runner: Arc<TaskRunner>) -> Result<()> {
    let ctx = runner.context();
    let cfg = ctx.config();

    let bindings = bindings_from_config(cfg)?;
    check_binding_tasks(&bindings, runner.registry())?;

    let hub = Arc::new(ReloadHub::default());
    let public_root = ctx.resolve(&ctx.paths().public.root);
    let server = DevServer::bind(&cfg.server().host, cfg.server().port, public_root, Arc::clone(&hub)).await?;

    let (changes_tx, changes_rx) = mpsc::channel::<String>(256);
    let _watcher = spawn_watcher(ctx.root(), cfg.watch().use_hash, changes_tx)?;

    let window = Duration::from_millis(cfg.watch().debounce_ms);
    let orchestrator = WatchOrchestrator::new(bindings, Arc::clone(&runner), hub, window);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.run(async move {
        let _ = shutdown_rx.await;
    }));

    tokio::select! {
        res = orchestrator.run(changes_rx) => res?,
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl+C")?;
            info!("interrupt received, stopping watch session");
        }
    }

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(SERVER_SHUTDOWN_GRACE, server_task).await {
        Ok(Ok(res)) => res?,
        Ok(Err(join_err)) => warn!("dev server task ended abnormally: {join_err}"),
        Err(_) => debug!("dev server still had open connections at shutdown"),
    }

    Ok(())
}

/// Every task named by a binding must be registered.
fn check_binding_tasks(bindings: &[WatchBinding], registry: &TaskRegistry) -> Result<()> {
    for binding in bindings {
        for task in binding.tasks() {
            if !registry.contains(task) {
                return Err(AssetflowError::UnknownTask {
                    name: task.clone(),
                    referenced_by: None,
                })
                .with_context(|| format!("watch binding {:?}", binding.patterns()));
            }
        }
    }
    Ok(())
}

/// Figure out the project root all configured paths are relative to.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetflow.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetflow.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the resolved plan, run mode and watch bindings without executing.
fn print_dry_run(runner: &TaskRunner, args: &CliArgs) -> Result<()> {
    let ctx = runner.context();
    let registry = runner.registry();
    let graph = registry.graph();

    println!("assetflow dry-run");
    println!("  mode = {}", ctx.mode());
    println!("  minify = {}", ctx.policy());
    println!("  root = {}", ctx.root().display());
    println!();

    match args.build_task() {
        Some(task) => {
            let plan = runner.plan(task)?;
            println!("plan for '{}' ({} tasks):", plan.target(), plan.len());
            for (idx, name) in plan.order().iter().enumerate() {
                let action = registry
                    .get(name)
                    .map(|def| def.action().describe())
                    .unwrap_or_default();
                println!("  {:>2}. {name:<14} {action}", idx + 1);
                let after = graph.dependencies_of(name);
                if !after.is_empty() {
                    println!("        after: {}", after.join(", "));
                }
            }
        }
        None => {
            println!("no initial build");
            if let Some(order) = graph.topological_order() {
                println!("registered tasks: {}", order.join(" -> "));
            }
        }
    }

    if args.watch_requested() {
        let cfg = ctx.config();
        let bindings = bindings_from_config(cfg)?;
        check_binding_tasks(&bindings, registry)?;

        println!();
        println!(
            "watch bindings (debounce {} ms{}):",
            cfg.watch().debounce_ms,
            if cfg.watch().use_hash { ", content hash" } else { "" }
        );
        for binding in &bindings {
            println!("  [{}] {}", binding.label(), binding.patterns().join(", "));
        }
        println!(
            "dev server: http://{}:{}/ serving {}",
            cfg.server().host,
            cfg.server().port,
            ctx.paths().public.root
        );
    }

    debug!(entry_points = ?graph.entry_points(), "dry-run complete (no execution)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_config_name_uses_cwd() {
        let root = config_root_dir(Path::new("Assetflow.toml"));
        assert_eq!(root, std::env::current_dir().unwrap());
        assert_eq!(config_root_dir(Path::new("site/Assetflow.toml")), PathBuf::from("site"));
    }

    fn failing_runner() -> TaskRunner {
        let mut registry = TaskRegistry::new();
        let broken = crate::exec::action_fn("broken", |_ctx| async {
            Err::<(), _>(anyhow::anyhow!("Undefined variable"))
        });
        registry.register("styles", Vec::<String>::new(), broken).unwrap();
        let ctx = TaskContext::new(".", RunMode::Production, crate::config::ConfigFile::default());
        TaskRunner::new(Arc::new(registry), Arc::new(ctx))
    }

    #[tokio::test]
    async fn failed_initial_build_is_deferred_when_watching() {
        let runner = failing_runner();

        let deferred = initial_build(&runner, "styles", true).await.unwrap();
        assert_eq!(deferred.as_ref().and_then(|e| e.failed_task()), Some("styles"));

        let err = initial_build(&runner, "styles", false).await.unwrap_err();
        assert_eq!(err.failed_task(), Some("styles"));
    }

    #[tokio::test]
    async fn registry_errors_abort_even_when_watching() {
        let runner = failing_runner();
        let err = initial_build(&runner, "scripts", true).await.unwrap_err();
        assert!(matches!(err, AssetflowError::UnknownTask { .. }));
    }

    #[test]
    fn bindings_must_name_registered_tasks() {
        let registry = builtin_registry().unwrap();
        let good = vec![WatchBinding::new(["*.scss"], ["styles"]).unwrap()];
        assert!(check_binding_tasks(&good, &registry).is_ok());

        let bad = vec![WatchBinding::new(["*.js"], ["scripts"]).unwrap()];
        let err = check_binding_tasks(&bad, &registry).unwrap_err();
        assert!(format!("{err:#}").contains("unknown task 'scripts'"));
    }
}
