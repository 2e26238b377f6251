// tests/pipelines.rs
//
// Built-in tasks against a temporary project, with tool commands replaced by
// POSIX shell utilities.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use assetflow::config::ConfigFile;
use assetflow::engine::TaskRunner;
use assetflow::errors::AssetflowError;
use assetflow::tasks::builtin_registry;
use assetflow::types::RunMode;
use assetflow_test_utils::builders::{ConfigFileBuilder, test_context};
use assetflow_test_utils::{init_tracing, with_timeout, write_file as write};

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
}

fn runner(root: &Path, mode: RunMode, cfg: ConfigFile) -> TaskRunner {
    init_tracing();
    TaskRunner::new(Arc::new(builtin_registry().unwrap()), test_context(root, mode, cfg))
}

fn stylesheets(root: &Path) {
    write(root, "app/styles/main.scss", "main\n");
    write(root, "app/styles/blocks/b.scss", "b\n");
    write(root, "app/styles/_vars.scss", "vars\n");
}

#[tokio::test]
async fn styles_are_minified_in_production() {
    let dir = tempfile::tempdir().unwrap();
    stylesheets(dir.path());
    let cfg = ConfigFileBuilder::new().with_shell_tools().build();

    with_timeout(runner(dir.path(), RunMode::Production, cfg).run("styles"))
        .await
        .unwrap();

    // Partials are skipped; sheets are concatenated in path order.
    assert_eq!(read(dir.path(), "www/css/bundle.css"), "bmain");
}

#[tokio::test]
async fn styles_stay_unminified_in_development() {
    let dir = tempfile::tempdir().unwrap();
    stylesheets(dir.path());
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_postprocess("tr a-z A-Z")
        .build();

    with_timeout(runner(dir.path(), RunMode::Development, cfg).run("styles"))
        .await
        .unwrap();

    assert_eq!(read(dir.path(), "www/css/bundle.css"), "B\nMAIN\n");
}

#[tokio::test]
async fn vendor_css_is_always_minified() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vendor/a.css", ".a {}\n");
    write(dir.path(), "vendor/b.css", ".b {}");
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_vendor_css(&["vendor/a.css", "vendor/b.css"])
        .build();

    with_timeout(runner(dir.path(), RunMode::Development, cfg).run("vendor-css"))
        .await
        .unwrap();

    assert_eq!(read(dir.path(), "www/css/vendor.bundle.css"), ".a {}.b {}");
}

#[tokio::test]
async fn missing_vendor_file_fails_the_task() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_vendor_css(&["vendor/missing.css"])
        .build();

    let err = with_timeout(runner(dir.path(), RunMode::Production, cfg).run("vendor-css"))
        .await
        .unwrap_err();
    assert_eq!(err.failed_task(), Some("vendor-css"));
    let chain = format!("{:#}", anyhow::Error::from(err));
    assert!(chain.contains("vendor/missing.css"), "{chain}");
}

#[tokio::test]
async fn sprite_without_sources_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    stylesheets(dir.path());
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_sprite_tool("exit 1")
        .build();

    with_timeout(runner(dir.path(), RunMode::Production, cfg).run("styles"))
        .await
        .unwrap();

    assert!(!dir.path().join("app/styles/_sprite.scss").exists());
    assert!(!dir.path().join("www/css/sprite.png").exists());
}

#[tokio::test]
async fn sprite_writes_image_and_stylesheet() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app/styles/sprite/a.png", "A");
    write(dir.path(), "app/styles/sprite/b.png", "B");
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_sprite_tool("cat {inputs} > {img_out} && printf '$sprite: %s;' {algorithm} > {css_out}")
        .build();

    with_timeout(runner(dir.path(), RunMode::Production, cfg).run("sprite"))
        .await
        .unwrap();

    assert_eq!(read(dir.path(), "www/css/sprite.png"), "AB");
    assert_eq!(read(dir.path(), "app/styles/_sprite.scss"), "$sprite: binary-tree;");
    // The staged stylesheet does not linger in the public tree.
    let leftovers: Vec<_> = fs::read_dir(dir.path().join("www/css"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["sprite.png"]);
}

#[tokio::test]
async fn templates_mirror_entry_directories() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app/jade/index.jade", "home");
    write(dir.path(), "app/jade/about/index.jade", "about");
    write(dir.path(), "app/jade/partials/nav.jade", "nav");
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_template_tool("printf '%s:' {pretty} && cat {input}")
        .build();

    with_timeout(runner(dir.path(), RunMode::Development, cfg).run("templates"))
        .await
        .unwrap();

    assert_eq!(read(dir.path(), "www/index.html"), "--pretty:home");
    assert_eq!(read(dir.path(), "www/about/index.html"), "--pretty:about");
    assert!(!dir.path().join("www/partials").exists());
}

#[tokio::test]
async fn templates_are_compact_in_production() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app/jade/index.jade", "home");
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_template_tool("printf '%s:' {pretty} && cat {input}")
        .build();

    with_timeout(runner(dir.path(), RunMode::Production, cfg).run("templates"))
        .await
        .unwrap();

    assert_eq!(read(dir.path(), "www/index.html"), ":home");
}

#[tokio::test]
async fn default_builds_the_whole_site() {
    let dir = tempfile::tempdir().unwrap();
    stylesheets(dir.path());
    write(dir.path(), "app/fonts/icons.woff", "font");
    write(dir.path(), "app/images/bg/hero.jpg", "jpg");
    write(dir.path(), "app/jade/index.jade", "home");
    write(dir.path(), "node_modules/uikit/dist/css/uikit.css", ".uk {}\n");
    write(dir.path(), "node_modules/bootstrap/fonts/glyph.ttf", "ttf");
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_template_tool("cat {input}")
        .build();

    let report = with_timeout(runner(dir.path(), RunMode::Production, cfg).run("default"))
        .await
        .unwrap();

    assert_eq!(report.completed.len(), 8);
    assert_eq!(read(dir.path(), "www/css/bundle.css"), "bmain");
    assert_eq!(read(dir.path(), "www/css/vendor.bundle.css"), ".uk {}");
    assert_eq!(read(dir.path(), "www/fonts/icons.woff"), "font");
    assert_eq!(read(dir.path(), "www/fonts/glyph.ttf"), "ttf");
    assert_eq!(read(dir.path(), "www/img/bg/hero.jpg"), "jpg");
    assert_eq!(read(dir.path(), "www/index.html"), "home");
}

#[tokio::test]
async fn compiler_failure_is_reported_with_task_and_stderr() {
    let dir = tempfile::tempdir().unwrap();
    stylesheets(dir.path());
    let cfg = ConfigFileBuilder::new()
        .with_shell_tools()
        .with_sass("echo 'Undefined variable' >&2; exit 65")
        .build();

    let err = with_timeout(runner(dir.path(), RunMode::Production, cfg).run("styles"))
        .await
        .unwrap_err();

    match &err {
        AssetflowError::TaskExecution { task, source } => {
            assert_eq!(task, "styles");
            let chain = format!("{source:#}");
            assert!(chain.contains("Undefined variable"), "{chain}");
            assert!(chain.contains("exited with 65"), "{chain}");
        }
        other => panic!("expected TaskExecution, got {other:?}"),
    }
    assert!(!dir.path().join("www/css/bundle.css").exists());
}

#[tokio::test]
async fn styles_without_sources_drop_the_old_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app/styles/_vars.scss", "vars\n");
    write(dir.path(), "www/css/bundle.css", "old{}");
    let cfg = ConfigFileBuilder::new().with_shell_tools().build();

    with_timeout(runner(dir.path(), RunMode::Production, cfg).run("styles"))
        .await
        .unwrap();

    assert!(!dir.path().join("www/css/bundle.css").exists());
}
