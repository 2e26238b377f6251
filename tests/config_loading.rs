// tests/config_loading.rs

use std::io::Write;

use assetflow::config::{load_and_validate, load_or_default};
use assetflow::errors::AssetflowError;
use assetflow::types::SpriteAlgorithm;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Assetflow.toml")).unwrap();

    assert_eq!(cfg.paths().app.styles, "app/styles/**/*.scss");
    assert_eq!(cfg.paths().public.styles_bundle, "bundle.css");
    assert_eq!(cfg.vendor().css, vec!["node_modules/uikit/dist/css/uikit.css"]);
    assert_eq!(cfg.server().port, 9000);
    assert_eq!(cfg.watch().debounce_ms, 200);
    assert!(cfg.watch().binding.is_empty());
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let file = config_file(
        r#"
[paths.app]
styles = "src/scss/**/*.scss"

[paths.public]
root = "dist"

[tools]
sprite_algorithm = "top-down"

[server]
port = 3000

[watch]
use_hash = true

[[watch.binding]]
patterns = ["src/scss/**/*.scss"]
tasks = ["styles"]

[[watch.binding]]
patterns = ["dist/**/*"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.paths().app.styles, "src/scss/**/*.scss");
    assert_eq!(cfg.paths().app.fonts, "app/fonts/**/*.*");
    assert_eq!(cfg.paths().public.root, "dist");
    assert_eq!(cfg.paths().public.fonts, "www/fonts");
    assert_eq!(cfg.tools().sprite_algorithm, SpriteAlgorithm::TopDown);
    assert_eq!(cfg.server().port, 3000);
    assert_eq!(cfg.server().host, "127.0.0.1");
    assert!(cfg.watch().use_hash);
    assert_eq!(cfg.watch().binding.len(), 2);
    assert!(cfg.watch().binding[1].tasks.is_empty());
}

#[test]
fn invalid_glob_is_a_config_error() {
    let file = config_file(
        r#"
[paths.app]
images = "app/images/[*.png"
"#,
    );

    match load_and_validate(file.path()) {
        Err(AssetflowError::Config(msg)) => {
            assert!(msg.contains("paths.app.images"), "{msg}");
        }
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn zero_port_is_a_config_error() {
    let file = config_file("[server]\nport = 0\n");
    assert!(matches!(load_and_validate(file.path()), Err(AssetflowError::Config(_))));
}

#[test]
fn malformed_toml_is_reported() {
    let file = config_file("[server\nport = 9000\n");
    assert!(matches!(load_and_validate(file.path()), Err(AssetflowError::Toml(_))));
}

#[test]
fn port_override_replaces_configured_port() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("missing.toml")).unwrap().with_port(8080);
    assert_eq!(cfg.server().port, 8080);
}
