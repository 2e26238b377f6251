// src/config/model.rs

use serde::Deserialize;

use crate::types::SpriteAlgorithm;

/// Top-level configuration as read from `Assetflow.toml`.
///
/// Every section is optional; the defaults describe the classic layout:
///
/// ```toml
/// [paths.app]
/// styles = "app/styles/**/*.scss"
///
/// [paths.public]
/// root = "www"
///
/// [server]
/// port = 9000
///
/// [watch]
/// debounce_ms = 200
///
/// [[watch.binding]]
/// patterns = ["app/styles/**/*.scss"]
/// tasks = ["styles"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub vendor: VendorSection,

    #[serde(default)]
    pub tools: ToolsSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration. Only constructible through
/// `TryFrom<RawConfigFile>` (see `validate.rs`) or [`ConfigFile::default`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathsSection,
    vendor: VendorSection,
    tools: ToolsSection,
    server: ServerSection,
    watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            vendor: raw.vendor,
            tools: raw.tools,
            server: raw.server,
            watch: raw.watch,
        }
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn vendor(&self) -> &VendorSection {
        &self.vendor
    }

    pub fn tools(&self) -> &ToolsSection {
        &self.tools
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    /// Override the dev-server port (from `--port`).
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[paths]`: logical role → glob pattern or directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsSection {
    #[serde(default)]
    pub app: AppPaths,

    #[serde(default)]
    pub public: PublicPaths,
}

/// `[paths.app]`: source tree. Values are globs unless noted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppPaths {
    /// Directory.
    pub root: String,
    pub styles: String,
    pub sprite: String,
    /// Directory receiving the generated sprite stylesheet.
    pub sprite_styles: String,
    /// File name of the generated sprite stylesheet.
    pub sprite_stylesheet: String,
    pub scripts: String,
    pub images: String,
    pub fonts: String,
    /// Every template, including partials (used for watching).
    pub templates: String,
    /// Templates that are rendered to pages.
    pub template_entries: String,
}

impl Default for AppPaths {
    fn default() -> Self {
        Self {
            root: "app".to_string(),
            styles: "app/styles/**/*.scss".to_string(),
            sprite: "app/styles/sprite/*.png".to_string(),
            sprite_styles: "app/styles".to_string(),
            sprite_stylesheet: "_sprite.scss".to_string(),
            scripts: "app/scripts/**/*.js".to_string(),
            images: "app/images/**/*.*".to_string(),
            fonts: "app/fonts/**/*.*".to_string(),
            templates: "app/jade/**/*.jade".to_string(),
            template_entries: "app/jade/**/index.jade".to_string(),
        }
    }
}

/// `[paths.public]`: output tree. All values are directories or file names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublicPaths {
    pub root: String,
    pub styles: String,
    pub scripts: String,
    pub images: String,
    pub sprite: String,
    pub fonts: String,
    pub styles_bundle: String,
    pub vendor_bundle: String,
    pub sprite_image: String,
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self {
            root: "www".to_string(),
            styles: "www/css".to_string(),
            scripts: "www/js".to_string(),
            images: "www/img".to_string(),
            sprite: "www/css".to_string(),
            fonts: "www/fonts".to_string(),
            styles_bundle: "bundle.css".to_string(),
            vendor_bundle: "vendor.bundle.css".to_string(),
            sprite_image: "sprite.png".to_string(),
        }
    }
}

/// `[vendor]`: third-party assets shipped alongside the site.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VendorSection {
    /// Plain file paths, concatenated in order.
    pub css: Vec<String>,
    /// Glob.
    pub fonts: String,
}

impl Default for VendorSection {
    fn default() -> Self {
        Self {
            css: vec!["node_modules/uikit/dist/css/uikit.css".to_string()],
            fonts: "node_modules/bootstrap/fonts/*.*".to_string(),
        }
    }
}

/// `[tools]`: shell command templates for external collaborators.
///
/// A template without `{output}` / `{out_dir}` is treated as a filter that
/// reads stdin (when it has no `{input}`) and writes the result to stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// Compiles one stylesheet (`{input}`) to CSS on stdout.
    pub sass: String,
    /// CSS post-processor filter (autoprefixing). Empty disables it.
    pub postprocess: String,
    /// CSS minifier filter.
    pub minify_css: String,
    /// Sprite packer.
    pub sprite: String,
    pub sprite_algorithm: SpriteAlgorithm,
    /// Template renderer.
    pub templates: String,
    /// Substituted for `{pretty}` when pretty output is wanted.
    pub pretty_flag: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            sass: "sass --no-source-map {input}".to_string(),
            postprocess: "postcss --use autoprefixer".to_string(),
            minify_css: "cleancss".to_string(),
            sprite: "spritesmith --algorithm {algorithm} --img {img_out} --css {css_out} {inputs}"
                .to_string(),
            sprite_algorithm: SpriteAlgorithm::default(),
            templates: "pug {pretty} --out {out_dir} {input}".to_string(),
            pretty_flag: "--pretty".to_string(),
        }
    }
}

/// `[server]`: local dev server used in watch mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Length of the debounce window per binding, in milliseconds.
    pub debounce_ms: u64,
    /// Drop change events whose file content hash did not change.
    pub use_hash: bool,
    /// Explicit bindings; when empty the built-in bindings are derived
    /// from `[paths]`.
    pub binding: Vec<BindingConfig>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            use_hash: false,
            binding: Vec::new(),
        }
    }
}

/// `[[watch.binding]]`: patterns → tasks. No tasks means reload only.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingConfig {
    pub patterns: Vec<String>,

    #[serde(default)]
    pub tasks: Vec<String>,
}
