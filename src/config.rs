//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! describe the Sinal Verde site as it ships; a project-level `config.toml`
//! overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! languages = ["pt", "en", "es"]   # Enumeration order doubles as fallback order
//! default_language = "pt"
//! domain = "https://sinalverdeassessoria.com.br"
//!
//! [paths]
//! templates = "templates"
//! locales = "lang"
//! content = "content"
//! assets = "assets"
//! dist = "dist"
//!
//! [build]
//! production = false        # Emit Netlify _redirects/_headers
//! debug = false             # Report unresolved {{placeholders}}
//! # max_threads = 4         # Parallel page renders (omit for auto = CPU cores)
//!
//! [pages]
//! root = ["index.html", "servicos.html", "sobre.html", "contato.html",
//!         "contato-sucesso.html", "politica-privacidade.html"]
//!
//! [segments]
//! output_dir = "segmentos"
//!
//! [[segments.pages]]
//! template = "grupos-economicos.html"
//! key = "economic-groups"
//!
//! [sitemap]
//! exclude = ["contato-sucesso.html"]
//!
//! [links]
//! shared_prefixes = ["assets/"]
//!
//! [[links.renames]]
//! from = "privacy-policy"
//! to = "politica-privacidade"
//!
//! [selector.pt]
//! flag = "🇧🇷"
//! code = "PT"
//! name = "Português"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::locale::Locales;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the project root when `--config` is not given.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Supported locale codes. The order is the fallback enumeration order.
    pub languages: Vec<String>,
    /// Locale tried right after the requested one.
    pub default_language: String,
    /// Public origin used for sitemap and robots.txt.
    pub domain: String,
    pub paths: PathsConfig,
    pub build: BuildConfig,
    pub pages: PagesConfig,
    pub segments: SegmentsConfig,
    pub links: LinksConfig,
    pub contact: ContactConfig,
    pub sitemap: SitemapConfig,
    /// Language-selector badge per locale.
    pub selector: BTreeMap<String, SelectorBadge>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            languages: vec!["pt".into(), "en".into(), "es".into()],
            default_language: "pt".into(),
            domain: "https://sinalverdeassessoria.com.br".into(),
            paths: PathsConfig::default(),
            build: BuildConfig::default(),
            pages: PagesConfig::default(),
            segments: SegmentsConfig::default(),
            links: LinksConfig::default(),
            contact: ContactConfig::default(),
            sitemap: SitemapConfig::default(),
            selector: default_selector(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::Validation("languages must not be empty".into()));
        }
        for (i, lang) in self.languages.iter().enumerate() {
            let well_formed = !lang.is_empty()
                && lang
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if !well_formed {
                return Err(ConfigError::Validation(format!(
                    "language code '{lang}' must be lowercase ASCII"
                )));
            }
            if self.languages[..i].contains(lang) {
                return Err(ConfigError::Validation(format!(
                    "language '{lang}' is listed twice"
                )));
            }
        }
        if !self.languages.contains(&self.default_language) {
            return Err(ConfigError::Validation(format!(
                "default_language '{}' is not in languages",
                self.default_language
            )));
        }
        for rename in &self.links.renames {
            if rename.from.is_empty() {
                return Err(ConfigError::Validation(
                    "links.renames entries need a non-empty 'from'".into(),
                ));
            }
            if rename.to.contains(&rename.from) {
                return Err(ConfigError::Validation(format!(
                    "links.renames: '{}' must not contain '{}'",
                    rename.to, rename.from
                )));
            }
        }
        for page in &self.segments.pages {
            if page.template.is_empty() || page.key.is_empty() {
                return Err(ConfigError::Validation(
                    "segments.pages entries need both 'template' and 'key'".into(),
                ));
            }
        }
        Ok(())
    }

    /// Locale set with its fallback order.
    pub fn locales(&self) -> Locales {
        Locales::new(self.languages.clone(), self.default_language.clone())
    }

    /// Resolve every configured path against the project root.
    pub fn resolve_paths(&self, root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            templates: root.join(&self.paths.templates),
            locales: root.join(&self.paths.locales),
            content: root.join(&self.paths.content),
            assets: root.join(&self.paths.assets),
            dist: root.join(&self.paths.dist),
        }
    }
}

/// Directory layout of a site project, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub templates: String,
    pub locales: String,
    pub content: String,
    pub assets: String,
    pub dist: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates: "templates".into(),
            locales: "lang".into(),
            content: "content".into(),
            assets: "assets".into(),
            dist: "dist".into(),
        }
    }
}

/// [`PathsConfig`] joined onto a project root.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub templates: PathBuf,
    pub locales: PathBuf,
    pub content: PathBuf,
    pub assets: PathBuf,
    pub dist: PathBuf,
}

/// Build-mode switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Production builds also emit deployment-platform config files.
    pub production: bool,
    /// Diagnostic mode: report leftover template markers in rendered pages.
    pub debug: bool,
    /// Maximum number of parallel page renders.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &BuildConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}

/// Templates rendered once per locale at the locale root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    pub root: Vec<String>,
    /// Template for the blog listing page.
    pub blog: String,
    /// Template for a single article.
    pub article: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            root: [
                "index.html",
                "servicos.html",
                "sobre.html",
                "contato.html",
                "contato-sucesso.html",
                "politica-privacidade.html",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            blog: "blog.html".into(),
            article: "artigo.html".into(),
        }
    }
}

/// Segment landing pages and the content keys they draw from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentsConfig {
    /// Directory (under both templates and each locale's output) holding
    /// the segment pages.
    pub output_dir: String,
    pub pages: Vec<SegmentPage>,
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        let page = |template: &str, key: &str| SegmentPage {
            template: template.into(),
            key: key.into(),
        };
        Self {
            output_dir: "segmentos".into(),
            pages: vec![
                page("grupos-economicos.html", "economic-groups"),
                page("escritorios-advocacia.html", "law-firms"),
                page("incorporadoras.html", "real-estate"),
                page("empresas.html", "general-companies"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentPage {
    /// Template file name inside the segments directory.
    pub template: String,
    /// Key into `segments.json`.
    pub key: String,
}

/// Link-localization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    /// Root-relative path prefixes shared by every locale (never prefixed).
    pub shared_prefixes: Vec<String>,
    /// Page names that differ between the source locale and the output.
    pub renames: Vec<PathRename>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            shared_prefixes: vec!["assets/".into()],
            renames: vec![PathRename {
                from: "privacy-policy".into(),
                to: "politica-privacidade".into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathRename {
    pub from: String,
    pub to: String,
}

/// Contact fallbacks used when `other-data.json` lacks them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactConfig {
    pub whatsapp_number: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            whatsapp_number: "5511936621755".into(),
        }
    }
}

/// Which pages `sitemap.xml` lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    /// Root templates left out (confirmation pages and the like).
    pub exclude: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            exclude: vec!["contato-sucesso.html".into()],
        }
    }
}

/// What the language selector shows for one locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorBadge {
    pub flag: String,
    pub code: String,
    /// Native language name, used on the root redirect page.
    pub name: String,
}

fn default_selector() -> BTreeMap<String, SelectorBadge> {
    let badge = |flag: &str, code: &str, name: &str| SelectorBadge {
        flag: flag.into(),
        code: code.into(),
        name: name.into(),
    };
    BTreeMap::from([
        ("pt".to_string(), badge("🇧🇷", "PT", "Português")),
        ("en".to_string(), badge("🇺🇸", "EN", "English")),
        ("es".to_string(), badge("🇪🇸", "ES", "Español")),
    ])
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_file(&root.join(CONFIG_FILENAME))
}

/// Load an explicit config file; a missing file yields the stock defaults.
pub fn load_config_file(config_path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(config_path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Sinal Verde Site Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Supported locales. The order is also the translation fallback order:
# requested locale -> default_language -> the rest, in this order.
languages = ["pt", "en", "es"]
default_language = "pt"

# Public origin used in sitemap.xml and robots.txt.
domain = "https://sinalverdeassessoria.com.br"

# ---------------------------------------------------------------------------
# Project layout (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
templates = "templates"
locales = "lang"          # One <locale>.json UI bundle per language
content = "content"       # *.json content files, blog/ holds one file per post
assets = "assets"         # Copied to dist/assets unchanged
dist = "dist"

# ---------------------------------------------------------------------------
# Build mode
# ---------------------------------------------------------------------------
[build]
# Also write Netlify _redirects and _headers.
production = false

# Warn about {{placeholders}} left in rendered pages.
debug = false

# Maximum parallel page renders.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4

# ---------------------------------------------------------------------------
# Pages
# ---------------------------------------------------------------------------
[pages]
# Templates rendered at each locale root.
root = [
    "index.html",
    "servicos.html",
    "sobre.html",
    "contato.html",
    "contato-sucesso.html",
    "politica-privacidade.html",
]
blog = "blog.html"       # Listing, written as blog.html and blog/index.html
article = "artigo.html"  # One page per content/blog/*.json post

# ---------------------------------------------------------------------------
# Segment landing pages: template -> key in content/segments.json
# ---------------------------------------------------------------------------
[segments]
output_dir = "segmentos"

[[segments.pages]]
template = "grupos-economicos.html"
key = "economic-groups"

[[segments.pages]]
template = "escritorios-advocacia.html"
key = "law-firms"

[[segments.pages]]
template = "incorporadoras.html"
key = "real-estate"

[[segments.pages]]
template = "empresas.html"
key = "general-companies"

# ---------------------------------------------------------------------------
# Link localization
# ---------------------------------------------------------------------------
[links]
# Root-relative prefixes that are shared by all locales and never prefixed.
shared_prefixes = ["assets/"]

# Page names that differ across locales. 'to' must not contain 'from'.
[[links.renames]]
from = "privacy-policy"
to = "politica-privacidade"

# ---------------------------------------------------------------------------
# Contact fallbacks (used when content/other-data.json has no value)
# ---------------------------------------------------------------------------
[contact]
whatsapp_number = "5511936621755"

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
# Root templates not listed in sitemap.xml.
exclude = ["contato-sucesso.html"]

# ---------------------------------------------------------------------------
# Language selector badges
# ---------------------------------------------------------------------------
[selector.pt]
flag = "🇧🇷"
code = "PT"
name = "Português"

[selector.en]
flag = "🇺🇸"
code = "EN"
name = "English"

[selector.es]
flag = "🇪🇸"
code = "ES"
name = "Español"
"##
}
