//! Template pipeline: extended syntax → primitive sections → HTML.
//!
//! ```text
//! source text ──normalize()──▶ primitive text ──parse()──▶ nodes
//!                                                            │
//!            context ──annotate()──▶ annotated context ──────┴──render──▶ HTML
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`preprocess`] | `{{#if}}` / `{{#each}}` / `{{else}}` / `{{this}}` rewriting |
//! | [`context`] | `@index` / `@first` / `@last` annotation of sequences |
//! | `render` | Parsing and logic-less evaluation over JSON values |
//!
//! [`Renderer`] ties the three together and owns the compiled-template cache.
//! Templates are loaded through a [`TemplateSource`] so the pipeline can run
//! against a directory or an in-memory set.

pub mod context;
pub mod preprocess;
mod render;

use crate::warning::Warning;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use thiserror::Error;

pub use preprocess::normalize;

/// Up to this many leftover markers are reported per render.
const MAX_REPORTED_PLACEHOLDERS: usize = 5;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^}]+\}\}").unwrap());

/// A malformed block structure, located by line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {problem}")]
pub struct StructureError {
    pub line: usize,
    pub problem: Problem,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    #[error("tag is never closed")]
    UnterminatedTag,
    #[error("close '{tag}' without an open section")]
    CloseWithoutOpen { tag: String },
    #[error("close '{tag}' does not match open '{open}' from line {open_line}")]
    CloseMismatch {
        tag: String,
        open: String,
        open_line: usize,
    },
    #[error("else outside of any section")]
    ElseWithoutOpen,
    #[error("else inside inverted section '{name}'")]
    ElseInInverted { name: String },
    #[error("second else in section '{name}'")]
    DuplicateElse { name: String },
    #[error("section '{open}' is never closed")]
    Unclosed { open: String },
    #[error("unsupported block expression '{expr}', blocks take a single name")]
    UnsupportedExpression { expr: String },
    #[error("unsupported tag {tag}")]
    UnsupportedTag { tag: String },
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("failed to read template {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("template {name}: {source}")]
    Structure {
        name: String,
        #[source]
        source: StructureError,
    },
}

/// Where raw template text comes from.
pub trait TemplateSource: Send + Sync {
    fn load(&self, name: &str) -> Result<String, TemplateError>;
}

/// Templates read from a directory; names are paths relative to it.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    root: PathBuf,
}

impl DirTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for DirTemplates {
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        fs::read_to_string(self.root.join(name)).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                TemplateError::NotFound(name.to_string())
            } else {
                TemplateError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })
    }
}

/// Named templates held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplates {
    templates: HashMap<String, String>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for MemoryTemplates {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut templates = Self::new();
        for (name, source) in iter {
            templates.insert(name, source);
        }
        templates
    }
}

impl TemplateSource for MemoryTemplates {
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Escape `{{x}}` output. Off for this site: its content carries trusted HTML.
    pub escape_html: bool,
    /// Report leftover `{{…}}` markers in the output.
    pub diagnostics: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub warnings: Vec<Warning>,
}

/// A template after normalization and parsing.
#[derive(Debug)]
struct Compiled {
    normalized: String,
    nodes: Vec<render::Node>,
}

/// Renders named templates, compiling each one once.
///
/// The cache lives as long as the renderer and is never invalidated;
/// rebuilding a site means building a new renderer. Shared by reference
/// across rayon workers.
pub struct Renderer {
    source: Box<dyn TemplateSource>,
    options: RenderOptions,
    cache: RwLock<HashMap<String, Arc<Compiled>>>,
}

impl Renderer {
    pub fn new(source: impl TemplateSource + 'static) -> Self {
        Self::with_options(source, RenderOptions::default())
    }

    pub fn with_options(source: impl TemplateSource + 'static, options: RenderOptions) -> Self {
        Self {
            source: Box::new(source),
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    fn compiled(&self, name: &str) -> Result<Arc<Compiled>, TemplateError> {
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(hit));
        }

        let raw = self.source.load(name)?;
        let structure = |source| TemplateError::Structure {
            name: name.to_string(),
            source,
        };
        let normalized = normalize(&raw).map_err(structure)?;
        let nodes = render::parse(&normalized).map_err(structure)?;
        let compiled = Arc::new(Compiled { normalized, nodes });

        // Two workers may compile the same template; the first insert wins
        // and both results are identical.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            cache.entry(name.to_string()).or_insert(compiled),
        ))
    }

    /// Normalized text of a template, from the cache when present.
    pub fn normalized(&self, name: &str) -> Result<String, TemplateError> {
        Ok(self.compiled(name)?.normalized.clone())
    }

    /// Render `name` against `context`. The context is not modified.
    pub fn render(&self, name: &str, context: &Map<String, Value>) -> Result<Rendered, TemplateError> {
        let compiled = self.compiled(name)?;
        let annotated = Value::Object(context::annotate(context));
        let html = render::render_nodes(&compiled.nodes, &annotated, self.options.escape_html);

        let mut warnings = Vec::new();
        if self.options.diagnostics {
            let tokens = unresolved_placeholders(&html);
            if !tokens.is_empty() {
                warnings.push(Warning::UnresolvedPlaceholders {
                    template: name.to_string(),
                    tokens,
                });
            }
        }
        Ok(Rendered { html, warnings })
    }

    /// Number of compiled templates held.
    pub fn cached_count(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Leftover `{{…}}` markers in rendered output, first few only.
pub fn unresolved_placeholders(html: &str) -> Vec<String> {
    PLACEHOLDER
        .find_iter(html)
        .take(MAX_REPORTED_PLACEHOLDERS)
        .map(|m| m.as_str().to_string())
        .collect()
}
