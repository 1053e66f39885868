//! Build orchestration: load, render every page, write the `dist/` tree.
//!
//! ```text
//! config.toml ─▶ load_content ─▶ plan_pages ─▶ PageBuilder (rayon) ─┐
//!                                                                  ├─▶ dist/{locale}/…
//! assets/ ─▶ asset_version (SHA-256) ─────────────────────────────┘    dist/assets/
//!                                                                      dist/{sitemap.xml, robots.txt, …}
//! ```
//!
//! A page that fails to render (broken template, missing template) is
//! skipped and reported; the rest of the site still builds. Config, content
//! and filesystem errors abort the build.
//!
//! The rayon pool is whatever the caller configured; [`build`] and [`check`]
//! only use `par_iter`.

use crate::artifacts::{
    BUILD_INFO_FILE, BuildInfo, HEADERS_FILE, REDIRECTS_FILE, ROBOTS_FILE, ROOT_INDEX_FILE,
    SITEMAP_FILE, netlify_headers, netlify_redirects, robots_txt, root_redirect_html, sitemap_xml,
};
use crate::config::{ConfigError, ResolvedPaths, SiteConfig};
use crate::loader::{LoadError, load_content};
use crate::page::{BuiltPage, PageBuilder, PageError, PageRequest, plan_pages};
use crate::template::{DirTemplates, RenderOptions, Renderer};
use crate::warning::Warning;
use chrono::{DateTime, Datelike, Utc};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Length of the asset hash used in `?v=` cache busters.
const ASSET_VERSION_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
    #[error("failed to serialize build info: {0}")]
    Json(#[from] serde_json::Error),
    #[error("refusing to clean {}: it contains the project root", .0.display())]
    UnsafeOutput(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Built { outputs: Vec<String> },
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct PageReport {
    pub request: PageRequest,
    pub template: String,
    pub outcome: PageOutcome,
}

/// What a build or check did, in page-plan order.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub pages: Vec<PageReport>,
    /// Load, locale and page warnings, in that order.
    pub warnings: Vec<Warning>,
    /// Site-level files written at the output root.
    pub artifacts: Vec<String>,
    pub assets_copied: usize,
    pub asset_version: String,
    /// `None` for a check, which writes nothing.
    pub output: Option<PathBuf>,
}

impl BuildReport {
    pub fn built(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.outcome, PageOutcome::Built { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.pages.len() - self.built()
    }
}

/// Everything rendered, nothing written yet.
struct RenderedSite {
    plan: Vec<PageRequest>,
    pages: Vec<(PageReport, Option<BuiltPage>)>,
    warnings: Vec<Warning>,
    asset_version: String,
}

/// Build the site at `root` into `output` (or the configured `paths.dist`).
///
/// The output directory is removed first.
pub fn build(
    root: &Path,
    config: &SiteConfig,
    output: Option<&Path>,
    now: DateTime<Utc>,
) -> Result<BuildReport, BuildError> {
    let paths = config.resolve_paths(root);
    let dist = output.map(Path::to_path_buf).unwrap_or_else(|| paths.dist.clone());

    let rendered = render_site(config, &paths, now)?;

    clean_output(root, &dist)?;
    let mut report = BuildReport {
        warnings: rendered.warnings,
        asset_version: rendered.asset_version,
        output: Some(dist.clone()),
        ..Default::default()
    };
    for (page_report, page) in rendered.pages {
        if let Some(page) = page {
            for file in &page.outputs {
                write_file(&dist.join(file), &page.html)?;
            }
        }
        report.pages.push(page_report);
    }
    log::info!("wrote {} pages to {}", report.built(), dist.display());

    let assets_dir = dist.join(&config.paths.assets);
    report.assets_copied = copy_assets(&paths.assets, &assets_dir)?;
    log::debug!("copied {} assets", report.assets_copied);

    let info = BuildInfo::new(config, &rendered.plan, report.built(), now);
    // Skipped pages have no file, so they stay out of the sitemap.
    let built: Vec<PageRequest> = report
        .pages
        .iter()
        .filter(|page| matches!(page.outcome, PageOutcome::Built { .. }))
        .map(|page| page.request.clone())
        .collect();
    let mut artifacts = vec![
        (ROOT_INDEX_FILE, root_redirect_html(config)),
        (SITEMAP_FILE, sitemap_xml(config, &built)),
        (ROBOTS_FILE, robots_txt(config)),
        (BUILD_INFO_FILE, info.to_json()?),
    ];
    if config.build.production {
        artifacts.push((REDIRECTS_FILE, netlify_redirects(config)));
        artifacts.push((HEADERS_FILE, netlify_headers().to_string()));
    }
    for (name, text) in artifacts {
        write_file(&dist.join(name), &text)?;
        report.artifacts.push(name.to_string());
    }

    Ok(report)
}

/// Render every page in memory and report, writing nothing.
pub fn check(root: &Path, config: &SiteConfig, now: DateTime<Utc>) -> Result<BuildReport, BuildError> {
    let paths = config.resolve_paths(root);
    let rendered = render_site(config, &paths, now)?;
    Ok(BuildReport {
        pages: rendered.pages.into_iter().map(|(report, _)| report).collect(),
        warnings: rendered.warnings,
        asset_version: rendered.asset_version,
        ..Default::default()
    })
}

fn render_site(config: &SiteConfig, paths: &ResolvedPaths, now: DateTime<Utc>) -> Result<RenderedSite, BuildError> {
    config.validate()?;
    let locales = config.locales();

    let loaded = load_content(paths, &locales)?;
    let content = loaded.content;
    let mut warnings = loaded.warnings;

    let asset_version = asset_version(&paths.assets)?;
    log::debug!("asset version {asset_version}");

    let renderer = Renderer::with_options(
        DirTemplates::new(&paths.templates),
        RenderOptions {
            escape_html: false,
            diagnostics: config.build.debug,
        },
    );
    let builder = PageBuilder::new(&renderer, &content, config, asset_version.as_str(), now.year());
    warnings.extend(builder.locale_warnings());

    let plan = plan_pages(config, &content);
    log::info!(
        "rendering {} pages for {} locales",
        plan.len(),
        config.languages.len()
    );
    let results: Vec<Result<BuiltPage, PageError>> =
        plan.par_iter().map(|request| builder.build(request)).collect();

    let mut pages = Vec::with_capacity(plan.len());
    for (request, result) in plan.iter().zip(results) {
        let template = request.template(config);
        match result {
            Ok(mut page) => {
                warnings.append(&mut page.warnings);
                let report = PageReport {
                    request: request.clone(),
                    template,
                    outcome: PageOutcome::Built {
                        outputs: page.outputs.clone(),
                    },
                };
                pages.push((report, Some(page)));
            }
            Err(e) => {
                log::warn!("skipping {template} ({}): {e}", request.locale);
                let report = PageReport {
                    request: request.clone(),
                    template,
                    outcome: PageOutcome::Skipped {
                        reason: e.to_string(),
                    },
                };
                pages.push((report, None));
            }
        }
    }
    for warning in &warnings {
        log::warn!("{warning}");
    }

    Ok(RenderedSite {
        plan,
        pages,
        warnings,
        asset_version,
    })
}

/// SHA-256 over every asset's relative path and bytes, in path order.
/// A missing asset directory hashes as empty.
pub fn asset_version(assets: &Path) -> Result<String, BuildError> {
    let mut hasher = Sha256::new();
    if assets.is_dir() {
        for entry in WalkDir::new(assets).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(assets).unwrap_or(entry.path());
            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(fs::read(entry.path()).map_err(io_error(entry.path()))?);
        }
    }
    let mut hash = format!("{:x}", hasher.finalize());
    hash.truncate(ASSET_VERSION_LEN);
    Ok(hash)
}

/// Copy the asset tree verbatim. Returns the number of files copied.
fn copy_assets(src: &Path, dst: &Path) -> Result<usize, BuildError> {
    if !src.is_dir() {
        log::warn!("no assets directory at {}", src.display());
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(io_error(&target))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Remove and recreate the output directory.
fn clean_output(root: &Path, dist: &Path) -> Result<(), BuildError> {
    let root = root.canonicalize().map_err(io_error(root))?;
    if let Ok(dist) = dist.canonicalize()
        && root.starts_with(&dist)
    {
        return Err(BuildError::UnsafeOutput(dist));
    }
    match fs::remove_dir_all(dist) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(BuildError::Io {
                path: dist.to_path_buf(),
                source,
            });
        }
    }
    fs::create_dir_all(dist).map_err(io_error(dist))
}

fn write_file(path: &Path, text: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(path, text).map_err(io_error(path))
}
