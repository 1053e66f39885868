//! Reads a site project's JSON content into a [`SiteContent`].
//!
//! ```text
//! lang/{locale}.json      → SiteContent::bundles[locale]
//! content/*.json          → SiteContent::files[stem]
//! content/blog/*.json     → SiteContent::posts (newest first)
//! ```
//!
//! A file that exists but cannot be read or parsed is fatal: silently
//! dropping it would publish a site with empty sections. Missing locale
//! bundles and missing directories load as empty and produce a
//! [`Warning::MissingContent`].

use crate::config::ResolvedPaths;
use crate::content::{BlogPost, SiteContent};
use crate::locale::Locales;
use crate::warning::Warning;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Subdirectory of the content directory holding blog posts.
pub const BLOG_SUBDIR: &str = "blog";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Content plus the non-fatal findings from reading it.
#[derive(Debug)]
pub struct Loaded {
    pub content: SiteContent,
    pub warnings: Vec<Warning>,
}

pub fn load_content(paths: &ResolvedPaths, locales: &Locales) -> Result<Loaded, LoadError> {
    let mut content = SiteContent::default();
    let mut warnings = Vec::new();

    for code in locales.all() {
        let path = paths.locales.join(format!("{code}.json"));
        match read_json::<Value>(&path)? {
            Some(bundle) => {
                content.bundles.insert(code.clone(), bundle);
            }
            None => warnings.push(missing(&path)),
        }
    }

    match json_files(&paths.content)? {
        Some(files) => {
            for path in files {
                if let (Some(stem), Some(value)) = (file_stem(&path), read_json::<Value>(&path)?) {
                    content.files.insert(stem, value);
                }
            }
        }
        None => warnings.push(missing(&paths.content)),
    }

    let blog_dir = paths.content.join(BLOG_SUBDIR);
    match json_files(&blog_dir)? {
        Some(files) => {
            for path in files {
                if let Some(post) = read_json::<BlogPost>(&path)? {
                    content.posts.push(post);
                }
            }
        }
        None => warnings.push(missing(&blog_dir)),
    }
    content.sort_posts();

    log::debug!(
        "loaded {} bundles, {} content files, {} posts",
        content.bundles.len(),
        content.files.len(),
        content.posts.len()
    );
    Ok(Loaded { content, warnings })
}

fn missing(path: &Path) -> Warning {
    Warning::MissingContent {
        path: path.display().to_string(),
    }
}

/// Parse a JSON file; `Ok(None)` when it does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, LoadError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// `*.json` files directly inside `dir`, sorted by name; `Ok(None)` when
/// the directory does not exist.
fn json_files(dir: &Path) -> Result<Option<Vec<PathBuf>>, LoadError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoadError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(Some(files))
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn project() -> (TempDir, ResolvedPaths, Locales) {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let paths = config.resolve_paths(tmp.path());
        fs::create_dir_all(&paths.locales).unwrap();
        fs::create_dir_all(paths.content.join(BLOG_SUBDIR)).unwrap();
        (tmp, paths, config.locales())
    }

    #[test]
    fn loads_bundles_files_and_sorted_posts() {
        let (_tmp, paths, locales) = project();
        fs::write(paths.locales.join("pt.json"), r#"{"nav": {"blog": "Blog"}}"#).unwrap();
        fs::write(paths.locales.join("en.json"), r#"{"nav": {"blog": "Blog"}}"#).unwrap();
        fs::write(paths.locales.join("es.json"), r#"{}"#).unwrap();
        fs::write(paths.content.join("segments.json"), r#"{"law-firms": {}}"#).unwrap();
        fs::write(paths.content.join("notes.txt"), "ignored").unwrap();
        let blog = paths.content.join(BLOG_SUBDIR);
        fs::write(blog.join("a.json"), r#"{"id": "a", "date": "2023-01-01"}"#).unwrap();
        fs::write(blog.join("b.json"), r#"{"id": "b", "date": "2024-01-01"}"#).unwrap();

        let loaded = load_content(&paths, &locales).unwrap();
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.content.bundles.len(), 3);
        assert_eq!(loaded.content.files.keys().collect::<Vec<_>>(), vec!["segments"]);
        let ids: Vec<&str> = loaded.content.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn missing_bundle_and_blog_dir_warn() {
        let (_tmp, paths, locales) = project();
        fs::write(paths.locales.join("pt.json"), "{}").unwrap();
        fs::remove_dir(paths.content.join(BLOG_SUBDIR)).unwrap();

        let loaded = load_content(&paths, &locales).unwrap();
        assert_eq!(loaded.content.bundles.len(), 1);
        assert!(loaded.content.posts.is_empty());
        let missing: Vec<String> = loaded.warnings.iter().map(|w| w.to_string()).collect();
        assert_eq!(missing.len(), 3);
        assert!(missing[0].ends_with("en.json"));
        assert!(missing[2].ends_with(BLOG_SUBDIR));
    }

    #[test]
    fn invalid_json_names_the_file() {
        let (_tmp, paths, locales) = project();
        fs::write(paths.content.join("other-data.json"), "{ nope").unwrap();
        let err = load_content(&paths, &locales).unwrap_err();
        match err {
            LoadError::Json { path, .. } => assert!(path.ends_with("other-data.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn post_without_id_is_invalid() {
        let (_tmp, paths, locales) = project();
        fs::write(paths.content.join(BLOG_SUBDIR).join("x.json"), r#"{"date": "2024-01-01"}"#).unwrap();
        assert!(matches!(
            load_content(&paths, &locales),
            Err(LoadError::Json { .. })
        ));
    }
}
