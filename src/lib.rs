//! # Sinal Verde
//!
//! Static site generator for the multilingual Sinal Verde marketing site.
//! Structured JSON content is rendered through mustache-style templates once
//! per language, and every internal link is rewritten to stay inside the
//! visitor's language.
//!
//! # Architecture: Render Pipeline
//!
//! Each (page, locale) pair goes through the same four steps:
//!
//! ```text
//! 1. Normalize   {{#if}}/{{#each}}/{{else}}  →  {{#x}} / {{^x}} / {{/x}}
//! 2. Render      normalized template + context  →  HTML
//! 3. Localize    href="/servicos.html"  →  href="/en/servicos.html"
//! 4. Write       dist/{locale}/…  plus sitemap, robots, redirect page
//! ```
//!
//! Steps 1 to 3 are pure functions over in-memory values. Only [`loader`] and
//! [`site`] touch the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`template`] | Extended-syntax normalizer, section renderer, per-instance template cache |
//! | [`content`] | Locale fallback resolution, post/segment/listing views, dates, categories |
//! | [`links`] | Locale prefixes on internal links, language-selector state |
//! | [`article`] | Structured post bodies rendered to HTML with Maud |
//! | [`page`] | Page plan and per-page context assembly |
//! | [`artifacts`] | `sitemap.xml`, `robots.txt`, root redirect, `build-info.json`, Netlify files |
//! | [`loader`] | Reads locale bundles and content JSON |
//! | [`site`] | Build orchestration: parallel render, asset copy, output tree |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`locale`] | Supported locales and the fallback order |
//! | [`warning`] | Non-fatal findings returned next to results |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## One Template, Every Language
//!
//! Templates are written once. Language differences live entirely in data
//! (`lang/{locale}.json` and the per-locale variants inside content files),
//! so adding a language is a config change plus a bundle.
//!
//! ## Fallback, Never Fail
//!
//! A missing translation never breaks a page. The view is taken from the
//! default language (then the others, in configured order) and the build
//! reports a [`warning::Warning::MissingTranslation`]. Broken templates skip
//! only the affected page.
//!
//! ## Always-Prefixed URLs
//!
//! Every locale, the default included, lives under `/{locale}/`. The root
//! `index.html` only redirects. This keeps link rewriting uniform and makes
//! sitemap URLs unambiguous.

pub mod article;
pub mod artifacts;
pub mod config;
pub mod content;
pub mod links;
pub mod loader;
pub mod locale;
pub mod output;
pub mod page;
pub mod site;
pub mod template;
pub mod warning;

#[cfg(test)]
pub(crate) mod test_helpers;
