//! Page assembly: one (page, locale) pair in, finished HTML out.
//!
//! ```text
//! base data (per locale) ─┐
//! page data ──────────────┼─▶ context ─▶ Renderer ─▶ localize_links ─▶ BuiltPage
//! labels + URL vars ──────┘
//! ```
//!
//! Later layers win on key clashes: base, then page data, then the UI
//! labels, then `CURRENT_LANG` / `BASE_URL` / `LANG_PREFIX` / `ASSET_VERSION`.
//!
//! | Kind | Template | Output (under `{locale}/`) |
//! |------|----------|----------------------------|
//! | Root | `index.html`, `servicos.html`, … | same name |
//! | Blog listing | `blog.html` | `blog/index.html` and `blog.html` |
//! | Article | `artigo.html` | `blog/{id}.html` |
//! | Segment | `segmentos/{template}` | `segmentos/{template}` |

use crate::article::{render_article_body, render_tags};
use crate::config::SiteConfig;
use crate::content::post::{listing, post_view, related_posts, resolve_post, PostView};
use crate::content::segment::segment_view;
use crate::content::{SiteContent, OTHER_DATA_FILE, SEGMENTS_FILE};
use crate::links::{LinkRules, localize_links};
use crate::locale::Locales;
use crate::template::{Renderer, TemplateError};
use crate::warning::Warning;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Output directory of the blog inside each locale.
pub const BLOG_DIR: &str = "blog";

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("no post with id '{0}'")]
    UnknownPost(String),
    #[error("locale '{0}' is not configured")]
    UnknownLocale(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    Root { template: String },
    BlogListing,
    Article { id: String },
    Segment { template: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub locale: String,
    pub kind: PageKind,
}

impl PageRequest {
    /// Output files, relative to the build directory, `/`-separated.
    pub fn outputs(&self, config: &SiteConfig) -> Vec<String> {
        let lang = &self.locale;
        match &self.kind {
            PageKind::Root { template } => vec![format!("{lang}/{template}")],
            PageKind::BlogListing => vec![
                format!("{lang}/{BLOG_DIR}/index.html"),
                format!("{lang}/{}", config.pages.blog),
            ],
            PageKind::Article { id } => vec![format!("{lang}/{BLOG_DIR}/{id}.html")],
            PageKind::Segment { template, .. } => {
                vec![format!("{lang}/{}/{template}", config.segments.output_dir)]
            }
        }
    }

    /// Template name inside the templates directory.
    pub fn template(&self, config: &SiteConfig) -> String {
        match &self.kind {
            PageKind::Root { template } => template.clone(),
            PageKind::BlogListing => config.pages.blog.clone(),
            PageKind::Article { .. } => config.pages.article.clone(),
            PageKind::Segment { template, .. } => {
                format!("{}/{template}", config.segments.output_dir)
            }
        }
    }

    /// Path of the page inside its locale directory, without `.html`; drives
    /// the language-selector links.
    pub fn page_path(&self, config: &SiteConfig) -> String {
        match &self.kind {
            PageKind::Article { id } => format!("{BLOG_DIR}/{id}"),
            _ => {
                let template = self.template(config);
                template
                    .strip_suffix(".html")
                    .map(str::to_string)
                    .unwrap_or(template)
            }
        }
    }
}

/// Every page of the site, locale by locale in configured order.
pub fn plan_pages(config: &SiteConfig, content: &SiteContent) -> Vec<PageRequest> {
    let mut plan = Vec::new();
    for locale in &config.languages {
        let mut push = |kind| {
            plan.push(PageRequest {
                locale: locale.clone(),
                kind,
            })
        };
        for template in &config.pages.root {
            push(PageKind::Root {
                template: template.clone(),
            });
        }
        push(PageKind::BlogListing);
        for post in &content.posts {
            push(PageKind::Article { id: post.id.clone() });
        }
        for page in &config.segments.pages {
            push(PageKind::Segment {
                template: page.template.clone(),
                key: page.key.clone(),
            });
        }
    }
    plan
}

#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub request: PageRequest,
    pub outputs: Vec<String>,
    pub html: String,
    pub warnings: Vec<Warning>,
}

/// Data shared by every page of one locale.
#[derive(Debug, Clone)]
struct LocaleBase {
    data: Map<String, Value>,
    labels: Map<String, Value>,
    warnings: Vec<Warning>,
}

/// Builds pages from loaded content. Cheap to share across threads.
pub struct PageBuilder<'a> {
    renderer: &'a Renderer,
    content: &'a SiteContent,
    config: &'a SiteConfig,
    locales: Locales,
    rules: LinkRules,
    asset_version: String,
    bases: BTreeMap<String, LocaleBase>,
}

impl<'a> PageBuilder<'a> {
    pub fn new(
        renderer: &'a Renderer,
        content: &'a SiteContent,
        config: &'a SiteConfig,
        asset_version: impl Into<String>,
        year: i32,
    ) -> Self {
        let locales = config.locales();
        let asset_version = asset_version.into();
        let bases = config
            .languages
            .iter()
            .map(|locale| {
                let base = locale_base(content, config, &locales, locale, &asset_version, year);
                (locale.clone(), base)
            })
            .collect();
        Self {
            renderer,
            content,
            config,
            locales,
            rules: LinkRules::from_config(config),
            asset_version,
            bases,
        }
    }

    /// Warnings raised while preparing each locale's shared data (missing
    /// bundles, untranslated privacy policy). Reported once, not per page.
    pub fn locale_warnings(&self) -> Vec<Warning> {
        self.bases
            .values()
            .flat_map(|base| base.warnings.iter().cloned())
            .collect()
    }

    pub fn build(&self, request: &PageRequest) -> Result<BuiltPage, PageError> {
        let locale = request.locale.as_str();
        let base = self
            .bases
            .get(locale)
            .ok_or_else(|| PageError::UnknownLocale(locale.to_string()))?;

        let (page_data, mut warnings) = match &request.kind {
            PageKind::Root { .. } => (Map::new(), Vec::new()),
            PageKind::BlogListing => {
                let listing = listing(&self.content.posts, locale, &self.locales);
                (listing.data, listing.warnings)
            }
            PageKind::Article { id } => self.article_data(id, locale)?,
            PageKind::Segment { key, .. } => {
                segment_view(&self.content.file(SEGMENTS_FILE), key, locale, &self.locales)
            }
        };

        let mut context = base.data.clone();
        context.extend(page_data);
        context.extend(base.labels.clone());
        context.extend(self.url_vars(locale));

        let template = request.template(self.config);
        let rendered = self.renderer.render(&template, &context)?;
        warnings.extend(rendered.warnings);

        let html = localize_links(&rendered.html, locale, &request.page_path(self.config), &self.rules);
        Ok(BuiltPage {
            request: request.clone(),
            outputs: request.outputs(self.config),
            html,
            warnings,
        })
    }

    fn url_vars(&self, locale: &str) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert("CURRENT_LANG".into(), Value::from(locale));
        vars.insert("BASE_URL".into(), Value::from(""));
        vars.insert("LANG_PREFIX".into(), Value::from(format!("/{locale}")));
        vars.insert("ASSET_VERSION".into(), Value::from(self.asset_version.as_str()));
        vars
    }

    fn article_data(&self, id: &str, locale: &str) -> Result<(Map<String, Value>, Vec<Warning>), PageError> {
        let post = self
            .content
            .posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PageError::UnknownPost(id.to_string()))?;

        let variant = resolve_post(post, locale, &self.locales);
        let view = PostView::new(post, &variant, locale);
        let seo = variant.get("seo");
        let seo_text = |key: &str| seo.and_then(|s| s.get(key)).and_then(Value::as_str).filter(|s| !s.is_empty());

        let keywords = match seo.and_then(|s| s.get("keywords")) {
            Some(Value::Array(words)) => words
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::String(words)) => words.clone(),
            _ => post.tags.join(", "),
        };
        let related: Vec<Value> = related_posts(post, &self.content.posts)
            .into_iter()
            .map(|p| post_view(p, locale, &self.locales).0.to_value())
            .collect();

        let mut data = match view.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut set = |key: &str, value: Value| {
            data.insert(key.to_string(), value);
        };
        set("META_TITLE", Value::from(seo_text("metaTitle").unwrap_or(&view.title)));
        set(
            "META_DESCRIPTION",
            Value::from(seo_text("metaDescription").unwrap_or(&view.excerpt)),
        );
        set("META_KEYWORDS", Value::from(keywords));
        set("OG_TITLE", Value::from(view.title.as_str()));
        set("OG_DESCRIPTION", Value::from(view.excerpt.as_str()));
        set("TITLE", Value::from(view.title.as_str()));
        set("EXCERPT", Value::from(view.excerpt.as_str()));
        set("CONTENT", Value::from(render_article_body(&view.content, locale)));
        set("TAGS", Value::from(render_tags(&post.tags)));
        set("CATEGORY", Value::from(view.category_name.as_str()));
        set("DATE", Value::from(view.date.as_str()));
        set("AUTHOR", Value::from(view.author.as_str()));
        set("AUTHOR_ROLE", Value::from(view.author_role.as_str()));
        set("READ_TIME_LABEL", Value::from(format!("{} min", view.read_time)));
        set("RELATED_ARTICLES", Value::Array(related.clone()));
        set("relatedPosts", Value::Array(related));

        Ok((data, variant.warning.into_iter().collect()))
    }
}

fn locale_base(
    content: &SiteContent,
    config: &SiteConfig,
    locales: &Locales,
    locale: &str,
    asset_version: &str,
    year: i32,
) -> LocaleBase {
    let (ui, bundle_warning) = content.bundle(locale, locales);
    let (privacy, privacy_warning) = content.privacy_policy(locale, locales);
    let posts: Vec<Value> = content.posts.iter().map(|p| p.to_value()).collect();

    let mut meta = Map::new();
    meta.insert("lang".into(), Value::from(locale));
    meta.insert("baseUrl".into(), Value::from(config.domain.as_str()));
    meta.insert("version".into(), Value::from(asset_version));
    meta.insert("year".into(), Value::from(year));

    let labels = ui_labels(&ui, locale, content, config);

    let mut data = Map::new();
    data.insert("ui".into(), Value::Object(ui));
    data.insert("segments".into(), content.file(SEGMENTS_FILE));
    data.insert("otherData".into(), content.file(OTHER_DATA_FILE));
    data.insert("privacyPolicy".into(), Value::Object(privacy));
    data.insert("blogPosts".into(), Value::Array(posts));
    data.insert("meta".into(), Value::Object(meta));

    LocaleBase {
        data,
        labels,
        warnings: bundle_warning.into_iter().chain(privacy_warning).collect(),
    }
}

/// Navigation and common labels, each with an English fallback.
fn ui_labels(ui: &Map<String, Value>, locale: &str, content: &SiteContent, config: &SiteConfig) -> Map<String, Value> {
    let label = |section: &str, key: &str, fallback: &str| {
        let text = ui
            .get(section)
            .and_then(|s| s.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback);
        Value::from(text)
    };

    let mut labels = Map::new();
    labels.insert("LANG".into(), Value::from(locale));
    labels.insert("MENU_LABEL".into(), label("common", "menu", "Menu"));
    labels.insert("SERVICES_LABEL".into(), label("nav", "services", "Services"));
    labels.insert("SEGMENTS_LABEL".into(), label("nav", "segments", "Segments"));
    labels.insert("ABOUT_LABEL".into(), label("nav", "about", "About"));
    labels.insert("BLOG_LABEL".into(), label("nav", "blog", "Blog"));
    labels.insert("CONTACT_LABEL".into(), label("nav", "contact", "Contact"));
    labels.insert("SHARE_LABEL".into(), label("blog", "share", "Share"));
    labels.insert(
        "RELATED_ARTICLES_TITLE".into(),
        label("blog", "relatedArticles", "Related Articles"),
    );
    labels.insert(
        "WHATSAPP_NUMBER".into(),
        Value::from(
            content
                .whatsapp_number()
                .unwrap_or(config.contact.whatsapp_number.as_str()),
        ),
    );
    labels.insert("WHATSAPP_LABEL".into(), Value::from("WhatsApp"));
    labels
}
