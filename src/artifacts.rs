//! Site-level files written next to the locale trees.
//!
//! | File | Built by |
//! |------|----------|
//! | `sitemap.xml` | [`sitemap_xml`] |
//! | `robots.txt` | [`robots_txt`] |
//! | `index.html` | [`root_redirect_html`] (language detection) |
//! | `build-info.json` | [`BuildInfo`] |
//! | `_redirects`, `_headers` | [`netlify_redirects`], [`netlify_headers`] (production only) |
//!
//! Everything here is a pure function of the config and the page plan; the
//! site builder decides where the strings go.

use crate::config::SiteConfig;
use crate::page::{PageKind, PageRequest};
use chrono::{DateTime, SecondsFormat, Utc};
use maud::{DOCTYPE, Escaper, PreEscaped, html};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";
pub const ROOT_INDEX_FILE: &str = "index.html";
pub const BUILD_INFO_FILE: &str = "build-info.json";
pub const REDIRECTS_FILE: &str = "_redirects";
pub const HEADERS_FILE: &str = "_headers";

/// Root template treated as the locale home page.
const HOME_TEMPLATE: &str = "index.html";

// =============================================================================
// Sitemap
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Sitemap entries for a page plan, in plan order.
///
/// URLs are always locale-prefixed and drop `.html`; the home page maps to
/// the bare locale root. Root templates listed in `sitemap.exclude` are
/// left out.
pub fn sitemap_entries(config: &SiteConfig, plan: &[PageRequest]) -> Vec<SitemapEntry> {
    let domain = config.domain.trim_end_matches('/');
    plan.iter()
        .filter_map(|request| {
            let (changefreq, priority) = match &request.kind {
                PageKind::Root { template } if config.sitemap.exclude.contains(template) => {
                    return None;
                }
                PageKind::Root { template } if template == HOME_TEMPLATE => ("daily", "1.0"),
                PageKind::Root { .. } => ("weekly", "0.7"),
                PageKind::BlogListing => ("weekly", "0.9"),
                PageKind::Article { .. } => ("monthly", "0.6"),
                PageKind::Segment { .. } => ("weekly", "0.8"),
            };
            let path = request.page_path(config);
            let loc = if path == "index" {
                format!("{domain}/{}", request.locale)
            } else {
                format!("{domain}/{}/{path}", request.locale)
            };
            Some(SitemapEntry {
                loc,
                changefreq,
                priority,
            })
        })
        .collect()
}

pub fn sitemap_xml(config: &SiteConfig, plan: &[PageRequest]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in sitemap_entries(config, plan) {
        xml.push_str("  <url>\n    <loc>");
        // Writing into a String cannot fail.
        let _ = Escaper::new(&mut xml).write_str(&entry.loc);
        let _ = write!(
            xml,
            "</loc>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
            entry.changefreq, entry.priority
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

// =============================================================================
// robots.txt
// =============================================================================

pub fn robots_txt(config: &SiteConfig) -> String {
    let domain = config.domain.trim_end_matches('/');
    let mut lines = vec![
        "User-agent: *".to_string(),
        "Allow: /".to_string(),
        format!("Sitemap: {domain}/{SITEMAP_FILE}"),
        String::new(),
        "# Directories".to_string(),
    ];
    lines.extend(config.languages.iter().map(|lang| format!("Allow: /{lang}/")));
    lines.push(format!("Allow: /{}/", config.paths.assets.trim_matches('/')));
    lines.push("Allow: /blog/".to_string());
    lines.push(format!("Allow: /{}/", config.segments.output_dir));
    lines.extend([
        String::new(),
        "# Block admin areas".to_string(),
        "Disallow: /admin/".to_string(),
        "Disallow: /api/".to_string(),
        String::new(),
        "Crawl-delay: 1".to_string(),
    ]);
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

// =============================================================================
// Root redirect page
// =============================================================================

/// Picks a locale from the saved preference, then the browser language.
/// Expects `LANGS` and `DEFAULT_LANG` to be defined before it.
const REDIRECT_JS: &str = r#"
(function () {
    var host = window.location.hostname;
    if (host === 'localhost' || host === '127.0.0.1') {
        window.location.href = '/' + DEFAULT_LANG + '/index.html';
        return;
    }
    var lang = DEFAULT_LANG;
    var saved = null;
    try { saved = localStorage.getItem('preferredLanguage'); } catch (e) {}
    var browser = navigator.language || navigator.userLanguage || '';
    if (saved && LANGS.indexOf(saved) !== -1) {
        lang = saved;
    } else {
        for (var i = 0; i < LANGS.length; i++) {
            if (browser.toLowerCase().indexOf(LANGS[i]) === 0) {
                lang = LANGS[i];
                break;
            }
        }
    }
    window.location.href = '/' + lang + '/';
})();
"#;

/// `dist/index.html`: sends visitors to their locale, with plain links for
/// clients without JavaScript.
pub fn root_redirect_html(config: &SiteConfig) -> String {
    let default = &config.default_language;
    let preamble = format!(
        "var LANGS = {}; var DEFAULT_LANG = {};",
        Value::from(config.languages.clone()),
        Value::from(default.as_str())
    );
    let refresh = format!("0; url=/{default}/");

    html! {
        (DOCTYPE)
        html lang=(default) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Sinal Verde - Redirecionando..." }
                script { (PreEscaped(preamble)) (PreEscaped(REDIRECT_JS)) }
                noscript { meta http-equiv="refresh" content=(refresh); }
            }
            body {
                div style="text-align: center; padding: 50px; font-family: Arial, sans-serif;" {
                    h1 { "Redirecionando..." }
                    p { "Se não for redirecionado automaticamente, escolha seu idioma:" }
                    hr style="margin: 30px auto; width: 200px;";
                    p style="font-size: 20px;" {
                        @for (i, lang) in config.languages.iter().enumerate() {
                            @if i > 0 { " | " }
                            @let badge = config.selector.get(lang);
                            a href={ "/" (lang) "/" } style="margin: 0 10px;" {
                                @if let Some(badge) = badge {
                                    (badge.flag) " " (badge.name)
                                } @else {
                                    (lang)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    .into_string()
}

// =============================================================================
// build-info.json
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: String,
    pub build_date: String,
    pub environment: &'static str,
    pub languages: Vec<String>,
    pub pages: PageCounts,
    pub features: Features,
}

/// Counts per locale, except `total` which covers every rendered page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageCounts {
    #[serde(rename = "static")]
    pub static_pages: usize,
    pub blog: usize,
    pub segments: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Features {
    pub multilingual: bool,
    pub seo: bool,
    pub responsive: bool,
    pub pwa: bool,
    pub analytics: bool,
}

impl BuildInfo {
    pub fn new(config: &SiteConfig, plan: &[PageRequest], built: usize, build_date: DateTime<Utc>) -> Self {
        let first = config.languages.first();
        let mut pages = PageCounts {
            total: built,
            ..Default::default()
        };
        for request in plan.iter().filter(|r| Some(&r.locale) == first) {
            match request.kind {
                PageKind::Root { .. } => pages.static_pages += 1,
                PageKind::Article { .. } => pages.blog += 1,
                PageKind::Segment { .. } => pages.segments += 1,
                PageKind::BlogListing => {}
            }
        }
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_date: build_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            environment: if config.build.production {
                "production"
            } else {
                "development"
            },
            languages: config.languages.clone(),
            pages,
            features: Features {
                multilingual: config.languages.len() > 1,
                seo: true,
                responsive: true,
                pwa: false,
                analytics: true,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// =============================================================================
// Netlify
// =============================================================================

pub fn netlify_redirects(config: &SiteConfig) -> String {
    let default = &config.default_language;
    let mut lines = vec!["# Language detection".to_string()];
    lines.extend(
        config
            .languages
            .iter()
            .map(|lang| format!("/  /{lang}/  302  Language={lang}")),
    );
    lines.extend([
        String::new(),
        format!("/  /{default}/  302"),
        String::new(),
        "# Old URLs".to_string(),
        format!("/index.html  /{default}/  301"),
        format!("/home  /{default}/  301"),
        format!("/inicio  /{default}/  301"),
        String::new(),
        "/api/*  /.netlify/functions/:splat  200".to_string(),
    ]);
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub fn netlify_headers() -> &'static str {
    "\
# Security headers
/*
  X-Frame-Options: DENY
  X-Content-Type-Options: nosniff
  X-XSS-Protection: 1; mode=block
  Referrer-Policy: strict-origin-when-cross-origin

/assets/*
  Cache-Control: public, max-age=31536000, immutable

/*.html
  Cache-Control: public, max-age=3600, must-revalidate
"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BlogPost, SiteContent};
    use crate::page::plan_pages;
    use chrono::TimeZone;

    fn content() -> SiteContent {
        let post: BlogPost = serde_json::from_value(serde_json::json!({"id": "lgpd"})).unwrap();
        SiteContent {
            posts: vec![post],
            ..Default::default()
        }
    }

    // =========================================================================
    // Sitemap
    // =========================================================================

    #[test]
    fn sitemap_prefixes_every_locale_and_drops_html() {
        let config = SiteConfig::default();
        let plan = plan_pages(&config, &content());
        let entries = sitemap_entries(&config, &plan);
        let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();

        assert_eq!(locs[0], "https://sinalverdeassessoria.com.br/pt");
        assert!(locs.contains(&"https://sinalverdeassessoria.com.br/pt/servicos"));
        assert!(locs.contains(&"https://sinalverdeassessoria.com.br/en/blog"));
        assert!(locs.contains(&"https://sinalverdeassessoria.com.br/es/blog/lgpd"));
        assert!(locs.contains(&"https://sinalverdeassessoria.com.br/en/segmentos/empresas"));
        assert!(!locs.iter().any(|l| l.ends_with(".html")));
    }

    #[test]
    fn sitemap_skips_excluded_pages() {
        let config = SiteConfig::default();
        let plan = plan_pages(&config, &content());
        let entries = sitemap_entries(&config, &plan);
        assert!(!entries.iter().any(|e| e.loc.contains("contato-sucesso")));
        // 5 root + listing + 1 article + 4 segments, times 3 locales.
        assert_eq!(entries.len(), 33);
    }

    #[test]
    fn sitemap_priorities_by_kind() {
        let config = SiteConfig::default();
        let plan = plan_pages(&config, &content());
        let entries = sitemap_entries(&config, &plan);
        let find = |suffix: &str| {
            entries
                .iter()
                .find(|e| e.loc.ends_with(suffix))
                .map(|e| (e.changefreq, e.priority))
                .unwrap()
        };
        assert_eq!(find("/pt"), ("daily", "1.0"));
        assert_eq!(find("/pt/sobre"), ("weekly", "0.7"));
        assert_eq!(find("/pt/blog"), ("weekly", "0.9"));
        assert_eq!(find("/pt/blog/lgpd"), ("monthly", "0.6"));
        assert_eq!(find("/pt/segmentos/incorporadoras"), ("weekly", "0.8"));
    }

    #[test]
    fn sitemap_xml_shape() {
        let mut config = SiteConfig::default();
        config.languages = vec!["pt".into()];
        config.pages.root = vec!["index.html".into()];
        config.segments.pages.clear();
        config.domain = "https://example.com/".into();
        let plan = plan_pages(&config, &SiteContent::default());
        let xml = sitemap_xml(&config, &plan);
        assert_eq!(
            xml,
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
                "  <url>\n    <loc>https://example.com/pt</loc>\n",
                "    <changefreq>daily</changefreq>\n    <priority>1.0</priority>\n  </url>\n",
                "  <url>\n    <loc>https://example.com/pt/blog</loc>\n",
                "    <changefreq>weekly</changefreq>\n    <priority>0.9</priority>\n  </url>\n",
                "</urlset>\n"
            )
        );
    }

    // =========================================================================
    // robots / redirect / Netlify
    // =========================================================================

    #[test]
    fn robots_lists_sitemap_and_locale_dirs() {
        let robots = robots_txt(&SiteConfig::default());
        assert!(robots.starts_with("User-agent: *\nAllow: /\n"));
        assert!(robots.contains("Sitemap: https://sinalverdeassessoria.com.br/sitemap.xml\n"));
        for dir in ["/pt/", "/en/", "/es/", "/assets/", "/blog/", "/segmentos/"] {
            assert!(robots.contains(&format!("Allow: {dir}\n")), "{dir}");
        }
        assert!(robots.contains("Disallow: /api/\n"));
        assert!(robots.ends_with("Crawl-delay: 1\n"));
    }

    #[test]
    fn root_redirect_links_every_locale() {
        let html = root_redirect_html(&SiteConfig::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"var LANGS = ["pt","en","es"]; var DEFAULT_LANG = "pt";"#));
        assert!(html.contains(r#"<meta http-equiv="refresh" content="0; url=/pt/">"#));
        assert!(html.contains(r#"<a href="/en/" style="margin: 0 10px;">🇺🇸 English</a>"#));
        assert!(html.contains("Português</a> | <a"));
    }

    #[test]
    fn root_redirect_without_badge_shows_code() {
        let mut config = SiteConfig::default();
        config.languages.push("fr".into());
        let html = root_redirect_html(&config);
        assert!(html.contains(r#"<a href="/fr/" style="margin: 0 10px;">fr</a>"#));
    }

    #[test]
    fn netlify_redirects_follow_languages() {
        let redirects = netlify_redirects(&SiteConfig::default());
        assert!(redirects.contains("/  /en/  302  Language=en\n"));
        assert!(redirects.contains("\n/  /pt/  302\n"));
        assert!(redirects.contains("/inicio  /pt/  301\n"));
        assert!(netlify_headers().contains("/assets/*\n  Cache-Control: public, max-age=31536000, immutable"));
    }

    // =========================================================================
    // Build info
    // =========================================================================

    #[test]
    fn build_info_counts_pages_per_locale() {
        let mut config = SiteConfig::default();
        config.build.production = true;
        let plan = plan_pages(&config, &content());
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let info = BuildInfo::new(&config, &plan, plan.len() - 1, date);

        assert_eq!(
            info.pages,
            PageCounts {
                static_pages: 6,
                blog: 1,
                segments: 4,
                total: 35,
            }
        );
        assert_eq!(info.environment, "production");
        assert_eq!(info.build_date, "2024-05-01T12:00:00.000Z");

        let json: Value = serde_json::from_str(&info.to_json().unwrap()).unwrap();
        assert_eq!(json["pages"]["static"], 6);
        assert_eq!(json["buildDate"], "2024-05-01T12:00:00.000Z");
        assert_eq!(json["features"]["pwa"], false);
    }
}
