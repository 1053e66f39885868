//! Link localization for rendered pages.
//!
//! Pages are written under `/{locale}/…`, so rooted internal links in the
//! templates need the locale inserted. The pass also drives the language
//! selector, which templates ship with neutral markup:
//!
//! ```html
//! <button class="lang-current">…</button>
//! <a class="lang-option" data-lang="en" href="#">English</a>
//! ```
//!
//! | Element | Rewrite |
//! |---------|---------|
//! | `<a href="/servicos.html">` | `/{locale}/servicos.html` |
//! | `<a href="/assets/…">`, `<a href="/en/…">`, `https:`, `#`, relative | untouched |
//! | `.lang-current` | inner HTML replaced with the locale's flag and code |
//! | `.lang-option[data-lang]` | `active` on the current locale only; `href` to the same page in that locale |
//! | `<a href*="{from}">` | first `{from}` replaced by `{to}` for each configured rename |
//! | `<!-- … -->`, `<script>…</script>`, `<style>…</style>` | untouched |
//!
//! Every rewrite is a fixed point: running the pass over its own output
//! changes nothing.

use crate::config::{PathRename, SelectorBadge, SiteConfig};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

const CURRENT_CLASS: &str = "lang-current";
const OPTION_CLASS: &str = "lang-option";
const ACTIVE_CLASS: &str = "active";

/// Start or end tag: (1) `/` for end tags, (2) name, (3) attribute text.
/// Quoted attribute values may contain `>`.
///
/// Comments and whole `<script>`/`<style>` elements match first and carry
/// no groups, so their contents are never scanned as markup.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)<!--.*?-->",
        r#"|(?i:<script\b(?:"[^"]*"|'[^']*'|[^'">])*>.*?</script\s*>)"#,
        r#"|(?i:<style\b(?:"[^"]*"|'[^']*'|[^'">])*>.*?</style\s*>)"#,
        r#"|<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:"[^"]*"|'[^']*'|[^'">])*)>"#,
    ))
    .unwrap()
});

/// (closing, name, attribute text) of a tag match; `None` for comments and
/// raw-text elements.
fn tag_parts<'h>(caps: &Captures<'h>) -> Option<(bool, &'h str, &'h str)> {
    let name = caps.get(2)?.as_str();
    let closing = caps.get(1).is_some_and(|m| !m.is_empty());
    let attrs = caps.get(3).map_or("", |m| m.as_str());
    Some((closing, name, attrs))
}

/// One attribute inside a tag: name and an optional double-quoted,
/// single-quoted or bare value.
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

static SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").unwrap());

/// What the localizer needs to know about the site.
#[derive(Debug, Clone, Default)]
pub struct LinkRules {
    /// Every configured locale; links already under one are left alone.
    pub locales: Vec<String>,
    /// Root-relative prefixes shared by all locales (`assets/`).
    pub shared_prefixes: Vec<String>,
    pub renames: Vec<PathRename>,
    /// Selector badge markup per locale.
    pub badges: BTreeMap<String, SelectorBadge>,
}

impl LinkRules {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            locales: config.languages.clone(),
            shared_prefixes: config.links.shared_prefixes.clone(),
            renames: config.links.renames.clone(),
            badges: config.selector.clone(),
        }
    }
}

/// Localize every internal link and the language selector in `html`.
///
/// `page_path` is the page's path inside the locale directory, with or
/// without `.html` (`index`, `servicos.html`, `blog/lgpd`).
pub fn localize_links(html: &str, locale: &str, page_path: &str, rules: &LinkRules) -> String {
    let html = match rules.badges.get(locale) {
        Some(badge) => replace_current_badge(html, &badge_markup(badge)),
        None => html.to_string(),
    };
    let page = page_path.strip_suffix(".html").unwrap_or(page_path);

    TAG.replace_all(&html, |caps: &Captures| {
        let whole = &caps[0];
        let Some((false, name, attrs)) = tag_parts(caps) else {
            return whole.to_string();
        };
        let mut attrs = attrs.to_string();
        let is_anchor = name.eq_ignore_ascii_case("a");

        if is_anchor
            && let Some(href) = attr_value(&attrs, "href")
            && let Some(localized) = localize_href(href, locale, rules)
        {
            attrs = set_attr(&attrs, "href", &localized);
        }

        if has_class(&attrs, OPTION_CLASS)
            && let Some(target) = attr_value(&attrs, "data-lang").map(str::to_string)
        {
            let classes = attr_value(&attrs, "class").unwrap_or_default();
            attrs = set_attr(&attrs, "class", &toggle_active(classes, target == locale));
            attrs = set_attr(&attrs, "href", &option_href(&target, page));
        }

        if is_anchor && let Some(href) = attr_value(&attrs, "href") {
            let mut renamed = href.to_string();
            for rename in &rules.renames {
                renamed = renamed.replacen(&rename.from, &rename.to, 1);
            }
            if renamed != href {
                attrs = set_attr(&attrs, "href", &renamed);
            }
        }

        format!("<{name}{attrs}>")
    })
    .into_owned()
}

/// Rewritten `href`, or `None` when the link stays as it is.
fn localize_href(href: &str, locale: &str, rules: &LinkRules) -> Option<String> {
    if href.is_empty() || href.starts_with('#') || href.starts_with("//") || SCHEME.is_match(href) {
        return None;
    }
    // Relative links already resolve inside the locale directory.
    let rest = href.strip_prefix('/')?;
    let prefixed = rules.locales.iter().any(|code| {
        rest.strip_prefix(code.as_str())
            .is_some_and(|after| after.is_empty() || after.starts_with('/'))
    });
    if prefixed || rules.shared_prefixes.iter().any(|p| rest.starts_with(p.as_str())) {
        return None;
    }
    Some(format!("/{locale}/{rest}"))
}

/// Same page in `lang`: `index` maps to the directory root.
fn option_href(lang: &str, page: &str) -> String {
    if page.is_empty() || page == "index" {
        format!("/{lang}/")
    } else if let Some(dir) = page.strip_suffix("/index") {
        format!("/{lang}/{dir}/")
    } else {
        format!("/{lang}/{page}.html")
    }
}

fn badge_markup(badge: &SelectorBadge) -> String {
    format!(
        r#"<span class="flag-emoji">{}</span><span>{}</span><i class="fas fa-chevron-down"></i>"#,
        badge.flag, badge.code
    )
}

fn toggle_active(classes: &str, active: bool) -> String {
    let mut list: Vec<&str> = classes
        .split_whitespace()
        .filter(|c| *c != ACTIVE_CLASS)
        .collect();
    if active {
        list.push(ACTIVE_CLASS);
    }
    list.join(" ")
}

/// Replace the contents of every `.lang-current` element with `markup`.
fn replace_current_badge(html: &str, markup: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(caps) = TAG.captures_at(html, search) {
        let Some(open) = caps.get(0) else { break };
        search = open.end();
        let Some((false, name, attrs)) = tag_parts(&caps) else {
            continue;
        };
        if !has_class(attrs, CURRENT_CLASS) {
            continue;
        }
        if let Some(close) = matching_close(html, open.end(), name) {
            out.push_str(&html[copied..open.end()]);
            out.push_str(markup);
            copied = close;
            search = close;
        }
    }
    out.push_str(&html[copied..]);
    out
}

/// Byte offset of the end tag closing an element named `name` whose
/// contents start at `from`.
fn matching_close(html: &str, from: usize, name: &str) -> Option<usize> {
    let mut depth = 1usize;
    for caps in TAG.captures_iter(&html[from..]) {
        let Some((closing, tag, attrs)) = tag_parts(&caps) else {
            continue;
        };
        if !tag.eq_ignore_ascii_case(name) {
            continue;
        }
        if closing {
            depth -= 1;
            if depth == 0 {
                return caps.get(0).map(|m| from + m.start());
            }
        } else if !attrs.trim_end().ends_with('/') {
            depth += 1;
        }
    }
    None
}

/// Location of attribute `name` inside a tag's attribute text.
struct AttrSpan<'a> {
    whole: Range<usize>,
    value: Option<&'a str>,
    quote: Option<char>,
}

fn find_attr<'a>(attrs: &'a str, name: &str) -> Option<AttrSpan<'a>> {
    ATTR.captures_iter(attrs).find_map(|caps| {
        let whole = caps.get(0)?;
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        let (value, quote) = if let Some(v) = caps.get(2) {
            (Some(v.as_str()), Some('"'))
        } else if let Some(v) = caps.get(3) {
            (Some(v.as_str()), Some('\''))
        } else {
            (caps.get(4).map(|v| v.as_str()), None)
        };
        Some(AttrSpan {
            whole: whole.range(),
            value,
            quote,
        })
    })
}

fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    find_attr(attrs, name)?.value
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr_value(attrs, "class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// Attribute text with `name` set to `value`, keeping the attribute's
/// position and quote style. A missing attribute is appended.
fn set_attr(attrs: &str, name: &str, value: &str) -> String {
    match find_attr(attrs, name) {
        Some(span) => {
            let quote = span.quote.unwrap_or('"');
            let existing = &attrs[span.whole.clone()];
            let written_name = existing.split(['=', ' ', '\t', '\n']).next().unwrap_or(name);
            format!(
                "{}{written_name}={quote}{value}{quote}{}",
                &attrs[..span.whole.start],
                &attrs[span.whole.end..]
            )
        }
        None => {
            let trimmed = attrs.trim_end();
            match trimmed.strip_suffix('/') {
                Some(head) => format!("{} {name}=\"{value}\" /", head.trim_end()),
                None => format!("{trimmed} {name}=\"{value}\""),
            }
        }
    }
}
