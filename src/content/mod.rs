//! Loaded site content and the per-locale views built from it.
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolve`] | Variant selection with locale fallback, bundle deep-fill |
//! | [`post`] | Blog post views, listing data, related posts |
//! | [`segment`] | Segment landing-page views and template aliases |
//! | [`category`] | Category display names |
//! | [`date`] | Localized long dates |
//!
//! Everything here is pure: [`SiteContent`] is filled by the loader and only
//! read afterwards.

pub mod category;
pub mod date;
pub mod post;
pub mod resolve;
pub mod segment;

use crate::locale::Locales;
use crate::warning::Warning;
use resolve::{Requirement, deep_fill, resolve_variant};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Content file stems with a fixed role.
pub const SEGMENTS_FILE: &str = "segments";
pub const OTHER_DATA_FILE: &str = "other-data";
pub const PRIVACY_POLICY_FILE: &str = "privacy-policy";

/// One `content/blog/*.json` file.
///
/// Shared fields sit at the top level; everything else (the locale
/// variants `pt`, `en`, … holding title, excerpt, content and seo) is kept
/// in `variants`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_role: String,
    #[serde(default)]
    pub read_time: u32,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(flatten)]
    pub variants: Map<String, Value>,
}

impl BlogPost {
    /// The post as authored, for templates that read raw posts.
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "id": self.id,
            "date": self.date,
            "author": self.author,
            "authorRole": self.author_role,
            "readTime": self.read_time,
            "views": self.views,
            "category": self.category,
            "image": self.image,
            "tags": self.tags,
            "featured": self.featured,
        });
        if let Value::Object(map) = &mut value {
            for (code, variant) in &self.variants {
                map.insert(code.clone(), variant.clone());
            }
        }
        value
    }
}

/// Everything read from the project's content directories.
#[derive(Debug, Clone, Default)]
pub struct SiteContent {
    /// `lang/{locale}.json`, keyed by locale code.
    pub bundles: Map<String, Value>,
    /// `content/*.json`, keyed by file stem.
    pub files: BTreeMap<String, Value>,
    /// `content/blog/*.json`, newest first once [`sort_posts`](Self::sort_posts) ran.
    pub posts: Vec<BlogPost>,
}

impl SiteContent {
    /// Content file by stem, or an empty mapping.
    pub fn file(&self, stem: &str) -> Value {
        self.files
            .get(stem)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Newest first. Stable, so same-day posts keep load order; posts with
    /// unparseable dates go last.
    pub fn sort_posts(&mut self) {
        self.posts
            .sort_by_key(|post| Reverse(date::parse_date(&post.date)));
    }

    /// Locale bundle for `locale`, with keys it lacks filled in from the
    /// default locale's bundle.
    pub fn bundle(&self, locale: &str, locales: &Locales) -> (Map<String, Value>, Option<Warning>) {
        let resolution = resolve_variant(
            &self.bundles,
            &format!("locale bundle '{locale}'"),
            locale,
            locales,
            Requirement::Present,
        );
        let mut bundle = resolution.fields().clone();
        if let Some(default) = self
            .bundles
            .get(locales.default_locale())
            .and_then(Value::as_object)
        {
            deep_fill(&mut bundle, default);
        }
        (bundle, resolution.warning)
    }

    /// Privacy-policy variant for `locale`. Missing file → empty mapping,
    /// no warning.
    pub fn privacy_policy(&self, locale: &str, locales: &Locales) -> (Map<String, Value>, Option<Warning>) {
        let Some(policy) = self.files.get(PRIVACY_POLICY_FILE).and_then(Value::as_object) else {
            return (Map::new(), None);
        };
        let resolution = resolve_variant(
            policy,
            "privacy policy",
            locale,
            locales,
            Requirement::Present,
        );
        (resolution.fields().clone(), resolution.warning)
    }

    /// `company.whatsappNumber` from `other-data.json`.
    pub fn whatsapp_number(&self) -> Option<&str> {
        self.files
            .get(OTHER_DATA_FILE)?
            .get("company")?
            .get("whatsappNumber")?
            .as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> Locales {
        Locales::new(vec!["pt".into(), "en".into(), "es".into()], "pt".into())
    }

    fn post(id: &str, date: &str) -> BlogPost {
        serde_json::from_value(json!({"id": id, "date": date})).unwrap()
    }

    #[test]
    fn blog_post_keeps_variants_apart_from_shared_fields() {
        let post: BlogPost = serde_json::from_value(json!({
            "id": "lgpd",
            "date": "2024-03-15",
            "authorRole": "Advogada",
            "readTime": 7,
            "tags": ["lgpd"],
            "pt": {"title": "LGPD"},
            "en": {"title": "GDPR-like"}
        }))
        .unwrap();
        assert_eq!(post.author_role, "Advogada");
        assert_eq!(post.read_time, 7);
        assert!(!post.featured);
        assert!(post.image.is_none());
        assert_eq!(post.variants.len(), 2);
        assert_eq!(post.variants["pt"]["title"], "LGPD");
    }

    #[test]
    fn raw_post_value_keeps_variants() {
        let post: BlogPost = serde_json::from_value(json!({
            "id": "x", "readTime": 3, "pt": {"title": "T"}
        }))
        .unwrap();
        let value = post.to_value();
        assert_eq!(value["readTime"], 3);
        assert_eq!(value["image"], Value::Null);
        assert_eq!(value["pt"]["title"], "T");
    }

    #[test]
    fn posts_sort_newest_first_and_undated_last() {
        let mut content = SiteContent {
            posts: vec![
                post("old", "2023-01-01"),
                post("undated", "someday"),
                post("new", "2024-06-01"),
                post("mid", "2023-07-01T09:00:00Z"),
            ],
            ..Default::default()
        };
        content.sort_posts();
        let ids: Vec<&str> = content.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old", "undated"]);
    }

    #[test]
    fn bundle_is_deep_filled_from_default() {
        let content = SiteContent {
            bundles: json!({
                "pt": {"nav": {"blog": "Blog", "about": "Sobre"}, "common": {"menu": "Menu"}},
                "en": {"nav": {"about": "About"}}
            })
            .as_object()
            .cloned()
            .unwrap(),
            ..Default::default()
        };
        let (bundle, warning) = content.bundle("en", &locales());
        assert!(warning.is_none());
        assert_eq!(bundle["nav"]["about"], "About");
        assert_eq!(bundle["nav"]["blog"], "Blog");
        assert_eq!(bundle["common"]["menu"], "Menu");
    }

    #[test]
    fn missing_bundle_falls_back_to_default() {
        let content = SiteContent {
            bundles: json!({"pt": {"title": "Oi"}}).as_object().cloned().unwrap(),
            ..Default::default()
        };
        let (bundle, warning) = content.bundle("es", &locales());
        assert_eq!(bundle["title"], "Oi");
        assert!(warning.is_some());
    }

    #[test]
    fn privacy_policy_uses_locale_first_level() {
        let mut content = SiteContent::default();
        content.files.insert(
            PRIVACY_POLICY_FILE.into(),
            json!({"pt": {"title": "Política"}, "en": {"title": "Policy"}}),
        );
        let (en, _) = content.privacy_policy("en", &locales());
        assert_eq!(en["title"], "Policy");
        let (es, warning) = content.privacy_policy("es", &locales());
        assert_eq!(es["title"], "Política");
        assert!(warning.is_some());
    }

    #[test]
    fn whatsapp_number_from_other_data() {
        let mut content = SiteContent::default();
        assert_eq!(content.whatsapp_number(), None);
        content.files.insert(
            OTHER_DATA_FILE.into(),
            json!({"company": {"whatsappNumber": "5511000000000"}}),
        );
        assert_eq!(content.whatsapp_number(), Some("5511000000000"));
    }

    #[test]
    fn missing_file_is_empty_mapping() {
        assert_eq!(SiteContent::default().file(SEGMENTS_FILE), json!({}));
    }
}
