//! Blog post views.
//!
//! A [`PostView`] is the fully populated, single-locale shape templates see
//! for a post. Listing data (featured post, articles, categories, popular
//! posts) and related posts are derived from the loaded post list without
//! reordering it.

use super::category::{ALL_CATEGORY, category_name};
use super::date::format_date;
use super::resolve::{Requirement, Resolution, resolve_variant};
use super::BlogPost;
use crate::locale::Locales;
use crate::warning::Warning;
use serde_json::{Map, Value, json};

pub const DEFAULT_IMAGE: &str = "default.jpg";
/// Posts shown in the listing's popular block and in an article's related block.
pub const SIDEBAR_POSTS: usize = 3;

/// Variant of `post` for `locale`, keyed on the title.
pub fn resolve_post<'p>(post: &'p BlogPost, locale: &str, locales: &Locales) -> Resolution<'p> {
    resolve_variant(
        &post.variants,
        &format!("post '{}'", post.id),
        locale,
        locales,
        Requirement::Field("title"),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    /// Long localized date.
    pub date: String,
    pub author: String,
    pub author_role: String,
    pub read_time: u32,
    pub views: u64,
    pub category: String,
    pub category_name: String,
    pub image: String,
    pub tags: Vec<String>,
    pub featured: bool,
    /// Structured article body, `{}` when absent.
    pub content: Value,
}

impl PostView {
    pub fn new(post: &BlogPost, variant: &Resolution<'_>, locale: &str) -> Self {
        Self {
            id: post.id.clone(),
            title: variant.str_field("title").to_string(),
            excerpt: variant.str_field("excerpt").to_string(),
            date: format_date(&post.date, locale),
            author: post.author.clone(),
            author_role: post.author_role.clone(),
            read_time: post.read_time,
            views: post.views,
            category: post.category.clone(),
            category_name: category_name(&post.category, locale).to_string(),
            image: post
                .image
                .clone()
                .filter(|image| !image.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            tags: post.tags.clone(),
            featured: post.featured,
            content: variant
                .get("content")
                .filter(|c| c.is_object())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    /// Template-facing keys.
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "excerpt": self.excerpt,
            "date": self.date,
            "author": self.author,
            "authorRole": self.author_role,
            "readTime": self.read_time,
            "views": self.views,
            "category": self.category,
            "categoryName": self.category_name,
            "image": self.image,
            "tags": self.tags,
            "featured": self.featured,
            "content": self.content,
        })
    }
}

/// View of `post` for `locale`, plus a warning when it had to fall back.
pub fn post_view(post: &BlogPost, locale: &str, locales: &Locales) -> (PostView, Option<Warning>) {
    let resolution = resolve_post(post, locale, locales);
    let view = PostView::new(post, &resolution, locale);
    (view, resolution.warning)
}

/// `all` first, then each distinct category in post order.
pub fn categories(posts: &[BlogPost], locale: &str) -> Vec<Value> {
    let mut ids: Vec<&str> = vec![ALL_CATEGORY];
    for post in posts {
        if !post.category.is_empty() && !ids.contains(&post.category.as_str()) {
            ids.push(&post.category);
        }
    }
    ids.into_iter()
        .map(|id| json!({"id": id, "name": category_name(id, locale)}))
        .collect()
}

/// Top posts by views, highest first, ties in load order.
pub fn popular_posts(posts: &[BlogPost]) -> Vec<&BlogPost> {
    let mut ranked: Vec<&BlogPost> = posts.iter().collect();
    ranked.sort_by(|a, b| b.views.cmp(&a.views));
    ranked.truncate(SIDEBAR_POSTS);
    ranked
}

/// Same-category posts other than `post`, in load order.
pub fn related_posts<'p>(post: &BlogPost, posts: &'p [BlogPost]) -> Vec<&'p BlogPost> {
    posts
        .iter()
        .filter(|p| p.id != post.id && p.category == post.category)
        .take(SIDEBAR_POSTS)
        .collect()
}

/// Data for the blog listing page.
pub struct Listing {
    pub data: Map<String, Value>,
    pub warnings: Vec<Warning>,
}

/// `featuredPost` (first featured, else first), `articles` (the rest),
/// `categories`, `popularPosts`.
pub fn listing(posts: &[BlogPost], locale: &str, locales: &Locales) -> Listing {
    let mut warnings = Vec::new();
    let mut view = |post: &BlogPost| {
        let (view, warning) = post_view(post, locale, locales);
        warnings.extend(warning);
        view.to_value()
    };

    let featured_index = posts
        .iter()
        .position(|p| p.featured)
        .or_else(|| (!posts.is_empty()).then_some(0));
    let featured = featured_index.map(|i| view(&posts[i])).unwrap_or(Value::Null);
    let articles: Vec<Value> = posts
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != featured_index)
        .map(|(_, p)| view(p))
        .collect();
    // Featured plus articles cover every post once; popular repeats some.
    let popular: Vec<Value> = popular_posts(posts)
        .into_iter()
        .map(|p| post_view(p, locale, locales).0.to_value())
        .collect();

    let mut data = Map::new();
    data.insert("featuredPost".into(), featured);
    data.insert("articles".into(), Value::Array(articles));
    data.insert("categories".into(), Value::Array(categories(posts, locale)));
    data.insert("popularPosts".into(), Value::Array(popular));
    Listing { data, warnings }
}
