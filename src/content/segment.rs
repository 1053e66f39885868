//! Segment landing-page views.
//!
//! `segments.json` maps segment keys (`economic-groups`, `law-firms`, …) to
//! localized entities. A segment view spreads the chosen variant into the
//! page context, adds the upper-case aliases older templates use, and
//! guarantees every field and list the segment templates read:
//!
//! | Key | Source |
//! |-----|--------|
//! | `SEGMENT_TITLE`, `SEGMENT_SUBTITLE`, `SEGMENT_CTA1/2` | `title`, `subtitle`, `cta1/2` |
//! | `INDICATOR1..3` | `indicator1..3` |
//! | `SOLUTION_{n}_TITLE/DESC` | `solutions[n-1]`, n = 1..4 |
//! | `PROCESS_STEP_{n}_TITLE/DESC` | `processSteps[n-1]`, n = 1..4 |
//! | `painPoints[]` | + `hasArrow`, `isLast` |
//! | `solutions[]` | + `badge` (null when absent) |
//! | `processSteps[]` | + `hasArrow`, `isLast`, `isNotLast`, `number` (default n) |

use super::resolve::{Requirement, resolve_variant};
use crate::locale::Locales;
use crate::warning::Warning;
use serde_json::{Map, Value};

/// Numbered aliases are generated for this many solutions and steps.
const NUMBERED_ALIASES: usize = 4;

const DEFAULT_SERVICES_TITLE: &str = "Nossas Soluções";
const DEFAULT_PROCESS_TITLE: &str = "Como Funciona";

/// Fields always present as strings.
const STRING_FIELDS: [&str; 8] = [
    "title",
    "subtitle",
    "label",
    "cta1",
    "cta2",
    "indicator1",
    "indicator2",
    "indicator3",
];

/// Lists always present, passed through unchanged.
const PLAIN_LISTS: [&str; 3] = ["results", "servicesShowcase", "ctaSectionBenefits"];

/// View of segment `key` for `locale`.
///
/// A key absent from `segments` yields an empty view and
/// [`Warning::MissingSegment`].
pub fn segment_view(
    segments: &Value,
    key: &str,
    locale: &str,
    locales: &Locales,
) -> (Map<String, Value>, Vec<Warning>) {
    let Some(segment) = segments.get(key).and_then(Value::as_object) else {
        return (
            Map::new(),
            vec![Warning::MissingSegment {
                key: key.to_string(),
            }],
        );
    };

    let resolution = resolve_variant(
        segment,
        &format!("segment '{key}'"),
        locale,
        locales,
        Requirement::Field("title"),
    );
    let variant = resolution.fields();
    let text = |field: &str| Value::from(str_of(variant, field));

    let mut view = Map::new();

    view.insert("META_TITLE".into(), text("metaTitle"));
    view.insert("META_DESCRIPTION".into(), text("metaDescription"));
    view.insert("META_KEYWORDS".into(), text("metaKeywords"));
    view.insert("SEGMENT_TITLE".into(), text("title"));
    view.insert("SEGMENT_SUBTITLE".into(), text("subtitle"));
    view.insert("SEGMENT_CTA1".into(), text("cta1"));
    view.insert("SEGMENT_CTA2".into(), text("cta2"));
    for n in 1..=3 {
        view.insert(format!("INDICATOR{n}"), text(&format!("indicator{n}")));
    }
    view.insert("PAIN_POINTS_TITLE".into(), text("painPointsTitle"));
    view.insert("PAIN_POINTS_SUBTITLE".into(), text("painPointsSubtitle"));

    view.insert(
        "SEGMENT_SERVICES_TITLE".into(),
        Value::from(non_empty_or(variant, "servicesTitle", DEFAULT_SERVICES_TITLE)),
    );
    numbered_aliases(&mut view, variant, "solutions", "SOLUTION");

    view.insert(
        "PROCESS_TITLE".into(),
        Value::from(non_empty_or(variant, "processTitle", DEFAULT_PROCESS_TITLE)),
    );
    numbered_aliases(&mut view, variant, "processSteps", "PROCESS_STEP");

    // The variant's own keys, then the guaranteed shapes on top.
    for (k, v) in variant {
        view.insert(k.clone(), v.clone());
    }

    let title = str_of(variant, "title");
    let subtitle = str_of(variant, "subtitle");
    view.insert(
        "metaTitle".into(),
        Value::from(non_empty_or(variant, "metaTitle", title)),
    );
    view.insert(
        "metaDescription".into(),
        Value::from(non_empty_or(variant, "metaDescription", subtitle)),
    );
    view.insert("metaKeywords".into(), text("metaKeywords"));
    for field in STRING_FIELDS {
        view.insert(field.into(), text(field));
    }

    view.insert(
        "painPoints".into(),
        map_items(variant, "painPoints", |item, index, len| {
            item.insert("hasArrow".into(), Value::Bool(index + 1 < len));
            item.insert("isLast".into(), Value::Bool(index + 1 == len));
        }),
    );
    view.insert(
        "solutions".into(),
        map_items(variant, "solutions", |item, _, _| {
            if !item.get("badge").is_some_and(is_set) {
                item.insert("badge".into(), Value::Null);
            }
        }),
    );
    view.insert(
        "processSteps".into(),
        map_items(variant, "processSteps", |item, index, len| {
            item.insert("hasArrow".into(), Value::Bool(index + 1 < len));
            item.insert("isLast".into(), Value::Bool(index + 1 == len));
            item.insert("isNotLast".into(), Value::Bool(index + 1 < len));
            if !item.get("number").is_some_and(is_set) {
                item.insert("number".into(), Value::from(index + 1));
            }
        }),
    );
    for list in PLAIN_LISTS {
        view.insert(list.into(), list_of(variant, list));
    }

    (view, resolution.warning.into_iter().collect())
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        _ => true,
    }
}

fn str_of<'v>(variant: &'v Map<String, Value>, field: &str) -> &'v str {
    variant.get(field).and_then(Value::as_str).unwrap_or("")
}

fn non_empty_or<'v>(variant: &'v Map<String, Value>, field: &str, default: &'v str) -> &'v str {
    match str_of(variant, field) {
        "" => default,
        value => value,
    }
}

fn list_of(variant: &Map<String, Value>, field: &str) -> Value {
    match variant.get(field) {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        _ => Value::Array(Vec::new()),
    }
}

/// Copy of list `field` with `decorate` applied to each mapping element.
fn map_items(
    variant: &Map<String, Value>,
    field: &str,
    decorate: impl Fn(&mut Map<String, Value>, usize, usize),
) -> Value {
    let Value::Array(mut items) = list_of(variant, field) else {
        return Value::Array(Vec::new());
    };
    let len = items.len();
    for (index, item) in items.iter_mut().enumerate() {
        if let Value::Object(map) = item {
            decorate(map, index, len);
        }
    }
    Value::Array(items)
}

/// `{PREFIX}_{n}_TITLE` / `{PREFIX}_{n}_DESC` for the first few list items.
fn numbered_aliases(view: &mut Map<String, Value>, variant: &Map<String, Value>, list: &str, prefix: &str) {
    let items = variant.get(list).and_then(Value::as_array);
    for n in 1..=NUMBERED_ALIASES {
        let item = items.and_then(|items| items.get(n - 1));
        for (suffix, field) in [("TITLE", "title"), ("DESC", "desc")] {
            let value = item
                .and_then(|item| item.get(field))
                .and_then(Value::as_str)
                .unwrap_or("");
            view.insert(format!("{prefix}_{n}_{suffix}"), Value::from(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locales() -> Locales {
        Locales::new(vec!["pt".into(), "en".into(), "es".into()], "pt".into())
    }

    fn segments() -> Value {
        json!({
            "law-firms": {
                "pt": {
                    "title": "Escritórios de Advocacia",
                    "subtitle": "Gestão societária",
                    "extra": "kept",
                    "painPoints": [{"title": "P1"}, {"title": "P2"}],
                    "solutions": [
                        {"title": "S1", "desc": "D1", "badge": "Novo"},
                        {"title": "S2", "desc": "D2"}
                    ],
                    "processSteps": [
                        {"title": "One", "desc": "first"},
                        {"title": "Two", "desc": "second", "number": "02"},
                        {"title": "Three", "desc": "third"}
                    ],
                    "results": [{"value": "98%"}]
                },
                "en": {"title": "Law Firms", "processTitle": "How it works"}
            }
        })
    }

    #[test]
    fn aliases_mirror_variant_fields() {
        let (view, warnings) = segment_view(&segments(), "law-firms", "pt", &locales());
        assert!(warnings.is_empty());
        assert_eq!(view["SEGMENT_TITLE"], "Escritórios de Advocacia");
        assert_eq!(view["SOLUTION_1_TITLE"], "S1");
        assert_eq!(view["SOLUTION_2_DESC"], "D2");
        assert_eq!(view["SOLUTION_3_TITLE"], "");
        assert_eq!(view["PROCESS_STEP_2_DESC"], "second");
        assert_eq!(view["PROCESS_STEP_4_TITLE"], "");
        assert_eq!(view["extra"], "kept");
    }

    #[test]
    fn defaults_fill_missing_titles() {
        let (view, _) = segment_view(&segments(), "law-firms", "pt", &locales());
        assert_eq!(view["SEGMENT_SERVICES_TITLE"], DEFAULT_SERVICES_TITLE);
        assert_eq!(view["PROCESS_TITLE"], DEFAULT_PROCESS_TITLE);
        assert_eq!(view["metaTitle"], "Escritórios de Advocacia");
        assert_eq!(view["metaDescription"], "Gestão societária");
        assert_eq!(view["label"], "");
        assert_eq!(view["servicesShowcase"], json!([]));
    }

    #[test]
    fn pain_points_get_arrows_except_last() {
        let (view, _) = segment_view(&segments(), "law-firms", "pt", &locales());
        assert_eq!(view["painPoints"][0]["hasArrow"], true);
        assert_eq!(view["painPoints"][1]["hasArrow"], false);
        assert_eq!(view["painPoints"][1]["isLast"], true);
    }

    #[test]
    fn solutions_badge_defaults_to_null() {
        let (view, _) = segment_view(&segments(), "law-firms", "pt", &locales());
        assert_eq!(view["solutions"][0]["badge"], "Novo");
        assert_eq!(view["solutions"][1]["badge"], Value::Null);
    }

    #[test]
    fn process_steps_are_numbered() {
        let (view, _) = segment_view(&segments(), "law-firms", "pt", &locales());
        let steps = view["processSteps"].as_array().unwrap();
        assert_eq!(steps[0]["number"], 1);
        assert_eq!(steps[1]["number"], "02");
        assert_eq!(steps[2]["number"], 3);
        assert_eq!(steps[1]["isNotLast"], true);
        assert_eq!(steps[2]["isNotLast"], false);
        assert_eq!(steps[2]["hasArrow"], false);
    }

    #[test]
    fn requested_variant_used_when_titled() {
        let (view, warnings) = segment_view(&segments(), "law-firms", "en", &locales());
        assert!(warnings.is_empty());
        assert_eq!(view["SEGMENT_TITLE"], "Law Firms");
        assert_eq!(view["PROCESS_TITLE"], "How it works");
        assert_eq!(view["painPoints"], json!([]));
    }

    #[test]
    fn untranslated_segment_falls_back() {
        let (view, warnings) = segment_view(&segments(), "law-firms", "es", &locales());
        assert_eq!(view["SEGMENT_TITLE"], "Escritórios de Advocacia");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn missing_segment_is_empty_with_warning() {
        let (view, warnings) = segment_view(&segments(), "real-estate", "pt", &locales());
        assert!(view.is_empty());
        assert_eq!(
            warnings,
            vec![Warning::MissingSegment {
                key: "real-estate".into()
            }]
        );
    }
}
