//! Per-locale views of localized entities.
//!
//! A localized entity is a JSON mapping whose locale-code keys hold
//! variants:
//!
//! ```json
//! { "id": "lgpd", "pt": { "title": "…" }, "en": { "title": "…" } }
//! ```
//!
//! Every call site (posts, segments, locale bundles, the privacy policy)
//! goes through [`resolve_variant`], so the fallback order is the same
//! everywhere: requested → default → remaining locales in configured order.

use crate::locale::Locales;
use crate::warning::Warning;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

/// What makes a variant usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement<'a> {
    /// Any mapping under the locale key.
    Present,
    /// A mapping whose field is set to a non-empty value.
    Field(&'a str),
}

impl Requirement<'_> {
    fn accepts(&self, variant: &Map<String, Value>) -> bool {
        match self {
            Requirement::Present => true,
            Requirement::Field(field) => variant.get(*field).is_some_and(has_value),
        }
    }
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// The variant chosen for one locale.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'e> {
    variant: Option<&'e Map<String, Value>>,
    /// Locale the variant was taken from.
    pub used: Option<String>,
    /// `false` when no variant met the requirement and a partial one (or
    /// nothing) was returned instead.
    pub complete: bool,
    pub warning: Option<Warning>,
}

impl<'e> Resolution<'e> {
    /// Variant fields; empty when the entity has no variants at all.
    pub fn fields(&self) -> &'e Map<String, Value> {
        self.variant.unwrap_or(&EMPTY)
    }

    pub fn get(&self, key: &str) -> Option<&'e Value> {
        self.fields().get(key)
    }

    /// String field, `""` when absent or not a string.
    pub fn str_field(&self, key: &str) -> &'e str {
        self.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// Pick the variant of `entity` to show for `requested`.
///
/// `entity_label` names the entity in the warning, e.g. `post 'lgpd'`. A
/// warning is produced whenever the requested variant does not meet the
/// requirement, whether or not a fallback was found.
pub fn resolve_variant<'e>(
    entity: &'e Map<String, Value>,
    entity_label: &str,
    requested: &str,
    locales: &Locales,
    requirement: Requirement<'_>,
) -> Resolution<'e> {
    let chain = locales.fallback_chain(requested);
    let variant_of = |code: &str| entity.get(code).and_then(Value::as_object);

    let chosen = chain
        .iter()
        .find_map(|code| {
            variant_of(code)
                .filter(|v| requirement.accepts(v))
                .map(|v| (*code, v, true))
        })
        .or_else(|| {
            chain
                .iter()
                .find_map(|code| variant_of(code).map(|v| (*code, v, false)))
        });

    let (used, variant, complete) = match chosen {
        Some((code, variant, complete)) => (Some(code.to_string()), Some(variant), complete),
        None => (None, None, false),
    };

    let warning = (used.as_deref() != Some(requested) || !complete).then(|| {
        Warning::MissingTranslation {
            entity: entity_label.to_string(),
            requested: requested.to_string(),
            used: used.clone().filter(|code| code != requested),
        }
    });

    Resolution {
        variant,
        used,
        complete,
        warning,
    }
}

/// Fill keys missing from `target` with copies from `defaults`, recursing
/// into mappings present on both sides. Existing values are never replaced.
pub fn deep_fill(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        match (target.get_mut(key), default) {
            (Some(Value::Object(existing)), Value::Object(default_map)) => {
                deep_fill(existing, default_map);
            }
            (Some(_), _) => {}
            (None, _) => {
                target.insert(key.clone(), default.clone());
            }
        }
    }
}
