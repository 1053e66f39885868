//! Non-fatal build findings.
//!
//! The core never logs. Template rendering, content resolution and page
//! assembly return warnings as data next to their result; the build shell
//! logs them and lists them in the build summary.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Rendered output still contains raw `{{…}}` markers (diagnostic mode only).
    UnresolvedPlaceholders {
        template: String,
        /// The first few offending markers, in output order.
        tokens: Vec<String>,
    },
    /// The requested locale had no usable variant of a localized entity.
    MissingTranslation {
        entity: String,
        requested: String,
        /// Locale the view was taken from instead, if any variant exists.
        used: Option<String>,
    },
    /// A segment page names a key absent from `segments.json`.
    MissingSegment { key: String },
    /// An optional content file or directory was not found.
    MissingContent { path: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedPlaceholders { template, tokens } => {
                write!(f, "unresolved placeholders in {template}: {}", tokens.join(", "))
            }
            Warning::MissingTranslation {
                entity,
                requested,
                used: Some(used),
            } => write!(f, "{entity} has no '{requested}' translation, using '{used}'"),
            Warning::MissingTranslation {
                entity,
                requested,
                used: None,
            } => write!(f, "{entity} has no '{requested}' translation and no fallback"),
            Warning::MissingSegment { key } => write!(f, "segment not found: {key}"),
            Warning::MissingContent { path } => write!(f, "content not found: {path}"),
        }
    }
}
