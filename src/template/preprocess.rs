//! Rewrites the extended block syntax into primitive mustache sections.
//!
//! | Source                      | Normalized                   |
//! |-----------------------------|------------------------------|
//! | `{{#if show}}`              | `{{#show}}`                  |
//! | `{{#each items}}`           | `{{#items}}`                 |
//! | `{{else}}`                  | `{{/show}}{{^show}}`         |
//! | `{{/if}}`, `{{/each}}`      | `{{/show}}`, `{{/items}}`    |
//! | `{{this}}`                  | `{{.}}`                      |
//! | `{{this.title}}`            | `{{.title}}` (current item only) |
//! | `{{{this}}}`, `{{&this}}`   | `{{{.}}}`, `{{&.}}`          |
//!
//! Generic closes and `else` are resolved against an explicit stack of open
//! blocks built while scanning tags left to right, so siblings and nesting
//! of any depth come out correctly named. Primitive `{{#x}}`/`{{^x}}`
//! sections already in the source are pushed too: a `{{/if}}` inside one of
//! them must not close it.

use super::{Problem, StructureError};

/// A piece of template source: literal text or one `{{…}}` tag.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Tag(Tag<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tag<'a> {
    /// The whole tag including delimiters.
    pub raw: &'a str,
    /// Text between the delimiters, untrimmed.
    pub inner: &'a str,
    /// `{{{…}}}` form.
    pub triple: bool,
    /// Byte offset of the opening delimiter.
    pub offset: usize,
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

/// Split `source` into text and tags.
pub(crate) fn scan(source: &str) -> Result<Vec<Token<'_>>, StructureError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(rel) = source[pos..].find("{{") {
        let start = pos + rel;
        if start > pos {
            tokens.push(Token::Text(&source[pos..start]));
        }
        let triple = source[start..].starts_with("{{{");
        let (open_len, close) = if triple { (3, "}}}") } else { (2, "}}") };
        let body_start = start + open_len;
        let Some(close_rel) = source[body_start..].find(close) else {
            return Err(StructureError {
                line: line_of(source, start),
                problem: Problem::UnterminatedTag,
            });
        };
        let end = body_start + close_rel + close.len();
        tokens.push(Token::Tag(Tag {
            raw: &source[start..end],
            inner: &source[body_start..body_start + close_rel],
            triple,
            offset: start,
        }));
        pos = end;
    }
    if pos < source.len() {
        tokens.push(Token::Text(&source[pos..]));
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Each,
    Section,
    Inverted,
}

impl BlockKind {
    fn keyword(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Each => "each",
            BlockKind::Section => "#",
            BlockKind::Inverted => "^",
        }
    }
}

#[derive(Debug)]
struct OpenBlock<'a> {
    kind: BlockKind,
    name: &'a str,
    line: usize,
    in_else: bool,
}

/// Normalize an extended-syntax template into primitive section syntax.
///
/// Pure and deterministic. Unbalanced or malformed blocks are reported with
/// the line of the offending tag; nothing is emitted for a template that
/// fails.
pub fn normalize(source: &str) -> Result<String, StructureError> {
    let tokens = scan(source)?;
    let mut out = String::with_capacity(source.len());
    let mut stack: Vec<OpenBlock<'_>> = Vec::new();

    for token in tokens {
        let tag = match token {
            Token::Text(text) => {
                out.push_str(text);
                continue;
            }
            Token::Tag(tag) => tag,
        };
        let line = line_of(source, tag.offset);
        let fail = |problem| StructureError { line, problem };

        let body = tag.inner.trim();
        if tag.triple {
            match this_path(body) {
                Some(path) => {
                    out.push_str("{{{");
                    out.push_str(&path);
                    out.push_str("}}}");
                }
                None => out.push_str(tag.raw),
            }
            continue;
        }

        if let Some(rest) = body.strip_prefix('#') {
            let rest = rest.trim_start();
            let (kind, expr) = if let Some(expr) = keyword_arg(rest, "if") {
                (BlockKind::If, expr)
            } else if let Some(expr) = keyword_arg(rest, "each") {
                (BlockKind::Each, expr)
            } else {
                (BlockKind::Section, rest)
            };
            let name = block_name(expr).map_err(fail)?;
            stack.push(OpenBlock {
                kind,
                name,
                line,
                in_else: false,
            });
            push_tag(&mut out, '#', name);
        } else if let Some(rest) = body.strip_prefix('^') {
            let name = block_name(rest).map_err(fail)?;
            stack.push(OpenBlock {
                kind: BlockKind::Inverted,
                name,
                line,
                in_else: false,
            });
            push_tag(&mut out, '^', name);
        } else if let Some(rest) = body.strip_prefix('/') {
            let closer = rest.trim();
            let Some(open) = stack.pop() else {
                return Err(fail(Problem::CloseWithoutOpen {
                    tag: closer.to_string(),
                }));
            };
            let matches = match closer {
                "if" => open.kind == BlockKind::If,
                "each" => open.kind == BlockKind::Each,
                named => named == open.name,
            };
            if !matches {
                return Err(fail(Problem::CloseMismatch {
                    tag: closer.to_string(),
                    open: format!("{} {}", open.kind.keyword(), open.name),
                    open_line: open.line,
                }));
            }
            push_tag(&mut out, '/', open.name);
        } else if body == "else" {
            let Some(open) = stack.last_mut() else {
                return Err(fail(Problem::ElseWithoutOpen));
            };
            if open.kind == BlockKind::Inverted {
                return Err(fail(Problem::ElseInInverted {
                    name: open.name.to_string(),
                }));
            }
            if open.in_else {
                return Err(fail(Problem::DuplicateElse {
                    name: open.name.to_string(),
                }));
            }
            open.in_else = true;
            push_tag(&mut out, '/', open.name);
            push_tag(&mut out, '^', open.name);
        } else if let Some(path) = this_path(body) {
            out.push_str("{{");
            out.push_str(&path);
            out.push_str("}}");
        } else if let Some(path) = body.strip_prefix('&').and_then(|rest| this_path(rest.trim())) {
            out.push_str("{{&");
            out.push_str(&path);
            out.push_str("}}");
        } else if body.starts_with('>') || body.starts_with('=') {
            return Err(fail(Problem::UnsupportedTag {
                tag: tag.raw.to_string(),
            }));
        } else {
            // Variables, {{&raw}}, {{! comments }} and {{@index}} pass through.
            out.push_str(tag.raw);
        }
    }

    if let Some(open) = stack.pop() {
        return Err(StructureError {
            line: open.line,
            problem: Problem::Unclosed {
                open: format!("{} {}", open.kind.keyword(), open.name),
            },
        });
    }
    Ok(out)
}

/// `this` → `.`, `this.title` → `.title`. A leading dot anchors the lookup
/// at the current item.
fn this_path(name: &str) -> Option<String> {
    if name == "this" {
        return Some(".".to_string());
    }
    let field = name.strip_prefix("this.")?.trim();
    Some(format!(".{field}"))
}

/// `"if show"` with keyword `"if"` → `Some("show")`. The keyword must be
/// followed by whitespace so a section named `iffy` stays a section.
fn keyword_arg<'a>(rest: &'a str, keyword: &str) -> Option<&'a str> {
    let after = rest.strip_prefix(keyword)?;
    after
        .starts_with(char::is_whitespace)
        .then(|| after.trim())
}

/// Blocks bind a single (possibly dotted) variable name.
fn block_name(expr: &str) -> Result<&str, Problem> {
    let name = expr.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(Problem::UnsupportedExpression {
            expr: name.to_string(),
        });
    }
    Ok(name)
}

fn push_tag(out: &mut String, sigil: char, name: &str) {
    out.push_str("{{");
    out.push(sigil);
    out.push_str(name);
    out.push_str("}}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(source: &str) -> Problem {
        normalize(source).unwrap_err().problem
    }

    // =========================================================================
    // Rewrites
    // =========================================================================

    #[test]
    fn if_becomes_section() {
        assert_eq!(normalize("{{#if show}}A{{/if}}").unwrap(), "{{#show}}A{{/show}}");
    }

    #[test]
    fn each_becomes_section() {
        assert_eq!(
            normalize("{{#each items}}{{this}}-{{/each}}").unwrap(),
            "{{#items}}{{.}}-{{/items}}"
        );
    }

    #[test]
    fn else_closes_and_inverts() {
        assert_eq!(
            normalize("{{#if show}}A{{else}}B{{/if}}").unwrap(),
            "{{#show}}A{{/show}}{{^show}}B{{/show}}"
        );
    }

    #[test]
    fn else_inside_each_applies_to_the_sequence() {
        assert_eq!(
            normalize("{{#each posts}}x{{else}}none{{/each}}").unwrap(),
            "{{#posts}}x{{/posts}}{{^posts}}none{{/posts}}"
        );
    }

    #[test]
    fn this_field_is_anchored_lookup() {
        assert_eq!(normalize("{{ this.title }}").unwrap(), "{{.title}}");
    }

    #[test]
    fn raw_this_is_mapped_too() {
        assert_eq!(normalize("{{{this}}}{{{ this.body }}}").unwrap(), "{{{.}}}{{{.body}}}");
        assert_eq!(normalize("{{& this}}").unwrap(), "{{&.}}");
        assert_eq!(normalize("{{{other}}}").unwrap(), "{{{other}}}");
    }

    #[test]
    fn index_and_variables_pass_through() {
        let src = "{{@index}} {{ name }} {{{html}}} {{&raw}} {{! note }}";
        assert_eq!(normalize(src).unwrap(), src);
    }

    #[test]
    fn whitespace_inside_block_tags_is_tolerated() {
        assert_eq!(
            normalize("{{# if  show }}A{{ else }}B{{/ if }}").unwrap(),
            "{{#show}}A{{/show}}{{^show}}B{{/show}}"
        );
    }

    #[test]
    fn section_named_like_keyword_prefix_is_not_if() {
        assert_eq!(normalize("{{#iffy}}x{{/iffy}}").unwrap(), "{{#iffy}}x{{/iffy}}");
    }

    // =========================================================================
    // Stack discipline
    // =========================================================================

    #[test]
    fn nested_if_inside_each_closes_innermost_first() {
        let src = "{{#each items}}{{#if featured}}*{{/if}}{{name}}{{/each}}";
        assert_eq!(
            normalize(src).unwrap(),
            "{{#items}}{{#featured}}*{{/featured}}{{name}}{{/items}}"
        );
    }

    #[test]
    fn sibling_blocks_do_not_confuse_close_matching() {
        let src = "{{#if a}}1{{/if}}{{#each xs}}{{#if b}}2{{/if}}{{/each}}{{#if c}}3{{/if}}";
        assert_eq!(
            normalize(src).unwrap(),
            "{{#a}}1{{/a}}{{#xs}}{{#b}}2{{/b}}{{/xs}}{{#c}}3{{/c}}"
        );
    }

    #[test]
    fn else_binds_to_innermost_open_block_after_a_closed_sibling() {
        // A find-last-open search would pick `inner` here.
        let src = "{{#if outer}}{{#if inner}}i{{/if}}o{{else}}n{{/if}}";
        assert_eq!(
            normalize(src).unwrap(),
            "{{#outer}}{{#inner}}i{{/inner}}o{{/outer}}{{^outer}}n{{/outer}}"
        );
    }

    #[test]
    fn generic_close_inside_primitive_section() {
        let src = "{{#meta}}{{#if lang}}{{lang}}{{/if}}{{/meta}}";
        assert_eq!(
            normalize(src).unwrap(),
            "{{#meta}}{{#lang}}{{lang}}{{/lang}}{{/meta}}"
        );
    }

    #[test]
    fn deep_nesting() {
        let mut src = String::new();
        for i in 0..50 {
            src.push_str(&format!("{{{{#if v{i}}}}}"));
        }
        for _ in 0..50 {
            src.push_str("{{/if}}");
        }
        let out = normalize(&src).unwrap();
        assert!(out.starts_with("{{#v0}}{{#v1}}"));
        assert!(out.ends_with("{{/v1}}{{/v0}}"));
    }

    #[test]
    fn normalize_is_deterministic() {
        let src = "{{#each a}}{{#if b}}x{{else}}y{{/if}}{{/each}}";
        assert_eq!(normalize(src).unwrap(), normalize(src).unwrap());
    }

    // =========================================================================
    // Structural errors
    // =========================================================================

    #[test]
    fn close_without_open() {
        assert_eq!(
            problem("x{{/if}}"),
            Problem::CloseWithoutOpen { tag: "if".into() }
        );
    }

    #[test]
    fn close_kind_mismatch() {
        assert!(matches!(
            problem("{{#each xs}}{{/if}}"),
            Problem::CloseMismatch { .. }
        ));
    }

    #[test]
    fn named_close_mismatch() {
        assert!(matches!(
            problem("{{#a}}{{/b}}"),
            Problem::CloseMismatch { .. }
        ));
    }

    #[test]
    fn else_without_open() {
        assert_eq!(problem("{{else}}"), Problem::ElseWithoutOpen);
    }

    #[test]
    fn duplicate_else() {
        assert_eq!(
            problem("{{#if a}}1{{else}}2{{else}}3{{/if}}"),
            Problem::DuplicateElse { name: "a".into() }
        );
    }

    #[test]
    fn else_in_inverted_section() {
        assert!(matches!(
            problem("{{^a}}1{{else}}2{{/a}}"),
            Problem::ElseInInverted { .. }
        ));
    }

    #[test]
    fn unclosed_reports_line_of_open_tag() {
        let err = normalize("line one\n{{#if a}}\nbody").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.problem, Problem::Unclosed { open: "if a".into() });
    }

    #[test]
    fn unterminated_tag() {
        assert_eq!(problem("hello {{name"), Problem::UnterminatedTag);
    }

    #[test]
    fn expression_conditions_are_rejected() {
        assert!(matches!(
            problem("{{#if a b}}x{{/if}}"),
            Problem::UnsupportedExpression { .. }
        ));
    }

    #[test]
    fn partials_are_rejected() {
        assert!(matches!(
            problem("{{> header}}"),
            Problem::UnsupportedTag { .. }
        ));
    }

    #[test]
    fn error_line_counts_newlines() {
        let err = normalize("a\nb\nc{{/each}}").unwrap_err();
        assert_eq!(err.line, 3);
    }

    // =========================================================================
    // Scanner
    // =========================================================================

    #[test]
    fn scan_splits_text_and_tags() {
        let tokens = scan("a{{b}}c{{{d}}}").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], Token::Text("a"));
        match &tokens[3] {
            Token::Tag(tag) => {
                assert!(tag.triple);
                assert_eq!(tag.inner, "d");
                assert_eq!(tag.offset, 7);
            }
            other => panic!("expected tag, got {other:?}"),
        }
    }
}
