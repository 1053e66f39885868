//! Logic-less evaluation of normalized templates.
//!
//! Normalized text is parsed once into a small node tree and then rendered
//! against a stack of scopes. The semantics follow the mustache engine the
//! site was built on:
//!
//! - `null`, `false`, `0`, `""` and `[]` are falsy; every mapping is truthy.
//! - `{{#x}}` over a sequence renders once per element, over a mapping once
//!   with the mapping as scope, over `true` once in the current scope.
//! - `{{^x}}` renders when `x` is falsy or missing.
//! - Names resolve up the scope stack; `a.b.c` resolves `a` up the stack and
//!   the rest by descent; `.` is the innermost scope.
//! - Missing values render as nothing.

use super::context::{POSITION_KEYS, position_value};
use super::preprocess::{Token, line_of, scan};
use super::{Problem, StructureError};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Var {
        name: String,
        /// `{{{x}}}` / `{{&x}}`: never escaped.
        raw: bool,
    },
    Section {
        name: String,
        inverted: bool,
        children: Vec<Node>,
    },
}

struct OpenSection {
    name: String,
    inverted: bool,
    line: usize,
    children: Vec<Node>,
}

/// Parse primitive mustache syntax into nodes.
pub(crate) fn parse(source: &str) -> Result<Vec<Node>, StructureError> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<OpenSection> = Vec::new();

    for token in scan(source)? {
        let target = match stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut root,
        };
        let tag = match token {
            Token::Text(text) => {
                target.push(Node::Text(text.to_string()));
                continue;
            }
            Token::Tag(tag) => tag,
        };
        let line = line_of(source, tag.offset);
        let body = tag.inner.trim();

        if tag.triple {
            target.push(Node::Var {
                name: body.to_string(),
                raw: true,
            });
        } else if let Some(name) = body.strip_prefix('#') {
            stack.push(OpenSection {
                name: name.trim().to_string(),
                inverted: false,
                line,
                children: Vec::new(),
            });
        } else if let Some(name) = body.strip_prefix('^') {
            stack.push(OpenSection {
                name: name.trim().to_string(),
                inverted: true,
                line,
                children: Vec::new(),
            });
        } else if let Some(name) = body.strip_prefix('/') {
            let name = name.trim();
            let Some(open) = stack.pop() else {
                return Err(StructureError {
                    line,
                    problem: Problem::CloseWithoutOpen { tag: name.to_string() },
                });
            };
            if open.name != name {
                return Err(StructureError {
                    line,
                    problem: Problem::CloseMismatch {
                        tag: name.to_string(),
                        open: open.name,
                        open_line: open.line,
                    },
                });
            }
            let node = Node::Section {
                name: open.name,
                inverted: open.inverted,
                children: open.children,
            };
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => root.push(node),
            }
        } else if body.starts_with('!') {
            // comment
        } else if let Some(name) = body.strip_prefix('&') {
            target.push(Node::Var {
                name: name.trim().to_string(),
                raw: true,
            });
        } else if body.starts_with('>') || body.starts_with('=') {
            return Err(StructureError {
                line,
                problem: Problem::UnsupportedTag {
                    tag: tag.raw.to_string(),
                },
            });
        } else {
            target.push(Node::Var {
                name: body.to_string(),
                raw: false,
            });
        }
    }

    if let Some(open) = stack.pop() {
        return Err(StructureError {
            line: open.line,
            problem: Problem::Unclosed { open: open.name },
        });
    }
    Ok(root)
}

/// One level of the scope stack.
#[derive(Clone, Copy)]
struct Scope<'v> {
    value: &'v Value,
    /// Set for scopes pushed by iterating a sequence: (index, len).
    position: Option<(usize, usize)>,
}

/// Render parsed nodes against an (already annotated) context.
pub(crate) fn render_nodes(nodes: &[Node], context: &Value, escape_html: bool) -> String {
    let mut out = String::new();
    let mut stack = vec![Scope {
        value: context,
        position: None,
    }];
    render_into(nodes, &mut stack, escape_html, &mut out);
    out
}

fn render_into<'v>(nodes: &[Node], stack: &mut Vec<Scope<'v>>, escape_html: bool, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var { name, raw } => {
                if let Some(value) = lookup(name, stack) {
                    let text = stringify(&value);
                    if escape_html && !raw {
                        // Writing into a String cannot fail.
                        let _ = maud::Escaper::new(out).write_str(&text);
                    } else {
                        out.push_str(&text);
                    }
                }
            }
            Node::Section {
                name,
                inverted: true,
                children,
            } => {
                if !lookup(name, stack).is_some_and(|v| is_truthy(&v)) {
                    render_into(children, stack, escape_html, out);
                }
            }
            Node::Section {
                name,
                inverted: false,
                children,
            } => match lookup(name, stack) {
                Some(Cow::Borrowed(Value::Array(items))) => {
                    let len = items.len();
                    for (index, item) in items.iter().enumerate() {
                        stack.push(Scope {
                            value: item,
                            position: Some((index, len)),
                        });
                        render_into(children, stack, escape_html, out);
                        stack.pop();
                    }
                }
                Some(Cow::Borrowed(value)) if is_truthy(value) => {
                    if value.is_boolean() {
                        render_into(children, stack, escape_html, out);
                    } else {
                        stack.push(Scope {
                            value,
                            position: None,
                        });
                        render_into(children, stack, escape_html, out);
                        stack.pop();
                    }
                }
                // Positional metadata is computed, never a scope of its own.
                Some(Cow::Owned(value)) if is_truthy(&value) => {
                    render_into(children, stack, escape_html, out);
                }
                _ => {}
            },
        }
    }
}

/// Resolve a (possibly dotted) name against the scope stack.
fn lookup<'v>(name: &str, stack: &[Scope<'v>]) -> Option<Cow<'v, Value>> {
    if name == "." {
        return stack.last().map(|scope| Cow::Borrowed(scope.value));
    }
    // `.field` resolves against the current item only.
    let (anchored, name) = match name.strip_prefix('.') {
        Some(rest) => (true, rest),
        None => (false, name),
    };
    let mut parts = name.split('.');
    let head = parts.next()?;

    let found = if anchored {
        stack.last()?.value.as_object().and_then(|map| map.get(head))
    } else {
        let mut found: Option<&'v Value> = None;
        for scope in stack.iter().rev() {
            if let Some(value) = scope.value.as_object().and_then(|map| map.get(head)) {
                found = Some(value);
                break;
            }
            if let Some((index, len)) = scope.position
                && POSITION_KEYS.contains(&head)
            {
                return Some(Cow::Owned(position_value(head, index, len)));
            }
        }
        found
    };

    let mut current = found?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(Cow::Borrowed(current))
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Text form of a value in output position.
///
/// Sequences join their scalar members with commas; mappings render as
/// nothing.
fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null | Value::Object(_) => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::String(s) => Cow::Borrowed(s),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(|item| stringify(item).into_owned())
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}
