//! Placeholder rendering engine.
//!
//! Templates reference parameters as `{{.Name}}`. The supported subset is:
//!
//! - field references `{{.Name}}`, with nested lookup into objects (`{{.User.Name}}`)
//! - whitespace inside the delimiters (`{{ .Name }}`)
//! - trim markers `{{- .Name -}}` that strip whitespace around the action
//! - comments `{{/* ... */}}`
//!
//! A field that is absent from the parameters renders as an empty string.
//! Anything else inside `{{ }}` (control flow, functions, pipelines) fails
//! when the template is executed.

use serde_json::Value;
use thiserror::Error;

use crate::trigger::Param;

/// Key/value mapping a template is rendered against.
pub type Params = serde_json::Map<String, Value>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("cannot execute '{action}' at byte {offset}: {message}")]
    Execution {
        offset: usize,
        action: String,
        message: String,
    },
}

impl RenderError {
    fn parse(offset: usize, message: impl Into<String>) -> Self {
        RenderError::Parse {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Node<'a> {
    Text(&'a str),
    Field {
        action: &'a str,
        path: Vec<&'a str>,
        offset: usize,
    },
    Unsupported {
        action: &'a str,
        offset: usize,
    },
}

/// Stateless renderer for subjects and bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEngine;

impl TemplateEngine {
    pub fn new() -> Self {
        Self
    }

    /// Render `source` against `params`. Nothing is returned on error.
    pub fn render(&self, source: &str, params: &Params) -> Result<String, RenderError> {
        let nodes = parse(source)?;
        execute(&nodes, params)
    }

    /// Render `source` using the example values of the declared parameters.
    pub fn preview(&self, source: &str, declared: &[Param]) -> Result<String, RenderError> {
        self.render(source, &example_params(declared))
    }
}

/// Parameters built from declared examples.
///
/// A parameter without an example maps to its own placeholder text, so the
/// output shows `{{.Name}}` wherever no example was provided.
pub fn example_params(declared: &[Param]) -> Params {
    declared
        .iter()
        .map(|param| {
            let value = if param.example.is_empty() {
                param.placeholder()
            } else {
                param.example.clone()
            };
            (param.name.clone(), Value::String(value))
        })
        .collect()
}

fn parse(source: &str) -> Result<Vec<Node<'_>>, RenderError> {
    let mut nodes = Vec::new();
    let mut cursor = 0;
    let mut trim_next_text = false;

    while let Some(found) = source[cursor..].find(OPEN) {
        let open = cursor + found;
        let body_start = open + OPEN.len();
        let trim_left = has_left_trim_marker(&source[body_start..]);
        let content_start = if trim_left { body_start + 1 } else { body_start };

        let (node, close, trim_right) = if source[content_start..]
            .trim_start()
            .starts_with(COMMENT_OPEN)
        {
            let (close, trim_right) = parse_comment(source, open, content_start)?;
            (None, close, trim_right)
        } else {
            let close = source[content_start..]
                .find(CLOSE)
                .map(|i| content_start + i)
                .ok_or_else(|| RenderError::parse(open, "unclosed action"))?;

            let mut inner = &source[content_start..close];
            let trim_right = has_right_trim_marker(inner);
            if trim_right {
                inner = &inner[..inner.len() - 1];
            }
            (Some(parse_action(inner.trim(), open)?), close, trim_right)
        };

        let mut text = &source[cursor..open];
        if trim_next_text {
            text = text.trim_start();
        }
        if trim_left {
            text = text.trim_end();
        }
        if !text.is_empty() {
            nodes.push(Node::Text(text));
        }
        if let Some(node) = node {
            nodes.push(node);
        }

        cursor = close + CLOSE.len();
        trim_next_text = trim_right;
    }

    let mut tail = &source[cursor..];
    if trim_next_text {
        tail = tail.trim_start();
    }
    if !tail.is_empty() {
        nodes.push(Node::Text(tail));
    }

    Ok(nodes)
}

/// `{{- ` : a dash immediately after the delimiter, followed by whitespace.
fn has_left_trim_marker(rest: &str) -> bool {
    rest.starts_with('-') && rest[1..].starts_with(char::is_whitespace)
}

/// ` -}}` : whitespace followed by a dash immediately before the delimiter.
fn has_right_trim_marker(inner: &str) -> bool {
    inner
        .strip_suffix('-')
        .is_some_and(|before| before.ends_with(char::is_whitespace))
}

/// Returns the position of the closing delimiter and whether it trims.
fn parse_comment(
    source: &str,
    open: usize,
    content_start: usize,
) -> Result<(usize, bool), RenderError> {
    let comment_start = content_start + source[content_start..].find(COMMENT_OPEN).unwrap_or(0);
    let comment_end = source[comment_start + COMMENT_OPEN.len()..]
        .find(COMMENT_CLOSE)
        .map(|i| comment_start + COMMENT_OPEN.len() + i + COMMENT_CLOSE.len())
        .ok_or_else(|| RenderError::parse(open, "unclosed comment"))?;

    let close = source[comment_end..]
        .find(CLOSE)
        .map(|i| comment_end + i)
        .ok_or_else(|| RenderError::parse(open, "unclosed action"))?;

    match source[comment_end..close].trim() {
        "" => Ok((close, false)),
        "-" if has_right_trim_marker(&source[comment_end..close]) => Ok((close, true)),
        _ => Err(RenderError::parse(
            open,
            "comment ends before closing delimiter",
        )),
    }
}

fn parse_action(body: &str, offset: usize) -> Result<Node<'_>, RenderError> {
    if body.is_empty() {
        return Err(RenderError::parse(offset, "missing value for action"));
    }

    let is_pipeline = body.contains(char::is_whitespace) || body.contains('|');
    if is_pipeline || body == "." || !body.starts_with('.') {
        return Ok(Node::Unsupported {
            action: body,
            offset,
        });
    }

    let path: Vec<&str> = body[1..].split('.').collect();
    if let Some(bad) = path.iter().find(|segment| !is_identifier(segment)) {
        return Err(RenderError::parse(
            offset,
            format!("bad field name '{}' in '{}'", bad, body),
        ));
    }

    Ok(Node::Field {
        action: body,
        path,
        offset,
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn execute(nodes: &[Node<'_>], params: &Params) -> Result<String, RenderError> {
    let mut out = String::new();

    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field {
                action,
                path,
                offset,
            } => {
                if let Some(value) = lookup(params, path, action, *offset)? {
                    write_value(&mut out, value);
                }
            }
            Node::Unsupported { action, offset } => {
                return Err(RenderError::Execution {
                    offset: *offset,
                    action: action.to_string(),
                    message: "unsupported template construct".to_string(),
                });
            }
        }
    }

    Ok(out)
}

/// Resolve a field path. Missing keys resolve to `None`, never an error.
fn lookup<'p>(
    params: &'p Params,
    path: &[&str],
    action: &str,
    offset: usize,
) -> Result<Option<&'p Value>, RenderError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(None);
    };
    let Some(mut current) = params.get(*first) else {
        return Ok(None);
    };

    for segment in rest {
        current = match current {
            Value::Object(map) => match map.get(*segment) {
                Some(value) => value,
                None => return Ok(None),
            },
            Value::Null => return Ok(None),
            other => {
                return Err(RenderError::Execution {
                    offset,
                    action: action.to_string(),
                    message: format!(
                        "can't evaluate field {} in {} value",
                        segment,
                        value_kind(other)
                    ),
                })
            }
        };
    }

    Ok(Some(current))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Null => {}
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        // Arrays and objects use their JSON representation
        _ => out.push_str(&value.to_string()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
