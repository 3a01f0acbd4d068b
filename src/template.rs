//! Field substitution for the application template.
//!
//! Supports the subset of Go `text/template` the Argo CD application template is
//! written in: `{{ .Field }}` references, `{{-` / `-}}` whitespace trimming and
//! `{{/* comments */}}`. Any other action is rejected while parsing, so a template
//! either renders completely or not at all.
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::Error;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

/// Template syntax and execution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {0}")]
    UnclosedAction(usize),

    #[error("unclosed comment starting at byte {0}")]
    UnclosedComment(usize),

    #[error("comment ends before closing delimiter at byte {0}")]
    CommentBeforeDelimiter(usize),

    #[error("unsupported action {action:?} at byte {offset}")]
    UnsupportedAction { action: String, offset: usize },

    #[error("can't evaluate field {0}")]
    MissingField(String),

    #[error("template data must be a struct or map: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn has_left_trim(body: &str) -> bool {
    body.strip_prefix('-')
        .is_some_and(|rest| rest.starts_with(is_space))
}

fn has_right_trim(action: &str) -> bool {
    action
        .strip_suffix('-')
        .is_some_and(|rest| rest.ends_with(is_space))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

impl Template {
    /// Parses template text, checking every action up front.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut pos = 0;
        let mut trim_next = false;

        while let Some(found) = source[pos..].find(LEFT_DELIM) {
            let open = pos + found;
            let mut body_start = open + LEFT_DELIM.len();

            let mut text = &source[pos..open];
            if trim_next {
                text = text.trim_start_matches(is_space);
            }
            let trim_left = has_left_trim(&source[body_start..]);
            if trim_left {
                text = text.trim_end_matches(is_space);
                body_start += 1;
            }
            push_text(&mut segments, text);

            // a comment must follow `{{` or `{{- ` directly and may contain the right delimiter
            let comment_start = if trim_left { body_start + 1 } else { body_start };
            if source[comment_start..].starts_with(LEFT_COMMENT) {
                let (end, trim_right) = comment_end(source, comment_start, open)?;
                trim_next = trim_right;
                pos = end;
                continue;
            }

            let body = &source[body_start..];
            let close = body.find(RIGHT_DELIM).ok_or(TemplateError::UnclosedAction(open))?;

            let mut action = &body[..close];
            trim_next = has_right_trim(action);
            if trim_next {
                action = &action[..action.len() - 1];
            }
            let field = parse_action(action, open)?;
            segments.push(Segment::Field(field));
            pos = body_start + close + RIGHT_DELIM.len();
        }

        let mut text = &source[pos..];
        if trim_next {
            text = text.trim_start_matches(is_space);
        }
        push_text(&mut segments, text);
        Ok(Self { segments })
    }

    /// Substitutes the fields of `data` into the template.
    ///
    /// `data` must serialize to a JSON object; its keys are the field names.
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        let fields = match serde_json::to_value(data) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => return Err(TemplateError::InvalidData(format!("got {other}"))),
            Err(e) => return Err(TemplateError::InvalidData(e.to_string())),
        };

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(name) => match fields.get(name) {
                    Some(Value::String(value)) => out.push_str(value),
                    Some(Value::Null) => out.push_str("<no value>"),
                    Some(value) => out.push_str(&value.to_string()),
                    None => return Err(TemplateError::MissingField(name.clone())),
                },
            }
        }
        Ok(out)
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

/// Returns the byte offset just past the comment action starting at `start`,
/// and whether it ends with a right trim marker.
fn comment_end(source: &str, start: usize, open: usize) -> Result<(usize, bool), TemplateError> {
    let comment = &source[start..];
    let end = comment[LEFT_COMMENT.len()..]
        .find(RIGHT_COMMENT)
        .ok_or(TemplateError::UnclosedComment(open))?
        + LEFT_COMMENT.len()
        + RIGHT_COMMENT.len();
    let after = &comment[end..];
    if after.starts_with(RIGHT_DELIM) {
        return Ok((start + end + RIGHT_DELIM.len(), false));
    }
    if after.starts_with(is_space) && after[1..].starts_with("-}}") {
        return Ok((start + end + 1 + "-}}".len(), true));
    }
    Err(TemplateError::CommentBeforeDelimiter(open))
}

fn parse_action(action: &str, offset: usize) -> Result<String, TemplateError> {
    let trimmed = action.trim_matches(is_space);
    match trimmed.strip_prefix('.') {
        Some(name) if is_identifier(name) => Ok(name.to_string()),
        _ => Err(unsupported(trimmed, offset)),
    }
}

fn unsupported(action: &str, offset: usize) -> TemplateError {
    TemplateError::UnsupportedAction {
        action: action.to_string(),
        offset,
    }
}

/// Parses and renders in one step, classifying failures as parse or execution errors.
pub fn render<T: Serialize>(source: &str, data: &T) -> Result<String, Error> {
    let template = Template::parse(source).map_err(Error::TemplateParse)?;
    template.render(data).map_err(Error::TemplateExecution)
}
