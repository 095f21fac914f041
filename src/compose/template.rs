use std::sync::LazyLock;

use regex::Regex;

use crate::collector::{ContentMap, ContentType};
use crate::error::TemplateError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Field(ContentType),
}

/// Split a template into literal text and `{content-type}` fields. Every
/// field must be one of `allowed`.
pub fn parse(source: &str, allowed: &[ContentType]) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(source) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_text(&mut segments, source, last, whole.start())?;

        let name = inner.as_str().trim();
        if name.is_empty() {
            return Err(TemplateError::EmptyPlaceholder(whole.start()));
        }
        let ty = name
            .parse::<ContentType>()
            .ok()
            .filter(|t| allowed.contains(t))
            .ok_or_else(|| TemplateError::UnknownField(name.to_string()))?;
        segments.push(Segment::Field(ty));
        last = whole.end();
    }
    push_text(&mut segments, source, last, source.len())?;
    Ok(segments)
}

/// Literal text between placeholders may not contain a lone brace.
fn push_text(
    segments: &mut Vec<Segment>,
    source: &str,
    start: usize,
    end: usize,
) -> Result<(), TemplateError> {
    let text = &source[start..end];
    if let Some(pos) = text.find(['{', '}']) {
        return Err(TemplateError::Unbalanced(start + pos));
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
    Ok(())
}

/// Substitute field values; missing values render empty.
pub fn render(segments: &[Segment], content: &ContentMap) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Field(ty) => {
                if let Some(v) = content.get(ty) {
                    out.push_str(v);
                }
            }
        }
    }
    out
}

/// Non-empty values of `inputs`, in order.
pub fn values<'a>(inputs: &[ContentType], content: &'a ContentMap) -> Vec<&'a str> {
    inputs
        .iter()
        .filter_map(|t| content.get(t))
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .collect()
}

/// Evaluate `source`, joining the inputs with a space when it does not
/// evaluate. Yields `""` when every input is empty.
pub fn evaluate(source: &str, inputs: &[ContentType], content: &ContentMap) -> String {
    let present = values(inputs, content);
    if present.is_empty() {
        return String::new();
    }
    match parse(source, inputs) {
        Ok(segments) => render(&segments, content),
        Err(e) => {
            tracing::debug!("template {:?}: {}", source, e);
            present.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(pairs: &[(ContentType, &str)]) -> ContentMap {
        pairs.iter().map(|(t, v)| (*t, v.to_string())).collect()
    }

    const INPUTS: [ContentType; 2] = [ContentType::Folder, ContentType::GitBranch];

    #[test]
    fn test_parse_fields_and_text() {
        let segments = parse("{folder}@{git-branch}", &INPUTS).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Field(ContentType::Folder),
                Segment::Text("@".into()),
                Segment::Field(ContentType::GitBranch),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse("{nope}", &INPUTS),
            Err(TemplateError::UnknownField("nope".into()))
        );
        assert_eq!(
            parse("{model}", &INPUTS),
            Err(TemplateError::UnknownField("model".into()))
        );
        assert_eq!(parse("a {} b", &INPUTS), Err(TemplateError::EmptyPlaceholder(2)));
        assert_eq!(parse("{folder", &INPUTS), Err(TemplateError::Unbalanced(0)));
        assert_eq!(parse("x}", &INPUTS), Err(TemplateError::Unbalanced(1)));
    }

    #[test]
    fn test_evaluate_renders() {
        let c = content(&[(ContentType::Folder, "app"), (ContentType::GitBranch, "main")]);
        assert_eq!(evaluate("{folder}@{git-branch}", &INPUTS, &c), "app@main");
    }

    #[test]
    fn test_evaluate_falls_back_to_space_join() {
        let c = content(&[(ContentType::Folder, "app"), (ContentType::GitBranch, "main")]);
        assert_eq!(evaluate("{folder}@{branch", &INPUTS, &c), "app main");
        assert_eq!(evaluate("{whatever}", &INPUTS, &c), "app main");
    }

    #[test]
    fn test_evaluate_all_empty_is_blank() {
        let c = content(&[(ContentType::Folder, ""), (ContentType::GitBranch, " ")]);
        assert_eq!(evaluate("in {folder} on {git-branch}", &INPUTS, &c), "");
        assert_eq!(evaluate("broken {", &INPUTS, &ContentMap::new()), "");
    }
}
