//! Task-text parsing and LLM-response parsing.
//!
//! The task side splits a free-form description into numbered questions,
//! finds referenced URLs, and detects the response shape the task asks for.
//! The response side strips code fences and parses the collaborator's text
//! into an ordered answer list; failure here is an [`ScoutError::UpstreamFormat`]
//! the orchestrator recovers from, never a crash.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{ScoutError, ScoutResult};

fn question_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)[.)]\s*(.+)$").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://\S+").unwrap())
}

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^```(?:json|plaintext)?|```\s*$").unwrap())
}

/// One answer value: a plain number, or a string (data URIs included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Number(f64),
    Text(String),
}

/// The response shape the task asks the collaborator for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateKind {
    /// "respond with a JSON array"
    Array,
    /// "respond with a JSON object", optionally with the keys of a fenced
    /// example object in the task text
    Object(Vec<String>),
    None,
}

/// A parsed task description.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub raw: String,
    pub questions: Vec<String>,
    pub urls: Vec<String>,
    pub template: TemplateKind,
}

impl TaskSpec {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            questions: split_numbered_questions(raw),
            urls: url_re()
                .find_iter(raw)
                .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ']']).to_string())
                .collect(),
            template: detect_template(raw),
        }
    }

    pub fn first_url(&self) -> Option<&str> {
        self.urls.first().map(|s| s.as_str())
    }
}

/// Split `1. ...` / `2) ...` lines into questions; a text with no numbered
/// lines is one single question.
pub fn split_numbered_questions(text: &str) -> Vec<String> {
    let questions: Vec<String> = text
        .lines()
        .filter_map(|line| question_line_re().captures(line))
        .map(|caps| caps[2].trim().to_string())
        .collect();

    if questions.is_empty() {
        vec![text.trim().to_string()]
    } else {
        questions
    }
}

fn detect_template(text: &str) -> TemplateKind {
    let lower = text.to_lowercase();
    if lower.contains("respond with a json object") {
        // Top-level keys of a fenced example object, when the task shows
        // one. serde_json's preserve_order keeps them in document order;
        // nested objects' keys are not part of the template.
        for block in fenced_blocks(text) {
            let body = block.trim();
            if body.starts_with('{') {
                if let Ok(map) = serde_json::from_str::<serde_json::Map<String, Value>>(body) {
                    return TemplateKind::Object(map.keys().cloned().collect());
                }
            }
        }
        return TemplateKind::Object(Vec::new());
    }
    if lower.contains("respond with a json array") {
        return TemplateKind::Array;
    }
    TemplateKind::None
}

fn fenced_blocks(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?si)```(?:json)?(.*?)```").unwrap());
    re.captures_iter(text).map(|c| c[1].to_string()).collect()
}

/// Remove surrounding markdown code-fence markers so the remainder can be
/// parsed as JSON.
pub fn strip_code_fences(text: &str) -> String {
    code_fence_re().replace_all(text.trim(), "").trim().to_string()
}

fn value_to_answer(value: &Value) -> Answer {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => Answer::Number(f),
            None => Answer::Text(n.to_string()),
        },
        Value::String(s) => Answer::Text(s.clone()),
        other => Answer::Text(other.to_string()),
    }
}

/// Parse the collaborator's raw completion into an ordered answer list.
///
/// Accepts a JSON array, or a JSON object when `template` carries the key
/// order to read it in. Anything else (prose, empty text, truncated JSON)
/// is an upstream-format error for the caller's recovery policy.
pub fn parse_answers(raw: &str, template: &TemplateKind) -> ScoutResult<Vec<Answer>> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(ScoutError::format("empty completion"));
    }

    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| ScoutError::format(format!("completion is not JSON: {e}")))?;

    match value {
        Value::Array(items) => Ok(items.iter().map(value_to_answer).collect()),
        Value::Object(map) => {
            if let TemplateKind::Object(keys) = template {
                if !keys.is_empty() {
                    return Ok(keys
                        .iter()
                        .map(|k| map.get(k).map(value_to_answer).unwrap_or_else(|| {
                            Answer::Text(format!("(missing key {k})"))
                        }))
                        .collect());
                }
            }
            Err(ScoutError::format("object completion without a key template"))
        }
        _ => Err(ScoutError::format("completion is neither array nor object")),
    }
}

/// The named recovery policy for unparseable completions: one placeholder
/// string per question, keeping the answer list aligned 1:1.
pub fn placeholder_answers(count: usize) -> Vec<Answer> {
    (1..=count)
        .map(|i| Answer::Text(format!("(Failed to answer question {i})")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_numbered_lines() {
        let text = "Intro line\n1. How many?\n2) Which one?\n3.   What correlation?\n";
        let qs = split_numbered_questions(text);
        assert_eq!(qs, vec!["How many?", "Which one?", "What correlation?"]);
    }

    #[test]
    fn unnumbered_text_is_one_question() {
        let qs = split_numbered_questions("Just answer this.");
        assert_eq!(qs.len(), 1);
    }

    #[test]
    fn finds_urls_without_trailing_punctuation() {
        let task = TaskSpec::parse("Scrape https://en.wikipedia.org/wiki/List_of_films. Then answer.");
        assert_eq!(task.first_url(), Some("https://en.wikipedia.org/wiki/List_of_films"));
    }

    #[test]
    fn detects_array_template() {
        let task = TaskSpec::parse("Respond with a JSON array of strings.\n1. Q?");
        assert_eq!(task.template, TemplateKind::Array);
    }

    #[test]
    fn detects_object_template_with_keys() {
        let task = TaskSpec::parse(
            "Respond with a JSON object.\n```json\n{\"total\": 0, \"winner\": \"\"}\n```",
        );
        match &task.template {
            TemplateKind::Object(keys) => assert_eq!(keys, &["total", "winner"]),
            other => panic!("expected object template, got {other:?}"),
        }
    }

    #[test]
    fn object_template_keys_are_top_level_only() {
        let task = TaskSpec::parse(
            "Respond with a JSON object.\n\
             ```json\n{\"summary\": {\"total\": 0, \"winner\": \"\"}, \"chart\": \"\"}\n```",
        );
        match &task.template {
            TemplateKind::Object(keys) => assert_eq!(keys, &["summary", "chart"]),
            other => panic!("expected object template, got {other:?}"),
        }
    }

    #[test]
    fn strips_fences_before_parsing() {
        let raw = "```json\n[1, \"Titanic\", 0.485782]\n```";
        let answers = parse_answers(raw, &TemplateKind::Array).unwrap();
        assert_eq!(answers[0], Answer::Number(1.0));
        assert_eq!(answers[1], Answer::Text("Titanic".into()));
    }

    #[test]
    fn object_completion_resolved_through_template_keys() {
        let template = TemplateKind::Object(vec!["total".into(), "winner".into()]);
        let answers = parse_answers("{\"winner\": \"Avatar\", \"total\": 3}", &template).unwrap();
        assert_eq!(answers, vec![Answer::Number(3.0), Answer::Text("Avatar".into())]);
    }

    #[test]
    fn prose_and_empty_are_format_errors() {
        assert!(matches!(
            parse_answers("I think the answer is 4.", &TemplateKind::Array),
            Err(ScoutError::UpstreamFormat { .. })
        ));
        assert!(matches!(
            parse_answers("", &TemplateKind::Array),
            Err(ScoutError::UpstreamFormat { .. })
        ));
    }

    #[test]
    fn placeholders_are_numbered_from_one() {
        let ph = placeholder_answers(2);
        assert_eq!(ph[0], Answer::Text("(Failed to answer question 1)".into()));
        assert_eq!(ph[1], Answer::Text("(Failed to answer question 2)".into()));
    }

    #[test]
    fn answers_serialize_positionally() {
        let answers = vec![Answer::Number(1.0), Answer::Text("Titanic".into())];
        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, "[1.0,\"Titanic\"]");
    }
}
