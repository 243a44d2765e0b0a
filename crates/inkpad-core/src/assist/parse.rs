//! Parsing of free-form generator responses.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AssistError;

const MAX_GLOSSARY_TERMS: usize = 10;
const MAX_FALLBACK_TERMS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarIssue {
    pub error: String,
    pub suggestion: String,
}

/// Glossary terms and whether they came from the line-based fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGlossary {
    pub terms: Vec<GlossaryTerm>,
    pub approximate: bool,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```(?:json)?\s*").expect("Invalid regex"))
}

fn array_regex() -> &'static Regex {
    static ARRAY: OnceLock<Regex> = OnceLock::new();
    ARRAY.get_or_init(|| Regex::new(r"\[[\s\S]*\]").expect("Invalid regex"))
}

fn colon_line_regex() -> &'static Regex {
    static COLON: OnceLock<Regex> = OnceLock::new();
    COLON.get_or_init(|| Regex::new(r"^(.+?):\s*(.+)$").expect("Invalid regex"))
}

fn dash_line_regex() -> &'static Regex {
    static DASH: OnceLock<Regex> = OnceLock::new();
    DASH.get_or_init(|| Regex::new(r"^(.+?)\s*-\s*(.+)$").expect("Invalid regex"))
}

/// Remove markdown code fences and surrounding whitespace.
pub fn strip_code_fences(response: &str) -> String {
    fence_regex().replace_all(response.trim(), "").trim().to_string()
}

/// Narrow a response to its outermost JSON array when one is present.
fn json_array_slice(cleaned: &str) -> &str {
    array_regex()
        .find(cleaned)
        .map_or(cleaned, |found| found.as_str())
}

fn non_empty_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| item.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Parse a glossary response.
///
/// A JSON array of `{term|name, definition|description}` objects is
/// preferred; anything else falls back to `Term: definition` or
/// `Term - definition` lines.
pub fn parse_glossary(response: &str) -> Result<ParsedGlossary, AssistError> {
    let cleaned = strip_code_fences(response);
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(json_array_slice(&cleaned)) {
        if !items.is_empty() {
            let terms: Vec<GlossaryTerm> = items
                .iter()
                .filter_map(|item| {
                    Some(GlossaryTerm {
                        term: non_empty_str(item, &["term", "name"])?.to_string(),
                        definition: non_empty_str(item, &["definition", "description"])?
                            .to_string(),
                    })
                })
                .take(MAX_GLOSSARY_TERMS)
                .collect();
            if terms.is_empty() {
                return Err(AssistError::Parse(
                    "no valid key terms found in the response".to_string(),
                ));
            }
            return Ok(ParsedGlossary {
                terms,
                approximate: false,
            });
        }
    }

    let terms = parse_term_lines(response);
    if terms.is_empty() {
        Err(AssistError::Parse(
            "unable to parse key terms from the response".to_string(),
        ))
    } else {
        Ok(ParsedGlossary {
            terms,
            approximate: true,
        })
    }
}

fn parse_term_lines(response: &str) -> Vec<GlossaryTerm> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            colon_line_regex()
                .captures(line)
                .or_else(|| dash_line_regex().captures(line))
                .map(|captures| GlossaryTerm {
                    term: captures[1].trim().to_string(),
                    definition: captures[2].trim().to_string(),
                })
        })
        .take(MAX_FALLBACK_TERMS)
        .collect()
}

/// Parse a grammar-check response: a JSON array of `{error, suggestion}`.
pub fn parse_grammar(response: &str) -> Result<Vec<GrammarIssue>, AssistError> {
    let cleaned = strip_code_fences(response);
    serde_json::from_str(json_array_slice(&cleaned))
        .map_err(|error| AssistError::Parse(format!("invalid grammar response: {error}")))
}

/// Split a comma-separated tag response.
pub fn parse_tags(response: &str) -> Vec<String> {
    response
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
