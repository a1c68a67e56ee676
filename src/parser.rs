//! Tolerant parsing of debate responses
//!
//! Models are asked to answer with a JSON object holding `optimistic`,
//! `pessimistic` and `recommendation`, but frequently wrap it in Markdown
//! fences, surround it with prose or ignore the format entirely. Parsing uses
//! a 3-tier fallback strategy after fence stripping:
//!
//! 1. Strict JSON parse of the whole text
//! 2. Extract the first balanced JSON object from mixed content
//! 3. Per-field pattern extraction (`<field><non-word chars><rest of line>`)
//!
//! Parsing never fails: fields that cannot be found hold [`PLACEHOLDER`].

use crate::logging::{log_debug, log_warn, preview};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value shown for a field the response did not provide
pub const PLACEHOLDER: &str = "-";

/// Field names requested from the model, in display order
pub const DEBATE_FIELDS: [&str; 3] = ["optimistic", "pessimistic", "recommendation"];

const FENCE: &str = "```";

static FIELD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    DEBATE_FIELDS
        .iter()
        .filter_map(|field| {
            Regex::new(&format!(r"(?i){field}\W+([^\n]*)"))
                .ok()
                .map(|regex| (*field, regex))
        })
        .collect()
});

/// Which tier produced the parsed values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseSource {
    /// The whole text was a JSON object
    Json,
    /// A JSON object was found inside surrounding prose
    ExtractedJson,
    /// Values were picked out line by line
    Pattern,
    /// The response was empty
    Empty,
}

/// The three perspectives of a debate, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDebate {
    pub optimistic: String,
    pub pessimistic: String,
    pub recommendation: String,
    /// Response text after trimming and fence stripping, line endings kept
    pub raw: String,
    pub source: ParseSource,
}

impl ParsedDebate {
    fn from_fields(
        [optimistic, pessimistic, recommendation]: [String; 3],
        raw: String,
        source: ParseSource,
    ) -> Self {
        Self {
            optimistic,
            pessimistic,
            recommendation,
            raw,
            source,
        }
    }

    /// Value of a field by its JSON name
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "optimistic" => Some(&self.optimistic),
            "pessimistic" => Some(&self.pessimistic),
            "recommendation" => Some(&self.recommendation),
            _ => None,
        }
    }

    /// Fields in display order
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("optimistic", self.optimistic.as_str()),
            ("pessimistic", self.pessimistic.as_str()),
            ("recommendation", self.recommendation.as_str()),
        ]
    }

    /// True when no field could be found and the raw text should be shown instead
    pub fn needs_inspection(&self) -> bool {
        self.fields().iter().all(|(_, value)| *value == PLACEHOLDER)
    }

    /// Whitespace-separated words of the raw text, used as a token estimate
    pub fn word_count(&self) -> usize {
        self.raw.split_whitespace().count()
    }
}

/// Response parser with fallback strategies
pub struct ResponseParser;

impl ResponseParser {
    /// Parse a model response into a [`ParsedDebate`]
    pub fn parse(content: &str) -> ParsedDebate {
        let raw = Self::strip_fences(content);

        log_debug!(
            content_length = raw.len(),
            content_preview = %preview(&raw),
            "Parsing debate response"
        );

        if raw.is_empty() {
            return ParsedDebate::from_fields(placeholders(), raw, ParseSource::Empty);
        }

        // 1. Strict JSON
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&raw) {
            log_debug!("Parsed debate response as JSON");
            let fields = Self::fields_from_object(&map);
            return ParsedDebate::from_fields(fields, raw, ParseSource::Json);
        }

        // 2. JSON object inside prose
        if let Some(map) = Self::extract_json_object(&raw) {
            if DEBATE_FIELDS.iter().any(|field| lookup(&map, field).is_some()) {
                log_debug!("Parsed debate response from embedded JSON object");
                let fields = Self::fields_from_object(&map);
                return ParsedDebate::from_fields(fields, raw, ParseSource::ExtractedJson);
            }
        }

        // 3. Field patterns
        let fields = Self::extract_fields(&raw);
        let parsed = ParsedDebate::from_fields(fields, raw, ParseSource::Pattern);
        if parsed.needs_inspection() {
            log_warn!(
                content_preview = %preview(&parsed.raw),
                "Debate response not recognizable, no field found"
            );
        }
        parsed
    }

    /// Trim and remove a surrounding ``` fence including its language tag
    ///
    /// Text fenced on one side only is returned trimmed but otherwise unchanged.
    pub fn strip_fences(content: &str) -> String {
        let trimmed = content.trim();
        if !(trimmed.starts_with(FENCE) && trimmed.ends_with(FENCE)) {
            return trimmed.to_string();
        }

        // Body between the opening and closing fence lines, line endings untouched
        if let (Some(first), Some(last)) = (trimmed.find('\n'), trimmed.rfind('\n')) {
            let body = if first < last { &trimmed[first + 1..last] } else { "" };
            return body.trim().to_string();
        }

        // Single line such as ```json {"a": 1}```
        let inner = trimmed
            .strip_prefix(FENCE)
            .and_then(|rest| rest.strip_suffix(FENCE))
            .unwrap_or_default()
            .trim();
        match inner.split_once(char::is_whitespace) {
            Some((tag, rest))
                if !tag.is_empty()
                    && tag.chars().all(|c| c.is_ascii_alphanumeric())
                    && rest.trim_start().starts_with(['{', '[']) =>
            {
                rest.trim().to_string()
            }
            _ => inner.to_string(),
        }
    }

    fn fields_from_object(map: &Map<String, Value>) -> [String; 3] {
        DEBATE_FIELDS.map(|field| match lookup(map, field) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => PLACEHOLDER.to_string(),
            Some(other) => other.to_string(),
        })
    }

    fn extract_fields(text: &str) -> [String; 3] {
        let mut fields = placeholders();
        for (slot, field) in fields.iter_mut().zip(DEBATE_FIELDS) {
            let captured = FIELD_PATTERNS
                .iter()
                .find(|(name, _)| *name == field)
                .and_then(|(_, regex)| regex.captures(text))
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().trim())
                .filter(|value| !value.is_empty());
            if let Some(value) = captured {
                *slot = value.to_string();
            }
        }
        fields
    }

    /// First balanced JSON object in mixed content, if it parses
    fn extract_json_object(content: &str) -> Option<Map<String, Value>> {
        let start_idx = content.find('{')?;
        let candidate = &content[start_idx..];
        let end_idx = Self::find_balanced_json_end(candidate)?;

        match serde_json::from_str::<Value>(&candidate[..=end_idx]) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Byte index of the brace closing the object that starts `text`
    fn find_balanced_json_end(text: &str) -> Option<usize> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (idx, ch) in text.char_indices() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }

        None // Unbalanced braces
    }
}

fn placeholders() -> [String; 3] {
    DEBATE_FIELDS.map(|_| PLACEHOLDER.to_string())
}

fn lookup<'m>(map: &'m Map<String, Value>, field: &str) -> Option<&'m Value> {
    map.get(field).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    })
}
