use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::RecordSchema;

/// Which repair strategy produced the record.
///
/// Stages are tried in declaration order; each is attempted only if the
/// previous one failed. `Defaults` always succeeds, so extraction is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// The text parsed as-is.
    Direct,
    /// A fenced code block or the first-`{`-to-last-`}` slice parsed.
    BlockExtract,
    /// Regex surgery (quoted keys/values, trailing commas, bracket
    /// balancing, embedded newlines) made the text parse.
    SyntacticRepair,
    /// Line-by-line key quoting made the text parse.
    LineRepair,
    /// Individual fields were pulled out by name-specific patterns.
    FieldScavenge,
    /// Nothing matched; the record is pure schema defaults.
    Defaults,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Direct => "direct",
            Stage::BlockExtract => "block_extract",
            Stage::SyntacticRepair => "syntactic_repair",
            Stage::LineRepair => "line_repair",
            Stage::FieldScavenge => "field_scavenge",
            Stage::Defaults => "defaults",
        };
        write!(f, "{}", name)
    }
}

/// A validated record plus the stage that produced it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: Map<String, Value>,
    pub stage: Stage,
}

impl Extraction {
    /// True when any repair past direct parsing was needed.
    pub fn was_repaired(&self) -> bool {
        self.stage > Stage::Direct
    }
}

type Attempt = fn(&str) -> Option<Map<String, Value>>;

/// Extract a record matching `schema` from arbitrary generator text.
///
/// Never fails: cascades through repair strategies and bottoms out at
/// schema defaults, then runs the validation pass unconditionally so every
/// required field is present with the declared shape.
pub fn extract(text: &str, schema: &RecordSchema) -> Extraction {
    const PARSE_ATTEMPTS: [(Stage, Attempt); 4] = [
        (Stage::Direct, parse_direct),
        (Stage::BlockExtract, parse_block),
        (Stage::SyntacticRepair, parse_repaired),
        (Stage::LineRepair, parse_line_repaired),
    ];

    for (stage, attempt) in PARSE_ATTEMPTS {
        if let Some(record) = attempt(text) {
            debug!(%stage, "extraction succeeded");
            return Extraction {
                record: schema.validate(record),
                stage,
            };
        }
    }

    if let Some(record) = scavenge_fields(text, schema) {
        debug!(stage = %Stage::FieldScavenge, "extraction succeeded");
        return Extraction {
            record: schema.validate(record),
            stage: Stage::FieldScavenge,
        };
    }

    debug!("all repair stages failed, using schema defaults");
    Extraction {
        record: schema.validate(schema.default_record()),
        stage: Stage::Defaults,
    }
}

fn as_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Stage 1: the whole text is already valid JSON.
fn parse_direct(text: &str) -> Option<Map<String, Value>> {
    serde_json::from_str(text.trim()).ok().and_then(as_object)
}

/// Stage 2: pull out the first fenced code block, or the substring between
/// the first `{` and the last `}`.
fn parse_block(text: &str) -> Option<Map<String, Value>> {
    let candidate = json_candidate(text)?;
    serde_json::from_str(&candidate).ok().and_then(as_object)
}

fn json_candidate(text: &str) -> Option<String> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid fence regex")
    });

    if let Some(caps) = fence.captures(text) {
        let block = caps[1].trim();
        if !block.is_empty() {
            return Some(block.to_string());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(text[start..=end].to_string())
    } else {
        None
    }
}

/// Stage 3: regex-based syntactic repair on the extracted candidate.
fn parse_repaired(text: &str) -> Option<Map<String, Value>> {
    let candidate = json_candidate(text).unwrap_or_else(|| text.trim().to_string());
    let repaired = repair_syntax(&candidate);
    serde_json::from_str(&repaired).ok().and_then(as_object)
}

fn repair_syntax(input: &str) -> String {
    static BARE_KEY: OnceLock<Regex> = OnceLock::new();
    static BARE_VALUE: OnceLock<Regex> = OnceLock::new();
    static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();

    let bare_key = BARE_KEY.get_or_init(|| {
        Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)"#).expect("valid key regex")
    });
    // A bare word after `:`, `[` or `,` that should have been a string.
    let bare_value = BARE_VALUE.get_or_init(|| {
        Regex::new(r#"([:\[,]\s*)([A-Za-z_][A-Za-z0-9_ .\-]*[A-Za-z0-9_.])(\s*[,}\]])"#)
            .expect("valid value regex")
    });
    let trailing_comma = TRAILING_COMMA
        .get_or_init(|| Regex::new(r#",(\s*[}\]])"#).expect("valid comma regex"));

    let mut text = collapse_newlines_in_strings(input);
    text = bare_key.replace_all(&text, r#"$1"$2"$3"#).into_owned();

    // Adjacent bare values share delimiters, which a single replace_all pass
    // cannot see, so iterate to a fixpoint (bounded).
    for _ in 0..4 {
        let next = bare_value
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                let token = caps[2].trim();
                if is_json_literal(token) {
                    caps[0].to_string()
                } else {
                    format!("{}\"{}\"{}", &caps[1], token, &caps[3])
                }
            })
            .into_owned();
        if next == text {
            break;
        }
        text = next;
    }

    text = trailing_comma.replace_all(&text, "$1").into_owned();
    balance_brackets(&text)
}

fn is_json_literal(token: &str) -> bool {
    matches!(token, "true" | "false" | "null") || token.parse::<f64>().is_ok()
}

/// Replace raw newlines inside string literals with spaces.
fn collapse_newlines_in_strings(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in input.chars() {
        match c {
            '"' if !escaped => {
                in_string = !in_string;
                out.push(c);
            }
            '\n' | '\r' if in_string => out.push(' '),
            '\\' if in_string && !escaped => {
                escaped = true;
                out.push(c);
                continue;
            }
            _ => out.push(c),
        }
        escaped = false;
    }
    out
}

/// Append closers for any unmatched `{` / `[` (count-based, outside strings).
fn balance_brackets(input: &str) -> String {
    let mut depth_brace = 0i32;
    let mut depth_bracket = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut closers = Vec::new();
    for c in input.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                depth_brace += 1;
                closers.push('}');
            }
            '}' if !in_string => {
                depth_brace -= 1;
                closers.pop();
            }
            '[' if !in_string => {
                depth_bracket += 1;
                closers.push(']');
            }
            ']' if !in_string => {
                depth_bracket -= 1;
                closers.pop();
            }
            _ => {}
        }
    }

    if depth_brace <= 0 && depth_bracket <= 0 {
        return input.to_string();
    }

    let mut out = input.trim_end().to_string();
    if in_string {
        out.push('"');
    }
    while let Some(closer) = closers.pop() {
        out.push(closer);
    }
    out
}

/// Stage 4: scan line by line for bare `key:` patterns and quote them
/// individually. Catches cases the single-pass repair misses because the
/// key's delimiter sits on the previous line.
fn parse_line_repaired(text: &str) -> Option<Map<String, Value>> {
    static LINE_KEY: OnceLock<Regex> = OnceLock::new();
    let line_key = LINE_KEY.get_or_init(|| {
        Regex::new(r#"^(\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)(.*)$"#).expect("valid line regex")
    });

    let candidate = json_candidate(text).unwrap_or_else(|| text.trim().to_string());
    let fixed: Vec<String> = candidate
        .lines()
        .map(|line| {
            line_key
                .replace(line, r#"$1"$2"$3$4"#)
                .into_owned()
        })
        .collect();
    let repaired = repair_syntax(&fixed.join("\n"));
    serde_json::from_str(&repaired).ok().and_then(as_object)
}

/// Stage 5: per-field regex extraction, ignoring surrounding syntax errors.
fn scavenge_fields(text: &str, schema: &RecordSchema) -> Option<Map<String, Value>> {
    let mut record = Map::new();
    for field in &schema.fields {
        if let Some(value) = scavenge_field(text, field.name) {
            record.insert(field.name.to_string(), value);
        }
    }
    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}

fn scavenge_field(text: &str, name: &str) -> Option<Value> {
    let escaped = regex::escape(name);

    // Array of strings first, so list fields are not truncated to one item.
    let array_re = Regex::new(&format!(r#""?{}"?\s*:\s*\[([^\]]*)\]"#, escaped)).ok()?;
    if let Some(caps) = array_re.captures(text) {
        let items: Vec<Value> = caps[1]
            .split(',')
            .map(|item| item.trim().trim_matches(['"', '\''].as_ref()).trim())
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect();
        return Some(Value::Array(items));
    }

    let quoted_re =
        Regex::new(&format!(r#""?{}"?\s*:\s*"((?:\\.|[^"\\])*)""#, escaped)).ok()?;
    if let Some(caps) = quoted_re.captures(text) {
        return Some(Value::String(caps[1].replace("\\\"", "\"")));
    }

    let bare_re = Regex::new(&format!(r#""?{}"?\s*:\s*([^,}}\n]+)"#, escaped)).ok()?;
    if let Some(caps) = bare_re.captures(text) {
        let raw = caps[1].trim().trim_matches(['"', '\''].as_ref()).trim();
        if !raw.is_empty() {
            return Some(Value::String(raw.to_string()));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldSpec;
    use serde_json::json;

    fn schema() -> RecordSchema {
        RecordSchema::new(vec![
            FieldSpec::text("name", "Candidate"),
            FieldSpec::text_list("skills", &[]),
        ])
    }

    #[test]
    fn test_valid_json_uses_direct_stage() {
        let out = extract(r#"{"name": "Ana", "skills": ["Python", "Go"]}"#, &schema());
        assert_eq!(out.stage, Stage::Direct);
        assert!(!out.was_repaired());
        assert_eq!(out.record["name"], json!("Ana"));
        assert_eq!(out.record["skills"], json!(["Python", "Go"]));
    }

    #[test]
    fn test_fenced_block_is_extracted() {
        let text = "Here is the result:\n```json\n{\"name\": \"Ana\", \"skills\": []}\n```\nDone.";
        let out = extract(text, &schema());
        assert_eq!(out.stage, Stage::BlockExtract);
        assert_eq!(out.record["name"], json!("Ana"));
    }

    #[test]
    fn test_prose_around_braces_is_stripped() {
        let text = "Sure! {\"name\": \"Ana\", \"skills\": [\"Rust\"]} hope that helps";
        let out = extract(text, &schema());
        assert_eq!(out.stage, Stage::BlockExtract);
        assert_eq!(out.record["skills"], json!(["Rust"]));
    }

    #[test]
    fn test_unquoted_keys_and_values_are_repaired() {
        let out = extract(r#"{name: "Ana", skills: [Python, Go]}"#, &schema());
        assert_eq!(out.stage, Stage::SyntacticRepair);
        assert_eq!(out.record["name"], json!("Ana"));
        assert_eq!(out.record["skills"], json!(["Python", "Go"]));
    }

    #[test]
    fn test_trailing_comma_and_unbalanced_braces() {
        let out = extract(r#"{"name": "Ana", "skills": ["Go",]"#, &schema());
        assert!(out.was_repaired());
        assert_eq!(out.record["name"], json!("Ana"));
        assert_eq!(out.record["skills"], json!(["Go"]));
    }

    #[test]
    fn test_multiline_bare_keys_need_line_repair() {
        let text = "{\n  name: \"Ana\",\n  skills:\n[\"Python\"]\n}";
        let out = extract(text, &schema());
        assert!(out.stage <= Stage::LineRepair);
        assert_eq!(out.record["name"], json!("Ana"));
    }

    #[test]
    fn test_field_scavenge_from_broken_text() {
        let text = "summary follows name: \"Ana\" and also skills: [\"SQL\", \"AWS\"] {{{";
        let out = extract(text, &schema());
        assert_eq!(out.stage, Stage::FieldScavenge);
        assert_eq!(out.record["name"], json!("Ana"));
        assert_eq!(out.record["skills"], json!(["SQL", "AWS"]));
    }

    #[test]
    fn test_empty_input_yields_defaults() {
        let out = extract("", &schema());
        assert_eq!(out.stage, Stage::Defaults);
        assert_eq!(out.record["name"], json!("Candidate"));
        assert_eq!(out.record["skills"], json!([]));
    }

    #[test]
    fn test_plain_prose_yields_defaults() {
        let out = extract("I could not produce a result for this request.", &schema());
        assert_eq!(out.stage, Stage::Defaults);
        assert_eq!(out.record.len(), 2);
    }

    #[test]
    fn test_truncated_json_recovers() {
        let out = extract(r#"{"name": "Ana", "skills": ["Py"#, &schema());
        assert!(out.was_repaired());
        assert_eq!(out.record["name"], json!("Ana"));
    }

    #[test]
    fn test_embedded_newline_in_string_collapsed() {
        let text = "{\"name\": \"Ana\nMartins\", \"skills\": []}";
        let out = extract(text, &schema());
        assert_eq!(out.record["name"], json!("Ana Martins"));
    }

    #[test]
    fn test_every_required_key_always_present() {
        for text in ["", "garbage", "{", "[1,2,3]", "{\"other\": 1}"] {
            let out = extract(text, &schema());
            assert!(out.record.contains_key("name"), "input {:?}", text);
            assert!(out.record.contains_key("skills"), "input {:?}", text);
        }
    }
}
