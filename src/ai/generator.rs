use crate::ai::client::{BackendError, CompletionBackend};
use crate::logger;
use crate::models::{QuestionRecord, QuestionType};
use serde_json::Value;

const SYSTEM_PROMPT: &str =
    "You are an educational assistant that writes quiz questions from study material. \
     Respond only with JSON.";

/// Strips code fences and surrounding prose, keeping the outermost JSON
/// object or array.
pub fn clean_json_response(response: &str) -> String {
    let mut cleaned = response.trim().to_string();

    if cleaned.starts_with("```") {
        let lines: Vec<&str> = cleaned.lines().collect();
        if lines.len() > 2 {
            cleaned = lines[1..lines.len() - 1].join("\n");
        }
    }

    let start = [cleaned.find('{'), cleaned.find('[')].into_iter().flatten().min();
    let end = [cleaned.rfind('}'), cleaned.rfind(']')].into_iter().flatten().max();
    if let (Some(start), Some(end)) = (start, end)
        && start < end
    {
        cleaned = cleaned[start..=end].to_string();
    }

    cleaned.trim().to_string()
}

/// First `max_chars` characters of `text`.
pub fn truncate_source(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_prompt(source: &str, num_questions: usize, types: &[QuestionType]) -> String {
    let type_list: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
    format!(
        r#"Create {} quiz questions from the text below.

Allowed question types: {}

Respond ONLY with this exact JSON structure (no markdown, no extra text):
{{
    "questions": [
        {{"question": "...", "answer": "...", "type": "one of the allowed types", "options": ["only", "for", "mcq"]}}
    ]
}}

Text:
{}
"#,
        num_questions,
        type_list.join(", "),
        source
    )
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_record(item: &Value) -> Option<QuestionRecord> {
    let question = item.get("question").and_then(value_to_text)?;
    let answer = item.get("answer").and_then(value_to_text)?;
    let raw_type = item.get("type").and_then(value_to_text)?;

    let kind = raw_type.parse::<QuestionType>().unwrap_or_else(|_| {
        logger::warn(&format!("Unknown question type '{}', using short_answer", raw_type));
        QuestionType::ShortAnswer
    });

    let record = QuestionRecord::new(question, answer, kind);
    match item.get("options").and_then(Value::as_array) {
        Some(options) => Some(record.with_options(options.iter().filter_map(value_to_text).collect())),
        None => Some(record),
    }
}

/// Accepts `{"questions": [...]}` or a bare list. Incomplete records are
/// dropped; malformed JSON yields nothing.
pub fn parse_questions(response: &str) -> Vec<QuestionRecord> {
    let cleaned = clean_json_response(response);
    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => {
            logger::warn(&format!("Failed to parse LLM questions: {}\nRaw: {}", e, response));
            return Vec::new();
        }
    };

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("questions").and_then(Value::as_array) {
            Some(items) => items,
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items.iter().filter_map(parse_record).collect()
}

pub async fn generate_from_llm(
    backend: &dyn CompletionBackend,
    source_text: &str,
    num_questions: usize,
    question_types: &[QuestionType],
    max_source_chars: usize,
) -> Result<Vec<QuestionRecord>, BackendError> {
    let source = truncate_source(source_text, max_source_chars);
    if source.len() < source_text.len() {
        logger::info(&format!("Source text truncated to {} characters", max_source_chars));
    }

    let prompt = build_prompt(source, num_questions, question_types);
    let response = backend.complete(SYSTEM_PROMPT, &prompt).await?;
    logger::log(&format!("Raw LLM response: {}", response));

    Ok(parse_questions(&response))
}
