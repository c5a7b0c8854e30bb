// file: src/llm/prompts.rs
// description: prompt construction for legal reasoning, options and drafting
// reference: internal prompt templates

use crate::llm::client::Sampling;
use serde_json::{Map, Value};

pub const REASONING: Sampling = Sampling {
    temperature: 0.1,
    max_tokens: 2000,
};

pub const OPTIONS: Sampling = Sampling {
    temperature: 0.2,
    max_tokens: 1500,
};

pub const DRAFT: Sampling = Sampling {
    temperature: 0.1,
    max_tokens: 2000,
};

pub const REASONING_SYSTEM_PROMPT: &str = "You are TamilGuardian, an AI legal assistant for Tamil Nadu residents.
Analyze the legal query using the provided context and generate a clear, factual summary.

CRITICAL REQUIREMENTS:
1. Every factual claim MUST include a citation [doc_id]
2. Prioritize Tamil Nadu laws over India-level laws
3. Be clear about limitations and when to consult a lawyer
4. Use simple, accessible language
5. Include relevant legal sections and provisions

Respond in JSON format with: summary, key_points, legal_basis, confidence_level";

pub const OPTIONS_SYSTEM_PROMPT: &str = "Generate 3-5 practical legal options for the user's situation.
Each option should include: title, description, steps, estimated_cost, timeline, success_probability.

Respond in JSON format with an 'options' array.";

pub const DRAFT_SYSTEM_PROMPT: &str = "Draft a formal legal notice or complaint based on the analysis.
Use proper legal formatting, include all necessary sections, and maintain professional tone.
Include placeholders for user-specific information like [YOUR_NAME], [DATE], etc.";

const RAG_CONTEXT_RESULTS: usize = 5;
const RAG_CONTENT_CHARS: usize = 500;
const WEB_CONTEXT_RESULTS: usize = 3;
const WEB_CONTENT_CHARS: usize = 300;
const CONTEXT_FACTS: usize = 10;

fn field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn field_or<'a>(value: &'a Value, key: &str, default: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn head(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

/// Retrieved statutes, web sources and user-document facts as one block of
/// prompt context.
pub fn build_context_string(rag_results: &[Value], web_results: &[Value], facts: &[Value]) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !rag_results.is_empty() {
        parts.push("=== LEGAL DOCUMENTS ===".to_string());
        for result in rag_results.iter().take(RAG_CONTEXT_RESULTS) {
            parts.push(format!(
                "[{}] {}",
                field_or(result, "doc_id", "unknown"),
                field(result, "title")
            ));
            parts.push(format!(
                "Jurisdiction: {}",
                field_or(result, "jurisdiction", "unknown")
            ));
            parts.push(format!(
                "Content: {}...",
                head(field(result, "content"), RAG_CONTENT_CHARS)
            ));
            parts.push(String::new());
        }
    }

    if !web_results.is_empty() {
        parts.push("=== WEB SOURCES ===".to_string());
        for result in web_results.iter().take(WEB_CONTEXT_RESULTS) {
            parts.push(format!(
                "[web_{}] {}",
                field_or(result, "url", "unknown"),
                field(result, "title")
            ));
            parts.push(format!(
                "Content: {}...",
                head(field(result, "content"), WEB_CONTENT_CHARS)
            ));
            parts.push(String::new());
        }
    }

    if !facts.is_empty() {
        parts.push("=== USER DOCUMENTS ===".to_string());
        for fact in facts.iter().take(CONTEXT_FACTS) {
            match fact.as_str() {
                Some(text) => parts.push(format!("- {}", text)),
                None => parts.push(format!("- {}", fact)),
            }
        }
        parts.push(String::new());
    }

    parts.join("\n")
}

pub fn reasoning_user_prompt(query: &str, context: &str) -> String {
    format!(
        "Legal Query: {}\n\nAvailable Context:\n{}\n\nProvide a comprehensive legal analysis with proper citations.",
        query, context
    )
}

fn render_list(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub fn options_user_prompt(reasoning: &Value) -> String {
    format!(
        "Based on this legal analysis:\n{}\n\nKey Points: {}\nLegal Basis: {}\n\nGenerate practical options for the user.",
        field(reasoning, "summary"),
        render_list(reasoning.get("key_points")),
        render_list(reasoning.get("legal_basis")),
    )
}

pub fn draft_user_prompt(reasoning: &Value, selected_option: Option<&Value>) -> String {
    let (title, description) = selected_option
        .map(|o| (field(o, "title"), field(o, "description")))
        .unwrap_or(("", ""));

    format!(
        "Legal Analysis: {}\nSelected Option: {} - {}\n\nDraft a formal legal document.",
        field(reasoning, "summary"),
        title,
        description
    )
}

/// Strips a surrounding markdown code fence and any prose outside the
/// outermost braces.
pub fn normalize_json_payload(payload: &str) -> String {
    let trimmed = payload.trim();

    let without_fence = if trimmed.starts_with("```") {
        let mut lines = trimmed.lines();
        let _ = lines.next(); // ``` or ```json
        let mut content = lines.collect::<Vec<_>>().join("\n");
        if content.trim_end().ends_with("```") {
            let end = content.trim_end().len() - 3;
            content.truncate(end);
        }
        content.trim().to_string()
    } else {
        trimmed.to_string()
    };

    if let (Some(start), Some(end)) = (without_fence.find('{'), without_fence.rfind('}'))
        && start < end
    {
        return without_fence[start..=end].to_string();
    }

    without_fence
}

pub fn parse_json_object(payload: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(&normalize_json_payload(payload)) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
