//! Lenient parsing of model replies into [`AnalysisResult`].
//!
//! Models wrap JSON in prose or code fences; the first balanced JSON object
//! in the text is taken and the rest ignored.

use crate::error::AnalysisError;
use crate::types::AnalysisResult;

/// Slice of the first balanced `{...}` object in `text`.
///
/// Braces inside string literals (including escaped quotes) are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and validate a model reply.
///
/// Missing JSON, schema mismatches, and out-of-range scores are all
/// unrecoverable: asking the same model again rarely fixes them.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let json = extract_json_object(text).ok_or_else(|| {
        AnalysisError::unrecoverable(format!(
            "no JSON object in model reply: {}",
            truncate(text, 120)
        ))
    })?;

    let mut result: AnalysisResult = serde_json::from_str(json)
        .map_err(|e| AnalysisError::unrecoverable(format!("malformed analysis JSON: {e}")))?;

    result.image_type = result.image_type.trim().to_lowercase();
    result.mood = result.mood.trim().to_lowercase();
    result.validate()?;
    Ok(result)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
