use serde_json::{json, Value};

/// Wrap plain text in a minimal Atlassian Document Format (ADF) document.
///
/// Each line becomes its own paragraph; blank lines produce empty paragraphs so spacing survives.
pub fn text_to_adf(text: &str) -> Value {
    let content: Vec<Value> = text
        .lines()
        .map(|line| {
            if line.is_empty() {
                json!({ "type": "paragraph", "content": [] })
            } else {
                json!({
                    "type": "paragraph",
                    "content": [{ "type": "text", "text": line }]
                })
            }
        })
        .collect();

    json!({ "type": "doc", "version": 1, "content": content })
}
