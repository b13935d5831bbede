//! Structured-output schema for generated comments

use serde_json::{Value, json};

/// Response schema the model must follow: a list of candidate comments,
/// each an object with a required `comment` string. The driver passes this
/// through untouched; only the generation endpoint interprets it.
pub fn comment_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "comment": { "type": "STRING" }
            },
            "required": ["comment"]
        }
    })
}
