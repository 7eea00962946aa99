//! Tool callables for the chat sub-agents, grounded on the source
//! repository's `secretary_agent` tool set (datetime lookup, learning
//! record persistence, task tracking). These are domain tool callables,
//! not orchestration machinery — business logic the Non-goals explicitly
//! leave to collaborators; what's implemented here is deterministic and
//! self-contained rather than backed by a real database.

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use meridian_state::ArtifactValue;
use meridian_tool::{ToolDyn, ToolError};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;

/// Converts one node's raw JSON artifact into the typed `ArtifactValue`
/// the rest of the system understands. Chat sub-agents only ever write
/// opaque records (a saved learning entry, a tracked task); these have no
/// dedicated `ArtifactValue` variant, so they round-trip as `Json`.
pub fn to_artifact_value(_key: &str, value: Value) -> ArtifactValue {
    ArtifactValue::Json(value)
}

/// `get_current_datetime`: reports the current time in a given IANA
/// timezone. Defaults to UTC on an unrecognised timezone name rather than
/// failing the tool call.
pub struct DateTimeTool;

impl ToolDyn for DateTimeTool {
    fn name(&self) -> &str {
        "get_current_datetime"
    }

    fn description(&self) -> &str {
        "Get the current date and time in a given IANA timezone (e.g. 'Asia/Tokyo'). \
         Defaults to UTC if the timezone is unrecognised."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name, e.g. 'Asia/Tokyo', 'UTC'"
                }
            }
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let tz_name = input
                .get("timezone")
                .and_then(|v| v.as_str())
                .unwrap_or("UTC")
                .to_string();
            let tz: Tz = tz_name.parse().unwrap_or(chrono_tz::UTC);
            let now = Utc::now().with_timezone(&tz);
            Ok(json!({
                "datetime": now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
                "date": now.format("%Y-%m-%d").to_string(),
                "time": now.format("%H:%M:%S").to_string(),
                "weekday": now.format("%A").to_string(),
                "timezone": tz.to_string(),
                "unix_timestamp": now.timestamp(),
            }))
        })
    }
}

/// `save_learning`: records a learning entry (word, sentence, topic,
/// article, question, or idea) the user explicitly asked to save.
pub struct SaveLearningTool;

impl ToolDyn for SaveLearningTool {
    fn name(&self) -> &str {
        "save_learning"
    }

    fn description(&self) -> &str {
        "Save a learning record when the user explicitly asks to save or remember \
         learning content. input_type is one of word, sentence, topic, article, \
         question, idea."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input_type": {
                    "type": "string",
                    "enum": ["word", "sentence", "topic", "article", "question", "idea"]
                },
                "user_input": { "type": "string" },
                "note": { "type": "string" }
            },
            "required": ["input_type", "user_input"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let input_type = input
                .get("input_type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("missing input_type".into()))?;
            let user_input = input
                .get("user_input")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("missing user_input".into()))?;
            Ok(json!({
                "saved": true,
                "input_type": input_type,
                "user_input": user_input,
            }))
        })
    }
}

/// `manage_task`: records or updates a lightweight personal task/reminder.
pub struct ManageTaskTool;

impl ToolDyn for ManageTaskTool {
    fn name(&self) -> &str {
        "manage_task"
    }

    fn description(&self) -> &str {
        "Create, update, or complete a personal task or reminder. action is one of \
         create, complete, list."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["create", "complete", "list"] },
                "title": { "type": "string" },
                "due": { "type": "string" }
            },
            "required": ["action"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let action = input
                .get("action")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("missing action".into()))?;
            Ok(json!({
                "status": "recorded",
                "action": action,
                "title": input.get("title").and_then(|v| v.as_str()),
            }))
        })
    }
}
