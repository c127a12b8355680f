use serde_json::{json, Value};
use staffboard_core::error::CoreError;

/// How a failed command is reported: a process exit code and a JSON body
/// printed to stderr.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub exit_code: i32,
    pub body: Value,
}

pub fn render(err: &CoreError) -> Rendered {
    let (exit_code, code, message, details) = match err {
        CoreError::Validation(errors) => (
            2,
            "VALIDATION_ERROR",
            "Validation failed".to_string(),
            json!(errors),
        ),
        CoreError::DailyCapExceeded { date, message } => (
            2,
            "DAILY_CAP_EXCEEDED",
            message.clone(),
            json!([{ "field": "date", "message": format!("{date}: {message}") }]),
        ),
        CoreError::Unauthorized(msg) => (3, "UNAUTHORIZED", msg.clone(), Value::Null),
        CoreError::Forbidden(msg) => (3, "FORBIDDEN", msg.clone(), Value::Null),
        CoreError::NotFound { entity, id } => (
            4,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
            Value::Null,
        ),
        CoreError::Configuration(msg) => (1, "CONFIGURATION_ERROR", msg.clone(), Value::Null),
        CoreError::Storage(source) => {
            tracing::error!(error = %source, "Storage error");
            (
                1,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                Value::Null,
            )
        }
    };

    let mut body = json!({ "error": message, "code": code });
    if !details.is_null() {
        body["details"] = details;
    }
    Rendered { exit_code, body }
}
