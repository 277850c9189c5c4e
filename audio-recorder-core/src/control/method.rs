use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::error::RecorderError;

/// A named operation with an open key-value argument map.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Result of a method call: empty success, a (code, message, details)
/// error triple, or "not implemented" for unknown methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success,
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn error(code: &str, message: &str, details: Option<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.to_string(),
            details,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Error code, if this is an error response.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<&RecorderError> for MethodResponse {
    fn from(error: &RecorderError) -> Self {
        Self::error(error.code(), error.summary(), error.detail().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_call_without_arguments() {
        let call: MethodCall = serde_json::from_str(r#"{"method": "stopRecording"}"#).unwrap();
        assert_eq!(call.method, "stopRecording");
        assert_eq!(call.arguments, Value::Null);
    }

    #[test]
    fn response_wire_shape() {
        assert_eq!(
            serde_json::to_value(MethodResponse::Success).unwrap(),
            json!({"status": "success"})
        );
        assert_eq!(
            serde_json::to_value(MethodResponse::NotImplemented).unwrap(),
            json!({"status": "not_implemented"})
        );
        assert_eq!(
            serde_json::to_value(MethodResponse::from(&RecorderError::NotRecording)).unwrap(),
            json!({"status": "error", "code": "not_recording", "message": "No recording in progress"})
        );
        assert_eq!(
            serde_json::to_value(MethodResponse::from(&RecorderError::DeviceOpen("busy".into())))
                .unwrap(),
            json!({
                "status": "error",
                "code": "init_failed",
                "message": "Failed to open audio device",
                "details": "busy"
            })
        );
    }
}
