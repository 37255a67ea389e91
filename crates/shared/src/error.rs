use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

/// Body the server sends with a 400 when model validation fails:
/// `{"title": "...", "errors": {"Title": ["The Title field is required."]}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationProblem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblem {
    pub fn flatten(self) -> Vec<String> {
        self.errors.into_values().flatten().collect()
    }
}

/// Server fault body (500) carrying the exception message and, in
/// development, the stack trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFault {
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
