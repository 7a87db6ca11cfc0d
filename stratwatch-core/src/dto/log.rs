//! Log DTOs

use serde::{Deserialize, Serialize};

use crate::domain::log::LogBatch;

/// Body of a forward log page request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsRequest {
    pub key: String,
    pub next_forward_token: Option<String>,
    pub limit: u32,
    pub direction: String,
    #[serde(rename = "type")]
    pub log_type: String,
}

impl LogsRequest {
    pub fn forward(key: impl Into<String>, cursor: Option<&str>, limit: u32) -> Self {
        Self {
            key: key.into(),
            next_forward_token: cursor.map(str::to_string),
            limit,
            direction: "forward".to_string(),
            log_type: "userLogs".to_string(),
        }
    }
}

/// Query string of a log page request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    pub is_python_build: bool,
    pub is_live: bool,
}

/// One page of log lines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub next_forward_token: Option<String>,
}

impl From<LogsResponse> for LogBatch {
    fn from(response: LogsResponse) -> Self {
        LogBatch::from_lines(response.data, response.next_forward_token)
    }
}
