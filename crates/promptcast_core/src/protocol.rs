//! Envelopes exchanged between the host and its panels.
//!
//! Panels share no memory with the host, so every command and reply crosses
//! the boundary as a JSON string tagged by `action`.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlates a `getLastOutput` command with the replies it provokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub(crate) fn from_sequence(seq: u64) -> Self {
        Self(format!("collect-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Host → panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostCommand {
    InjectPrompt {
        prompt: String,
    },
    GetLastOutput {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
}

/// Panel → host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PanelReply {
    ReceiveLastOutput {
        /// Absent or empty means the panel found nothing to report.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        /// Hostname of the replying panel.
        source: String,
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
}

impl HostCommand {
    pub fn to_wire(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_wire(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl PanelReply {
    pub fn last_output(
        source: impl Into<String>,
        output: Option<String>,
        request_id: Option<RequestId>,
    ) -> Self {
        PanelReply::ReceiveLastOutput {
            output,
            source: source.into(),
            request_id,
        }
    }

    pub fn to_wire(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_wire(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }
}
