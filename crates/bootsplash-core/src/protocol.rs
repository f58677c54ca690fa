use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::HelperError;

/// One privileged action, as submitted by the broker. Exactly one action
/// per helper invocation; malformed requests are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ActionRequest {
    Save { theme: String },
    Install { themearchive: String },
    Uninstall { theme: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyOutcome {
    Success,
    ValidationError,
    BackendError,
    HelperError,
}

/// The structured result handed back to the broker. Immutable once built;
/// serialized exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply {
    pub outcome: ReplyOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl ActionReply {
    pub fn success() -> Self {
        Self {
            outcome: ReplyOutcome::Success,
            error_code: None,
            error_description: None,
            data: BTreeMap::new(),
        }
    }

    pub fn success_with_data(data: BTreeMap<String, String>) -> Self {
        Self {
            outcome: ReplyOutcome::Success,
            error_code: None,
            error_description: None,
            data,
        }
    }

    /// Generic operational failure that never reached a component, e.g. a
    /// request the helper could not parse.
    pub fn backend_error(description: impl Into<String>) -> Self {
        Self {
            outcome: ReplyOutcome::BackendError,
            error_code: None,
            error_description: Some(description.into()),
            data: BTreeMap::new(),
        }
    }

    pub fn from_error(error: &HelperError) -> Self {
        let (outcome, error_code) = match error {
            HelperError::EmptyArgument { .. } => (ReplyOutcome::ValidationError, None),
            HelperError::CommandFailed { code, .. } => (ReplyOutcome::HelperError, Some(*code)),
            // A partially-failed removal is a completed-but-failed
            // operation, not a backend fault.
            HelperError::RemovalFailed { .. } => (ReplyOutcome::HelperError, Some(1)),
            _ => (ReplyOutcome::BackendError, None),
        };

        Self {
            outcome,
            error_code,
            error_description: Some(error.description()),
            data: BTreeMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ReplyOutcome::Success
    }
}

/// Wire messages written to the broker on stdout, one JSON object per line.
/// At most one progress message precedes the single reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum HelperMessage {
    Progress { data: BTreeMap<String, String> },
    Reply { reply: ActionReply },
}
