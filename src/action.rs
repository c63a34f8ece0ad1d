use serde::Serialize;

/// The three request kinds the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Explain,
    Debug,
    General,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Explain => "EXPLAIN",
            ActionKind::Debug => "DEBUG",
            ActionKind::General => "GENERAL",
        }
    }

    /// Directive line prepended to code submissions; chat has none.
    pub fn directive(&self) -> Option<&'static str> {
        match self {
            ActionKind::Explain => Some("Explain this code:"),
            ActionKind::Debug => Some("Debug this code:"),
            ActionKind::General => None,
        }
    }

    /// Spinner label shown while this action is in flight.
    pub fn progress_label(&self) -> &'static str {
        match self {
            ActionKind::Explain => "Explaining",
            ActionKind::Debug => "Debugging",
            ActionKind::General => "Thinking",
        }
    }
}

/// One request against the backend chat endpoint. Exactly one of
/// `code`/`message` is set, determined by `action`; the unset field is
/// omitted from the serialized body entirely.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRequest {
    pub action: ActionKind,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionRequest {
    /// Request shape for the code actions (`Explain`/`Debug`).
    pub fn with_code(action: ActionKind, thread_id: &str, code: &str) -> Self {
        Self {
            action,
            thread_id: thread_id.to_string(),
            code: Some(code.to_string()),
            message: None,
        }
    }

    /// Request shape for free-form chat.
    pub fn general(thread_id: &str, message: &str) -> Self {
        Self {
            action: ActionKind::General,
            thread_id: thread_id.to_string(),
            code: None,
            message: Some(message.to_string()),
        }
    }
}
