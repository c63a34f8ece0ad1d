use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A chat message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only ordered history of the exchanged messages. Entries are
/// never edited or removed once appended.
#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The current ordered sequence, for read-only consumption by the
    /// presentation layer.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }
}

/// One conversation with the backend. The thread id is generated at
/// startup and reused for every request until the process exits, so the
/// backend can keep per-thread memory.
#[derive(Debug)]
pub struct Session {
    thread_id: String,
    log: ConversationLog,
}

impl Session {
    pub fn new() -> Self {
        Self {
            thread_id: generate_thread_id(),
            log: ConversationLog::default(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn append(&mut self, message: Message) {
        self.log.append(message);
    }
}

/// `thread_<epoch-millis>_<random-suffix>`, the shape the backend
/// expects as a stable per-conversation key.
fn generate_thread_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("thread_{}_{}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_id_has_expected_shape() {
        let session = Session::new();
        let mut parts = session.thread_id().splitn(3, '_');

        assert_eq!(parts.next(), Some("thread"));
        let millis = parts.next().expect("timestamp part");
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        let suffix = parts.next().expect("suffix part");
        assert_eq!(suffix.chars().count(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn sessions_get_distinct_thread_ids() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.thread_id(), b.thread_id());
    }

    #[test]
    fn log_preserves_append_order() {
        let mut log = ConversationLog::default();
        log.append(Message::user("first"));
        log.append(Message::assistant("second"));
        log.append(Message::user("third"));

        let contents: Vec<&str> = log
            .snapshot()
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[test]
    fn session_thread_id_is_stable_across_appends() {
        let mut session = Session::new();
        let id = session.thread_id().to_string();
        session.append(Message::user("hello"));
        session.append(Message::assistant("hi"));
        assert_eq!(session.thread_id(), id);
    }
}
