use tokio::task::JoinHandle;

use crate::action::{ActionKind, ActionRequest};
use crate::backend::{BackendClient, SendError};
use crate::gate::ActionGate;
use crate::session::{Message, Session};

/// Handle for the one request allowed in flight at a time. The main
/// loop reaps it and feeds the outcome back through
/// [`AppController::settle`].
pub type PendingAction = JoinHandle<Result<String, SendError>>;

/// Validates user intents, drives the backend client through the
/// action gate, and owns the session (thread id plus conversation log).
/// Every other component sees the log and gate state read-only.
pub struct AppController {
    session: Session,
    gate: ActionGate,
    client: BackendClient,
}

impl AppController {
    pub fn new(session: Session, client: BackendClient) -> Self {
        Self {
            session,
            gate: ActionGate::default(),
            client,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.session.log().snapshot()
    }

    pub fn thread_id(&self) -> &str {
        self.session.thread_id()
    }

    pub fn backend_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn in_flight(&self) -> bool {
        self.gate.in_flight()
    }

    pub fn current_action(&self) -> Option<ActionKind> {
        self.gate.current_action()
    }

    pub fn submit_explain(&mut self, code: &str) -> Option<PendingAction> {
        self.submit_code(ActionKind::Explain, code)
    }

    pub fn submit_debug(&mut self, code: &str) -> Option<PendingAction> {
        self.submit_code(ActionKind::Debug, code)
    }

    /// Free-form chat. Whitespace-only input is dropped silently.
    pub fn submit_chat(&mut self, text: &str) -> Option<PendingAction> {
        if self.gate.in_flight() {
            return None;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.session.append(Message::user(trimmed));
        let request = ActionRequest::general(self.session.thread_id(), trimmed);
        self.dispatch(request)
    }

    /// Shared path for the code actions. Empty code is rejected locally
    /// with an instructional message and never reaches the transport.
    fn submit_code(&mut self, action: ActionKind, code: &str) -> Option<PendingAction> {
        if self.gate.in_flight() {
            return None;
        }
        let directive = match action.directive() {
            Some(directive) => directive,
            None => return None, // chat goes through submit_chat
        };
        if code.trim().is_empty() {
            self.session
                .append(Message::assistant(empty_code_notice(action)));
            return None;
        }

        self.session.append(Message::user(format!(
            "{}\n\n```python\n{}\n```",
            directive, code
        )));
        let request = ActionRequest::with_code(action, self.session.thread_id(), code);
        self.dispatch(request)
    }

    /// Acquire the gate for this request and run the transport call as
    /// its own task, so the UI keeps rendering while it is in flight.
    fn dispatch(&mut self, request: ActionRequest) -> Option<PendingAction> {
        if !self.gate.try_acquire(request.action) {
            return None;
        }
        tracing::info!(
            action = request.action.as_str(),
            thread_id = request.thread_id.as_str(),
            "dispatching request"
        );
        let client = self.client.clone();
        Some(tokio::spawn(async move { client.send(&request).await }))
    }

    /// Record the outcome of the in-flight request. The gate is
    /// released first, unconditionally, so no outcome can leave the
    /// client locked.
    pub fn settle(&mut self, outcome: Result<String, SendError>) {
        self.gate.release();
        let content = match outcome {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("request settled with error: {err}");
                self.failure_notice(&err)
            }
        };
        self.session.append(Message::assistant(content));
    }

    /// User-safe text for a classified transport failure.
    fn failure_notice(&self, err: &SendError) -> String {
        match err {
            SendError::NetworkUnreachable => format!(
                "Cannot connect to the AI server. Make sure the backend is running on {}",
                self.client.base_url()
            ),
            SendError::HttpStatus(_) | SendError::Protocol => {
                "Sorry, I encountered an error. Please try again.".to_string()
            }
        }
    }
}

fn empty_code_notice(action: ActionKind) -> String {
    let trigger = match action {
        ActionKind::Explain => "Explain",
        ActionKind::Debug => "Debug",
        ActionKind::General => "that",
    };
    format!(
        "Please enter some Python code in the editor above before running {}.",
        trigger
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::testutil::{http_response, refused_backend_url, spawn_stub_backend};

    fn controller_at(base_url: &str) -> AppController {
        AppController::new(Session::new(), BackendClient::new(base_url))
    }

    async fn settle_task(controller: &mut AppController, task: PendingAction) {
        let outcome = task.await.expect("request task");
        controller.settle(outcome);
    }

    #[tokio::test]
    async fn empty_code_is_rejected_locally() {
        let backend = refused_backend_url().await;
        for code in ["", "   ", "\n\t "] {
            let mut controller = controller_at(&backend);

            assert!(controller.submit_explain(code).is_none());
            assert!(!controller.in_flight());

            let messages = controller.messages();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].role, Role::Assistant);
            assert!(messages[0].content.contains("Please enter some Python code"));
            // Unreachable backend would have produced a connection
            // notice instead, so this proves nothing was sent.
            assert!(!messages[0].content.contains(&backend));
        }
    }

    #[tokio::test]
    async fn blank_chat_is_dropped_silently() {
        let backend = refused_backend_url().await;
        let mut controller = controller_at(&backend);

        assert!(controller.submit_chat("   ").is_none());
        assert!(controller.messages().is_empty());
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn chat_round_trip_appends_user_then_assistant() {
        let (base_url, _rx) = spawn_stub_backend(http_response(
            200,
            "OK",
            r#"{"response": "A list is an ordered collection."}"#,
        ))
        .await;
        let mut controller = controller_at(&base_url);

        let task = controller
            .submit_chat("What is a list?")
            .expect("dispatched");
        assert!(controller.in_flight());
        assert_eq!(controller.current_action(), Some(ActionKind::General));

        settle_task(&mut controller, task).await;

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is a list?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "A list is an ordered collection.");
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn explain_prepends_labeled_code_block_and_sends_code() {
        let (base_url, mut rx) =
            spawn_stub_backend(http_response(200, "OK", r#"{"response": "It prints 1."}"#)).await;
        let mut controller = controller_at(&base_url);

        let task = controller.submit_explain("print(1)").expect("dispatched");
        assert_eq!(controller.current_action(), Some(ActionKind::Explain));

        // The user message is in the log before the request settles.
        let first = &controller.messages()[0];
        assert_eq!(first.role, Role::User);
        assert!(first.content.starts_with("Explain this code:"));
        assert!(first.content.contains("```python\nprint(1)\n```"));

        settle_task(&mut controller, task).await;

        let body = rx.recv().await.expect("captured request body");
        let json: serde_json::Value = serde_json::from_str(&body).expect("request json");
        assert_eq!(json["action"], "EXPLAIN");
        assert_eq!(json["thread_id"], controller.thread_id());
        assert_eq!(json["code"], "print(1)");
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn debug_uses_its_own_directive() {
        let (base_url, mut rx) =
            spawn_stub_backend(http_response(200, "OK", r#"{"response": "Missing colon."}"#)).await;
        let mut controller = controller_at(&base_url);

        let task = controller
            .submit_debug("def f()\n    pass")
            .expect("dispatched");
        assert!(controller.messages()[0]
            .content
            .starts_with("Debug this code:"));

        settle_task(&mut controller, task).await;

        let body = rx.recv().await.expect("captured request body");
        let json: serde_json::Value = serde_json::from_str(&body).expect("request json");
        assert_eq!(json["action"], "DEBUG");
    }

    #[tokio::test]
    async fn http_error_appends_one_notice_and_idles_the_gate() {
        let (base_url, _rx) = spawn_stub_backend(http_response(
            500,
            "Internal Server Error",
            r#"{"detail": "boom"}"#,
        ))
        .await;
        let mut controller = controller_at(&base_url);

        let task = controller.submit_chat("hello").expect("dispatched");
        settle_task(&mut controller, task).await;

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(
            messages[1].content,
            "Sorry, I encountered an error. Please try again."
        );
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn unreachable_backend_notice_names_its_location() {
        let base_url = refused_backend_url().await;
        let mut controller = controller_at(&base_url);

        let task = controller.submit_chat("hello").expect("dispatched");
        settle_task(&mut controller, task).await;

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains(&base_url));
        assert!(messages[1].content.contains("backend is running"));
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn submissions_are_refused_while_in_flight() {
        let (base_url, _rx) =
            spawn_stub_backend(http_response(200, "OK", r#"{"response": "ok"}"#)).await;
        let mut controller = controller_at(&base_url);

        let task = controller.submit_chat("first").expect("dispatched");
        assert!(controller.in_flight());

        assert!(controller.submit_explain("print(1)").is_none());
        assert!(controller.submit_debug("print(1)").is_none());
        assert!(controller.submit_chat("second").is_none());
        // Refused submissions leave no trace in the log.
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.current_action(), Some(ActionKind::General));

        settle_task(&mut controller, task).await;
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn thread_id_is_stable_across_requests() {
        let (base_url, mut rx) =
            spawn_stub_backend(http_response(200, "OK", r#"{"response": "ok"}"#)).await;
        let mut controller = controller_at(&base_url);
        let thread_id = controller.thread_id().to_string();

        let task = controller.submit_chat("one").expect("dispatched");
        settle_task(&mut controller, task).await;
        let task = controller.submit_explain("print(1)").expect("dispatched");
        settle_task(&mut controller, task).await;

        for _ in 0..2 {
            let body = rx.recv().await.expect("captured request body");
            let json: serde_json::Value = serde_json::from_str(&body).expect("request json");
            assert_eq!(json["thread_id"], thread_id.as_str());
        }
        assert_eq!(controller.thread_id(), thread_id);
    }

    #[tokio::test]
    async fn settle_releases_the_gate_on_every_outcome() {
        let (base_url, _rx) =
            spawn_stub_backend(http_response(200, "OK", r#"{"response": "ok"}"#)).await;
        let mut controller = controller_at(&base_url);

        for outcome in [
            Ok("done".to_string()),
            Err(SendError::NetworkUnreachable),
            Err(SendError::HttpStatus(502)),
            Err(SendError::Protocol),
        ] {
            let task = controller.submit_chat("go").expect("dispatched");
            let _ = task.await;
            controller.settle(outcome);
            assert!(!controller.in_flight());
            assert_eq!(controller.current_action(), None);
        }
    }
}
