use crate::action::ActionKind;

/// Single-holder lock tagged with the action currently executing.
/// There is no queue: a refused acquisition means the caller must keep
/// its trigger disabled, not buffer the submission.
#[derive(Debug, Default)]
pub struct ActionGate {
    current: Option<ActionKind>,
}

impl ActionGate {
    pub fn try_acquire(&mut self, action: ActionKind) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some(action);
        true
    }

    /// Idempotent; safe to call on an idle gate.
    pub fn release(&mut self) {
        self.current = None;
    }

    pub fn in_flight(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_action(&self) -> Option<ActionKind> {
        self.current
    }
}
