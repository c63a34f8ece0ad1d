use ratatui::layout::Rect;

use crate::backend::{BackendClient, SendError};
use crate::config;
use crate::controller::{AppController, PendingAction};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Editor,
    Input,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub input_mode: InputMode,

    // Code editor state (multi-line buffer, char-indexed cursor)
    pub code_input: String,
    pub code_cursor: usize,
    pub editor_scroll: u16,
    pub editor_height: u16,

    // Chat input state (single line, char-indexed cursor)
    pub chat_input: String,
    pub chat_cursor: usize,

    // Chat pane state
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state (0-2 for ellipsis animation)
    pub animation_frame: u8,

    // Startup health probe result
    pub backend_online: Option<bool>,

    // Panel areas for mouse hit-testing (updated during render)
    pub editor_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    // Request orchestration
    pub controller: AppController,
    pub pending_action: Option<PendingAction>,
}

impl App {
    pub async fn new(backend_override: Option<String>) -> Self {
        let base_url = config::resolve_backend_url(backend_override);
        let client = BackendClient::new(&base_url);
        let backend_online = Some(client.health().await.is_ok());
        let controller = AppController::new(Session::new(), client);

        Self {
            should_quit: false,
            focus: FocusPane::Editor,
            input_mode: InputMode::Normal,

            code_input: String::new(),
            code_cursor: 0,
            editor_scroll: 0,
            editor_height: 0,

            chat_input: String::new(),
            chat_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            backend_online,

            editor_area: None,
            chat_area: None,

            controller,
            pending_action: None,
        }
    }

    // Submit triggers. Each refuses while a request is pending; the
    // controller refuses again on its own gate, so the UI check is
    // only there to keep the triggers inert.
    pub fn submit_explain(&mut self) {
        if self.pending_action.is_some() {
            return;
        }
        self.pending_action = self.controller.submit_explain(&self.code_input);
        self.scroll_chat_to_bottom();
    }

    pub fn submit_debug(&mut self) {
        if self.pending_action.is_some() {
            return;
        }
        self.pending_action = self.controller.submit_debug(&self.code_input);
        self.scroll_chat_to_bottom();
    }

    pub fn submit_chat(&mut self) {
        if self.pending_action.is_some() {
            return;
        }
        if let Some(task) = self.controller.submit_chat(&self.chat_input) {
            self.pending_action = Some(task);
            self.chat_input.clear();
            self.chat_cursor = 0;
            self.scroll_chat_to_bottom();
        }
    }

    /// Settle the in-flight request once its task has finished. A task
    /// fault is folded into the generic failure path so the gate is
    /// still released.
    pub async fn reap_pending(&mut self) {
        let finished = self
            .pending_action
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.pending_action.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!("request task failed: {err}");
                    Err(SendError::Protocol)
                }
            };
            self.controller.settle(outcome);
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Code editor editing

    pub fn code_insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.code_input, self.code_cursor);
        self.code_input.insert(byte_pos, c);
        self.code_cursor += 1;
    }

    pub fn code_backspace(&mut self) {
        if self.code_cursor > 0 {
            self.code_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.code_input, self.code_cursor);
            self.code_input.remove(byte_pos);
        }
    }

    pub fn code_delete(&mut self) {
        if self.code_cursor < self.code_input.chars().count() {
            let byte_pos = char_to_byte_index(&self.code_input, self.code_cursor);
            self.code_input.remove(byte_pos);
        }
    }

    pub fn code_cursor_left(&mut self) {
        self.code_cursor = self.code_cursor.saturating_sub(1);
    }

    pub fn code_cursor_right(&mut self) {
        let char_count = self.code_input.chars().count();
        self.code_cursor = (self.code_cursor + 1).min(char_count);
    }

    pub fn code_cursor_up(&mut self) {
        let (line, col) = self.code_line_col();
        if line == 0 {
            return;
        }
        let starts = self.code_line_starts();
        let prev_start = starts[line - 1];
        let prev_len = starts[line] - prev_start - 1;
        self.code_cursor = prev_start + col.min(prev_len);
    }

    pub fn code_cursor_down(&mut self) {
        let (line, col) = self.code_line_col();
        let starts = self.code_line_starts();
        if line + 1 >= starts.len() {
            return;
        }
        let next_start = starts[line + 1];
        let next_len = match starts.get(line + 2) {
            Some(&after) => after - next_start - 1,
            None => self.code_input.chars().count() - next_start,
        };
        self.code_cursor = next_start + col.min(next_len);
    }

    pub fn code_cursor_home(&mut self) {
        let (line, _) = self.code_line_col();
        self.code_cursor = self.code_line_starts()[line];
    }

    pub fn code_cursor_end(&mut self) {
        let (line, _) = self.code_line_col();
        let starts = self.code_line_starts();
        self.code_cursor = match starts.get(line + 1) {
            Some(&after) => after - 1,
            None => self.code_input.chars().count(),
        };
    }

    /// (line, column) of the cursor, both zero-based and char-counted.
    pub fn code_line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for (i, c) in self.code_input.chars().enumerate() {
            if i == self.code_cursor {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    /// Char index of the first character of each line.
    fn code_line_starts(&self) -> Vec<usize> {
        let mut starts = vec![0];
        for (i, c) in self.code_input.chars().enumerate() {
            if c == '\n' {
                starts.push(i + 1);
            }
        }
        starts
    }

    // Chat input editing

    pub fn chat_insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
        self.chat_input.insert(byte_pos, c);
        self.chat_cursor += 1;
    }

    pub fn chat_backspace(&mut self) {
        if self.chat_cursor > 0 {
            self.chat_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
            self.chat_input.remove(byte_pos);
        }
    }

    pub fn chat_delete(&mut self) {
        if self.chat_cursor < self.chat_input.chars().count() {
            let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
            self.chat_input.remove(byte_pos);
        }
    }

    // Chat pane scrolling

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn chat_half_page_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(self.chat_height / 2);
    }

    pub fn chat_half_page_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(self.chat_height / 2);
    }

    /// Scroll chat so the newest message (or the progress indicator)
    /// is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.controller.messages() {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.controller.in_flight() {
            total_lines += 2; // Role line + progress indicator
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }
}
