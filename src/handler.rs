use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Tab cycles focus: Editor -> Input -> Chat -> Editor
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Editor => FocusPane::Input,
                FocusPane::Input => FocusPane::Chat,
                FocusPane::Chat => FocusPane::Editor,
            };
            // Auto-enter editing mode when focusing the chat input
            if app.focus == FocusPane::Input {
                app.input_mode = InputMode::Editing;
                app.chat_cursor = app.chat_input.chars().count();
            }
        }

        // Enter editing on the focused input
        KeyCode::Char('i') | KeyCode::Enter => match app.focus {
            FocusPane::Editor => app.input_mode = InputMode::Editing,
            FocusPane::Input => {
                app.input_mode = InputMode::Editing;
                app.chat_cursor = app.chat_input.chars().count();
            }
            FocusPane::Chat => {}
        },

        // Action triggers
        KeyCode::Char('e') => app.submit_explain(),

        // Half-page scroll (must be before plain 'd' to match first)
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if app.focus == FocusPane::Chat {
                app.chat_half_page_down();
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if app.focus == FocusPane::Chat {
                app.chat_half_page_up();
            }
        }
        KeyCode::Char('d') => app.submit_debug(),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Editor => app.code_cursor_down(),
            FocusPane::Chat => app.chat_scroll_down(),
            FocusPane::Input => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Editor => app.code_cursor_up(),
            FocusPane::Chat => app.chat_scroll_up(),
            FocusPane::Input => {}
        },
        KeyCode::Char('g') => match app.focus {
            FocusPane::Editor => app.code_cursor = 0,
            FocusPane::Chat => app.chat_scroll = 0,
            FocusPane::Input => {}
        },
        KeyCode::Char('G') => match app.focus {
            FocusPane::Editor => app.code_cursor = app.code_input.chars().count(),
            FocusPane::Chat => app.scroll_chat_to_bottom(),
            FocusPane::Input => {}
        },

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    // Submit shortcuts reachable without leaving the editor
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('e') => {
                app.submit_explain();
                return;
            }
            KeyCode::Char('d') => {
                app.submit_debug();
                return;
            }
            _ => {}
        }
    }

    match app.focus {
        FocusPane::Editor => handle_editor_editing(app, key),
        FocusPane::Input => handle_input_editing(app, key),
        FocusPane::Chat => app.input_mode = InputMode::Normal,
    }
}

fn handle_editor_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.code_insert('\n'),
        // Tab indents; focus switching is a normal-mode key
        KeyCode::Tab => {
            for _ in 0..4 {
                app.code_insert(' ');
            }
        }
        KeyCode::Backspace => app.code_backspace(),
        KeyCode::Delete => app.code_delete(),
        KeyCode::Left => app.code_cursor_left(),
        KeyCode::Right => app.code_cursor_right(),
        KeyCode::Up => app.code_cursor_up(),
        KeyCode::Down => app.code_cursor_down(),
        KeyCode::Home => app.code_cursor_home(),
        KeyCode::End => app.code_cursor_end(),
        KeyCode::Char(c) => app.code_insert(c),
        _ => {}
    }
}

fn handle_input_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_chat(),
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Chat;
        }
        KeyCode::Backspace => app.chat_backspace(),
        KeyCode::Delete => app.chat_delete(),
        KeyCode::Left => app.chat_cursor = app.chat_cursor.saturating_sub(1),
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.chat_cursor = 0,
        KeyCode::End => app.chat_cursor = app.chat_input.chars().count(),
        KeyCode::Char(c) => app.chat_insert(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_editor = app
        .editor_area
        .map(|r| point_in_rect(x, y, r))
        .unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.chat_scroll = app.chat_scroll.saturating_add(3);
            } else if in_editor {
                app.editor_scroll = app.editor_scroll.saturating_add(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.chat_scroll = app.chat_scroll.saturating_sub(3);
            } else if in_editor {
                app.editor_scroll = app.editor_scroll.saturating_sub(3);
            }
        }
        _ => {}
    }
}
