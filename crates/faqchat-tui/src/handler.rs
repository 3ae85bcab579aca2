use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => {
            if app.focus == FocusPane::Input && !app.show_contact {
                app.insert_str(&text);
            }
        }
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }

    app.poll_tasks().await;
    Ok(())
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_contact {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::F(1)) {
            app.show_contact = false;
        }
        return;
    }

    match key.code {
        KeyCode::F(1) => app.show_contact = true,
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height.max(2) / 2),
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height.max(2) / 2),
        _ => match app.focus {
            FocusPane::Input => handle_input_key(app, key),
            FocusPane::Related => handle_related_key(app, key),
        },
    }
}

/// Enter with any of these held inserts a newline instead of submitting.
/// Most terminals only report Shift+Enter with the kitty protocol, Alt+Enter
/// works everywhere.
fn is_newline_chord(modifiers: KeyModifiers) -> bool {
    modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT | KeyModifiers::CONTROL)
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter if is_newline_chord(key.modifiers) => app.insert_newline(),
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => app.insert_newline(),
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            app.insert_char(c);
        }
        _ => {}
    }
}

fn handle_related_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_contact = true,
        KeyCode::Char('j') | KeyCode::Down => app.related_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.related_nav_up(),
        KeyCode::Enter => {
            if let Some(index) = app.related_state.selected() {
                app.select_related(index);
            }
        }
        KeyCode::Tab | KeyCode::Esc => app.focus = FocusPane::Input,
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Index of the related question drawn at row `y`, accounting for the border
/// and the list's scroll offset.
fn related_index_at(app: &App, y: u16) -> Option<usize> {
    let area = app.related_area?;
    let first_row = area.y + 1;
    if y < first_row || y >= area.y + area.height.saturating_sub(1) {
        return None;
    }
    let index = (y - first_row) as usize + app.related_state.offset();
    (index < app.chat.related().len()).then_some(index)
}

pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.show_contact {
        return;
    }

    let (x, y) = (mouse.column, mouse.row);
    let in_related = app.related_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_related => app.related_nav_down(),
        MouseEventKind::ScrollUp if in_related => app.related_nav_up(),
        MouseEventKind::ScrollDown => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp => app.scroll_chat_up(3),
        MouseEventKind::Down(MouseButton::Left) if in_related => {
            if let Some(index) = related_index_at(app, y) {
                app.related_state.select(Some(index));
                app.select_related(index);
            }
        }
        _ => {}
    }
}
