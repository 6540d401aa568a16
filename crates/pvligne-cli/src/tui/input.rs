//! Input handling for TUI key and mouse events.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use pvligne_core::NavKey;
use pvligne_core::session::KeyOutcome;
use ratatui::layout::Position;

use super::TermEvent;
use crate::app::App;
use crate::autocomplete::PointerOutcome;
use crate::ui::text_layout;

/// Process a terminal event, updating app state.
pub fn handle_term_event(app: &mut App, event: TermEvent) {
    match event {
        TermEvent::Key(key) => handle_key(app, key),
        TermEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // Picked up by the next draw.
        TermEvent::Resize(..) => {}
    }
}

const fn nav_key(code: KeyCode) -> Option<NavKey> {
    match code {
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Enter => Some(NavKey::Enter),
        KeyCode::Esc => Some(NavKey::Escape),
        _ => None,
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // AltGr arrives as Ctrl+Alt on Windows (`@` on AZERTY): that is text, not a chord.
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL)
        && !key.modifiers.contains(KeyModifiers::ALT);
    if ctrl {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('s') => {
                app.save_on_exit = true;
                app.should_quit = true;
            }
            _ => {}
        }
        return;
    }

    // An open panel gets the navigation keys first.
    if let Some(nav) = nav_key(key.code) {
        let host = app.focus;
        let field = &mut app.fields[host];
        if let Some(ac) = field.autocomplete.as_mut() {
            match ac.on_key(nav, &field.text, field.caret) {
                KeyOutcome::Handled => return,
                KeyOutcome::Commit(done) => {
                    app.apply_commit(host, done);
                    return;
                }
                KeyOutcome::Ignored => {}
            }
        }
    }

    match key.code {
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Enter => app.insert_newline(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.move_left(),
        KeyCode::Right => app.move_right(),
        KeyCode::Home => app.move_home(),
        KeyCode::End => app.move_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let pos = Position::new(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => pointer_down(app, pos),
        MouseEventKind::Moved => {
            for field in &mut app.fields {
                if let Some(ac) = field.autocomplete.as_mut() {
                    ac.on_hover(pos);
                }
            }
        }
        _ => {}
    }
}

fn pointer_down(app: &mut App, pos: Position) {
    // Panels first: a press on a panel must not move focus away from its host.
    for host in 0..app.fields.len() {
        let field = &mut app.fields[host];
        let Some(ac) = field.autocomplete.as_mut() else {
            continue;
        };
        match ac.on_pointer_down(pos, &field.text, field.caret) {
            PointerOutcome::Commit(done) => {
                app.apply_commit(host, done);
                return;
            }
            PointerOutcome::Panel => return,
            PointerOutcome::Outside => {}
        }
    }

    app.document_click(pos);

    let Some(index) = app.fields.iter().position(|f| f.area.contains(pos)) else {
        return;
    };
    app.focus_field(index);
    let field = app.focused();
    let inner = field.text_area();
    if inner.contains(pos) {
        let row = usize::from(pos.y - inner.y) + usize::from(field.scroll);
        let col = usize::from(pos.x - inner.x);
        let offset = text_layout::offset_at(&field.text, usize::from(inner.width), row, col);
        app.set_caret(offset);
    }
}
