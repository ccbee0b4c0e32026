use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, ChatFocus, FocusPane, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string edits
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Works everywhere, even while the chat panel is open
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The open chat panel captures the keyboard
    if app.chat_open {
        handle_chat_key(app, key);
        return;
    }

    match app.screen {
        Screen::Browse => handle_browse_key(app, key),
        Screen::Search => {
            if app.search_editing {
                handle_search_editing(app, key);
            } else {
                handle_search_key(app, key);
            }
        }
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Categories => app.category_nav_down(),
            FocusPane::Places => app.place_nav_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Categories => app.category_nav_up(),
            FocusPane::Places => app.place_nav_up(),
        },

        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            if app.focus == FocusPane::Categories && !app.cached_places.is_empty() {
                app.focus = FocusPane::Places;
            }
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => {
            app.focus = FocusPane::Categories;
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Categories if !app.cached_places.is_empty() => FocusPane::Places,
                _ => FocusPane::Categories,
            };
        }

        // Screen switching
        KeyCode::Char('/') => {
            app.screen = Screen::Search;
            app.search_editing = true;
        }
        // Launcher
        KeyCode::Char('a') => app.toggle_chat(),

        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.screen = Screen::Browse;
            app.search_input.clear();
            app.search_results.clear();
            app.search_state.select(None);
        }
        KeyCode::Char('j') | KeyCode::Down => app.search_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.search_nav_up(),
        KeyCode::Enter => {
            if let Some(place) = app.selected_search_result().cloned() {
                app.jump_to_place(&place);
            }
        }
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.search_editing = true;
        }
        KeyCode::Char('a') => app.toggle_chat(),
        _ => {}
    }
}

fn handle_search_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.search_editing = false;
        }
        KeyCode::Enter => {
            app.perform_search();
            app.search_editing = false;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
        }
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    // Esc dismisses the panel, equivalent to the close action
    if key.code == KeyCode::Esc {
        app.close_chat();
        return;
    }

    // Tab moves between input and suggestions while both are shown
    if key.code == KeyCode::Tab {
        if app.suggestions_visible() {
            app.chat_focus = match app.chat_focus {
                ChatFocus::Input => ChatFocus::Suggestions,
                ChatFocus::Suggestions => ChatFocus::Input,
            };
        }
        return;
    }

    match app.chat_focus {
        ChatFocus::Suggestions => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.suggestion_nav_down(),
            KeyCode::Char('k') | KeyCode::Up => app.suggestion_nav_up(),
            KeyCode::Enter => app.submit_suggestion(),
            _ => {}
        },
        ChatFocus::Input => handle_chat_input_key(app, key),
    }
}

fn handle_chat_input_key(app: &mut App, key: KeyEvent) {
    // History scrolling stays available while a response is pending
    match key.code {
        KeyCode::Up => {
            app.chat_scroll_up(1);
            return;
        }
        KeyCode::Down => {
            app.chat_scroll_down(1);
            return;
        }
        KeyCode::PageUp => {
            app.chat_scroll_up(10);
            return;
        }
        KeyCode::PageDown => {
            app.chat_scroll_down(10);
            return;
        }
        _ => {}
    }

    // The input is disabled while a response is outstanding
    if app.conversation.input_locked() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_chat_input(),
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if app.chat_open {
                app.chat_scroll_down(3);
            } else {
                match app.screen {
                    Screen::Browse => match app.focus {
                        FocusPane::Categories => app.category_nav_down(),
                        FocusPane::Places => app.place_nav_down(),
                    },
                    Screen::Search => app.search_nav_down(),
                }
            }
        }
        MouseEventKind::ScrollUp => {
            if app.chat_open {
                app.chat_scroll_up(3);
            } else {
                match app.screen {
                    Screen::Browse => match app.focus {
                        FocusPane::Categories => app.category_nav_up(),
                        FocusPane::Places => app.place_nav_up(),
                    },
                    Screen::Search => app.search_nav_up(),
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatClient;
    use crate::catalog::Catalog;

    const SAMPLE: &str = r#"[
        {"name": "Vieux-Lyon", "category": "Quartiers", "district": "5e",
         "summary": "Traboules et Renaissance.", "tags": []}
    ]"#;

    fn test_app() -> App {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let client = ChatClient::new("http://127.0.0.1:1");
        App::new(catalog, client, "test-conversation".to_string())
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn char_index_maps_to_byte_index() {
        let s = "été à Lyon";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 2); // 'é' is two bytes
        assert_eq!(char_to_byte_index(s, 100), s.len());
    }

    #[test]
    fn launcher_key_toggles_the_panel_and_esc_closes_it() {
        let mut app = test_app();
        assert!(!app.chat_open);
        press(&mut app, KeyCode::Char('a'));
        assert!(app.chat_open);
        press(&mut app, KeyCode::Esc);
        assert!(!app.chat_open);
        press(&mut app, KeyCode::Char('a'));
        assert!(app.chat_open);
    }

    #[tokio::test]
    async fn typing_is_ignored_while_a_response_is_pending() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('a'));
        for c in "Bonjour".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.chat_input, "Bonjour");
        press(&mut app, KeyCode::Enter);
        assert!(app.conversation.input_locked());

        for c in "xyz".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.chat_input.is_empty());
        assert_eq!(app.conversation.messages().len(), 2);
    }

    #[tokio::test]
    async fn enter_on_a_suggestion_submits_it() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Tab); // focus the suggestion list
        assert_eq!(app.chat_focus, ChatFocus::Suggestions);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.conversation.messages().len(), 2);
        assert_eq!(
            app.conversation.messages()[1].content,
            crate::suggestions::list()[0]
        );
        assert!(app.conversation.pending());
    }

    #[test]
    fn slash_opens_search_in_editing_mode() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.screen, Screen::Search);
        assert!(app.search_editing);

        for c in "traboules".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(!app.search_editing);
        assert_eq!(app.search_results.len(), 1);
    }
}
