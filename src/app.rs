use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::api::{ChatAnswer, ChatClient};
use crate::catalog::{Catalog, Place};
use crate::conversation::{Conversation, Role};
use crate::suggestions;

/// Shown as an assistant turn when the answering service is unreachable or
/// returns an error. The diagnostic itself goes to the log file only.
pub const SERVICE_FALLBACK: &str =
    "Désolé, je ne parviens pas à joindre l'assistant pour le moment. Réessayez dans un instant.";

const SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Browse,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Categories,
    Places,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFocus {
    Input,
    Suggestions,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub focus: FocusPane,

    // Browse state
    pub category_state: ListState,
    pub place_state: ListState,
    pub cached_places: Vec<Place>,

    // Search state
    pub search_input: String,
    pub search_editing: bool,
    pub search_results: Vec<Place>,
    pub search_state: ListState,

    // Chat panel (launcher + widget)
    pub chat_open: bool,
    pub chat_focus: ChatFocus,
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // inner chat area size, updated during render
    pub chat_width: u16,
    pub suggestion_state: ListState,
    pub animation_frame: u8, // 0-2 for the typing ellipsis
    pub conversation: Conversation,
    chat_task: Option<JoinHandle<anyhow::Result<ChatAnswer>>>,

    // Collaborators
    pub catalog: Catalog,
    client: ChatClient,
    conversation_id: String,
}

impl App {
    pub fn new(catalog: Catalog, client: ChatClient, conversation_id: String) -> Self {
        let mut category_state = ListState::default();
        if !catalog.categories().is_empty() {
            category_state.select(Some(0));
        }

        let mut app = Self {
            should_quit: false,
            screen: Screen::Browse,
            focus: FocusPane::Categories,

            category_state,
            place_state: ListState::default(),
            cached_places: Vec::new(),

            search_input: String::new(),
            search_editing: false,
            search_results: Vec::new(),
            search_state: ListState::default(),

            chat_open: false,
            chat_focus: ChatFocus::Input,
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            suggestion_state: ListState::default(),
            animation_frame: 0,
            conversation: Conversation::new(),
            chat_task: None,

            catalog,
            client,
            conversation_id,
        };
        app.load_places();
        app
    }

    // ----- Browse navigation -----

    pub fn selected_category(&self) -> Option<&String> {
        self.category_state
            .selected()
            .and_then(|i| self.catalog.categories().get(i))
    }

    pub fn selected_place(&self) -> Option<&Place> {
        self.place_state
            .selected()
            .and_then(|i| self.cached_places.get(i))
    }

    fn load_places(&mut self) {
        if let Some(category) = self.selected_category().cloned() {
            self.cached_places = self
                .catalog
                .places_in(&category)
                .into_iter()
                .cloned()
                .collect();
        } else {
            self.cached_places.clear();
        }
        if self.cached_places.is_empty() {
            self.place_state.select(None);
        } else {
            self.place_state.select(Some(0));
        }
    }

    pub fn category_nav_down(&mut self) {
        let len = self.catalog.categories().len();
        if len > 0 {
            let i = self.category_state.selected().unwrap_or(0);
            self.category_state.select(Some((i + 1).min(len - 1)));
            self.load_places();
        }
    }

    pub fn category_nav_up(&mut self) {
        let i = self.category_state.selected().unwrap_or(0);
        self.category_state.select(Some(i.saturating_sub(1)));
        self.load_places();
    }

    pub fn place_nav_down(&mut self) {
        let len = self.cached_places.len();
        if len > 0 {
            let i = self.place_state.selected().unwrap_or(0);
            self.place_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn place_nav_up(&mut self) {
        let i = self.place_state.selected().unwrap_or(0);
        self.place_state.select(Some(i.saturating_sub(1)));
    }

    // ----- Search -----

    pub fn perform_search(&mut self) {
        if self.search_input.trim().is_empty() {
            self.search_results.clear();
            self.search_state.select(None);
            return;
        }

        self.search_results = self
            .catalog
            .search(&self.search_input, SEARCH_LIMIT)
            .into_iter()
            .cloned()
            .collect();
        if self.search_results.is_empty() {
            self.search_state.select(None);
        } else {
            self.search_state.select(Some(0));
        }
    }

    pub fn search_nav_down(&mut self) {
        let len = self.search_results.len();
        if len > 0 {
            let i = self.search_state.selected().unwrap_or(0);
            self.search_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn search_nav_up(&mut self) {
        let i = self.search_state.selected().unwrap_or(0);
        self.search_state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_search_result(&self) -> Option<&Place> {
        self.search_state
            .selected()
            .and_then(|i| self.search_results.get(i))
    }

    /// Jump from a search result to its place in the Browse screen.
    pub fn jump_to_place(&mut self, place: &Place) {
        let Some(cat_idx) = self
            .catalog
            .categories()
            .iter()
            .position(|c| *c == place.category)
        else {
            return;
        };
        self.category_state.select(Some(cat_idx));
        self.load_places();
        if let Some(idx) = self.cached_places.iter().position(|p| p.name == place.name) {
            self.place_state.select(Some(idx));
        }
        self.screen = Screen::Browse;
        self.focus = FocusPane::Places;
    }

    // ----- Launcher -----

    pub fn toggle_chat(&mut self) {
        if self.chat_open {
            self.close_chat();
        } else {
            self.open_chat();
        }
    }

    pub fn open_chat(&mut self) {
        self.chat_open = true;
        self.chat_focus = ChatFocus::Input;
        if self.suggestions_visible() && self.suggestion_state.selected().is_none() {
            self.suggestion_state.select(Some(0));
        }
        self.scroll_chat_to_bottom();
    }

    /// Hides the panel. The conversation is owned here, above the panel,
    /// so the log survives close/reopen within the session.
    pub fn close_chat(&mut self) {
        self.chat_open = false;
    }

    // ----- Chat widget -----

    /// Suggestions are offered until the user has said something.
    pub fn suggestions_visible(&self) -> bool {
        !self
            .conversation
            .messages()
            .iter()
            .any(|m| m.role == Role::User)
    }

    pub fn suggestion_nav_down(&mut self) {
        let len = suggestions::list().len();
        if len > 0 {
            let i = self.suggestion_state.selected().unwrap_or(0);
            self.suggestion_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn suggestion_nav_up(&mut self) {
        let i = self.suggestion_state.selected().unwrap_or(0);
        self.suggestion_state.select(Some(i.saturating_sub(1)));
    }

    /// Submits the selected suggestion through the same path as typed text.
    pub fn submit_suggestion(&mut self) {
        if let Some(text) = self
            .suggestion_state
            .selected()
            .and_then(|i| suggestions::list().get(i))
        {
            self.submit_text(text);
            self.chat_focus = ChatFocus::Input;
        }
    }

    /// Submits the typed input, clearing it only when the submission is
    /// accepted (blank or locked input leaves everything untouched).
    pub fn submit_chat_input(&mut self) {
        let text = self.chat_input.trim().to_string();
        if text.is_empty() || self.conversation.input_locked() {
            return;
        }
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.submit_text(&text);
    }

    /// One submission: append the user turn, enter Sending, fire the
    /// request. Submissions while a request is outstanding are rejected
    /// here as well as at the input.
    fn submit_text(&mut self, text: &str) {
        if self.chat_task.is_some() || !self.conversation.append_user(text) {
            return;
        }
        if !self.conversation.begin_pending() {
            return;
        }

        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let conversation_id = self.conversation_id.clone();
        let message = text.trim().to_string();
        self.chat_task = Some(tokio::spawn(async move {
            client.send(&conversation_id, &message).await
        }));
    }

    /// Applies the outcome of a finished request. Both outcomes end in
    /// Idle: an answer (blank replaced by the placeholder) or the fixed
    /// fallback turn. Failures stop here, the panel stays interactive.
    pub fn finish_chat(&mut self, result: anyhow::Result<ChatAnswer>) {
        self.conversation.end_pending();
        match result {
            Ok(answer) => self.conversation.append_assistant(answer.answer),
            Err(err) => {
                tracing::warn!("assistant request failed: {err:#}");
                self.conversation.append_assistant(SERVICE_FALLBACK.to_string());
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Collects the in-flight request once it resolves. Called from the
    /// event loop; a panicked task counts as a transport failure.
    pub async fn poll_chat(&mut self) {
        let finished = self
            .chat_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.chat_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(anyhow::anyhow!("assistant task aborted: {err}")),
            };
            self.finish_chat(result);
        }
    }

    /// Tick animation frame while a response is outstanding.
    pub fn tick_animation(&mut self) {
        if self.conversation.pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn chat_scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn chat_scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    /// Scroll the chat so the newest turn (or the typing indicator) is
    /// visible. Reacts to log growth; wrap math mirrors the renderer.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.conversation.messages() {
            total_lines += 1; // role label
            for line in msg.content.lines() {
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // blank line after each turn
        }

        if self.conversation.pending() {
            total_lines += 2; // label + typing indicator
        }

        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{EMPTY_ANSWER_PLACEHOLDER, GREETING};

    const SAMPLE: &str = r#"[
        {"name": "Vieux-Lyon", "category": "Quartiers", "district": "5e",
         "summary": "Traboules et Renaissance.", "tags": []},
        {"name": "Musée des Confluences", "category": "Musées", "district": "2e",
         "summary": "Sciences et sociétés.", "tags": []}
    ]"#;

    fn test_app() -> App {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        // An unroutable endpoint: spawned requests fail fast and their
        // results are only applied when a test polls for them.
        let client = ChatClient::new("http://127.0.0.1:1");
        App::new(catalog, client, "test-conversation".to_string())
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut app = test_app();
        app.chat_input = "   ".to_string();
        app.submit_chat_input();
        assert_eq!(app.conversation.messages().len(), 1);
        assert!(!app.conversation.pending());
        assert!(app.chat_task.is_none());
    }

    #[tokio::test]
    async fn submission_locks_input_and_rejects_reentry() {
        let mut app = test_app();
        app.chat_input = "Que faire à Lyon ?".to_string();
        app.submit_chat_input();

        assert_eq!(app.conversation.messages().len(), 2);
        assert!(app.conversation.input_locked());
        assert!(app.chat_task.is_some());
        assert!(app.chat_input.is_empty());

        // A second submission while pending changes nothing and fires no
        // second request.
        app.chat_input = "Et les musées ?".to_string();
        app.submit_chat_input();
        assert_eq!(app.conversation.messages().len(), 2);
        assert_eq!(app.chat_input, "Et les musées ?");
    }

    #[tokio::test]
    async fn answer_is_appended_verbatim() {
        let mut app = test_app();
        app.chat_input = "Bonjour".to_string();
        app.submit_chat_input();

        app.finish_chat(Ok(ChatAnswer {
            answer: "Bonjour ! Que voulez-vous visiter ?".to_string(),
        }));

        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "Bonjour ! Que voulez-vous visiter ?");
        assert!(!app.conversation.pending());
    }

    #[tokio::test]
    async fn blank_answer_becomes_the_placeholder() {
        let mut app = test_app();
        app.chat_input = "Bonjour".to_string();
        app.submit_chat_input();

        app.finish_chat(Ok(ChatAnswer {
            answer: String::new(),
        }));

        let last = app.conversation.messages().last().unwrap();
        assert_eq!(last.content, EMPTY_ANSWER_PLACEHOLDER);
    }

    #[tokio::test]
    async fn failure_is_absorbed_into_the_fallback_turn() {
        let mut app = test_app();
        app.chat_input = "Bonjour".to_string();
        app.submit_chat_input();

        app.finish_chat(Err(anyhow::anyhow!("connection refused")));

        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].content, SERVICE_FALLBACK);
        assert!(!app.conversation.pending());

        // The widget stays fully interactive after a failure.
        app.chat_task = None;
        app.chat_input = "Encore là ?".to_string();
        app.submit_chat_input();
        assert_eq!(app.conversation.messages().len(), 4);
    }

    #[tokio::test]
    async fn suggestion_is_identical_to_typing_it() {
        let suggestion = suggestions::list()[0];

        let mut typed = test_app();
        typed.chat_input = suggestion.to_string();
        typed.submit_chat_input();

        let mut clicked = test_app();
        clicked.open_chat();
        clicked.submit_suggestion();

        let typed_log: Vec<_> = typed
            .conversation
            .messages()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect();
        let clicked_log: Vec<_> = clicked
            .conversation
            .messages()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect();
        assert_eq!(typed_log, clicked_log);
        assert!(clicked.conversation.pending());
    }

    #[tokio::test]
    async fn closing_the_panel_preserves_the_log() {
        let mut app = test_app();
        app.open_chat();
        app.chat_input = "Que faire à Lyon ?".to_string();
        app.submit_chat_input();
        app.finish_chat(Ok(ChatAnswer {
            answer: "Commencez par le Vieux-Lyon.".to_string(),
        }));

        app.close_chat();
        assert!(!app.chat_open);
        app.open_chat();

        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, GREETING);
        assert_eq!(messages[1].content, "Que faire à Lyon ?");
        assert_eq!(messages[2].content, "Commencez par le Vieux-Lyon.");
    }

    #[test]
    fn suggestions_hide_after_the_first_user_turn() {
        let mut app = test_app();
        assert!(app.suggestions_visible());
        app.conversation.append_user("Bonjour");
        assert!(!app.suggestions_visible());
    }

    #[test]
    fn jump_to_place_selects_category_and_place() {
        let mut app = test_app();
        app.search_input = "confluences".to_string();
        app.perform_search();
        assert_eq!(app.search_results.len(), 1);

        let place = app.search_results[0].clone();
        app.jump_to_place(&place);

        assert_eq!(app.screen, Screen::Browse);
        assert_eq!(app.selected_category().unwrap(), "Musées");
        assert_eq!(app.selected_place().unwrap().name, "Musée des Confluences");
    }
}
