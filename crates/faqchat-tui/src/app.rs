use anyhow::anyhow;
use faqchat_core::{AnswerClient, AnswerResult, AnswerService, Chat, HealthStatus};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

/// The input box grows with its content up to this many text lines.
pub const MAX_INPUT_LINES: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Related,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceHealth {
    Checking,
    Online(HealthStatus),
    Offline,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub focus: FocusPane,

    // Chat state
    pub chat: Chat,
    pub cursor: usize, // cursor position in chat.input, in chars
    pub query_task: Option<JoinHandle<anyhow::Result<AnswerResult>>>,
    pub related_state: ListState,

    // Chat view geometry (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub related_area: Option<Rect>,

    pub show_contact: bool,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Service
    pub client: AnswerClient,
    pub health: ServiceHealth,
    pub health_task: Option<JoinHandle<anyhow::Result<HealthStatus>>>,
}

impl App {
    pub fn new(client: AnswerClient) -> Self {
        let checker = client.clone();
        let health_task = tokio::spawn(async move { checker.health().await });

        Self {
            should_quit: false,
            focus: FocusPane::Input,

            chat: Chat::new(),
            cursor: 0,
            query_task: None,
            related_state: ListState::default(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            related_area: None,

            show_contact: false,
            animation_frame: 0,

            client,
            health: ServiceHealth::Checking,
            health_task: Some(health_task),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.chat.is_busy()
    }

    /// Submit the current input. Ignored while a request is in flight.
    pub fn submit(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        match self.chat.begin_submit() {
            Some(question) => {
                self.cursor = 0;
                self.dispatch(question);
                true
            }
            None => false,
        }
    }

    /// Submit the related question at `index` as if it had been typed.
    pub fn select_related(&mut self, index: usize) -> bool {
        if self.is_busy() {
            return false;
        }
        let submitted = self.chat.select_related(index);
        // The input now holds the related question (or is empty after a submit).
        self.cursor = self.chat.input.chars().count();
        match submitted {
            Some(question) => {
                self.focus = FocusPane::Input;
                self.dispatch(question);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, question: String) {
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        self.query_task = Some(tokio::spawn(async move { client.ask(&question).await }));
    }

    /// Settle finished background tasks. Called after every event.
    pub async fn poll_tasks(&mut self) {
        if self.query_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.query_task.take() {
                let outcome = task
                    .await
                    .unwrap_or_else(|e| Err(anyhow!("answer task did not complete: {}", e)));
                self.finish_query(outcome);
            }
        }

        if self.health_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.health_task.take() {
                self.health = match task.await {
                    Ok(Ok(status)) => ServiceHealth::Online(status),
                    Ok(Err(e)) => {
                        tracing::warn!("health check failed: {:#}", e);
                        ServiceHealth::Offline
                    }
                    Err(e) => {
                        tracing::warn!("health check task did not complete: {}", e);
                        ServiceHealth::Offline
                    }
                };
            }
        }
    }

    pub fn finish_query(&mut self, outcome: anyhow::Result<AnswerResult>) {
        self.chat.settle(outcome);

        if self.chat.related_visible() {
            self.related_state.select(Some(0));
        } else {
            self.related_state.select(None);
            self.focus = FocusPane::Input;
        }
        self.scroll_chat_to_bottom();
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.chat.input, self.cursor);
        self.chat.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\r') {
            self.insert_char(c);
        }
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.chat.input.chars().count());
    }

    pub fn delete_before_cursor(&mut self) {
        self.clamp_cursor();
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.chat.input, self.cursor);
            self.chat.input.remove(byte_pos);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        self.clamp_cursor();
        if self.cursor < self.chat.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.chat.input, self.cursor);
            self.chat.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chat.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.chat.input.chars().count();
    }

    /// (row, column) of the cursor within the input text
    pub fn cursor_position(&self) -> (u16, u16) {
        let before: String = self.chat.input.chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);
        (row as u16, col as u16)
    }

    pub fn input_line_count(&self) -> u16 {
        self.chat.input.split('\n').count() as u16
    }

    /// Height of the input box including borders
    pub fn input_height(&self) -> u16 {
        self.input_line_count().clamp(1, MAX_INPUT_LINES) + 2
    }

    // Related questions list

    pub fn related_nav_down(&mut self) {
        let len = self.chat.related().len();
        if len > 0 {
            let i = self.related_state.selected().unwrap_or(0);
            self.related_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn related_nav_up(&mut self) {
        let i = self.related_state.selected().unwrap_or(0);
        self.related_state.select(Some(i.saturating_sub(1)));
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Input if self.chat.related_visible() => {
                if self.related_state.selected().is_none() {
                    self.related_state.select(Some(0));
                }
                FocusPane::Related
            }
            _ => FocusPane::Input,
        };
    }

    // Chat view

    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    fn visible_chat_height(&self) -> u16 {
        if self.chat_height > 0 { self.chat_height } else { 20 }
    }

    /// Largest useful scroll offset, clamped to what the paragraph scroll accepts.
    fn max_chat_scroll(&self) -> u16 {
        let max = self
            .chat_line_count()
            .saturating_sub(self.visible_chat_height() as usize);
        u16::try_from(max).unwrap_or(u16::MAX)
    }

    /// Number of wrapped lines the transcript occupies, including the
    /// "Thinking..." indicator while busy.
    pub fn chat_line_count(&self) -> usize {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        let mut total_lines: usize = 0;
        for msg in self.chat.transcript() {
            total_lines = total_lines.saturating_add(1); // sender line
            for line in msg.text.lines() {
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
            if msg.confidence.is_some() {
                total_lines = total_lines.saturating_add(1);
            }
            total_lines = total_lines.saturating_add(1); // blank line after message
        }

        if self.is_busy() {
            total_lines = total_lines.saturating_add(2);
        }
        total_lines
    }

    /// Scroll so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }
}
