//! Chat interaction controller
//!
//! Owns the transcript, the input buffer, the related-questions panel and the
//! busy flag. A submission is split into [`Chat::begin_submit`], which records
//! the question and marks the controller busy, and [`Chat::settle`], which
//! turns the service outcome into a bot message and clears the busy flag. The
//! outbound call in between belongs to the caller.

use anyhow::Result;

use crate::client::AnswerService;
use crate::state::{AnswerResult, Message, RelatedQuestion};

/// Shown in place of a reply when the request or its body fails.
pub const GENERIC_FAILURE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Default)]
pub struct Chat {
    transcript: Vec<Message>,
    related: Vec<RelatedQuestion>,
    busy: bool,
    pub input: String,
}

impl Chat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Related questions from the latest reply. Empty means the panel is hidden.
    pub fn related(&self) -> &[RelatedQuestion] {
        &self.related
    }

    pub fn related_visible(&self) -> bool {
        !self.related.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Record the trimmed input as a user message, clear the input and go busy.
    ///
    /// Returns the question to send, or `None` when the input is blank or a
    /// request is already in flight. Neither case touches any state.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.busy {
            tracing::debug!("submission refused while a request is in flight");
            return None;
        }

        let question = self.input.trim();
        if question.is_empty() {
            return None;
        }
        let question = question.to_string();

        self.transcript.push(Message::user(question.clone()));
        self.input.clear();
        self.busy = true;
        tracing::info!(question = %question, "question submitted");

        Some(question)
    }

    /// Apply the outcome of the outbound call and return to idle.
    pub fn settle(&mut self, outcome: Result<AnswerResult>) {
        match outcome {
            Ok(result) => self.apply_answer(result),
            Err(e) => {
                tracing::warn!("answer request failed: {:#}", e);
                self.transcript.push(Message::bot_error(GENERIC_FAILURE));
            }
        }
        self.busy = false;
    }

    fn apply_answer(&mut self, result: AnswerResult) {
        if let Some(error) = result.service_error() {
            tracing::info!(error = %error, "answer service reported an error");
            self.transcript.push(Message::bot_error(format!("Error: {}", error)));
            return;
        }

        let confidence = result.confidence();
        self.transcript.push(
            Message::bot(result.response)
                .with_confidence(confidence)
                .with_category(result.category)
                .with_source(result.source),
        );

        // Replace, never merge, the previous suggestions.
        self.related = result.related_questions;
    }

    /// Put a suggested question into the input and submit it.
    pub fn select_related(&mut self, index: usize) -> Option<String> {
        let question = self.related.get(index)?.question.clone();
        self.select_related_question(&question)
    }

    pub fn select_related_question(&mut self, question: &str) -> Option<String> {
        self.input = question.to_string();
        self.begin_submit()
    }

    /// Run a whole submission against `service`. Returns `false` when nothing
    /// was submitted.
    pub async fn submit<S: AnswerService>(&mut self, service: &S) -> bool {
        let Some(question) = self.begin_submit() else {
            return false;
        };
        let outcome = service.ask(&question).await;
        self.settle(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Confidence, Sender};
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Replies with a fixed outcome and remembers every question it was asked.
    struct FakeService {
        reply: std::result::Result<&'static str, &'static str>,
        asked: Mutex<Vec<String>>,
    }

    impl FakeService {
        fn replying(body: &'static str) -> Self {
            Self { reply: Ok(body), asked: Mutex::new(Vec::new()) }
        }

        fn failing(reason: &'static str) -> Self {
            Self { reply: Err(reason), asked: Mutex::new(Vec::new()) }
        }

        fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    impl AnswerService for FakeService {
        async fn ask(&self, question: &str) -> Result<AnswerResult> {
            self.asked.lock().unwrap().push(question.to_string());
            match self.reply {
                Ok(body) => AnswerResult::from_json(body),
                Err(reason) => Err(anyhow!(reason)),
            }
        }
    }

    fn chat_with_input(input: &str) -> Chat {
        let mut chat = Chat::new();
        chat.input = input.to_string();
        chat
    }

    #[test]
    fn test_begin_submit_records_user_message_first() {
        let mut chat = chat_with_input("  How do I complete KYC?  ");

        let question = chat.begin_submit();

        assert_eq!(question.as_deref(), Some("How do I complete KYC?"));
        assert_eq!(chat.transcript(), &[Message::user("How do I complete KYC?")]);
        assert!(chat.input.is_empty());
        assert!(chat.is_busy());
    }

    #[test]
    fn test_blank_input_is_a_no_op() {
        for input in ["", "   ", "\n\t "] {
            let mut chat = chat_with_input(input);
            assert_eq!(chat.begin_submit(), None);
            assert!(chat.transcript().is_empty());
            assert!(!chat.is_busy());
            assert_eq!(chat.input, input);
        }
    }

    #[test]
    fn test_submission_refused_while_busy() {
        let mut chat = chat_with_input("first");
        chat.begin_submit();
        chat.input = "second".to_string();

        assert_eq!(chat.begin_submit(), None);
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.input, "second");
    }

    #[test]
    fn test_reply_with_confidence() {
        let mut chat = chat_with_input("fees?");
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(
            r#"{"response": "No joining fee.", "similarity_score": 0.823, "category": "Cards", "source": "knowledge_base"}"#,
        ));

        let reply = &chat.transcript()[1];
        assert_eq!(reply.sender, Sender::Bot);
        assert_eq!(reply.text, "No joining fee.");
        assert!(!reply.is_error);
        assert_eq!(reply.confidence.map(|c| c.to_string()).as_deref(), Some("Confidence: 82.3%"));
        assert_eq!(reply.category.as_deref(), Some("Cards"));
        assert_eq!(reply.source.as_deref(), Some("knowledge_base"));
        assert!(!chat.is_busy());
    }

    #[test]
    fn test_zero_or_missing_score_has_no_confidence() {
        for body in [r#"{"response": "a", "similarity_score": 0}"#, r#"{"response": "a"}"#] {
            let mut chat = chat_with_input("q");
            chat.begin_submit();
            chat.settle(AnswerResult::from_json(body));
            assert_eq!(chat.transcript()[1].confidence, None);
        }
    }

    #[test]
    fn test_service_error_is_prefixed_and_marked() {
        let mut chat = chat_with_input("q");
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(
            r#"{"error": "FAQ bot not initialized.", "response": "Service temporarily unavailable.", "similarity_score": 0.9}"#,
        ));

        let reply = &chat.transcript()[1];
        assert_eq!(reply.text, "Error: FAQ bot not initialized.");
        assert!(reply.is_error);
        assert_eq!(reply.confidence, None);
        assert!(!chat.is_busy());
    }

    #[test]
    fn test_transport_failure_uses_generic_message() {
        let mut chat = chat_with_input("q");
        chat.begin_submit();
        chat.settle(Err(anyhow!("connection refused")));

        assert_eq!(
            chat.transcript()[1],
            Message::bot_error("Sorry, I encountered an error. Please try again.")
        );
        assert!(!chat.is_busy());
    }

    #[test]
    fn test_related_questions_replace_previous_set() {
        let mut chat = chat_with_input("one");
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(
            r#"{"response": "a", "related_questions": [{"question": "A1"}, {"question": "A2"}]}"#,
        ));
        assert!(chat.related_visible());

        chat.input = "two".to_string();
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(
            r#"{"response": "b", "related_questions": [{"question": "B1"}]}"#,
        ));
        assert_eq!(chat.related(), &[RelatedQuestion::new("B1")]);

        chat.input = "three".to_string();
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(r#"{"response": "c"}"#));
        assert!(!chat.related_visible());
    }

    #[test]
    fn test_errors_leave_related_panel_alone() {
        let mut chat = chat_with_input("one");
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(
            r#"{"response": "a", "related_questions": [{"question": "A1"}]}"#,
        ));

        chat.input = "two".to_string();
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(r#"{"error": "boom"}"#));
        chat.input = "three".to_string();
        chat.begin_submit();
        chat.settle(Err(anyhow!("timed out")));

        assert_eq!(chat.related(), &[RelatedQuestion::new("A1")]);
    }

    #[test]
    fn test_select_related_submits_its_question() {
        let mut chat = chat_with_input("one");
        chat.begin_submit();
        chat.settle(AnswerResult::from_json(
            r#"{"response": "a", "related_questions": [{"question": "What rewards can I get?"}]}"#,
        ));
        chat.input = "half-typed".to_string();

        let question = chat.select_related(0);

        assert_eq!(question.as_deref(), Some("What rewards can I get?"));
        assert_eq!(chat.transcript().last(), Some(&Message::user("What rewards can I get?")));
        assert!(chat.input.is_empty());
        assert!(chat.is_busy());
        assert_eq!(chat.select_related(5), None);
    }

    #[tokio::test]
    async fn test_submit_runs_full_pipeline_once() {
        let service = FakeService::replying(
            r#"{"response": "Open the app.", "similarity_score": 0.75, "related_questions": [{"question": "Next?"}]}"#,
        );
        let mut chat = chat_with_input("How do I start?");

        assert!(chat.submit(&service).await);

        assert_eq!(service.asked(), vec!["How do I start?".to_string()]);
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(chat.transcript()[1].confidence, Some(Confidence(0.75)));
        assert!(!chat.is_busy());
    }

    #[tokio::test]
    async fn test_submit_blank_input_sends_nothing() {
        let service = FakeService::replying(r#"{"response": "unused"}"#);
        let mut chat = chat_with_input("    ");

        assert!(!chat.submit(&service).await);
        assert!(service.asked().is_empty());
        assert!(chat.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_submit_recovers_from_failure() {
        let service = FakeService::failing("network unreachable");
        let mut chat = chat_with_input("hello");

        assert!(chat.submit(&service).await);
        assert_eq!(chat.transcript()[1].text, GENERIC_FAILURE);
        assert!(chat.transcript()[1].is_error);
        assert!(!chat.is_busy());

        chat.input = "again".to_string();
        assert!(chat.submit(&service).await);
        assert_eq!(service.asked().len(), 2);
    }

    #[test]
    fn test_contact_does_not_touch_state() {
        let mut chat = chat_with_input("pending");
        chat.begin_submit();

        let _ = crate::contact::show_contact();

        assert_eq!(chat.transcript().len(), 1);
        assert!(chat.is_busy());
    }
}
