//! UI-agnostic chat state types
//!
//! This module contains the data structures exchanged between the answer
//! service client, the chat controller and whatever front end renders the
//! transcript. None of them depend on a UI framework.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who sent a message in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
}

/// Confidence indicator derived from the service's similarity score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence(pub f64);

impl Confidence {
    /// Only strictly positive scores produce an indicator.
    pub fn from_score(score: Option<f64>) -> Option<Self> {
        score.filter(|s| *s > 0.0).map(Confidence)
    }

    pub fn percent(&self) -> f64 {
        self.0 * 100.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Confidence: {:.1}%", self.percent())
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub is_error: bool,
    pub confidence: Option<Confidence>,
    pub category: Option<String>,
    /// Where the answer came from, e.g. `knowledge_base`
    pub source: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            is_error: false,
            confidence: None,
            category: None,
            source: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            is_error: false,
            confidence: None,
            category: None,
            source: None,
        }
    }

    pub fn bot_error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::bot(text)
        }
    }

    pub fn with_confidence(mut self, confidence: Option<Confidence>) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source.filter(|s| !s.trim().is_empty());
        self
    }
}

/// A suggested follow-up question returned alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuestion {
    pub question: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RelatedQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            score: None,
            category: None,
        }
    }
}

/// Parsed body of an `/ask` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub similarity_score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub related_questions: Vec<RelatedQuestion>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl AnswerResult {
    pub fn from_json(body: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// The service-reported error, if it is present and non-empty.
    pub fn service_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    pub fn confidence(&self) -> Option<Confidence> {
        Confidence::from_score(self.similarity_score)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RelatedQuestion>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Vec<RelatedQuestion>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
