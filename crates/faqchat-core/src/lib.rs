pub mod chat;
pub mod client;
pub mod config;
pub mod contact;
pub mod state;

// Re-export main types for convenience
pub use chat::{Chat, GENERIC_FAILURE};
pub use client::{AnswerClient, AnswerService, HealthStatus};
pub use config::Config;
pub use contact::show_contact;
pub use state::{AnswerResult, Confidence, Message, RelatedQuestion, Sender};
