//! Turns a plain language sentence such as "今天买咖啡花了35元" into a
//! transaction by asking an external language model.
//!
//! The model is reached through [CompletionClient] so tests can script its
//! replies. [OpenAiCompatibleClient] talks to any provider that implements
//! the OpenAI chat-completions protocol.

mod client;
mod endpoint;
mod error;
mod prompt;

pub use client::{CompletionClient, OpenAiCompatibleClient, ProviderConfig};
pub use endpoint::{ExtractionOutcome, create_ai_transaction_endpoint, record_from_text};
pub use error::ExtractionError;
pub use prompt::{SYSTEM_INSTRUCTION, parse_extraction, strip_code_fences, user_prompt};
