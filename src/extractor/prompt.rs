//! The instruction sent to the model and parsing of its reply.

use serde::{Deserialize, Deserializer, de};

use crate::extractor::ExtractionError;

/// Constrains the model to reply with a single JSON object describing one transaction.
pub const SYSTEM_INSTRUCTION: &str = "You are a professional bookkeeping assistant. \
Convert the user's plain language description into JSON.
Rules:
1. Return one JSON object and nothing else. Do not use Markdown formatting (such as ```json).
2. The object must have exactly two fields:
   - \"label\" (string): a short description.
   - \"amount\" (number): the amount. Spending must be negative, income must be positive.
3. If you cannot understand the input, set \"label\" to \"未知\" and \"amount\" to 0.";

/// The label the model uses when it cannot understand the input.
pub const UNKNOWN_LABEL: &str = "未知";

/// The transaction fields the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractedTransaction {
    /// A short description, e.g. "咖啡".
    pub label: String,
    /// Negative for spending, positive for income.
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub amount: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

/// Models occasionally quote the amount, e.g. `"-35"`.
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(amount) => Ok(amount),
        RawAmount::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("amount {text:?} is not a number"))),
    }
}

/// Build the prompt for the user's raw input.
pub fn user_prompt(text: &str) -> String {
    format!("User input: {text}")
}

/// Remove Markdown code fence markers ("```json" and "```") and surrounding whitespace.
///
/// Models sometimes wrap JSON in a code block even when told not to.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_owned()
}

/// Parse the model's reply, after fences have been stripped.
///
/// # Errors
///
/// Returns [ExtractionError::InvalidJson] if `text` is not a JSON object with
/// a string `label` and an `amount` that is a number or a string holding one.
pub fn parse_extraction(text: &str) -> Result<ExtractedTransaction, ExtractionError> {
    serde_json::from_str(text).map_err(|error| ExtractionError::InvalidJson(error.to_string()))
}
