/// The ways that turning free text into a transaction can fail.
///
/// None of these are shown to the user. They are logged and the user is
/// asked to try again.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ExtractionError {
    /// No API key was configured for the completion provider.
    #[error("AI extraction is not configured")]
    NotConfigured,

    /// The request to the provider failed, e.g. a connection error or a non-2xx status.
    #[error("the completion request failed: {0}")]
    Request(String),

    /// The provider did not answer within the configured timeout.
    #[error("the completion request timed out")]
    Timeout,

    /// The provider answered, but not in the chat-completions format.
    #[error("the completion response was malformed: {0}")]
    MalformedResponse(String),

    /// The model's reply was not the JSON object it was asked for.
    #[error("the model replied with invalid JSON: {0}")]
    InvalidJson(String),

    /// The reply parsed, but the label or amount cannot be saved.
    #[error("the model replied with unusable values: {0}")]
    InvalidValues(String),
}
