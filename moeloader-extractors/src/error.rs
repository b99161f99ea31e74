use crate::settings::SettingsError;
use thiserror::Error;

/// Enumerates the possible errors that can arise while talking to a site.
///
/// Only failures of a whole request or of the payload root end up here. A single malformed field
/// inside an otherwise valid listing never does: it is mapped to its zero value instead.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// An error occurred during a network request (e.g., connection timeout, DNS resolution failure).
    /// Wraps an underlying `reqwest::Error`.
    #[error("Connection Error: {0}")]
    ConnectionError(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("Server returned status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// A payload arrived but its root is not the list/object this site returns.
    #[error("Site returned an unexpected response: {reason}")]
    ResponseShape { reason: String },

    /// The site wants a logged in account for this request.
    #[error("This request requires a logged in account: {reason}")]
    AuthRequired { reason: String },

    /// Login or logout was requested on a site without account support.
    #[error("This site does not support authentication.")]
    AuthUnsupported,

    /// The given credential doesn't contain what the site needs.
    #[error("Invalid credential: {reason}")]
    InvalidCredential { reason: String },

    /// The requested operation is not supported by the current site or its API.
    #[error("Unsupported operation for this site")]
    UnsupportedOperation,

    /// The caller cancelled the request before it finished.
    #[error("Request cancelled")]
    Cancelled,

    /// An error occurred while deserializing a JSON response from the site API.
    /// Wraps an underlying `serde_json::Error`.
    #[error("Error while deserializing JSON: {0}")]
    JsonSerializeFail(#[from] serde_json::Error),

    /// Reading or persisting the per-site settings failed.
    #[error("Site settings failure: {source}")]
    Settings {
        #[from]
        source: SettingsError,
    },

    /// No adapter is registered under the requested name.
    #[error("Unknown site: {name}")]
    UnknownSite { name: String },
}

impl ExtractorError {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        Self::ResponseShape {
            reason: reason.into(),
        }
    }

    /// Whether the error came from the caller cancelling, not from the site.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
