use moeloader_extractors::error::ExtractorError;
use thiserror::Error;

/// Why a page fetch was rejected or failed. The session is left untouched in every case.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Another page fetch of the same session is still running.
    #[error("A page fetch is already in progress for this session")]
    Busy,

    /// The site reported that the last page was already returned.
    #[error("No more pages for this search")]
    Exhausted,

    #[error("Page fetch cancelled")]
    Cancelled,

    #[error(transparent)]
    Extractor(ExtractorError),
}

impl From<ExtractorError> for SessionError {
    fn from(value: ExtractorError) -> Self {
        if value.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Extractor(value)
        }
    }
}

/// A media load that ended without a payload. Cancellation is not a failure and is reported
/// through its own event.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Item {site}#{id} has no thumbnail or medium url")]
    NoMediaUrl { site: String, id: u64 },

    #[error("Failed to fetch media: {0}")]
    Request(#[from] ExtractorError),
}
