use std::io;

use moeloader_core::error::SessionError;
use moeloader_extractors::{error::ExtractorError, extractor_config::ConfigError};
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Site request failed: {source}")]
    ExtractorFail {
        #[from]
        source: ExtractorError,
    },

    #[error("Search failed: {source}")]
    SessionFail {
        #[from]
        source: SessionError,
    },

    #[error("Failed to read site config: {source}")]
    SiteConfigFail {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to access file: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("Invalid cookie '{input}', expected NAME=VALUE")]
    InvalidCookie { input: String },

    #[error("Nothing to log in with. Pass --token or --cookie")]
    MissingCredential,
}
