//! Site adapters that turn image board search APIs into one item model.

extern crate moeloader_common;

pub mod error;
pub mod extractor_config;
pub mod lenient;
pub mod prelude;
pub mod registry;
pub mod settings;
pub mod sites;
pub mod transport;

pub use crate::registry::SiteRegistry;
pub use crate::sites::{Category, Credential, SiteAdapter, SiteCapabilities, StarOutcome};
