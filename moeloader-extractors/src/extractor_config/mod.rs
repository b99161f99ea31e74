//! Static description of every site the adapters can talk to.
//!
//! The built-in sites live in [`DEFAULT_SITES`]. Users can add or override entries through a
//! `sites.toml` file, see [`serialize::read_site_cfg_file`].
use moeloader_common::serde::{self, Deserialize, Serialize};
use moeloader_common::SiteKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Display;
use std::io;
use thiserror::Error;

use crate::site_config;

pub mod macros;
pub mod serialize;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access site config file: {source}")]
    ConfigIOError {
        #[from]
        source: io::Error,
    },

    #[error("Failed to parse site config file: {source}")]
    ConfigParseError {
        #[from]
        source: toml::de::Error,
    },

    #[error("Site {site} uses an unknown API kind: {kind}")]
    UnknownKind { site: String, kind: String },
}

pub static DEFAULT_SITES: Lazy<HashMap<String, SiteConfig>> = Lazy::new(|| {
    let mut hmap = HashMap::with_capacity(3);
    hmap.insert(
        "konachan".to_string(),
        site_config!(
            "konachan",
            "Konachan",
            SiteKind::Moebooru,
            "https://konachan.com",
            Some(String::from("https://konachan.net")),
            "https://konachan.com",
            None,
            None,
            100
        ),
    );
    hmap.insert(
        "yandere".to_string(),
        site_config!(
            "yandere",
            "yande.re",
            SiteKind::Moebooru,
            "https://yande.re",
            None,
            "https://yande.re",
            None,
            None,
            100
        ),
    );
    hmap.insert(
        "sankaku-chan".to_string(),
        site_config!(
            "sankaku-chan",
            "SankakuComplex[Chan]",
            SiteKind::Sankaku,
            "https://chan.sankakucomplex.com",
            None,
            "https://capi-v2.sankakucomplex.com",
            Some(String::from("https://beta.sankakucomplex.com")),
            Some(String::from("https://beta.sankakucomplex.com/home")),
            100
        ),
    );
    hmap
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SiteConfig {
    /// Registry key and settings file name.
    pub name: String,
    pub pretty_name: String,
    pub kind: SiteKind,
    pub user_agent: String,
    /// Public site root, used for detail page links.
    pub base_url: String,
    /// Root of a filtered mirror used when explicit content is hidden.
    pub safe_base_url: Option<String>,
    /// Root of the JSON API.
    pub api_url: String,
    /// Front-end the API expects as referer and cookie origin.
    pub beta_url: Option<String>,
    /// Page where an external login flow obtains credentials.
    pub login_url: Option<String>,
    pub max_page_size: u16,
}

impl SiteConfig {
    /// Root to list posts from, honoring the safe mirror when explicit content is hidden.
    pub fn listing_root(&self, show_explicit: bool) -> &str {
        match &self.safe_base_url {
            Some(safe) if !show_explicit => safe,
            _ => &self.base_url,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        site_config!(
            "konachan",
            "Konachan",
            SiteKind::Moebooru,
            "https://konachan.com",
            Some(String::from("https://konachan.net")),
            "https://konachan.com",
            None,
            None,
            100
        )
    }
}

impl Display for SiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
