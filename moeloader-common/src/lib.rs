use std::{
    env,
    fmt::Display,
    fs::create_dir_all,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

// Public Exports
pub use bytes;
pub use chrono;
pub use directories;
pub use log;
pub use reqwest;
pub use serde;
pub use serde_json;
pub use tokio;

use directories::ProjectDirs;

use log::debug;

use serde::{Deserialize, Serialize};

pub mod cancel;
pub mod item;
pub mod macros;
pub mod query;

/// API families a site adapter can speak.
///
/// Several sites can share a family (e.g. `konachan` and `yande.re` are both Moebooru), so the
/// concrete site is always identified by its configured name, never by this enum alone.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteKind {
    /// Page-number based JSON API used by ```https://konachan.com``` and ```https://yande.re```.
    Moebooru,
    /// Keyset (cursor) based API used by ```https://chan.sankakucomplex.com```.
    Sankaku,
}

impl Display for SiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Moebooru => write!(f, "moebooru"),
            Self::Sankaku => write!(f, "sankaku"),
        }
    }
}

impl FromStr for SiteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "moebooru" | "konachan" => Ok(Self::Moebooru),
            "sankaku" | "sankakucomplex" => Ok(Self::Sankaku),
            other => Err(format!("unknown site kind: {other}")),
        }
    }
}

impl SiteKind {
    /// User agent sent by every request issued for this family.
    ///
    /// It will always follow the version declared inside ```Cargo.toml```
    #[inline]
    pub fn user_agent(self) -> String {
        let app_name = "moeloader";
        let ua = match self {
            Self::Moebooru => format!("{}/{}", app_name, env!("CARGO_PKG_VERSION")),
            // The keyset API rejects unknown clients, so it gets a browser-like prefix.
            Self::Sankaku => format!(
                "Mozilla/5.0 (compatible; {}/{})",
                app_name,
                env!("CARGO_PKG_VERSION")
            ),
        };
        debug!("Using user-agent: {}", ua);
        ua
    }
}

/// Returns a `PathBuf` pointing to the directory holding site settings and `sites.toml`.
///
/// This is XDG-compliant and resolves to `$XDG_CONFIG_HOME/moeloader` on Linux or
/// `%APPDATA%/moeloader/moeloader` on Windows.
///
/// Or you can set the env var `MOELOADER_CONFIG_DIR` to point it to a custom location.
pub fn config_dir() -> Result<PathBuf, io::Error> {
    let cfg_path = match env::var("MOELOADER_CONFIG_DIR") {
        Ok(path) => PathBuf::from(path),
        Err(_) => ProjectDirs::from("org", "moeloader", "moeloader")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory found"))?,
    };

    let cfold = Path::new(&cfg_path);

    if !cfold.exists() {
        create_dir_all(cfold)?;
    }

    Ok(cfold.to_path_buf())
}
