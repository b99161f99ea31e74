use moeloader_common::{
    log::debug,
    serde::{self, Deserialize},
    SiteKind,
};
use std::{collections::HashMap, fs::read_to_string, io::Write, str::FromStr};
use std::{fs::File, path::Path};

use super::{ConfigError, SiteConfig};

const SAMPLE_SITES_TOML: &str = include_str!("sample.toml");

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct Config {
    #[serde(default)]
    sites: HashMap<String, Site>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct Site {
    pretty_name: String,
    kind: String,
    base_url: String,
    safe_base_url: Option<String>,
    api_url: Option<String>,
    beta_url: Option<String>,
    login_url: Option<String>,
    max_page_size: Option<u16>,
}

/// Reads `sites.toml` into `smap`, writing a commented sample first if the file doesn't exist.
pub fn read_site_cfg_file(
    path: &Path,
    smap: &mut HashMap<String, SiteConfig>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        let mut sample_toml = File::create(path)?;
        sample_toml.write_all(SAMPLE_SITES_TOML.as_bytes())?;
    }

    let contents = read_to_string(path)?;
    parse_site_cfg(&contents, smap)
}

/// Parses a `sites.toml` document into `smap`, overriding entries with the same name.
pub fn parse_site_cfg(
    contents: &str,
    smap: &mut HashMap<String, SiteConfig>,
) -> Result<(), ConfigError> {
    let config: Config = toml::from_str(contents)?;

    for (id, data) in config.sites {
        let kind = SiteKind::from_str(&data.kind).map_err(|_| ConfigError::UnknownKind {
            site: id.clone(),
            kind: data.kind.clone(),
        })?;

        let config = SiteConfig {
            name: id.clone(),
            pretty_name: data.pretty_name,
            kind,
            user_agent: kind.user_agent(),
            api_url: data.api_url.unwrap_or_else(|| data.base_url.clone()),
            base_url: data.base_url,
            safe_base_url: data.safe_base_url,
            beta_url: data.beta_url,
            login_url: data.login_url,
            max_page_size: data.max_page_size.unwrap_or(100),
        };
        smap.insert(id, config);
    }

    debug!("Configured sites: {:?}", smap.keys());
    Ok(())
}
