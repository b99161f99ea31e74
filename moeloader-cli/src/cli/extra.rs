use std::{collections::HashMap, sync::Arc};

use log::{debug, warn};
use moeloader_common::config_dir;
use moeloader_extractors::{
    extractor_config::{serialize::read_site_cfg_file, SiteConfig, DEFAULT_SITES},
    registry::build_adapter,
    settings::SiteSettings,
    sites::SiteAdapter,
    transport::HttpTransport,
};

use super::AVAILABLE_SITES;
use crate::error::CliError;

/// Built-in sites plus whatever `sites.toml` in the config dir adds or overrides.
///
/// A broken `sites.toml` is reported and skipped, leaving the built-in list usable.
pub fn get_sites<'a>() -> &'a HashMap<String, SiteConfig> {
    AVAILABLE_SITES.get_or_init(|| {
        let mut sites = DEFAULT_SITES.clone();

        match config_dir() {
            Ok(dir) => {
                if let Err(e) = read_site_cfg_file(&dir.join("sites.toml"), &mut sites) {
                    warn!("Ignoring custom sites: {e}");
                }
            }
            Err(e) => warn!("No config dir available: {e}"),
        }

        sites
    })
}

pub fn validate_site(input: &str) -> Result<SiteConfig, String> {
    let sites = get_sites();

    sites.get(input).map_or_else(
        || {
            let mut names: Vec<&String> = sites.keys().collect();
            names.sort();
            Err(format!(
                "Invalid site: {input}. Allowed sites are: {names:?}"
            ))
        },
        |site| Ok(site.clone()),
    )
}

/// Everything a command needs to talk to one site.
pub struct SiteHandle {
    pub adapter: Arc<dyn SiteAdapter>,
    pub transport: Arc<HttpTransport>,
}

/// Builds the adapter for `config` with its persisted settings.
pub async fn open_site(config: &SiteConfig) -> Result<SiteHandle, CliError> {
    let dir = config_dir()?;
    let settings = SiteSettings::open(&config.name, &dir)
        .await
        .map_err(moeloader_extractors::error::ExtractorError::from)?;
    let transport = Arc::new(HttpTransport::new(&config.user_agent)?);

    let adapter = build_adapter(config.clone(), transport.clone(), Arc::new(settings))?;
    debug!(
        "Opened {} (logged in: {})",
        adapter.site(),
        adapter.is_authenticated()
    );

    Ok(SiteHandle { adapter, transport })
}

/// Splits a `NAME=VALUE` cookie argument.
pub fn parse_cookie(input: &str) -> Result<(String, String), CliError> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(CliError::InvalidCookie {
            input: input.to_string(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::parse_cookie;
    use crate::error::CliError;

    #[test]
    fn cookie_arguments() {
        assert_eq!(
            parse_cookie("accessToken=abc=def").unwrap(),
            ("accessToken".to_string(), "abc=def".to_string())
        );
        assert!(matches!(
            parse_cookie("=abc"),
            Err(CliError::InvalidCookie { .. })
        ));
        assert!(parse_cookie("novalue").is_err());
    }
}
