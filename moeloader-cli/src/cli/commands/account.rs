use clap::Args;
use log::info;
use moeloader_extractors::{extractor_config::SiteConfig, sites::Credential};
use owo_colors::OwoColorize;

use crate::{
    cli::extra::{open_site, parse_cookie},
    error::CliError,
};

#[derive(Debug, Args)]
pub struct Login {
    /// Access token copied from a logged in browser session
    #[clap(long, value_parser, conflicts_with = "cookie")]
    pub token: Option<String>,

    /// Login cookie as NAME=VALUE. Can be repeated
    #[clap(long, value_parser)]
    pub cookie: Vec<String>,
}

impl Login {
    pub fn credential(&self) -> Result<Credential, CliError> {
        if let Some(token) = &self.token {
            return Ok(Credential::Token(token.clone()));
        }

        if self.cookie.is_empty() {
            return Err(CliError::MissingCredential);
        }

        let cookies = self
            .cookie
            .iter()
            .map(|c| parse_cookie(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Credential::Cookies(cookies))
    }

    pub async fn run(&self, site: &SiteConfig) -> Result<(), CliError> {
        let credential = self.credential()?;
        let handle = open_site(site).await?;

        handle.adapter.authenticate(credential).await?;
        info!("Stored credential for {}", site.name);

        println!(
            "{} {}",
            "Logged in to".bold(),
            site.pretty_name.bold().green()
        );
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct Logout {}

impl Logout {
    pub async fn run(&self, site: &SiteConfig) -> Result<(), CliError> {
        let handle = open_site(site).await?;
        handle.adapter.logout().await?;

        println!(
            "{} {}",
            "Logged out of".bold(),
            site.pretty_name.bold().green()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use moeloader_extractors::sites::Credential;

    use super::Login;
    use crate::error::CliError;

    #[test]
    fn token_wins_over_cookies() {
        let login = Login {
            token: Some("abc".into()),
            cookie: vec![],
        };
        assert!(matches!(login.credential().unwrap(), Credential::Token(t) if t == "abc"));
    }

    #[test]
    fn cookies_are_split() {
        let login = Login {
            token: None,
            cookie: vec!["accessToken=xyz".into(), "other=1".into()],
        };

        let Credential::Cookies(cookies) = login.credential().unwrap() else {
            panic!("expected cookies");
        };
        assert_eq!(cookies[0], ("accessToken".to_string(), "xyz".to_string()));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn nothing_given() {
        let login = Login {
            token: None,
            cookie: vec![],
        };
        assert!(matches!(login.credential(), Err(CliError::MissingCredential)));
    }
}
