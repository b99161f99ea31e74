use clap::Args;
use moeloader_common::{cancel::CancelToken, item::SuggestItem};
use moeloader_extractors::extractor_config::SiteConfig;
use owo_colors::OwoColorize;

use crate::{cli::extra::open_site, error::CliError};

#[derive(Debug, Args)]
pub struct Suggest {
    /// Beginning of the tag to complete
    #[clap(value_parser)]
    pub partial: String,
}

impl Suggest {
    pub async fn run(&self, site: &SiteConfig) -> Result<Vec<SuggestItem>, CliError> {
        let handle = open_site(site).await?;
        Ok(handle
            .adapter
            .suggest(&self.partial, &CancelToken::never())
            .await?)
    }
}

pub fn print_suggestions(items: &[SuggestItem]) {
    if items.is_empty() {
        println!("{}", "No matching tags".bold().yellow());
        return;
    }

    for item in items {
        println!(
            "{:<32} {}",
            item.word.bold().green(),
            item.count.to_string().blue()
        );
    }
}
