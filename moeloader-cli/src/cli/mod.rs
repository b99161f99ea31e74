use moeloader_extractors::extractor_config::SiteConfig;
use once_cell::sync::OnceCell;
use std::{collections::HashMap, path::PathBuf};

use clap::{Parser, Subcommand};

use self::{
    commands::{
        account::{Login, Logout},
        search::TagSearch,
        suggest::Suggest,
    },
    extra::validate_site,
};

pub mod commands;
pub mod extra;

pub static AVAILABLE_SITES: OnceCell<HashMap<String, SiteConfig>> = OnceCell::new();

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search posts with tags and load their previews
    Search(TagSearch),
    /// Complete a partial tag
    Suggest(Suggest),
    /// Store an access token or cookie for the selected site
    Login(Login),
    /// Forget the stored credential of the selected site
    Logout(Logout),
    /// Print all available sites and exit
    Sites,
}

#[derive(Parser, Debug)]
#[clap(name = "moeloader", author, version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub mode: Commands,

    /// Specify which site to talk to
    ///
    /// Default sites include: ["konachan", "yandere", "sankaku-chan"]
    #[clap(short, long, ignore_case = true, default_value_t = SiteConfig::default(), global = true, value_parser = validate_site)]
    pub site: SiteConfig,

    /// Print more log output. Repeat for more detail
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Cli {
    pub const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Where loaded files go. Falls back to the current dir.
pub fn output_dir(output: Option<&PathBuf>) -> Result<PathBuf, std::io::Error> {
    output.map_or_else(std::env::current_dir, |path| Ok(path.clone()))
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn parses_search() {
        let cli = Cli::try_parse_from([
            "moeloader",
            "-vv",
            "--site",
            "yandere",
            "search",
            "blue_sky",
            "cloud",
            "--explicit",
            "--limit",
            "20",
        ])
        .unwrap();

        assert_eq!(cli.site.name, "yandere");
        assert_eq!(cli.log_filter(), "debug");

        let Commands::Search(args) = cli.mode else {
            panic!("expected search");
        };
        assert_eq!(args.tags, vec!["blue_sky", "cloud"]);
        assert!(args.explicit);
        assert_eq!(args.limit, 20);
        assert_eq!(args.pages, 1);
    }

    #[test]
    fn rejects_unknown_site() {
        assert!(Cli::try_parse_from(["moeloader", "--site", "nowhere", "sites"]).is_err());
    }

    #[test]
    fn defaults_to_konachan() {
        let cli = Cli::try_parse_from(["moeloader", "suggest", "blu"]).unwrap();
        assert_eq!(cli.site.name, "konachan");
        assert_eq!(cli.log_filter(), "warn");
    }
}
