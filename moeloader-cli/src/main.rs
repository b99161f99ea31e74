#![deny(clippy::all)]
use clap::Parser;
use color_eyre::eyre::Result;
use owo_colors::OwoColorize;
use moeloader_cli::cli::{
    commands::{search::print_summary, suggest::print_suggestions},
    extra::{get_sites, open_site},
    Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .format_timestamp(None)
        .init();
    color_eyre::install()?;

    match &args.mode {
        Commands::Search(com) => {
            let summary = com.run(&args.site).await?;
            print_summary(&summary);
        }
        Commands::Suggest(com) => {
            let items = com.run(&args.site).await?;
            print_suggestions(&items);
        }
        Commands::Login(com) => com.run(&args.site).await?,
        Commands::Logout(com) => com.run(&args.site).await?,
        Commands::Sites => print_sites().await,
    }

    Ok(())
}

async fn print_sites() {
    println!(
        "{}\n----------------",
        "Available Sites:".underline().bold().blue()
    );

    let mut sites: Vec<_> = get_sites().values().collect();
    sites.sort_by(|a, b| a.name.cmp(&b.name));

    for data in sites {
        let features = match open_site(data).await {
            Ok(handle) => {
                let caps = handle.adapter.capabilities();
                let mut features: Vec<&str> = caps.iter_names().map(|(name, _)| name).collect();
                if handle.adapter.is_authenticated() {
                    features.push("LOGGED_IN");
                }
                features
            }
            Err(e) => {
                log::warn!("Could not open {}: {e}", data.name);
                Vec::new()
            }
        };

        println!(
            "{:<16} - {}:\n - {} {}\n - {} {}\n - {} {}\n - {} {:?}\n",
            format!("[{}]", data.name),
            data.pretty_name.bold().green(),
            "API Type:".bold().blue(),
            data.kind.to_string().bold().purple().underline(),
            "Base URL:".bold().blue(),
            data.base_url.bold().purple().underline(),
            "Max Page Size:".bold().blue(),
            data.max_page_size.bold().yellow(),
            "Available features:".bold().blue(),
            features,
        );
    }
}
