use std::{collections::HashSet, path::PathBuf, sync::Arc};

use clap::Args;
use log::{debug, info};
use moeloader_common::{
    cancel::CancelSource,
    item::{MediaVariant, ResultItem},
    query::{ImageOrder, SearchQuery},
};
use moeloader_core::{
    scheduler::TransportFetcher, FetchOutcome, MediaFetchScheduler, SearchSession, SessionError,
};
use moeloader_extractors::{extractor_config::SiteConfig, sites::SiteCapabilities};
use owo_colors::OwoColorize;
use tokio::fs;

use crate::{
    cli::{extra::open_site, output_dir},
    error::CliError,
    progress_bars::{FetchProgress, LogType},
};

#[derive(Debug, Args)]
pub struct TagSearch {
    /// Tags to search
    #[clap(value_parser, required = true)]
    pub tags: Vec<String>,

    /// Include explicit posts in the results
    #[clap(long, value_parser, default_value_t = false, help_heading = "GENERAL")]
    pub explicit: bool,

    /// Posts requested per page. Sites cap this at their own maximum.
    ///
    /// [max: 1000]
    #[clap(short, long, value_parser(clap::value_parser!(u16).range(1..=1000)), default_value_t = 60, help_heading = "GENERAL")]
    pub limit: u16,

    /// Number of pages to walk before stopping
    #[clap(short, long, value_parser(clap::value_parser!(u16).range(1..)), default_value_t = 1, help_heading = "GENERAL")]
    pub pages: u16,

    /// List the logged in account's favorites instead of the latest posts
    #[clap(long, value_parser, default_value_t = false, help_heading = "GENERAL")]
    pub favorites: bool,

    /// Sort by popularity on sites that support it
    #[clap(long, value_parser, default_value_t = false, help_heading = "GENERAL")]
    pub popular: bool,

    /// Load the original files instead of the previews
    #[clap(long, value_parser, default_value_t = false, help_heading = "SAVE")]
    pub original: bool,

    /// Number of simultaneous loads
    ///
    /// [max: 20]
    #[clap(
        short = 'd',
        value_name = "NUMBER",
        value_parser(clap::value_parser!(u8).range(1..=20)),
        default_value_t = 4,
        help_heading = "DOWNLOAD"
    )]
    pub simultaneous_downloads: u8,

    /// Where to save files (If the path doesn't exist, it will be created.)
    #[clap(short = 'o', value_name = "PATH", help_heading = "SAVE")]
    pub output: Option<PathBuf>,
}

/// Totals of one search run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchSummary {
    pub listed: usize,
    pub saved: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl TagSearch {
    /// Builds the query the way the site can take it: separate keywords where several are
    /// supported, one space-joined keyword otherwise.
    pub fn query(&self, caps: SiteCapabilities) -> SearchQuery {
        let query = if caps.contains(SiteCapabilities::MULTI_KEYWORDS) {
            let (first, rest) = self
                .tags
                .split_first()
                .map_or(("", &[][..]), |(f, r)| (f.as_str(), r));
            SearchQuery::new(first).with_extra_keywords(rest)
        } else {
            SearchQuery::new(self.tags.join(" "))
        };

        query
            .show_explicit(self.explicit)
            .page_size(self.limit)
            .menu_index(usize::from(self.favorites))
            .order(if self.popular {
                ImageOrder::Popular
            } else {
                ImageOrder::Date
            })
    }

    const fn variant(&self) -> MediaVariant {
        if self.original {
            MediaVariant::Original
        } else {
            MediaVariant::Thumbnail
        }
    }

    pub async fn run(&self, site: &SiteConfig) -> Result<SearchSummary, CliError> {
        let handle = open_site(site).await?;
        let query = self.query(handle.adapter.capabilities());
        debug!("Search query: {query:?}");

        let dest = output_dir(self.output.as_ref())?;
        fs::create_dir_all(&dest).await?;

        let session = SearchSession::new(handle.adapter.clone(), query);
        let (scheduler, mut events) = MediaFetchScheduler::new(
            Arc::new(TransportFetcher::new(handle.transport.clone())),
            usize::from(self.simultaneous_downloads),
            self.variant(),
        );
        let scheduler = Arc::new(scheduler);

        let source = Arc::new(CancelSource::new());
        let token = source.token();

        let ctrl_c = tokio::spawn({
            let scheduler = scheduler.clone();
            let source = source.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    source.cancel();
                    let stopped = scheduler.cancel_all();
                    info!("Interrupted, cancelled {stopped} loads");
                }
            }
        });

        let progress = FetchProgress::new(site.kind);
        let mut summary = SearchSummary::default();
        let mut task_ids = HashSet::new();

        for _ in 0..self.pages {
            let page = match session.fetch_next_page(&token).await {
                Ok(page) => page,
                Err(SessionError::Exhausted | SessionError::Cancelled) => break,
                Err(e) => {
                    ctrl_c.abort();
                    progress.done();
                    return Err(e.into());
                }
            };

            summary.listed += page.items.len();
            for item in page.items.iter().filter(|i| i.tip.is_some()) {
                progress.log_event(
                    LogType::Warning,
                    &format!("#{}", item.id),
                    item.tip.as_deref().unwrap_or_default(),
                );
            }

            let before = task_ids.len();
            task_ids.extend(scheduler.request_many(page.items).iter().map(|h| h.id()));
            progress.inc_total((task_ids.len() - before) as u64);

            if !session.has_more() {
                break;
            }
        }

        let mut finished = 0;
        while finished < task_ids.len() {
            let Some(event) = events.recv().await else {
                break;
            };
            finished += 1;
            progress.tick();

            let target = format!("#{}", event.item.id);
            match event.outcome {
                FetchOutcome::Done { payload, .. } => {
                    let name = file_name(&event.item, self.variant());
                    fs::write(dest.join(&name), &payload).await?;
                    summary.saved += 1;
                    debug!("Saved {name}");
                }
                FetchOutcome::Failed(e) => {
                    summary.failed += 1;
                    progress.log_event(LogType::Error, &target, &e.to_string());
                }
                FetchOutcome::Cancelled => {
                    summary.cancelled += 1;
                    progress.log_event(LogType::Skip, &target, "Cancelled.");
                }
            }
        }

        ctrl_c.abort();
        progress.done();

        Ok(summary)
    }
}

/// `{site}_{id}.{ext}`, the extension taken from the URL the scheduler loads.
pub fn file_name(item: &ResultItem, variant: MediaVariant) -> String {
    let url = item
        .url(variant)
        .or_else(|| item.loadable_url().map(|(_, url)| url))
        .map_or("", |url| url.url.as_str());

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5)
        .unwrap_or("jpg");

    format!("{}_{}.{}", item.site, item.id, ext.to_lowercase())
}

pub fn print_summary(summary: &SearchSummary) {
    println!(
        "{} {} {}",
        summary.listed.to_string().bold().blue(),
        "posts".bold().blue(),
        "listed".bold()
    );
    println!(
        "{} {} {}",
        summary.saved.to_string().bold().blue(),
        "files".bold().blue(),
        "saved".bold()
    );

    if summary.failed > 0 {
        println!(
            "{} {}",
            summary.failed.to_string().bold().red(),
            "files failed to load.".bold().red()
        );
    }

    if summary.cancelled > 0 {
        println!(
            "{} {}",
            summary.cancelled.to_string().bold().yellow(),
            "loads were cancelled.".bold().yellow()
        );
    }
}
