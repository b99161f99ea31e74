use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use moeloader_common::SiteKind;
use owo_colors::OwoColorize;
use std::{fmt::Write, time::Duration};

const PROGRESS_CHARS: &str = "━━";

/// How a line printed above the bar is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Info,
    Success,
    Skip,
    Warning,
    Error,
}

struct BarTemplate(&'static str);

impl BarTemplate {
    /// Returns special-themed progress bar templates for each API family
    #[inline]
    const fn new(kind: SiteKind) -> Self {
        match kind {
            SiteKind::Sankaku => Self(
                "{spinner:.yellow.bold} {elapsed_precise:.bold} {wide_bar:.yellow/white.dim} {percent:.bold}  {pos:.yellow} ({files_sec:.blue})",
            ),
            SiteKind::Moebooru => Self(
                "{spinner:.green.bold} {elapsed_precise:.bold} {wide_bar:.green/white.dim} {percent:.bold}  {pos:.green} ({files_sec:.blue})",
            ),
        }
    }
}

/// Progress display of one search run: a single bar counting finished loads.
#[derive(Debug)]
pub struct FetchProgress {
    main_bar: ProgressBar,
}

impl FetchProgress {
    pub fn new(kind: SiteKind) -> Self {
        let bar = ProgressBar::new(0).with_style(master_progress_style(&BarTemplate::new(kind)));
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { main_bar: bar }
    }

    pub fn inc_total(&self, delta: u64) {
        self.main_bar.inc_length(delta);
    }

    pub fn tick(&self) {
        self.main_bar.inc(1);
    }

    pub fn done(&self) {
        self.main_bar.finish_and_clear();
    }

    pub fn log_event(&self, log_type: LogType, target: &str, message: &str) {
        let formatted_message = match log_type {
            LogType::Info => format!("{} {}", target.bold(), message),
            LogType::Success => format!("{} {}", target.blue().italic(), message.green().bold()),
            LogType::Skip => format!(
                "{} {} {}",
                target.blue().italic(),
                message.green().bold(),
                "Skipping...".green().bold()
            ),
            LogType::Warning => format!(
                "{} {} {}",
                target.blue().italic(),
                message.yellow().bold(),
                "Warning.".yellow().bold()
            ),
            LogType::Error => format!(
                "{} {} {}",
                target.blue().italic(),
                message.red().bold(),
                "Error.".red().bold()
            ),
        };

        self.main_bar.println(formatted_message);
    }
}

fn master_progress_style(template: &BarTemplate) -> ProgressStyle {
    ProgressStyle::with_template(template.0)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("pos", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{}/{}", state.pos(), state.len().unwrap_or(0));
        })
        .with_key("percent", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:>3.0}%", state.fraction() * 100_f32);
        })
        .with_key(
            "files_sec",
            |state: &ProgressState, w: &mut dyn Write| {
                let _ = match state.per_sec() {
                    files_sec if files_sec.abs() < f64::EPSILON => write!(w, "0 files/s"),
                    files_sec if files_sec < 1.0 => write!(w, "{:.2} s/file", 1.0 / files_sec),
                    files_sec => write!(w, "{files_sec:.2} files/s"),
                };
            },
        )
        .progress_chars(PROGRESS_CHARS)
}
