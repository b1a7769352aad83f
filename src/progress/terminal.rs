//! Progress display on the terminal
//!
//! Task events become styled status lines; downloads get an indicatif bar.

use std::sync::{Mutex, PoisonError};

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use super::{DownloadProgress, DownloadSink, EventKind, ProgressEvent, ProgressSink};

/// Progress display for installations
pub struct TerminalProgress {
    /// Bar of the download currently in flight
    download_pb: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            download_pb: Mutex::new(None),
            quiet,
        }
    }

    fn new_download_bar(total: Option<u64>) -> ProgressBar {
        match total {
            Some(total) => {
                let pb = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("  [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {bytes} {msg}")
                {
                    pb.set_style(style);
                }
                pb
            }
        }
    }

    /// Shorten long URLs for display
    fn display_url(url: &str) -> String {
        if url.len() > 50 {
            let tail: String = url
                .chars()
                .rev()
                .take(47)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{tail}")
        } else {
            url.to_string()
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event.kind {
            EventKind::Begin => {
                let style = Style::new().cyan().bold();
                eprintln!("{} {}", style.apply_to("==>"), event.name);
            }
            EventKind::Message => {
                eprintln!("    {}", event.message);
            }
            EventKind::Complete => {
                let style = Style::new().green().bold();
                println!("{} {}", style.apply_to("✓"), event.message);
            }
        }
    }
}

impl DownloadSink for TerminalProgress {
    fn on_progress(&self, update: DownloadProgress) {
        if self.quiet {
            return;
        }

        let mut slot = self
            .download_pb
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let pb = slot.get_or_insert_with(|| {
            let pb = Self::new_download_bar(update.total);
            pb.set_message(Self::display_url(&update.url));
            pb
        });

        pb.set_position(update.downloaded);
        if update.completed {
            pb.finish_and_clear();
            *slot = None;
        }
    }
}
