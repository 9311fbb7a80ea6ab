//! Crawl command.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::helpers::open_catalog;
use crate::config::Settings;
use crate::crawler::Progress;
use crate::store::SaveOutcome;

/// Collect movies for every configured language and replace the table.
pub async fn cmd_crawl(settings: &Settings, pages: Option<u32>) -> anyhow::Result<()> {
    let mut catalog = open_catalog(settings)?;
    if let Some(pages) = pages {
        catalog.set_pages_per_partition(pages);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let (progress, mut messages) = Progress::channel();
    let handle = catalog.start_crawl(progress);

    // The channel closes when the crawl task drops its sender.
    while let Some(message) = messages.recv().await {
        if message.starts_with("  ") {
            pb.set_message(message.trim_start().to_string());
        } else {
            pb.println(message);
        }
    }
    pb.finish_and_clear();

    let report = handle.await?;
    match report.saved {
        SaveOutcome::Written { path, rows } => {
            println!(
                "{} Collected {} unique movies across {} languages",
                style("✓").green(),
                rows,
                report.outcome.partitions
            );
            if report.outcome.pages_failed > 0 {
                println!(
                    "  {} {} pages could not be fetched",
                    style("!").yellow(),
                    report.outcome.pages_failed
                );
            }
            println!("  {} Saved to {}", style("→").dim(), path.display());
        }
        SaveOutcome::Skipped => {
            println!(
                "{} No movie data collected; existing table left unchanged",
                style("!").yellow()
            );
        }
    }

    Ok(())
}
