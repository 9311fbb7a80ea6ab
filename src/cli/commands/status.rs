//! Status command.

use std::collections::BTreeSet;

use console::style;

use crate::cli::helpers::{load_table_or_hint, open_catalog};
use crate::config::Settings;

/// Show the table location and a summary of its contents.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let catalog = open_catalog(settings)?;

    println!("{}", style("reelscout status").bold());
    println!("  Table:     {}", catalog.store().path().display());
    println!(
        "  API key:   {}",
        if settings.api_key.is_some() {
            style("configured").green()
        } else {
            style("missing (set TMDB_API_KEY)").yellow()
        }
    );
    println!(
        "  Crawl:     {} languages x {} pages",
        settings.languages.len(),
        catalog.pages_per_partition()
    );

    let Some(table) = load_table_or_hint(&catalog)? else {
        return Ok(());
    };

    let languages: BTreeSet<&str> = table
        .iter()
        .map(|r| r.fetched_partition_name.as_str())
        .collect();
    let genres: BTreeSet<&str> = table
        .iter()
        .flat_map(|r| r.category_names.iter().map(String::as_str))
        .collect();

    println!("  Movies:    {}", table.len());
    println!("  Languages: {}", languages.len());
    println!("  Genres:    {}", genres.len());
    Ok(())
}
