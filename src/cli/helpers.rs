//! Shared helper functions for CLI commands.

use console::style;

use crate::config::Settings;
use crate::models::Record;
use crate::service::Catalog;

/// Build the TMDb-backed catalog for a command.
pub fn open_catalog(settings: &Settings) -> anyhow::Result<Catalog> {
    Ok(Catalog::from_settings(settings)?)
}

/// Load the table, printing a hint when nothing has been collected yet.
pub fn load_table_or_hint(catalog: &Catalog) -> anyhow::Result<Option<Vec<Record>>> {
    let table = catalog.load_table()?;
    if table.is_none() {
        println!(
            "{} No data loaded from {}",
            style("!").yellow(),
            catalog.store().path().display()
        );
        println!(
            "  {} Run 'reelscout crawl' to collect movies first",
            style("→").dim()
        );
    }
    Ok(table)
}

/// Find a language code in the table by code or by name, ignoring case.
pub fn language_code_in_table(table: &[Record], language: &str) -> Option<String> {
    let wanted = language.trim();
    table
        .iter()
        .find(|r| {
            r.fetched_partition_code.eq_ignore_ascii_case(wanted)
                || r.fetched_partition_name.eq_ignore_ascii_case(wanted)
        })
        .map(|r| r.fetched_partition_code.clone())
}

/// Find a language code among the configured languages by code or name.
pub fn language_code_in_settings(settings: &Settings, language: &str) -> Option<String> {
    let wanted = language.trim();
    settings
        .languages
        .iter()
        .find(|p| p.code.eq_ignore_ascii_case(wanted) || p.name.eq_ignore_ascii_case(wanted))
        .map(|p| p.code.clone())
}
