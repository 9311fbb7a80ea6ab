//! Query command.

use console::style;

use crate::cli::helpers::{
    language_code_in_settings, language_code_in_table, load_table_or_hint, open_catalog,
};
use crate::config::Settings;

/// Print the top movies for a language and genre from the saved table.
pub async fn cmd_query(settings: &Settings, language: &str, genre: &str) -> anyhow::Result<()> {
    let catalog = open_catalog(settings)?;
    let Some(table) = load_table_or_hint(&catalog)? else {
        return Ok(());
    };

    // Offline lookups first; the live list is only needed for names that
    // appear in neither the table nor the config.
    let code = match language_code_in_table(&table, language)
        .or_else(|| language_code_in_settings(settings, language))
    {
        Some(code) => code,
        None => {
            let index = catalog.list_available_languages().await?;
            match index.resolve(language) {
                Some(code) => code.to_string(),
                None => anyhow::bail!("Unknown language: {}", language),
            }
        }
    };

    let results = catalog.query(&table, &code, genre);
    if results.is_empty() {
        println!(
            "{} No titles found for the selected language and genre combination in the collected data.",
            style("!").yellow()
        );
        println!("  Try collecting more data using 'reelscout crawl' or choose different criteria.");
        return Ok(());
    }

    for (i, record) in results.iter().enumerate() {
        println!("{}. {}", i + 1, record.title);
    }

    Ok(())
}
