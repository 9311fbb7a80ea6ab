//! Genre and language listing commands.

use console::style;

use crate::cli::helpers::open_catalog;
use crate::config::Settings;

/// List genres from the saved table, or the live genre list when it has none.
pub async fn cmd_genres(settings: &Settings) -> anyhow::Result<()> {
    let catalog = open_catalog(settings)?;
    let table = catalog.load_table()?;

    let genres = catalog.list_available_categories(table.as_deref()).await?;
    if genres.is_empty() {
        println!("{} No genres available", style("!").yellow());
        return Ok(());
    }

    for genre in &genres {
        println!("{}", genre);
    }
    Ok(())
}

/// List languages known to TMDb with their codes.
pub async fn cmd_languages(settings: &Settings) -> anyhow::Result<()> {
    let catalog = open_catalog(settings)?;
    let index = catalog.list_available_languages().await?;

    if index.is_empty() {
        println!("{} No languages available", style("!").yellow());
        return Ok(());
    }

    let default = index.default_name();
    for name in index.names() {
        let code = index.resolve(name).unwrap_or_default();
        let marker = if Some(name.as_str()) == default { "*" } else { " " };
        println!("{} {:<32} {}", marker, name, style(code).dim());
    }
    Ok(())
}
