//! Catalog browsing commands
//!
//! Read a published catalog through the cached client and render it as
//! tables or JSON.

use anyhow::{Context, Result};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use templar_core::model::Template;
use templar_core::{CatalogClient, CatalogConfig};

/// Table row for search results
#[derive(Tabled)]
struct SearchResultRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Table row for category listings
#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Templates")]
    templates: usize,
    #[tabled(rename = "Description")]
    description: String,
}

/// Shorten `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

fn render<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

pub async fn execute_search(
    config: &CatalogConfig,
    query: Option<&str>,
    category: Option<&str>,
    json_output: bool,
    force_refresh: bool,
) -> Result<()> {
    let client = CatalogClient::from_config(config)?;

    if !json_output {
        if force_refresh {
            println!("Fetching catalog (refreshing cache)...");
        } else {
            println!("Fetching catalog...");
        }
    }
    let api = client
        .get_templates(!force_refresh)
        .await
        .with_context(|| format!("Failed to load catalog from {}", client.base_url()))?;

    let mut results: Vec<&Template> = api.search(query.unwrap_or_default());
    if let Some(category) = category {
        results.retain(|t| t.category == category);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("\nNo templates found.");
        return Ok(());
    }

    println!("\nFound {} template(s):\n", results.len());

    let rows: Vec<SearchResultRow> = results
        .iter()
        .map(|t| SearchResultRow {
            id: t.id.clone(),
            name: t.name.clone(),
            category: t.category.clone(),
            version: t.version.clone(),
            author: t.author.clone(),
            description: truncate(&t.description, 50),
        })
        .collect();

    println!("{}", render(&rows));
    Ok(())
}

pub async fn execute_list(config: &CatalogConfig, json_output: bool) -> Result<()> {
    let client = CatalogClient::from_config(config)?;
    let api = client
        .get_templates(true)
        .await
        .with_context(|| format!("Failed to load catalog from {}", client.base_url()))?;

    if json_output {
        let categories: Vec<serde_json::Value> = api
            .categories
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "name": c.name,
                    "description": c.description,
                    "templates": c.templates.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }

    println!(
        "Catalog updated {} ({} templates)\n",
        api.last_updated,
        api.template_count()
    );

    let rows: Vec<CategoryRow> = api
        .categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.clone(),
            name: c.name.clone(),
            templates: c.templates.len(),
            description: truncate(&c.description, 50),
        })
        .collect();

    println!("{}", render(&rows));
    Ok(())
}
