//! Saved-listing commands.

use clap::Subcommand;
use console::style;
use uuid::Uuid;

use rt_core::config::ConfigHandle;
use rt_core::error::RtResult;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum SavedAction {
    /// List your saved listings.
    List,
    /// Save a listing.
    Add { listing_id: Uuid },
    /// Remove a saved listing.
    Remove { listing_id: Uuid },
    /// Check whether a listing is saved.
    Check { listing_id: Uuid },
}

pub async fn run(config: ConfigHandle, action: SavedAction, format: OutputFormat) -> RtResult<()> {
    let app = super::connect(&config).await?;

    match action {
        SavedAction::List => {
            let saved = app.saved_listings.get_saved_listings().await?;
            if let OutputFormat::Json = format {
                return super::print_json(&saved);
            }
            if saved.is_empty() {
                println!("No saved listings.");
                return Ok(());
            }
            let mut table = super::new_table(vec!["Title", "Rent", "Host", "Saved", "Listing id"]);
            for s in &saved {
                let (title, rent) = match &s.listing {
                    Some(l) => (super::truncate(&l.title, 32), super::format_rent(l.monthly_rent)),
                    None => ("-".to_string(), "-".to_string()),
                };
                let host = s
                    .homeowner
                    .as_ref()
                    .and_then(|o| o.homeowner.as_ref())
                    .map(|p| p.display_name())
                    .unwrap_or_else(|| "-".into());
                let when = s
                    .created_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".into());
                table.add_row(vec![title, rent, host, when, s.listing_id.to_string()]);
            }
            println!("{table}");
        }
        SavedAction::Add { listing_id } => {
            let saved = app.saved_listings.save_listing(listing_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&saved)?,
                OutputFormat::Text => println!("{} Saved.", style("OK").green().bold()),
            }
        }
        SavedAction::Remove { listing_id } => {
            app.saved_listings.unsave_listing(listing_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "removed": listing_id }))?,
                OutputFormat::Text => println!("Removed."),
            }
        }
        SavedAction::Check { listing_id } => {
            let saved = app.saved_listings.is_listing_saved(listing_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "saved": saved }))?,
                OutputFormat::Text => println!("{}", if saved { "saved" } else { "not saved" }),
            }
        }
    }

    Ok(())
}
