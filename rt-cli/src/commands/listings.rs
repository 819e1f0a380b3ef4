//! Listing commands.

use clap::Subcommand;
use console::style;
use uuid::Uuid;

use rt_core::config::ConfigHandle;
use rt_core::error::{RtError, RtResult};
use rt_models::{Listing, ListingFilters, ListingUpdate, NewListing};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ListingsAction {
    /// Search active listings.
    List {
        /// Only listings near this university.
        #[arg(short, long)]
        university: Option<String>,
        /// Maximum monthly rent (inclusive).
        #[arg(short, long)]
        max_price: Option<f64>,
        /// Only listings with (true) or without (false) a help discount.
        #[arg(long)]
        help_discount: Option<bool>,
    },
    /// Show one listing. Counts as a view.
    Get {
        id: Uuid,
        /// Do not count this as a view.
        #[arg(long)]
        no_view: bool,
    },
    /// List your own listings.
    Mine,
    /// Create a listing.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        rent: f64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        room_type: Option<String>,
        #[arg(long)]
        bathroom_type: Option<String>,
        #[arg(long)]
        university: Option<String>,
        /// Monthly discount offered for help around the house.
        #[arg(long)]
        help_discount: Option<f64>,
        /// Kinds of help wanted (repeatable).
        #[arg(long = "help-type")]
        help_types: Vec<String>,
        /// Amenities (repeatable).
        #[arg(long = "amenity")]
        amenities: Vec<String>,
    },
    /// Change a listing. Only the given fields change.
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        rent: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        help_discount: Option<f64>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a listing.
    Delete { id: Uuid },
    /// View and application totals for a homeowner (default: you).
    Stats { homeowner_id: Option<Uuid> },
}

pub async fn run(config: ConfigHandle, action: ListingsAction, format: OutputFormat) -> RtResult<()> {
    let app = super::connect(&config).await?;

    match action {
        ListingsAction::List { university, max_price, help_discount } => {
            let filters = ListingFilters {
                university,
                max_price,
                has_help_discount: help_discount,
            };
            let listings = app.listings.get_all_listings(&filters).await?;
            print_listings(&listings, format)?;
        }
        ListingsAction::Get { id, no_view } => {
            let listing = app.listings.get_listing(id).await?;
            if listing.is_some() && !no_view {
                app.listings.increment_view_count(id).await?;
            }
            match format {
                OutputFormat::Json => super::print_json(&listing)?,
                OutputFormat::Text => match listing {
                    Some(listing) => print_listing(&listing),
                    None => println!("Listing {id} not found."),
                },
            }
        }
        ListingsAction::Mine => {
            let listings = app.listings.get_my_listings().await?;
            print_listings(&listings, format)?;
        }
        ListingsAction::Create {
            title,
            rent,
            description,
            room_type,
            bathroom_type,
            university,
            help_discount,
            help_types,
            amenities,
        } => {
            let listing = app
                .listings
                .create_listing(NewListing {
                    title,
                    description,
                    room_type,
                    bathroom_type,
                    monthly_rent: rent,
                    closest_university: university,
                    help_discount_amount: help_discount,
                    help_types_needed: help_types,
                    amenities,
                    ..Default::default()
                })
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&listing)?,
                OutputFormat::Text => {
                    println!("{} Created listing {}", style("OK").green().bold(), listing.id)
                }
            }
        }
        ListingsAction::Update { id, title, rent, description, help_discount, active } => {
            let updates = ListingUpdate {
                title,
                monthly_rent: rent,
                description,
                help_discount_amount: help_discount,
                is_active: active,
                ..Default::default()
            };
            let listing = app.listings.update_listing(id, &updates).await?;
            match format {
                OutputFormat::Json => super::print_json(&listing)?,
                OutputFormat::Text => println!("{} Updated {}", style("OK").green().bold(), listing.title),
            }
        }
        ListingsAction::Delete { id } => {
            app.listings.delete_listing(id).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "deleted": id }))?,
                OutputFormat::Text => println!("Deleted listing {id}."),
            }
        }
        ListingsAction::Stats { homeowner_id } => {
            let homeowner_id = match homeowner_id {
                Some(id) => id,
                None => app
                    .auth
                    .get_current_user()
                    .await?
                    .ok_or(RtError::NotAuthenticated)?
                    .id,
            };
            let stats = app.listings.get_listing_stats(homeowner_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&stats)?,
                OutputFormat::Text => {
                    println!("{}", style("Listing stats").bold().underlined());
                    println!("  Views:            {}", stats.total_views);
                    println!("  Applications:     {}", stats.total_applications);
                    println!("  New applications: {}", stats.new_applications);
                }
            }
        }
    }

    Ok(())
}

fn print_listings(listings: &[Listing], format: OutputFormat) -> RtResult<()> {
    if let OutputFormat::Json = format {
        return super::print_json(listings);
    }
    if listings.is_empty() {
        println!("No listings found.");
        return Ok(());
    }

    let mut table = super::new_table(vec!["Title", "Rent", "University", "Help discount", "Host", "Id"]);
    for l in listings {
        let host = l
            .homeowner
            .as_ref()
            .map(|h| {
                let name = [h.first_name.as_deref(), h.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if h.is_verified {
                    format!("{name} ✓")
                } else {
                    name
                }
            })
            .unwrap_or_else(|| "-".into());
        let discount = if l.has_help_discount() {
            format!("-${:.0}", l.help_discount_amount)
        } else {
            "-".into()
        };
        table.add_row(vec![
            super::truncate(&l.title, 32),
            super::format_rent(l.monthly_rent),
            super::or_dash(l.closest_university.as_deref()),
            discount,
            host,
            l.id.to_string(),
        ]);
    }
    println!("{table}");
    println!("\n{} listings", listings.len());
    Ok(())
}

fn print_listing(l: &Listing) {
    println!("{}", style(&l.title).bold().underlined());
    println!("  Rent:        {}", super::format_rent(l.monthly_rent));
    if l.has_help_discount() {
        println!(
            "  Discount:    ${:.0}/mo for help with {}",
            l.help_discount_amount,
            if l.help_types_needed.is_empty() {
                "household tasks".to_string()
            } else {
                l.help_types_needed.join(", ")
            }
        );
    }
    println!("  Room:        {}", super::or_dash(l.room_type.as_deref()));
    println!("  Bathroom:    {}", super::or_dash(l.bathroom_type.as_deref()));
    println!(
        "  Available:   {}",
        l.available_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("  University:  {}", super::or_dash(l.closest_university.as_deref()));
    if !l.amenities.is_empty() {
        println!("  Amenities:   {}", l.amenities.join(", "));
    }
    println!("  Views:       {}", l.view_count);
    if let Some(h) = &l.homeowner {
        println!(
            "  Host:        {} {}{}",
            h.first_name.as_deref().unwrap_or(""),
            h.last_name.as_deref().unwrap_or(""),
            if h.is_verified { " (verified)" } else { "" }
        );
    }
    if let Some(description) = l.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!();
        println!("{description}");
    }
}
