//! Application commands.

use clap::Subcommand;
use console::style;
use uuid::Uuid;

use rt_core::config::ConfigHandle;
use rt_core::error::RtResult;
use rt_models::{Application, ApplicationStatus};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ApplicationsAction {
    /// Apply to a listing.
    Apply {
        listing_id: Uuid,
        /// Note to the homeowner.
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Applications you have submitted.
    Mine,
    /// Applications to your listings.
    Incoming,
    /// Applications to one listing.
    ForListing { listing_id: Uuid },
    /// Accept, reject, or withdraw an application.
    SetStatus {
        id: Uuid,
        #[arg(value_parser = parse_status)]
        status: ApplicationStatus,
    },
}

fn parse_status(s: &str) -> Result<ApplicationStatus, String> {
    ApplicationStatus::parse(s).ok_or_else(|| "status must not be blank".to_string())
}

pub async fn run(config: ConfigHandle, action: ApplicationsAction, format: OutputFormat) -> RtResult<()> {
    let app = super::connect(&config).await?;

    match action {
        ApplicationsAction::Apply { listing_id, message } => {
            let application = app.applications.create_application(listing_id, message).await?;
            match format {
                OutputFormat::Json => super::print_json(&application)?,
                OutputFormat::Text => println!(
                    "{} Applied to {} (application {})",
                    style("OK").green().bold(),
                    application
                        .listing
                        .as_ref()
                        .map(|l| l.title.as_str())
                        .unwrap_or("listing"),
                    application.id
                ),
            }
        }
        ApplicationsAction::Mine => {
            let applications = app.applications.get_my_applications().await?;
            print_applications(&applications, format, Column::Homeowner)?;
        }
        ApplicationsAction::Incoming => {
            let applications = app.applications.get_applications_for_my_listings().await?;
            print_applications(&applications, format, Column::Renter)?;
        }
        ApplicationsAction::ForListing { listing_id } => {
            let applications = app.applications.get_applications_for_listing(listing_id).await?;
            print_applications(&applications, format, Column::Renter)?;
        }
        ApplicationsAction::SetStatus { id, status } => {
            let application = app.applications.update_application_status(id, status).await?;
            match format {
                OutputFormat::Json => super::print_json(&application)?,
                OutputFormat::Text => println!(
                    "{} Application {} is now {}",
                    style("OK").green().bold(),
                    application.id,
                    status_label(&application.status)
                ),
            }
        }
    }

    Ok(())
}

/// Which party to show alongside each application.
#[derive(Clone, Copy)]
enum Column {
    Renter,
    Homeowner,
}

fn status_label(status: &ApplicationStatus) -> String {
    match status {
        ApplicationStatus::Pending => style("pending").yellow().to_string(),
        ApplicationStatus::Accepted => style("accepted").green().to_string(),
        ApplicationStatus::Rejected => style("rejected").red().to_string(),
        ApplicationStatus::Withdrawn => style("withdrawn").dim().to_string(),
        ApplicationStatus::Other(other) => other.clone(),
    }
}

fn print_applications(applications: &[Application], format: OutputFormat, column: Column) -> RtResult<()> {
    if let OutputFormat::Json = format {
        return super::print_json(applications);
    }
    if applications.is_empty() {
        println!("No applications.");
        return Ok(());
    }

    let party = match column {
        Column::Renter => "Renter",
        Column::Homeowner => "Homeowner",
    };
    let mut table = super::new_table(vec!["Listing", party, "Status", "Message", "Applied", "Id"]);
    for a in applications {
        let listing = a
            .listing
            .as_ref()
            .map(|l| super::truncate(&l.title, 28))
            .unwrap_or_else(|| a.listing_id.to_string());
        let who = match column {
            Column::Renter => a.renter.as_ref().map(|p| p.display_name()),
            Column::Homeowner => a.homeowner_profile().map(|p| p.display_name()),
        }
        .unwrap_or_else(|| "-".into());
        let applied = a
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            listing,
            who,
            status_label(&a.status),
            super::truncate(&super::or_dash(a.message.as_deref()), 40),
            applied,
            a.id.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
