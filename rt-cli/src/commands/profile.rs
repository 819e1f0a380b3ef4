//! Profile commands.

use clap::Subcommand;
use console::style;
use uuid::Uuid;

use rt_core::config::ConfigHandle;
use rt_core::error::{RtError, RtResult};
use rt_models::{ExtendedProfile, FullProfile, ProfileUpdate};
use rt_services::RoomThere;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show a profile with its renter or homeowner details.
    Show {
        /// User id (defaults to the signed-in user).
        user_id: Option<Uuid>,
    },
    /// Update your own profile. Only the given fields change.
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        photo_url: Option<String>,
    },
}

async fn caller_id(app: &RoomThere) -> RtResult<Uuid> {
    app.auth
        .get_current_user()
        .await?
        .map(|u| u.id)
        .ok_or(RtError::NotAuthenticated)
}

pub async fn run(config: ConfigHandle, action: ProfileAction, format: OutputFormat) -> RtResult<()> {
    let app = super::connect(&config).await?;

    match action {
        ProfileAction::Show { user_id } => {
            let id = match user_id {
                Some(id) => id,
                None => caller_id(&app).await?,
            };
            let profile = app.profiles.get_full_profile(id).await?;
            match format {
                OutputFormat::Json => super::print_json(&profile)?,
                OutputFormat::Text => match profile {
                    Some(profile) => print_profile(&profile),
                    None => println!("No profile for {id}."),
                },
            }
        }
        ProfileAction::Update { first_name, last_name, phone, bio, photo_url } => {
            let id = caller_id(&app).await?;
            let updates = ProfileUpdate {
                user_type: None,
                first_name,
                last_name,
                photo_url,
                bio,
                phone,
            };
            let profile = app.profiles.update_profile(id, &updates).await?;
            match format {
                OutputFormat::Json => super::print_json(&profile)?,
                OutputFormat::Text => {
                    println!("{} Profile updated for {}", style("OK").green().bold(), profile.display_name())
                }
            }
        }
    }

    Ok(())
}

fn print_profile(full: &FullProfile) {
    let p = &full.profile;
    println!("{}", style(p.display_name()).bold().underlined());
    println!(
        "  Role:      {}",
        p.user_type.map(|t| t.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("  Email:     {}", super::or_dash(p.email.as_deref()));
    println!("  Phone:     {}", super::or_dash(p.phone.as_deref()));
    println!(
        "  Verified:  {}",
        if p.is_verified {
            style("yes").green().to_string()
        } else {
            style("no").yellow().to_string()
        }
    );
    if let Some(bio) = p.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        println!("  Bio:       {bio}");
    }

    match &full.extended_profile {
        Some(ExtendedProfile::Renter(r)) => {
            println!();
            println!("{}", style("Renter").bold().underlined());
            println!("  Occupation:  {}", super::or_dash(r.occupation_type.as_deref()));
            println!("  School/work: {}", super::or_dash(r.school_or_employer.as_deref()));
            println!(
                "  Move-in:     {}",
                r.desired_move_in_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
            );
            println!("  Lease:       {}", super::or_dash(r.preferred_lease_length.as_deref()));
            if !r.help_types_offered.is_empty() {
                println!("  Can help:    {}", r.help_types_offered.join(", "));
            }
        }
        Some(ExtendedProfile::Homeowner(h)) => {
            println!();
            println!("{}", style("Homeowner").bold().underlined());
            let location = [h.city.as_deref(), h.state.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(", ");
            println!("  Location:    {}", super::or_dash(Some(&location)));
            println!(
                "  Pets:        {}",
                if h.has_pets {
                    h.pet_details.clone().unwrap_or_else(|| "yes".into())
                } else {
                    "none".into()
                }
            );
        }
        None => {}
    }
}
