//! Auth commands - sign up, sign in, sign out, and show the current user.

use clap::Subcommand;
use console::style;
use dialoguer::Password;
use serde_json::json;

use rt_core::config::{AppConfig, ConfigHandle};
use rt_core::error::RtResult;
use rt_models::UserType;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in with email and password.
    Login {
        /// Account email.
        email: String,
        /// Password (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account.
    Signup {
        /// Account email.
        email: String,
        /// Password (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
        /// Account role.
        #[arg(short = 't', long, value_parser = parse_user_type)]
        user_type: UserType,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Sign out and forget the saved session.
    Logout,
    /// Show the signed-in user.
    Whoami,
}

fn parse_user_type(s: &str) -> Result<UserType, String> {
    UserType::parse(s).ok_or_else(|| format!("unknown user type '{s}' (expected renter or homeowner)"))
}

fn password_or_prompt(password: Option<String>, confirm: bool) -> RtResult<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt.interact().map_err(super::prompt_error)
}

pub async fn run(config: ConfigHandle, action: AuthAction, format: OutputFormat) -> RtResult<()> {
    let app = super::connect(&config).await?;
    let session_path = AppConfig::session_path()?;

    match action {
        AuthAction::Login { email, password } => {
            let password = password_or_prompt(password, false)?;
            let session = app.auth.sign_in_with_password(&email, &password).await?;
            super::save_session(&session_path, Some(&session))?;

            match format {
                OutputFormat::Json => super::print_json(&session.user)?,
                OutputFormat::Text => println!(
                    "{} Signed in as {}",
                    style("OK").green().bold(),
                    session.user.email.as_deref().unwrap_or(&email)
                ),
            }
        }
        AuthAction::Signup { email, password, user_type, first_name, last_name } => {
            let password = password_or_prompt(password, true)?;
            let metadata = json!({
                "user_type": user_type,
                "first_name": first_name,
                "last_name": last_name,
            });
            let signup = app.auth.sign_up(&email, &password, metadata).await?;
            if let Some(session) = &signup.session {
                super::save_session(&session_path, Some(session))?;
            }

            match format {
                OutputFormat::Json => super::print_json(&signup)?,
                OutputFormat::Text => {
                    println!("{} Account created for {email}", style("OK").green().bold());
                    if signup.session.is_none() {
                        println!("  Check your inbox to confirm the address, then run `roomthere auth login`.");
                    }
                }
            }
        }
        AuthAction::Logout => {
            app.auth.sign_out().await?;
            super::save_session(&session_path, None)?;
            match format {
                OutputFormat::Json => super::print_json(&json!({ "signed_in": false }))?,
                OutputFormat::Text => println!("Signed out."),
            }
        }
        AuthAction::Whoami => {
            let user = app.auth.get_current_user().await?;
            match format {
                OutputFormat::Json => super::print_json(&user)?,
                OutputFormat::Text => match user {
                    Some(user) => println!(
                        "{} ({})",
                        user.email.as_deref().unwrap_or("no email"),
                        style(user.id).dim()
                    ),
                    None => println!("Not signed in."),
                },
            }
        }
    }

    Ok(())
}
