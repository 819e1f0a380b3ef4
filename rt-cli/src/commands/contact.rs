//! Contact commands - reach the RoomThere team.

use clap::Subcommand;
use console::style;
use dialoguer::Input;

use rt_core::config::ConfigHandle;
use rt_core::error::RtResult;
use rt_models::{ContactForm, ProblemReportForm};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ContactAction {
    /// Send a message through the contact form.
    Send {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        /// Message body (prompted when omitted).
        #[arg(short, long)]
        message: Option<String>,
        /// renter or homeowner, if applicable.
        #[arg(long)]
        user_type: Option<String>,
    },
    /// Report a problem with the site.
    Report {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Kind of problem, e.g. bug, account, listing.
        #[arg(long)]
        issue_type: String,
        #[arg(long)]
        subject: String,
        /// What happened (prompted when omitted).
        #[arg(short, long)]
        description: Option<String>,
    },
}

fn text_or_prompt(value: Option<String>, prompt: &str) -> RtResult<String> {
    match value {
        Some(v) => Ok(v),
        None => Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(super::prompt_error),
    }
}

pub async fn run(config: ConfigHandle, action: ContactAction, format: OutputFormat) -> RtResult<()> {
    let app = super::connect(&config).await?;

    match action {
        ContactAction::Send { name, email, subject, message, user_type } => {
            let message = text_or_prompt(message, "Message")?;
            let submission = app
                .contact
                .submit_contact_form(ContactForm {
                    name,
                    email,
                    user_type,
                    subject,
                    message,
                })
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&submission)?,
                OutputFormat::Text => println!(
                    "{} Thanks! We'll reply to {}.",
                    style("OK").green().bold(),
                    submission.email
                ),
            }
        }
        ContactAction::Report { name, email, issue_type, subject, description } => {
            let description = text_or_prompt(description, "Describe the problem")?;
            let report = app
                .contact
                .submit_problem_report(ProblemReportForm {
                    name,
                    email,
                    issue_type,
                    subject,
                    description,
                })
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&report)?,
                OutputFormat::Text => {
                    println!("{} Problem report {} filed.", style("OK").green().bold(), report.id)
                }
            }
        }
    }

    Ok(())
}
