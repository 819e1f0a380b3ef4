//! Contact form submissions and problem reports. Both are insert-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::non_blank;

/// Input from the public contact form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub user_type: Option<String>,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    /// Row to insert; a blank user type is stored as null.
    pub fn into_row(self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "user_type": non_blank(self.user_type),
            "subject": self.subject,
            "message": self.message,
        })
    }
}

/// A row of `contact_submissions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub user_type: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for reporting a problem with the site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemReportForm {
    pub name: String,
    pub email: String,
    pub issue_type: String,
    pub subject: String,
    pub description: String,
}

impl ProblemReportForm {
    pub fn into_row(self) -> Value {
        json!({
            "reporter_name": self.name,
            "reporter_email": self.email,
            "issue_type": self.issue_type,
            "subject": self.subject,
            "description": self.description,
        })
    }
}

/// A row of `problem_reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemReport {
    pub id: Uuid,
    pub reporter_name: String,
    pub reporter_email: String,
    pub issue_type: String,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_row_nulls_blank_user_type() {
        let row = ContactForm {
            name: "Kim".into(),
            email: "kim@example.com".into(),
            user_type: Some(String::new()),
            subject: "Hello".into(),
            message: "Question about fees".into(),
        }
        .into_row();
        assert!(row["user_type"].is_null());
        assert_eq!(row["subject"], "Hello");
    }

    #[test]
    fn test_problem_report_uses_reporter_columns() {
        let row = ProblemReportForm {
            name: "Kim".into(),
            email: "kim@example.com".into(),
            issue_type: "bug".into(),
            subject: "Broken photo".into(),
            description: "Upload fails".into(),
        }
        .into_row();
        assert_eq!(row["reporter_name"], "Kim");
        assert_eq!(row["reporter_email"], "kim@example.com");
        assert!(row.get("name").is_none());
    }
}
