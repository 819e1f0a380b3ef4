//! Contact accessor. Insert-only; no caller identity needed.

use std::sync::Arc;

use tracing::info;

use rt_api::Backend;
use rt_core::constants::tables;
use rt_core::error::RtResult;
use rt_models::query::Query;
use rt_models::{ContactForm, ContactSubmission, ProblemReport, ProblemReportForm};

use crate::accessor::{decode_single, Accessor};

#[derive(Clone)]
pub struct ContactService {
    backend: Arc<dyn Backend>,
}

impl ContactService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn submit_contact_form(&self, form: ContactForm) -> RtResult<ContactSubmission> {
        let query = Query::table(tables::CONTACT_SUBMISSIONS);
        let submission: ContactSubmission =
            decode_single(self.backend.insert(&query, form.into_row()).await?)?;
        info!("contact submission {} received", submission.id);
        Ok(submission)
    }

    pub async fn submit_problem_report(&self, report: ProblemReportForm) -> RtResult<ProblemReport> {
        let query = Query::table(tables::PROBLEM_REPORTS);
        let report: ProblemReport = decode_single(self.backend.insert(&query, report.into_row()).await?)?;
        info!("problem report {} filed", report.id);
        Ok(report)
    }
}

impl Accessor for ContactService {
    fn name(&self) -> &'static str {
        "contact"
    }
}
