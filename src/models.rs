use serde::{Deserialize, Serialize};

use crate::error::FatalError;

/// Value used for any field that exists in the schema but could not be determined.
pub const SENTINEL: &str = "N/A";

/// Literal used when no application link can be resolved from the detail page.
pub const SEE_JOB_DESCRIPTION: &str = "See Job Description";

/// Column names, in export order.
pub const FIELD_NAMES: [&str; 17] = [
    "Job Title",
    "Company Name",
    "Company Headquarters",
    "Date Posted",
    "Apply Deadline",
    "Job Type",
    "Job Category",
    "Region",
    "Salary",
    "Tags",
    "Company Description",
    "Job Description",
    "Job URL",
    "Application URL",
    "Company Profile URL",
    "Company Logo URL",
    "Company Total Jobs Posted",
];

pub(crate) fn sentinel() -> String {
    SENTINEL.to_string()
}

/// What a listing card on the index page tells us about one job.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub job_url: String,
    pub title: String,
    pub company: String,
    pub headquarters: String,
    pub logo_url: String,
    pub company_profile_url: String,
    pub locked: bool,
    pub tags: String,
}

/// Fields only available on a listing's own page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailFields {
    pub date_posted: String,
    pub apply_deadline: String,
    pub job_type: String,
    pub job_category: String,
    pub region: String,
    pub salary: String,
    pub company_description: String,
    pub job_description: String,
    pub application_url: String,
    pub company_total_jobs: String,
}

impl Default for DetailFields {
    fn default() -> Self {
        DetailFields {
            date_posted: sentinel(),
            apply_deadline: sentinel(),
            job_type: sentinel(),
            job_category: sentinel(),
            region: sentinel(),
            salary: sentinel(),
            company_description: sentinel(),
            job_description: sentinel(),
            application_url: sentinel(),
            company_total_jobs: sentinel(),
        }
    }
}

/// One finalized output row. Field order matches [`FIELD_NAMES`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "Job Title")]
    pub job_title: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Company Headquarters")]
    pub company_headquarters: String,
    #[serde(rename = "Date Posted")]
    pub date_posted: String,
    #[serde(rename = "Apply Deadline")]
    pub apply_deadline: String,
    #[serde(rename = "Job Type")]
    pub job_type: String,
    #[serde(rename = "Job Category")]
    pub job_category: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Salary")]
    pub salary: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Company Description")]
    pub company_description: String,
    #[serde(rename = "Job Description")]
    pub job_description: String,
    #[serde(rename = "Job URL")]
    pub job_url: String,
    #[serde(rename = "Application URL")]
    pub application_url: String,
    #[serde(rename = "Company Profile URL")]
    pub company_profile_url: String,
    #[serde(rename = "Company Logo URL")]
    pub company_logo_url: String,
    #[serde(rename = "Company Total Jobs Posted")]
    pub company_total_jobs_posted: String,
}

impl JobRecord {
    pub fn values(&self) -> [&str; 17] {
        [
            self.job_title.as_str(),
            self.company_name.as_str(),
            self.company_headquarters.as_str(),
            self.date_posted.as_str(),
            self.apply_deadline.as_str(),
            self.job_type.as_str(),
            self.job_category.as_str(),
            self.region.as_str(),
            self.salary.as_str(),
            self.tags.as_str(),
            self.company_description.as_str(),
            self.job_description.as_str(),
            self.job_url.as_str(),
            self.application_url.as_str(),
            self.company_profile_url.as_str(),
            self.company_logo_url.as_str(),
            self.company_total_jobs_posted.as_str(),
        ]
    }

    /// Value of a column by its export name.
    pub fn get(&self, field: &str) -> Option<&str> {
        FIELD_NAMES
            .iter()
            .position(|name| *name == field)
            .map(|idx| self.values()[idx])
    }
}

/// Everything one crawl produced, in enumeration order.
#[derive(Debug, Default)]
pub struct RunResult {
    pub records: Vec<JobRecord>,
    /// Number of listing cards found on the index page, job or not.
    pub total_discovered: usize,
    /// Set when the listing loop was cut short. `records` still holds what was finished.
    pub interrupted: Option<FatalError>,
}

impl RunResult {
    pub fn total_finalized(&self) -> usize {
        self.records.len()
    }

    /// Finalized over discovered, as a percentage. `None` if the index page had no cards.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_discovered == 0 {
            return None;
        }
        Some(self.total_finalized() as f64 / self.total_discovered as f64 * 100.0)
    }
}
