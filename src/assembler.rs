use crate::models::{DetailFields, JobRecord, ListingSummary};

/// Builds the output record for one listing. `detail` is `None` for locked
/// listings, which get the all-sentinel detail set.
pub fn assemble(summary: ListingSummary, detail: Option<DetailFields>) -> JobRecord {
    let detail = detail.unwrap_or_default();
    JobRecord {
        job_title: summary.title,
        company_name: summary.company,
        company_headquarters: summary.headquarters,
        date_posted: detail.date_posted,
        apply_deadline: detail.apply_deadline,
        job_type: detail.job_type,
        job_category: detail.job_category,
        region: detail.region,
        salary: detail.salary,
        tags: summary.tags,
        company_description: detail.company_description,
        job_description: detail.job_description,
        job_url: summary.job_url,
        application_url: detail.application_url,
        company_profile_url: summary.company_profile_url,
        company_logo_url: summary.logo_url,
        company_total_jobs_posted: detail.company_total_jobs,
    }
}
