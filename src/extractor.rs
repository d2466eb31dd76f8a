use regex::Regex;
use url::Url;
use log::{debug, info};

use crate::browser::{Browser, Document, Node, Page};
use crate::config::ScrapeConfig;
use crate::error::ListingError;
use crate::listing::absolutize;
use crate::models::{sentinel, DetailFields, SEE_JOB_DESCRIPTION};
use crate::retry;

const READY_MARKER: &str = ".lis-container__header__hero__company-info";
const DATE_POSTED: &str = ".lis-container__header__hero__company-info__icons__item span";
const COMPANY_DESCRIPTION: &str = ".lis-container__header__hero__company-info__description";
const JOB_DESCRIPTION: &str = ".lis-container__job__content__description";
const APPLY_BUTTON: &str = "a.apply-btn:not(.apply-btn--locked)";
const DESCRIPTION_APPLY_LINK: &str = r#".lis-container__job__content__description a[href*="apply"], .lis-container__job__content__description a[href*="jobs"], .lis-container__job__content__description a[href*="careers"]"#;
const SIDEBAR_ITEM: &str = ".lis-container__job__sidebar__job-about__list__item";
const JOBS_POSTED: &str = ".lis-container__job__sidebar__companyDetails__info__jobs-posted";

#[derive(Debug, Clone, Copy, PartialEq)]
enum SidebarField {
    ApplyDeadline,
    JobType,
    JobCategory,
    Region,
}

struct SidebarRule {
    label: &'static str,
    field: SidebarField,
    value_selector: &'static str,
}

/// Checked top to bottom; the first label found in an item's text claims it.
const SIDEBAR_RULES: [SidebarRule; 4] = [
    SidebarRule { label: "Apply before", field: SidebarField::ApplyDeadline, value_selector: "span" },
    SidebarRule { label: "Job type", field: SidebarField::JobType, value_selector: ".box--jobType" },
    SidebarRule { label: "Category", field: SidebarField::JobCategory, value_selector: ".box--blue" },
    SidebarRule { label: "Region", field: SidebarField::Region, value_selector: ".box--region" },
];

impl SidebarField {
    fn slot<'a>(&self, detail: &'a mut DetailFields) -> &'a mut String {
        match self {
            SidebarField::ApplyDeadline => &mut detail.apply_deadline,
            SidebarField::JobType => &mut detail.job_type,
            SidebarField::JobCategory => &mut detail.job_category,
            SidebarField::Region => &mut detail.region,
        }
    }
}

/// Pulls the extended fields out of a listing's own page.
pub struct Extractor {
    salary_regex: Regex,
    digits_regex: Regex,
    base: Url,
}

impl Extractor {
    pub fn new(base: Url) -> Self {
        Extractor {
            // Currency-prefixed amount or range, optional pay period. Same currency on both ends.
            salary_regex: Regex::new(
                r"(?i)\$[\d,]+(?:\s*-\s*\$[\d,]+)?(?:\s*(?:per|/)\s*(?:year|hour|month|annum|annually))?|€[\d,]+(?:\s*-\s*€[\d,]+)?(?:\s*(?:per|/)\s*(?:year|hour|month|annum|annually))?|£[\d,]+(?:\s*-\s*£[\d,]+)?(?:\s*(?:per|/)\s*(?:year|hour|month|annum|annually))?",
            )
            .unwrap(),
            digits_regex: Regex::new(r"\d+").unwrap(),
            base,
        }
    }

    /// Loads `url` in a fresh page and extracts its detail fields.
    ///
    /// The page is closed on every return path.
    pub fn extract_detail<B: Browser>(
        &self,
        browser: &B,
        url: &str,
        config: &ScrapeConfig,
    ) -> Result<DetailFields, ListingError> {
        let mut page = browser.new_scoped_page().map_err(|source| ListingError::Session {
            url: url.to_string(),
            source,
        })?;

        retry::attempt(
            |n| {
                debug!("Loading detail page {} (attempt {})", url, n);
                page.navigate(url, config.navigation_timeout())?;
                page.wait_for_selector(READY_MARKER, config.detail_wait())
            },
            config.max_attempts,
            config.detail_retry_delay(),
        )
        .map_err(|source| ListingError::DetailUnavailable {
            url: url.to_string(),
            attempts: config.max_attempts.max(1),
            source,
        })?;

        let detail = self.parse_detail(&*page);
        info!("Extracted details from {}", url);
        Ok(detail)
    }

    /// Reads every detail field from an already loaded page. Never fails;
    /// anything missing is left at the sentinel.
    pub fn parse_detail<D: Document>(&self, doc: &D) -> DetailFields {
        let mut detail = DetailFields::default();

        detail.date_posted = text_or_sentinel(doc, DATE_POSTED);
        detail.company_description = text_or_sentinel(doc, COMPANY_DESCRIPTION);

        if let Some(description) = doc.query_selector(JOB_DESCRIPTION) {
            let text = description.inner_text();
            detail.salary = self.extract_salary(&text);
            detail.job_description = text;
        }

        detail.application_url = self.resolve_application_url(doc);
        apply_sidebar(doc, &mut detail);
        detail.company_total_jobs = self.extract_jobs_posted(doc);

        detail
    }

    /// First currency amount or range in `text`. A heuristic: it will miss
    /// salaries written without a currency symbol.
    pub fn extract_salary(&self, text: &str) -> String {
        self.salary_regex
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(sentinel)
    }

    /// Apply button, unless it only leads to the site's own registration;
    /// then the first careers-looking link in the description; then a pointer
    /// to the description itself.
    pub fn resolve_application_url<D: Document>(&self, doc: &D) -> String {
        let Some(button) = doc.query_selector(APPLY_BUTTON) else {
            return SEE_JOB_DESCRIPTION.to_string();
        };

        match button.attribute("href") {
            Some(href) if !href.contains("register") => absolutize(&self.base, &href),
            _ => doc
                .query_selector(DESCRIPTION_APPLY_LINK)
                .and_then(|link| link.attribute("href"))
                .unwrap_or_else(|| SEE_JOB_DESCRIPTION.to_string()),
        }
    }

    pub fn extract_jobs_posted<D: Document>(&self, doc: &D) -> String {
        doc.query_selector(JOBS_POSTED)
            .map(|node| node.inner_text())
            .and_then(|text| self.digits_regex.find(&text).map(|m| m.as_str().to_string()))
            .unwrap_or_else(sentinel)
    }
}

fn apply_sidebar<D: Document>(doc: &D, detail: &mut DetailFields) {
    for item in doc.query_selector_all(SIDEBAR_ITEM) {
        let text = item.inner_text();
        let Some(rule) = SIDEBAR_RULES.iter().find(|rule| text.contains(rule.label)) else {
            continue;
        };
        *rule.field.slot(detail) = item
            .query_selector(rule.value_selector)
            .map(|value| value.inner_text())
            .unwrap_or_else(sentinel);
    }
}

fn text_or_sentinel<D: Document>(doc: &D, selector: &str) -> String {
    doc.query_selector(selector)
        .map(|node| node.inner_text())
        .unwrap_or_else(sentinel)
}
