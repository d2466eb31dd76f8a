use log::{debug, info};
use url::Url;

use crate::browser::{Node, Page};
use crate::config::ScrapeConfig;
use crate::error::FatalError;
use crate::models::{sentinel, ListingSummary};
use crate::retry;

pub const LISTING_CARD: &str = "li.feature";
const JOB_LINK: &str = r#"a[href^="/remote-jobs/"]"#;
const LOCKED_CLASS: &str = "listing-link--locked";
const TITLE: &str = ".new-listing__header__title";
const COMPANY_NAME: &str = ".new-listing__company-name";
const HEADQUARTERS: &str = ".new-listing__company-headquarters";
const LOGO: &str = ".tooltip--flag-logo__flag-logo";
const COMPANY_LINK: &str = r#"a[href^="/company/"]"#;
const TAG: &str = ".new-listing__categories__category";

/// One card from the index page, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    Job(ListingSummary),
    /// No job link on the card (ads, promotions). Not an error.
    Promotional,
}

/// Loads the index page at `base` and parses every listing card on it.
///
/// Failing to load the page, or the listing container never showing up, is
/// fatal: without an index there is nothing to crawl.
pub fn enumerate_listings<P: Page>(page: &mut P, base: &Url, config: &ScrapeConfig) -> Result<Vec<Card>, FatalError> {
    let index_url = base.as_str();

    retry::attempt(
        |n| {
            info!("Loading index page (attempt {}/{})...", n, config.max_attempts.max(1));
            page.navigate(index_url, config.navigation_timeout())?;
            page.wait_for_selector(LISTING_CARD, config.index_wait())
        },
        config.max_attempts,
        config.index_retry_delay(),
    )
    .map_err(|source| FatalError::IndexUnavailable {
        url: index_url.to_string(),
        attempts: config.max_attempts.max(1),
        source,
    })?;

    let cards: Vec<Card> = page
        .query_selector_all(LISTING_CARD)
        .iter()
        .map(|card| parse_card(card, base))
        .collect();

    info!("Found {} listing cards on {}", cards.len(), index_url);
    Ok(cards)
}

/// Parses one listing card. Missing fields become the sentinel.
pub fn parse_card<N: Node>(card: &N, base: &Url) -> Card {
    let Some(link) = card.query_selector(JOB_LINK) else {
        debug!("Card without a job link, skipping");
        return Card::Promotional;
    };

    let locked = link
        .attribute("class")
        .map_or(false, |class| class.contains(LOCKED_CLASS));

    let job_url = link
        .attribute("href")
        .map(|href| absolutize(base, &href))
        .unwrap_or_else(sentinel);

    let tags: Vec<String> = card
        .query_selector_all(TAG)
        .iter()
        .map(|tag| tag.inner_text())
        .filter(|tag| !tag.is_empty())
        .collect();

    Card::Job(ListingSummary {
        job_url,
        title: text_or_sentinel(card, TITLE),
        company: text_or_sentinel(card, COMPANY_NAME),
        headquarters: text_or_sentinel(card, HEADQUARTERS),
        logo_url: card
            .query_selector(LOGO)
            .and_then(|logo| logo.attribute("style"))
            .and_then(|style| background_image_url(&style))
            .unwrap_or_else(sentinel),
        company_profile_url: card
            .query_selector(COMPANY_LINK)
            .and_then(|a| a.attribute("href"))
            .map(|href| absolutize(base, &href))
            .unwrap_or_else(sentinel),
        locked,
        tags: if tags.is_empty() { sentinel() } else { tags.join(", ") },
    })
}

fn text_or_sentinel<N: Node>(node: &N, selector: &str) -> String {
    node.query_selector(selector)
        .map(|n| n.inner_text())
        .unwrap_or_else(sentinel)
}

/// Resolves a link relative to the site root. Unparseable hrefs are kept as-is.
pub(crate) fn absolutize(base: &Url, href: &str) -> String {
    match base.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Pulls the URL out of an inline `background-image: url(...)` style.
fn background_image_url(style: &str) -> Option<String> {
    let start = style.find("url(")? + "url(".len();
    let rest = &style[start..];
    let end = rest.find(')')?;
    let url = rest[..end].trim().trim_matches(|c| c == '"' || c == '\'');
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}
