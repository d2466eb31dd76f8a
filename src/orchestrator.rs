use log::{error, info, warn};
use url::Url;

use crate::assembler::assemble;
use crate::browser::Browser;
use crate::config::ScrapeConfig;
use crate::delay_manager;
use crate::error::{FatalError, ListingError};
use crate::extractor::Extractor;
use crate::listing::{enumerate_listings, Card};
use crate::models::{JobRecord, ListingSummary, RunResult};

/// Progress notifications, emitted in processing order. `index` is 1-based.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    IndexLoaded { total: usize },
    Skipped { index: usize, total: usize },
    Locked { index: usize, total: usize, listing: &'a ListingSummary },
    Fetching { index: usize, total: usize, listing: &'a ListingSummary },
    Completed { index: usize, total: usize, scraped: usize },
    Failed { index: usize, total: usize, error: &'a ListingError },
    Aborted { error: &'a FatalError },
}

pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent<'_>);
}

/// Reports progress through the `log` facade.
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        match event {
            ProgressEvent::IndexLoaded { total } => {
                info!("Found {} listings, scraping in display order", total)
            }
            ProgressEvent::Skipped { index, total } => {
                info!("[{}/{}] Skipping - no valid job link", index, total)
            }
            ProgressEvent::Locked { index, total, listing } => info!(
                "[{}/{}] {} @ {} - locked listing, basic info only",
                index, total, listing.title, listing.company
            ),
            ProgressEvent::Fetching { index, total, listing } => info!(
                "[{}/{}] {} @ {} - fetching full details...",
                index, total, listing.title, listing.company
            ),
            ProgressEvent::Completed { index, total, scraped } => {
                info!("[{}/{}] Complete ({} scraped so far)", index, total, scraped)
            }
            ProgressEvent::Failed { index, total, error } => {
                warn!("[{}/{}] Error: {}", index, total, error)
            }
            ProgressEvent::Aborted { error } => error!("Run aborted: {}", error),
        }
    }
}

/// Drives one crawl: index, then every listing in order, one at a time.
pub struct Orchestrator<B: Browser> {
    browser: B,
    config: ScrapeConfig,
    base: Url,
    extractor: Extractor,
}

impl<B: Browser> Orchestrator<B> {
    pub fn new(browser: B, config: ScrapeConfig) -> Result<Self, FatalError> {
        let base = Url::parse(&config.base_url).map_err(|e| FatalError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Orchestrator {
            browser,
            config,
            extractor: Extractor::new(base.clone()),
            base,
        })
    }

    /// Runs the crawl.
    ///
    /// `Err` only when the index could not be read; nothing was collected then.
    /// A failure later in the loop stops it and is recorded in
    /// [`RunResult::interrupted`], and the records gathered so far are returned.
    pub fn run(&self, observer: &mut dyn ProgressObserver) -> Result<RunResult, FatalError> {
        let mut cards = {
            let mut page = self.browser.new_scoped_page().map_err(FatalError::Session)?;
            let cards = enumerate_listings(&mut *page, &self.base, &self.config)?;
            cards
        };
        if let Some(limit) = self.config.limit {
            cards.truncate(limit);
        }

        let total = cards.len();
        observer.on_event(&ProgressEvent::IndexLoaded { total });

        let mut result = RunResult {
            total_discovered: total,
            ..RunResult::default()
        };

        for (i, card) in cards.into_iter().enumerate() {
            let index = i + 1;
            let summary = match card {
                Card::Job(summary) => summary,
                Card::Promotional => {
                    observer.on_event(&ProgressEvent::Skipped { index, total });
                    continue;
                }
            };

            let fetched = !summary.locked;
            match self.process_listing(summary, index, total, observer) {
                Ok(record) => {
                    result.records.push(record);
                    if fetched {
                        observer.on_event(&ProgressEvent::Completed {
                            index,
                            total,
                            scraped: result.records.len(),
                        });
                        delay_manager::politeness_delay(self.config.politeness_delay());
                    }
                }
                Err(ListingError::Session { source, .. }) => {
                    let fatal = FatalError::Session(source);
                    observer.on_event(&ProgressEvent::Aborted { error: &fatal });
                    result.interrupted = Some(fatal);
                    break;
                }
                Err(error) => {
                    observer.on_event(&ProgressEvent::Failed { index, total, error: &error });
                }
            }
        }

        Ok(result)
    }

    fn process_listing(
        &self,
        summary: ListingSummary,
        index: usize,
        total: usize,
        observer: &mut dyn ProgressObserver,
    ) -> Result<JobRecord, ListingError> {
        if summary.locked {
            observer.on_event(&ProgressEvent::Locked { index, total, listing: &summary });
            return Ok(assemble(summary, None));
        }

        observer.on_event(&ProgressEvent::Fetching { index, total, listing: &summary });
        let detail = self
            .extractor
            .extract_detail(&self.browser, &summary.job_url, &self.config)?;
        Ok(assemble(summary, Some(detail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixtures::FixtureBrowser;
    use crate::models::SENTINEL;

    const INDEX: &str = "https://wwr.test/";

    #[derive(Default)]
    struct Recorder {
        skipped: Vec<usize>,
        completed: Vec<usize>,
        failed: Vec<usize>,
        aborted: bool,
        close_browser_after_index: Option<FixtureBrowser>,
    }

    impl ProgressObserver for Recorder {
        fn on_event(&mut self, event: &ProgressEvent<'_>) {
            match event {
                ProgressEvent::IndexLoaded { .. } => {
                    if let Some(browser) = &self.close_browser_after_index {
                        browser.refuse_new_pages();
                    }
                }
                ProgressEvent::Skipped { index, .. } => self.skipped.push(*index),
                ProgressEvent::Completed { index, .. } => self.completed.push(*index),
                ProgressEvent::Failed { index, .. } => self.failed.push(*index),
                ProgressEvent::Aborted { .. } => self.aborted = true,
                ProgressEvent::Locked { .. } | ProgressEvent::Fetching { .. } => {}
            }
        }
    }

    fn card(slug: &str, title: &str, locked: bool) -> String {
        let class = if locked { "listing-link--locked" } else { "listing-link--unlocked" };
        format!(
            r#"<li class="feature"><a class="{class}" href="/remote-jobs/{slug}">
                 <h4 class="new-listing__header__title">{title}</h4>
                 <p class="new-listing__company-name">{title} Inc</p>
               </a></li>"#
        )
    }

    fn index_html(cards: &[String]) -> String {
        format!("<html><body><ul>{}</ul></body></html>", cards.concat())
    }

    fn detail_html(job_type: &str) -> String {
        format!(
            r#"<html><body>
                 <div class="lis-container__header__hero__company-info"></div>
                 <div class="lis-container__job__content__description"><p>Pay: €45,000 per year</p></div>
                 <li class="lis-container__job__sidebar__job-about__list__item">Job type <span class="box--jobType">{job_type}</span></li>
               </body></html>"#
        )
    }

    fn detail_url(slug: &str) -> String {
        format!("{INDEX}remote-jobs/{slug}")
    }

    fn config() -> ScrapeConfig {
        let mut config = ScrapeConfig::default().without_delays();
        config.base_url = INDEX.to_string();
        config
    }

    fn fixture_site() -> FixtureBrowser {
        let index = index_html(&[
            card("alpha", "Alpha", false),
            r#"<li class="feature"><a href="/sponsor">Sponsored</a></li>"#.to_string(),
            card("beta", "Beta", true),
            card("gamma", "Gamma", false),
            card("delta", "Delta", false),
        ]);
        FixtureBrowser::new()
            .with_page(INDEX, &index)
            .with_page(&detail_url("alpha"), &detail_html("Full-Time"))
            .with_page(&detail_url("delta"), &detail_html("Contract"))
    }

    #[test]
    fn records_follow_enumeration_order() {
        let browser = fixture_site();
        let orchestrator = Orchestrator::new(browser.clone(), config()).unwrap();
        let result = orchestrator.run(&mut LogObserver).unwrap();

        let titles: Vec<&str> = result.records.iter().map(|r| r.job_title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "Beta", "Delta"]);
        assert_eq!(result.total_discovered, 5);
        assert_eq!(result.total_finalized(), 3);
        assert!(result.interrupted.is_none());

        assert_eq!(result.records[0].job_type, "Full-Time");
        assert_eq!(result.records[0].salary, "€45,000 per year");
        assert_eq!(result.records[2].job_type, "Contract");
    }

    #[test]
    fn locked_listing_is_never_fetched() {
        let browser = fixture_site();
        let orchestrator = Orchestrator::new(browser.clone(), config()).unwrap();
        let result = orchestrator.run(&mut LogObserver).unwrap();

        assert_eq!(browser.navigations_to(&detail_url("beta")), 0);
        let beta = &result.records[1];
        assert_eq!(beta.job_description, SENTINEL);
        assert_eq!(beta.application_url, SENTINEL);
        assert_eq!(beta.company_name, "Beta Inc");
    }

    #[test]
    fn failed_detail_is_skipped_and_every_page_closed() {
        let browser = fixture_site();
        let orchestrator = Orchestrator::new(browser.clone(), config()).unwrap();

        let mut recorder = Recorder::default();
        let result = orchestrator.run(&mut recorder).unwrap();

        assert_eq!(recorder.failed, [4]);
        assert_eq!(recorder.skipped, [2]);
        assert_eq!(recorder.completed, [1, 5]);
        assert_eq!(browser.navigations_to(&detail_url("gamma")), 3);
        assert_eq!(result.total_finalized(), 3);
        // index page plus alpha, gamma and delta
        assert_eq!(browser.opened(), 4);
        assert_eq!(browser.closed(), 4);
    }

    #[test]
    fn index_failure_is_fatal() {
        let browser = FixtureBrowser::new();
        let orchestrator = Orchestrator::new(browser.clone(), config()).unwrap();
        let err = orchestrator.run(&mut LogObserver).unwrap_err();
        assert!(matches!(err, FatalError::IndexUnavailable { .. }));
        assert_eq!(browser.navigations_to(INDEX), 3);
    }

    #[test]
    fn lost_session_keeps_partial_results() {
        let index = index_html(&[card("beta", "Beta", true), card("alpha", "Alpha", false)]);
        let browser = FixtureBrowser::new()
            .with_page(INDEX, &index)
            .with_page(&detail_url("alpha"), &detail_html("Full-Time"));
        let orchestrator = Orchestrator::new(browser.clone(), config()).unwrap();

        let mut recorder = Recorder {
            close_browser_after_index: Some(browser.clone()),
            ..Recorder::default()
        };
        let result = orchestrator.run(&mut recorder).unwrap();

        assert!(recorder.aborted);
        assert_eq!(result.total_finalized(), 1);
        assert_eq!(result.records[0].job_title, "Beta");
        assert!(matches!(result.interrupted, Some(FatalError::Session(_))));
    }

    #[test]
    fn limit_caps_cards() {
        let browser = fixture_site();
        let mut config = config();
        config.limit = Some(2);
        let orchestrator = Orchestrator::new(browser.clone(), config).unwrap();
        let result = orchestrator.run(&mut LogObserver).unwrap();

        assert_eq!(result.total_discovered, 2);
        assert_eq!(result.total_finalized(), 1);
    }

    #[test]
    fn promotional_only_index_yields_no_records() {
        let browser = FixtureBrowser::new().with_page(INDEX, r#"<ul><li class="feature">Ad</li></ul>"#);
        let orchestrator = Orchestrator::new(browser, config()).unwrap();
        let result = orchestrator.run(&mut LogObserver).unwrap();
        assert_eq!(result.total_discovered, 1);
        assert!(result.records.is_empty());
        assert_eq!(result.success_rate(), Some(0.0));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let mut config = config();
        config.base_url = "not a url".to_string();
        let err = Orchestrator::new(FixtureBrowser::new(), config).err().unwrap();
        assert!(matches!(err, FatalError::InvalidBaseUrl { .. }));
    }
}
