use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://weworkremotely.com/";

#[derive(Parser, Debug, Clone)]
#[command(name = "wwr-scraper", version, about = "Scrapes WeWorkRemotely listings into XLSX, CSV and JSON")]
pub struct ScrapeConfig {
    #[arg(long, default_value = DEFAULT_BASE_URL, help = "Index page to crawl; relative links resolve against it")]
    pub base_url: String,

    #[arg(long, default_value = ".", help = "Directory the export files are written to")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = 3, help = "Attempts per page load before giving up")]
    pub max_attempts: u32,

    #[arg(long, default_value_t = 2000)]
    pub index_retry_delay_ms: u64,

    #[arg(long, default_value_t = 1000)]
    pub detail_retry_delay_ms: u64,

    #[arg(long, default_value_t = 1500, help = "Pause after each detail page, to go easy on the site")]
    pub politeness_delay_ms: u64,

    #[arg(long, default_value_t = 60)]
    pub navigation_timeout_secs: u64,

    #[arg(long, default_value_t = 30)]
    pub index_wait_secs: u64,

    #[arg(long, default_value_t = 20)]
    pub detail_wait_secs: u64,

    #[arg(long, help = "Fixed User-Agent; a random desktop browser one is used per page otherwise")]
    pub user_agent: Option<String>,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    #[arg(long, help = "Stop after this many listing cards")]
    pub limit: Option<usize>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig::parse_from(["wwr-scraper"])
    }
}

impl ScrapeConfig {
    pub fn index_retry_delay(&self) -> Duration {
        Duration::from_millis(self.index_retry_delay_ms)
    }

    pub fn detail_retry_delay(&self) -> Duration {
        Duration::from_millis(self.detail_retry_delay_ms)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn index_wait(&self) -> Duration {
        Duration::from_secs(self.index_wait_secs)
    }

    pub fn detail_wait(&self) -> Duration {
        Duration::from_secs(self.detail_wait_secs)
    }

    /// Same settings with every sleep removed. Used by tests.
    pub fn without_delays(mut self) -> Self {
        self.index_retry_delay_ms = 0;
        self.detail_retry_delay_ms = 0;
        self.politeness_delay_ms = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_policy() {
        let config = ScrapeConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.index_retry_delay(), Duration::from_secs(2));
        assert_eq!(config.detail_retry_delay(), Duration::from_secs(1));
        assert_eq!(config.politeness_delay(), Duration::from_millis(1500));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.limit.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = ScrapeConfig::parse_from([
            "wwr-scraper",
            "--max-attempts",
            "5",
            "--politeness-delay-ms",
            "0",
            "--log-level",
            "debug",
            "--limit",
            "10",
        ]);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.politeness_delay(), Duration::ZERO);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.limit, Some(10));
    }
}
