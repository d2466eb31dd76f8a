use wwr_scraper_lib::logger;
use wwr_scraper_lib::{Exporter, HttpBrowser, LogObserver, Orchestrator, ScrapeConfig, Summary};

use std::error::Error;
use log::{info, warn, error};
use chrono::Local;
use clap::Parser;

fn main() -> Result<(), Box<dyn Error>> {
    let config = ScrapeConfig::parse();
    logger::init(config.log_level);

    let started = Local::now();
    info!("Starting WeWorkRemotely scraper at {}", started.format("%Y-%m-%d %H:%M:%S"));

    let browser = match HttpBrowser::new(&config) {
        Ok(b) => b,
        Err(e) => {
            error!("Could not start browser session: {}", e);
            return Ok(());
        }
    };

    let orchestrator = match Orchestrator::new(browser, config.clone()) {
        Ok(o) => o,
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };

    let run = match orchestrator.run(&mut LogObserver) {
        Ok(run) => run,
        Err(e) => {
            error!("Fatal error: {}", e);
            return Ok(());
        }
    };

    if let Some(e) = &run.interrupted {
        warn!("Run ended early ({}); exporting the {} records collected so far", e, run.records.len());
    }

    if run.records.is_empty() {
        warn!("No jobs were scraped successfully; nothing to export");
    } else {
        let exporter = Exporter::new(&config.output_dir, started);
        if let Err(e) = exporter.export_all(&run) {
            error!("Export failed: {}", e);
        }
    }

    for line in Summary::from_run(&run).to_string().lines() {
        info!("{}", line);
    }
    info!("Finished at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}
