pub mod config;
pub mod error;
pub mod models;
pub mod browser;
pub mod retry;
pub mod delay_manager;
pub mod logger;
pub mod listing;
pub mod extractor;
pub mod assembler;
pub mod export;
pub mod orchestrator;

// Exporting types for convenience
pub use browser::{Browser, HttpBrowser};
pub use config::ScrapeConfig;
pub use error::{ExportError, FatalError, FetchError, ListingError};
pub use export::{Exporter, Summary};
pub use extractor::Extractor;
pub use models::{JobRecord, RunResult, FIELD_NAMES, SENTINEL};
pub use orchestrator::{LogObserver, Orchestrator, ProgressEvent, ProgressObserver};
