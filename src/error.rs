use std::time::Duration;
use thiserror::Error;

/// Failures reported by the document-retrieval layer.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("selector `{selector}` did not appear within {timeout:?}")]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("browser session unavailable: {0}")]
    Session(String),
}

/// Failure while processing a single listing. The listing is dropped,
/// except for `Session`, which ends the run: no further page can be opened.
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("detail page {url} unavailable after {attempts} attempts: {source}")]
    DetailUnavailable {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("could not open a page for {url}: {source}")]
    Session {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Failure outside the per-listing boundary. Ends the run early.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("index page {url} unavailable after {attempts} attempts: {source}")]
    IndexUnavailable {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("browser session lost: {0}")]
    Session(#[source] FetchError),

    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
