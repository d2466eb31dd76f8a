//! Document retrieval.
//!
//! Extraction code only talks to the traits in this module: a [`Browser`] hands
//! out [`Page`]s, a page is a [`Document`] once loaded, and a document yields
//! [`Node`]s. [`HttpBrowser`] is the production implementation; the site is
//! server-rendered, so a plain GET plus HTML parsing is enough.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::node::Node as DomNode;
use scraper::{ElementRef, Html, Selector};
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use log::{debug, warn};

use crate::config::ScrapeConfig;
use crate::error::FetchError;

/// An element handle.
pub trait Node: Sized {
    /// Rendered text, trimmed, with blank lines dropped.
    fn inner_text(&self) -> String;
    fn attribute(&self, name: &str) -> Option<String>;
    fn query_selector(&self, selector: &str) -> Option<Self>;
    fn query_selector_all(&self, selector: &str) -> Vec<Self>;
}

/// Something that can be queried with CSS selectors.
pub trait Document {
    type Element<'a>: Node
    where
        Self: 'a;

    fn query_selector(&self, selector: &str) -> Option<Self::Element<'_>>;
    /// Matches in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element<'_>>;
}

/// A single browsing context.
pub trait Page: Document {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), FetchError>;
    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), FetchError>;
    /// Releases the context. Calling it twice is harmless.
    fn close(&mut self);
}

pub trait Browser {
    type Page: Page;

    fn new_page(&self) -> Result<Self::Page, FetchError>;

    fn new_scoped_page(&self) -> Result<ScopedPage<Self::Page>, FetchError> {
        self.new_page().map(ScopedPage::new)
    }
}

/// Owns a page and closes it when dropped, whichever way the owner returns.
pub struct ScopedPage<P: Page> {
    page: P,
}

impl<P: Page> ScopedPage<P> {
    pub fn new(page: P) -> Self {
        ScopedPage { page }
    }
}

impl<P: Page> Deref for ScopedPage<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.page
    }
}

impl<P: Page> DerefMut for ScopedPage<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.page
    }
}

impl<P: Page> Drop for ScopedPage<P> {
    fn drop(&mut self) {
        self.page.close();
    }
}

pub(crate) fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

/// Elements rendered on their own lines.
const BLOCK_ELEMENTS: [&str; 16] = [
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "section", "article",
    "header", "footer",
];
const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Text of `element` laid out the way a browser renders it: `<br>` and block
/// boundaries become line breaks, hidden elements contribute nothing.
fn rendered_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            DomNode::Text(text) => out.push_str(text),
            DomNode::Element(el) => {
                let name = el.name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                rendered_text(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn normalize_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl<'a> Node for ElementRef<'a> {
    fn inner_text(&self) -> String {
        let mut text = String::new();
        rendered_text(*self, &mut text);
        normalize_text(&text)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(|v| v.to_string())
    }

    fn query_selector(&self, selector: &str) -> Option<Self> {
        let selector = parse_selector(selector)?;
        let found = self.select(&selector).next();
        found
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let found = self.select(&selector).collect();
        found
    }
}

impl Document for Html {
    type Element<'a> = ElementRef<'a>;

    fn query_selector(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = parse_selector(selector)?;
        let found = self.select(&selector).next();
        found
    }

    fn query_selector_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let found = self.select(&selector).collect();
        found
    }
}

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

fn random_user_agent() -> &'static str {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
}

/// Blocking HTTP session shared by every page it opens (cookies included).
pub struct HttpBrowser {
    client: Client,
    user_agent: Option<String>,
}

impl HttpBrowser {
    pub fn new(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(config.navigation_timeout())
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::Session(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpBrowser {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

impl Browser for HttpBrowser {
    type Page = HttpPage;

    fn new_page(&self) -> Result<HttpPage, FetchError> {
        let user_agent = match &self.user_agent {
            Some(ua) => ua.clone(),
            None => random_user_agent().to_string(),
        };
        Ok(HttpPage {
            client: self.client.clone(),
            user_agent,
            document: None,
            closed: false,
        })
    }
}

pub struct HttpPage {
    client: Client,
    user_agent: String,
    document: Option<Html>,
    closed: bool,
}

impl Page for HttpPage {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), FetchError> {
        if self.closed {
            return Err(FetchError::Session("page already closed".to_string()));
        }
        let navigation_error = |reason: String| FetchError::Navigation {
            url: url.to_string(),
            reason,
        };

        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .timeout(timeout)
            .send()
            .map_err(|e| navigation_error(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status)));
        }

        let body = resp.text().map_err(|e| navigation_error(e.to_string()))?;
        self.document = Some(Html::parse_document(&body));
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), FetchError> {
        // The document is complete once fetched; there is nothing further to wait for.
        match self.query_selector(selector) {
            Some(_) => Ok(()),
            None => Err(FetchError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            }),
        }
    }

    fn close(&mut self) {
        self.document = None;
        self.closed = true;
    }
}

impl Document for HttpPage {
    type Element<'a> = ElementRef<'a>;

    fn query_selector(&self, selector: &str) -> Option<ElementRef<'_>> {
        self.document.as_ref()?.query_selector(selector)
    }

    fn query_selector_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match &self.document {
            Some(doc) => doc.query_selector_all(selector),
            None => Vec::new(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::FixtureBrowser;
    use super::*;

    #[test]
    fn node_text_is_trimmed_per_line() {
        let html = Html::parse_document(
            "<div class='d'>\n   <p>  First line </p>\n\n   <p>Second <b>bold</b> line</p>\n</div>",
        );
        let node = html.query_selector(".d").unwrap();
        assert_eq!(node.inner_text(), "First line\nSecond bold line");
    }

    #[test]
    fn line_breaks_and_blocks_become_newlines() {
        let html = Html::parse_document(
            "<div class='d'><div>We are hiring.<br><br>Requirements:</div>\
             <ul><li>Rust</li><li>Go</li></ul>\
             <div>Pay up to $90,000<br>per year</div>\
             <script>var tracking = 1;</script><style>p { color: red }</style></div>",
        );
        let node = html.query_selector(".d").unwrap();
        assert_eq!(
            node.inner_text(),
            "We are hiring.\nRequirements:\nRust\nGo\nPay up to $90,000\nper year"
        );
    }

    #[test]
    fn inline_elements_stay_on_one_line() {
        let html = Html::parse_document("<p class='p'>Apply <b>before</b> <span>Jan 5</span></p>");
        let node = html.query_selector(".p").unwrap();
        assert_eq!(node.inner_text(), "Apply before Jan 5");
    }

    #[test]
    fn scoped_queries_stay_inside_the_node() {
        let html = Html::parse_document(
            "<ul><li class='a'><span>one</span></li><li class='b'><span>two</span></li></ul>",
        );
        let b = html.query_selector("li.b").unwrap();
        assert_eq!(b.query_selector("span").unwrap().inner_text(), "two");
        assert_eq!(html.query_selector_all("span").len(), 2);
        assert_eq!(b.attribute("class").as_deref(), Some("b"));
        assert!(b.attribute("href").is_none());
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let html = Html::parse_document("<p>x</p>");
        assert!(html.query_selector("p[").is_none());
        assert!(html.query_selector_all("p[").is_empty());
    }

    #[test]
    fn scoped_page_closes_on_drop() {
        let browser = FixtureBrowser::new().with_page("https://x.test/", "<p>hi</p>");
        {
            let mut page = browser.new_scoped_page().unwrap();
            page.navigate("https://x.test/", Duration::from_secs(1)).unwrap();
            assert!(page.wait_for_selector("p", Duration::from_secs(1)).is_ok());
        }
        assert_eq!(browser.opened(), 1);
        assert_eq!(browser.closed(), 1);
    }

    #[test]
    fn missing_selector_is_a_timeout() {
        let browser = FixtureBrowser::new().with_page("https://x.test/", "<p>hi</p>");
        let mut page = browser.new_scoped_page().unwrap();
        page.navigate("https://x.test/", Duration::from_secs(1)).unwrap();
        let err = page.wait_for_selector("li.feature", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, FetchError::SelectorTimeout { .. }));
    }
}
