//! URL content fetching with content-type detection and an optional
//! one-hop crawl of in-domain links.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use docvault_core::{Error, Result};

use crate::html::{clean_html, extract_links, filter_links};

/// Fixed timeout for every outbound request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum spacing between consecutive link fetches.
const LINK_FETCH_DELAY: Duration = Duration::from_secs(1);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Detected content type of a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Pdf,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Pdf => "pdf",
        }
    }
}

/// Extracted text and metadata for one fetched URL.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub content_type: ContentKind,
}

impl FetchedPage {
    pub fn title(&self) -> &str {
        self.metadata.get("title").map(String::as_str).unwrap_or("Untitled")
    }
}

/// Outcome of one URL within a batch.
#[derive(Debug, Clone)]
pub struct UrlBatchItem {
    pub url: String,
    pub page: Option<FetchedPage>,
    pub error: Option<String>,
}

impl UrlBatchItem {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Web content fetcher with browser-like headers.
#[derive(Clone)]
pub struct WebFetcher {
    client: reqwest::Client,
}

impl Default for WebFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WebFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch one URL, detect its content type, and extract clean text.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = Url::parse(url).map_err(|e| Error::Fetch(format!("invalid URL {}: {}", url, e)))?;
        let (bytes, content_type) = self.fetch_raw(url).await?;

        if content_type.contains("application/pdf") {
            process_pdf(&bytes, url, &parsed)
        } else {
            Ok(process_html_page(
                &String::from_utf8_lossy(&bytes),
                url,
                &parsed,
            ))
        }
    }

    /// Fetch one URL and, for HTML content, crawl up to `max_links`
    /// same-domain links one hop deep, appending their text as labeled
    /// sections.
    pub async fn fetch_with_links(&self, url: &str, max_links: usize) -> Result<FetchedPage> {
        let parsed = Url::parse(url).map_err(|e| Error::Fetch(format!("invalid URL {}: {}", url, e)))?;
        let (bytes, content_type) = self.fetch_raw(url).await?;

        if content_type.contains("application/pdf") {
            // Link crawling is HTML-only.
            return process_pdf(&bytes, url, &parsed);
        }

        let html = String::from_utf8_lossy(&bytes);
        let links = filter_links(&parsed, &extract_links(&html), max_links);
        let mut page = process_html_page(&html, url, &parsed);

        let mut sections = Vec::new();
        for (i, link) in links.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(LINK_FETCH_DELAY).await;
            }

            let (bytes, content_type) = match self.fetch_raw(link).await {
                Ok(result) => result,
                Err(e) => {
                    // One broken link never aborts the crawl.
                    warn!("Skipping linked page {}: {}", link, e);
                    continue;
                }
            };
            if !content_type.contains("text/html") {
                debug!("Skipping non-HTML linked resource {}", link);
                continue;
            }

            let cleaned = clean_html(&String::from_utf8_lossy(&bytes));
            if cleaned.text.is_empty() {
                continue;
            }
            sections.push(format!(
                "--- Content from {} ({}) ---\n{}",
                cleaned.title, link, cleaned.text
            ));
        }

        if !sections.is_empty() {
            page.text
                .push_str(&format!("\n\nLINKED CONTENT\n\n{}", sections.join("\n\n")));
            page.metadata
                .insert("includes_linked_content".to_string(), "true".to_string());
            page.metadata
                .insert("linked_pages_count".to_string(), sections.len().to_string());
        }

        Ok(page)
    }

    /// Fetch a batch of URLs sequentially. Every URL yields exactly one
    /// item; failures are recorded, never propagated.
    pub async fn fetch_batch(&self, urls: &[String]) -> Vec<UrlBatchItem> {
        let mut items = Vec::with_capacity(urls.len());
        for url in urls {
            let item = match self.fetch(url).await {
                Ok(page) => UrlBatchItem {
                    url: url.clone(),
                    page: Some(page),
                    error: None,
                },
                Err(e) => UrlBatchItem {
                    url: url.clone(),
                    page: None,
                    error: Some(e.to_string()),
                },
            };
            items.push(item);
        }
        items
    }

    async fn fetch_raw(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .get(url)
            .headers(browser_headers())
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("reading body of {} failed: {}", url, e)))?;

        Ok((bytes.to_vec(), content_type))
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers
}

fn base_metadata(url: &str, parsed: &Url, title: &str, kind: ContentKind) -> HashMap<String, String> {
    HashMap::from([
        ("source".to_string(), url.to_string()),
        (
            "domain".to_string(),
            parsed.host_str().unwrap_or("").to_string(),
        ),
        ("title".to_string(), title.to_string()),
        ("content_type".to_string(), kind.as_str().to_string()),
        ("source_type".to_string(), "web".to_string()),
    ])
}

fn process_html_page(html: &str, url: &str, parsed: &Url) -> FetchedPage {
    let cleaned = clean_html(html);
    FetchedPage {
        metadata: base_metadata(url, parsed, &cleaned.title, ContentKind::Html),
        text: cleaned.text,
        content_type: ContentKind::Html,
    }
}

fn process_pdf(bytes: &[u8], url: &str, parsed: &Url) -> Result<FetchedPage> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::Fetch(format!("PDF from {} could not be parsed: {}", url, e)))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        if let Ok(text) = doc.extract_text(&[*page_number]) {
            let text = text.trim().to_string();
            if !text.is_empty() {
                pages.push(text);
            }
        }
    }

    let title = pdf_title(&doc).unwrap_or_else(|| url_file_name(parsed));

    Ok(FetchedPage {
        metadata: base_metadata(url, parsed, &title, ContentKind::Pdf),
        text: pages.join("\n\n"),
        content_type: ContentKind::Pdf,
    })
}

/// Title from the PDF Info dictionary, when present and non-empty.
fn pdf_title(doc: &lopdf::Document) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let dict = match info {
        lopdf::Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        lopdf::Object::Dictionary(dict) => dict,
        _ => return None,
    };
    match dict.get(b"Title").ok()? {
        lopdf::Object::String(bytes, _) => {
            let title = String::from_utf8_lossy(bytes).trim().to_string();
            (!title.is_empty()).then_some(title)
        }
        _ => None,
    }
}

fn url_file_name(parsed: &Url) -> String {
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/article");
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body(
                        "<html><head><title>Article Title</title></head>\
                         <body><nav>menu</nav><p>Body of the article.</p></body></html>",
                    );
            })
            .await;

        let url = server.url("/article");
        let page = WebFetcher::new().fetch(&url).await.unwrap();

        assert_eq!(page.content_type, ContentKind::Html);
        assert_eq!(page.title(), "Article Title");
        assert!(page.text.contains("Body of the article."));
        assert!(!page.text.contains("menu"));
        assert_eq!(page.metadata.get("source").unwrap(), &url);
        assert_eq!(page.metadata.get("source_type").unwrap(), "web");
        assert_eq!(page.metadata.get("domain").unwrap(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_fetch_404_is_fetch_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let err = WebFetcher::new()
            .fetch(&server.url("/missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[tokio::test]
    async fn test_batch_records_per_url_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ok1");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<html><body><p>one</p></body></html>");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ok2");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<html><body><p>two</p></body></html>");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken");
                then.status(404);
            })
            .await;

        let urls = vec![
            server.url("/ok1"),
            server.url("/broken"),
            server.url("/ok2"),
        ];
        let items = WebFetcher::new().fetch_batch(&urls).await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_success());
        assert!(!items[1].is_success());
        assert!(items[2].is_success());
        assert_eq!(items[1].url, server.url("/broken"));
        assert!(items[1].error.as_ref().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_with_links_appends_linked_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/main");
                then.status(200).header("content-type", "text/html").body(
                    "<html><head><title>Main</title></head><body>\
                     <p>Main page body.</p>\
                     <a href=\"/linked\">A very relevant page</a>\
                     <a href=\"/login\">Member sign-in page</a>\
                     </body></html>",
                );
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/linked");
                then.status(200).header("content-type", "text/html").body(
                    "<html><head><title>Linked</title></head>\
                     <body><p>Linked page body.</p></body></html>",
                );
            })
            .await;

        let page = WebFetcher::new()
            .fetch_with_links(&server.url("/main"), 5)
            .await
            .unwrap();

        assert!(page.text.contains("Main page body."));
        assert!(page.text.contains("LINKED CONTENT"));
        assert!(page.text.contains("--- Content from Linked"));
        assert!(page.text.contains("Linked page body."));
        assert_eq!(page.metadata.get("includes_linked_content").unwrap(), "true");
        assert_eq!(page.metadata.get("linked_pages_count").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_fetch_with_links_skips_broken_link() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/main");
                then.status(200).header("content-type", "text/html").body(
                    "<html><body><p>Main page body.</p>\
                     <a href=\"/gone\">A page that went away</a></body></html>",
                );
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(404);
            })
            .await;

        let page = WebFetcher::new()
            .fetch_with_links(&server.url("/main"), 5)
            .await
            .unwrap();

        assert!(page.text.contains("Main page body."));
        assert!(!page.text.contains("LINKED CONTENT"));
        assert!(page.metadata.get("includes_linked_content").is_none());
    }
}
