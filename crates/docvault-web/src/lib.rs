//! DocVault Web — URL fetching, HTML cleaning, and one-hop in-domain
//! link crawling.

pub mod fetcher;
pub mod html;

pub use fetcher::{ContentKind, FetchedPage, UrlBatchItem, WebFetcher};
pub use html::{clean_html, extract_links, filter_links, CleanedHtml};
