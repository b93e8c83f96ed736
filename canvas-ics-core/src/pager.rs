//! Cursor pagination over `Link: <...>; rel="next"` headers.
//!
//! [`Pager`] walks a collection one page at a time. Each follow-up request
//! uses the URL from the previous response's `next` relation with empty
//! query parameters, since that URL already carries them. Iteration ends
//! when a response has no `next` relation; there is no page cap.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::Result;

/// Query parameters for a page request.
pub type Params = Vec<(String, String)>;

/// One decoded page of a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in upstream order
    pub records: Vec<Value>,
    /// URL of the following page, if the server advertised one
    pub next: Option<String>,
}

/// Fetches a single page. Implemented over HTTP by
/// [`CanvasClient`](crate::client::CanvasClient).
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str, params: &[(String, String)]) -> Result<Page>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for &T {
    async fn fetch_page(&self, url: &str, params: &[(String, String)]) -> Result<Page> {
        (**self).fetch_page(url, params).await
    }
}

/// Lazy, finite walk over a paginated collection.
///
/// Pages are requested only when [`Pager::next_page`] is called, so a caller
/// may stop early. To start over, build a new pager.
pub struct Pager<'a, S: PageSource + ?Sized> {
    source: &'a S,
    pending: Option<(String, Params)>,
    pages_fetched: usize,
}

impl<'a, S: PageSource + ?Sized> Pager<'a, S> {
    /// An empty `url` yields no pages.
    pub fn new(source: &'a S, url: impl Into<String>, params: Params) -> Self {
        let url = url.into();
        let pending = (!url.is_empty()).then_some((url, params));
        Self {
            source,
            pending,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, or `None` once the collection is exhausted.
    ///
    /// A failed request also exhausts the pager.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        let Some((url, params)) = self.pending.take() else {
            return Ok(None);
        };

        tracing::debug!(page = self.pages_fetched + 1, %url, "fetching page");
        let page = self.source.fetch_page(&url, &params).await?;
        self.pages_fetched += 1;

        self.pending = page
            .next
            .filter(|next| !next.is_empty())
            .map(|next| (next, Params::new()));

        Ok(Some(page.records))
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_none()
    }

    /// Drain every remaining page into one list, preserving order.
    pub async fn collect_all(mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }
        Ok(records)
    }
}

static LINK_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]*)>([^<]*)").expect("valid link regex"));
static REL_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\brel\s*=\s*(?:"([^"]*)"|([^\s;,]+))"#).expect("valid rel regex")
});

/// Extract the `next` relation from an RFC 8288 `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    LINK_ENTRY.captures_iter(header).find_map(|entry| {
        let params = entry.get(2)?.as_str();
        let rel = REL_PARAM.captures(params)?;
        let rel = rel.get(1).or_else(|| rel.get(2))?.as_str();
        rel.split_whitespace()
            .any(|r| r.eq_ignore_ascii_case("next"))
            .then(|| entry[1].trim().to_string())
    })
}

/// Convert borrowed query pairs into owned [`Params`].
pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
