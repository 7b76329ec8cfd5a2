//! Page-number pagination for the order listing.
//!
//! Responses use the envelope `{count, next, previous, results}` where
//! `next` and `previous` are absolute URLs to the neighbouring pages.

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_PAGE_SIZE: u64 = 3;
pub const MAX_PAGE_SIZE: u64 = 20;
pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// A page size that is missing, unparsable or not positive falls back
    /// to the default; larger sizes are capped.
    pub fn from_query(query: &PageQuery) -> ApiResult<Self> {
        let page_size = query
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|size| *size > 0)
            .map_or(DEFAULT_PAGE_SIZE, |size| size.min(MAX_PAGE_SIZE));

        let page = match query.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|page| *page > 0)
                .ok_or(ApiError::InvalidPage)?,
        };

        Ok(Self { page, page_size })
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    pub fn page_count(&self, count: u64) -> u64 {
        count.div_ceil(self.page_size)
    }

    /// The first page always exists, even when empty.
    pub fn ensure_exists(&self, count: u64) -> ApiResult<()> {
        if self.page > 1 && self.page > self.page_count(count) {
            return Err(ApiError::InvalidPage);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, count: u64, url: &RequestUrl, results: Vec<T>) -> Self {
        let next = (request.page < request.page_count(count)).then(|| url.with_page(Some(request.page + 1)));
        let previous = match request.page {
            1 => None,
            2 => Some(url.with_page(None)),
            page => Some(url.with_page(Some(page - 1))),
        };
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Absolute URL of the current request, used to build page links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    base: String,
    query: Vec<(String, String)>,
}

impl RequestUrl {
    pub fn new(scheme: &str, host: &str, path: &str, query: Option<&str>) -> Self {
        let query = query
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();
        Self {
            base: format!("{scheme}://{host}{path}"),
            query,
        }
    }

    /// Replaces the page parameter, or drops it when `page` is `None`.
    /// Other parameters keep their order.
    pub fn with_page(&self, page: Option<u64>) -> String {
        let mut pairs: Vec<String> = Vec::with_capacity(self.query.len() + 1);
        let mut replaced = false;
        for (key, value) in &self.query {
            if key == PAGE_PARAM {
                if let (Some(page), false) = (page, replaced) {
                    pairs.push(format!("{PAGE_PARAM}={page}"));
                    replaced = true;
                }
                continue;
            }
            pairs.push(format!("{key}={value}"));
        }
        if let (Some(page), false) = (page, replaced) {
            pairs.push(format!("{PAGE_PARAM}={page}"));
        }

        if pairs.is_empty() {
            self.base.clone()
        } else {
            format!("{}?{}", self.base, pairs.join("&"))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestUrl
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers strip their prefix from `parts.uri`.
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.clone(), |original| original.0.clone());
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|authority| authority.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http")
            .to_string();

        Ok(RequestUrl::new(&scheme, &host, uri.path(), uri.query()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn default_page_size_is_three() {
        let request = PageRequest::from_query(&query(None, None)).unwrap();
        assert_eq!(request, PageRequest { page: 1, page_size: 3 });
    }

    #[test]
    fn page_size_is_client_overridable_up_to_twenty() {
        assert_eq!(PageRequest::from_query(&query(None, Some("10"))).unwrap().page_size, 10);
        assert_eq!(PageRequest::from_query(&query(None, Some("25"))).unwrap().page_size, 20);
        assert_eq!(PageRequest::from_query(&query(None, Some("20"))).unwrap().page_size, 20);
    }

    #[test]
    fn bad_page_size_falls_back_to_default() {
        for raw in ["0", "-4", "lots", ""] {
            assert_eq!(
                PageRequest::from_query(&query(None, Some(raw))).unwrap().page_size,
                DEFAULT_PAGE_SIZE
            );
        }
    }

    #[test]
    fn bad_page_number_is_invalid_page() {
        for raw in ["0", "abc", "-1"] {
            assert!(matches!(
                PageRequest::from_query(&query(Some(raw), None)),
                Err(ApiError::InvalidPage)
            ));
        }
    }

    #[test]
    fn skip_and_page_count() {
        let request = PageRequest { page: 3, page_size: 3 };
        assert_eq!(request.skip(), 6);
        assert_eq!(request.page_count(7), 3);
        assert_eq!(request.page_count(0), 0);
    }

    #[test]
    fn pages_beyond_the_last_do_not_exist() {
        let first = PageRequest { page: 1, page_size: 3 };
        assert!(first.ensure_exists(0).is_ok());

        let third = PageRequest { page: 3, page_size: 3 };
        assert!(third.ensure_exists(7).is_ok());
        assert!(matches!(third.ensure_exists(6), Err(ApiError::InvalidPage)));
    }

    #[test]
    fn links_replace_page_and_keep_other_params() {
        let url = RequestUrl::new("http", "localhost:8000", "/api/cinema/orders/", Some("page=2&page_size=2"));
        let page = Page::new(PageRequest { page: 2, page_size: 2 }, 5, &url, vec![(); 2]);

        assert_eq!(
            page.next.as_deref(),
            Some("http://localhost:8000/api/cinema/orders/?page=3&page_size=2")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://localhost:8000/api/cinema/orders/?page_size=2")
        );
    }

    #[test]
    fn first_and_last_pages_have_one_link() {
        let url = RequestUrl::new("https", "cinema.example", "/api/cinema/orders/", None);

        let first = Page::new(PageRequest { page: 1, page_size: 3 }, 4, &url, vec![(); 3]);
        assert_eq!(first.previous, None);
        assert_eq!(first.next.as_deref(), Some("https://cinema.example/api/cinema/orders/?page=2"));

        let last = Page::new(PageRequest { page: 2, page_size: 3 }, 4, &url, vec![(); 1]);
        assert_eq!(last.next, None);
        assert_eq!(last.previous.as_deref(), Some("https://cinema.example/api/cinema/orders/"));
    }

    #[test]
    fn middle_page_previous_keeps_number() {
        let url = RequestUrl::new("http", "h", "/o", Some("page=4"));
        let page = Page::new(PageRequest { page: 4, page_size: 3 }, 20, &url, Vec::<u8>::new());
        assert_eq!(page.previous.as_deref(), Some("http://h/o?page=3"));
        assert_eq!(page.next.as_deref(), Some("http://h/o?page=5"));
    }
}
