//! services/api/src/adapters/lookup.rs
//!
//! Adapters for the reference-lookup services: dictionary definitions,
//! encyclopedia summaries, and book search. Each implements its port from
//! the `core` crate over plain REST calls; failures degrade to
//! `PortError::External` and never take the request down.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use studyhub_core::domain::{BookResult, DictionaryEntry, EncyclopediaPage};
use studyhub_core::ports::{
    BookSearchService, DictionaryService, EncyclopediaService, PortError, PortResult,
};

const DICTIONARY_BASE: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
const WIKIPEDIA_BASE: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Book results are capped the way the source UI lists them.
const MAX_BOOK_RESULTS: usize = 10;

fn request_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::External("lookup service timed out".to_string())
    } else {
        PortError::External(e.to_string())
    }
}

fn unparseable() -> PortError {
    PortError::External("lookup service returned an unparseable payload".to_string())
}

/// Appends a user-supplied path segment with percent-encoding.
fn endpoint(base: &str, segment: &str) -> PortResult<Url> {
    let mut url =
        Url::parse(base).map_err(|e| PortError::Unexpected(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| PortError::Unexpected("lookup base url cannot be a base".to_string()))?
        .push(segment);
    Ok(url)
}

//=========================================================================================
// Dictionary
//=========================================================================================

/// `DictionaryService` backed by dictionaryapi.dev.
#[derive(Clone)]
pub struct DictionaryApiAdapter {
    http: reqwest::Client,
}

impl DictionaryApiAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DictionaryService for DictionaryApiAdapter {
    async fn define(&self, word: &str) -> PortResult<DictionaryEntry> {
        let url = endpoint(DICTIONARY_BASE, word)?;
        let response = self.http.get(url).send().await.map_err(request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound("word".to_string()));
        }
        if !response.status().is_success() {
            return Err(PortError::External(format!(
                "dictionary service returned status {}",
                response.status()
            )));
        }

        // The payload is irregular: phonetics entries may lack text or
        // audio, so each field is picked out defensively.
        let payload: Value = response.json().await.map_err(request_error)?;
        let entry = payload.get(0).ok_or_else(unparseable)?;

        let phonetics_list = entry
            .get("phonetics")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let phonetics = phonetics_list
            .iter()
            .find_map(|p| p.get("text").and_then(Value::as_str))
            .map(str::to_string);
        let audio = phonetics_list
            .iter()
            .find_map(|p| p.get("audio").and_then(Value::as_str))
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let definition = entry
            .pointer("/meanings/0/definitions/0/definition")
            .and_then(Value::as_str)
            .ok_or_else(unparseable)?
            .to_string();

        Ok(DictionaryEntry {
            word: word.to_string(),
            phonetics,
            audio,
            definition,
        })
    }
}

//=========================================================================================
// Encyclopedia
//=========================================================================================

/// `EncyclopediaService` backed by the Wikipedia REST summary endpoint.
#[derive(Clone)]
pub struct WikipediaAdapter {
    http: reqwest::Client,
}

impl WikipediaAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl EncyclopediaService for WikipediaAdapter {
    async fn summarize(&self, query: &str) -> PortResult<EncyclopediaPage> {
        let url = endpoint(WIKIPEDIA_BASE, query)?;
        let response = self.http.get(url).send().await.map_err(request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound("page".to_string()));
        }
        if !response.status().is_success() {
            return Err(PortError::External(format!(
                "encyclopedia service returned status {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(request_error)?;
        let title = payload
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(unparseable)?
            .to_string();
        let summary = payload
            .get("extract")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let url = payload
            .pointer("/content_urls/desktop/page")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(EncyclopediaPage {
            title,
            url,
            summary,
        })
    }
}

//=========================================================================================
// Book Search
//=========================================================================================

/// `BookSearchService` backed by the Google Books volumes API.
#[derive(Clone)]
pub struct GoogleBooksAdapter {
    http: reqwest::Client,
}

impl GoogleBooksAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BookSearchService for GoogleBooksAdapter {
    async fn search(&self, query: &str) -> PortResult<Vec<BookResult>> {
        let response = self
            .http
            .get(BOOKS_URL)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(PortError::External(format!(
                "book search returned status {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(request_error)?;
        let items = payload
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let results = items
            .iter()
            .filter_map(|item| {
                let info = item.get("volumeInfo")?;
                Some(BookResult {
                    title: info.get("title").and_then(Value::as_str)?.to_string(),
                    subtitle: info
                        .get("subtitle")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    description: info
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    page_count: info.get("pageCount").and_then(Value::as_i64),
                    categories: info
                        .get("categories")
                        .and_then(Value::as_array)
                        .map(|cats| {
                            cats.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                    thumbnail: info
                        .pointer("/imageLinks/thumbnail")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    preview_link: info
                        .get("previewLink")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .take(MAX_BOOK_RESULTS)
            .collect();

        Ok(results)
    }
}
