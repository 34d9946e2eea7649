//! Content sources.
//!
//! A [`ContentSource`] answers the two questions the build asks of the CMS:
//! "which posts exist" and "give me this post". Two implementations ship:
//!
//! | Source | Use |
//! |--------|-----|
//! | [`contentful::ContentfulClient`] | Contentful Delivery API over HTTP |
//! | [`fixture::FixtureSource`] | JSON file of posts, for offline builds and tests |
//!
//! ## Empty vs failed
//!
//! Both queries return `Result<Fetched<T>, ContentError>`. `Fetched::Empty`
//! means the store answered and had nothing (no posts, unknown slug); `Err`
//! means the store could not be asked. Callers treat the first as a normal
//! outcome and the second as fatal to the build.

pub mod contentful;
pub mod fixture;

use crate::types::{PostDetail, PostSummary};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Missing content API credential: set {0}")]
    MissingCredential(&'static str),
}

/// Outcome of a query that reached the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Found(T),
    Empty,
}

impl<T> Fetched<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Fetched::Empty)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::Empty => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Fetched<U> {
        match self {
            Fetched::Found(value) => Fetched::Found(f(value)),
            Fetched::Empty => Fetched::Empty,
        }
    }
}

impl<T> Fetched<Vec<T>> {
    /// `Empty` for an empty list, `Found` otherwise.
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Fetched::Empty
        } else {
            Fetched::Found(items)
        }
    }

    /// The items, or an empty vec.
    pub fn into_items(self) -> Vec<T> {
        self.into_option().unwrap_or_default()
    }
}

/// The two queries the build issues against the content store.
pub trait ContentSource {
    /// Metadata for every post, in the store's order. A single page of
    /// results is assumed to be the whole set.
    fn list_post_summaries(&self) -> Result<Fetched<Vec<PostSummary>>, ContentError>;

    /// One post by exact slug match.
    fn get_post_by_slug(&self, slug: &str) -> Result<Fetched<PostDetail>, ContentError>;
}
