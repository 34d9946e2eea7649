//! Shared post types used across all pipeline stages.
//!
//! These types cross stage boundaries as JSON (the paths manifest and the
//! metadata sidecar), so field names are serialized in camelCase to match the
//! field names the content API uses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Prefix of every post detail route.
pub const POST_ROUTE_PREFIX: &str = "/blog/post/";

/// The single listing route.
pub const LISTING_ROUTE: &str = "/blog";

/// A post category (only the display name survives normalization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

/// A post author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Publish date as delivered by the content store.
///
/// The raw string is kept so JSON-LD and the sidecar reproduce exactly what
/// the CMS returned. Contentful emits `2021-03-05`, `2021-03-05T10:00+01:00`
/// or full RFC 3339; only the calendar date is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishDate(String);

impl PublishDate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date from the leading `YYYY-MM-DD`, if it parses.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.0.trim();
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    }

    /// Long US-English form, e.g. `March 5, 2021`. Falls back to the raw value.
    pub fn display(&self) -> String {
        match self.date() {
            Some(date) => date.format("%B %-d, %Y").to_string(),
            None => self.0.clone(),
        }
    }
}

/// Listing-query projection of a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    /// URL-safe identifier; assumed unique across the listing.
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub category: Category,
    pub author: Author,
    #[serde(default)]
    pub publish_date: PublishDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
}

impl PostSummary {
    /// The static route this post is served at.
    pub fn route(&self) -> RouteDescriptor {
        RouteDescriptor::for_slug(&self.slug)
    }
}

/// A fully fetched post: summary fields plus the markdown body.
///
/// This is also the record type of the metadata sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub summary: PostSummary,
    /// Markdown source.
    #[serde(default)]
    pub content: String,
}

impl PostDetail {
    pub fn slug(&self) -> &str {
        &self.summary.slug
    }
}

/// One generated static route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
}

impl RouteDescriptor {
    pub fn for_slug(slug: &str) -> Self {
        Self {
            path: format!("{POST_ROUTE_PREFIX}{slug}"),
        }
    }

    pub fn listing() -> Self {
        Self {
            path: LISTING_ROUTE.to_string(),
        }
    }

    /// Slug of a post route: the trailing path segment. `None` for other routes.
    pub fn post_slug(&self) -> Option<&str> {
        self.path
            .strip_prefix(POST_ROUTE_PREFIX)
            .and_then(|rest| rest.rsplit('/').next())
            .filter(|slug| !slug.is_empty())
    }
}

/// Whether a slug can be used as a single path segment under
/// `/blog/post/`: non-empty, letters, digits, `-` and `_` only.
pub fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Prefix protocol-relative URLs (`//host/path`) with `https:`.
///
/// Contentful serves asset URLs without a scheme; anything else is returned
/// unchanged.
pub fn https_url(src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src.to_string()
    }
}
