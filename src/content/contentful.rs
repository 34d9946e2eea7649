//! Contentful Delivery API client.
//!
//! Issues the two entry queries against
//! `{api_url}/spaces/{space}/environments/{env}/entries` and normalizes the
//! response into [`PostSummary`] / [`PostDetail`] records.
//!
//! ## Link resolution
//!
//! The REST API does not inline referenced entries. A post's `author`,
//! `category` and `featuredImage` fields arrive as link stubs:
//!
//! ```json
//! { "sys": { "type": "Link", "linkType": "Entry", "id": "4fX..." } }
//! ```
//!
//! and the targets are delivered once, in the response's `includes.Entry` /
//! `includes.Asset` arrays. [`Links`] indexes those arrays by id so
//! normalization can follow a stub to its target. Asset URLs are
//! protocol-relative (`//images.ctfassets.net/...`) and get `https:` here.
//!
//! ## Query shapes
//!
//! | Query | Extra parameters |
//! |-------|------------------|
//! | listing | `select=fields.title,fields.publishDate,...` |
//! | by slug | `fields.slug={slug}` |
//!
//! No pagination: the default page size is assumed to hold every post.

use super::{ContentError, ContentSource, Fetched};
use crate::config::{ContentConfig, ENV_ACCESS_TOKEN, ENV_SPACE_ID};
use crate::types::{
    Author, Category, PostDetail, PostSummary, PublishDate, https_url, is_url_safe_slug,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Field projection used by the listing query.
const LISTING_FIELDS: &str = "fields.title,fields.publishDate,fields.slug,fields.featuredImage,fields.category,fields.excerpt,fields.author";

const UNCATEGORIZED: &str = "Uncategorized";
const UNKNOWN_AUTHOR: &str = "Unknown author";

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct EntryCollection {
    #[serde(default)]
    items: Vec<Entry>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default, rename = "Entry")]
    entries: Vec<Entry>,
    #[serde(default, rename = "Asset")]
    assets: Vec<Asset>,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    sys: Sys,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    #[serde(default)]
    sys: Sys,
    #[serde(default)]
    fields: AssetFields,
}

#[derive(Debug, Default, Deserialize)]
struct AssetFields {
    #[serde(default)]
    file: Option<AssetFile>,
}

#[derive(Debug, Deserialize)]
struct AssetFile {
    url: String,
}

// ============================================================================
// Link resolution and normalization
// ============================================================================

/// Id index over every entry and asset a response delivered.
struct Links<'a> {
    entries: HashMap<&'a str, &'a Entry>,
    assets: HashMap<&'a str, &'a Asset>,
}

impl<'a> Links<'a> {
    fn new(collection: &'a EntryCollection) -> Self {
        let entries = collection
            .includes
            .entries
            .iter()
            .chain(&collection.items)
            .map(|e| (e.sys.id.as_str(), e))
            .collect();
        let assets = collection
            .includes
            .assets
            .iter()
            .map(|a| (a.sys.id.as_str(), a))
            .collect();
        Self { entries, assets }
    }

    fn entry(&self, field: Option<&Value>) -> Option<&'a Entry> {
        let id = link_id(field?, "Entry")?;
        self.entries.get(id).copied()
    }

    fn asset_url(&self, field: Option<&Value>) -> Option<String> {
        let id = link_id(field?, "Asset")?;
        let file = self.assets.get(id)?.fields.file.as_ref()?;
        Some(https_url(&file.url))
    }
}

/// Id of a `{"sys": {"type": "Link", "linkType": ..., "id": ...}}` stub.
fn link_id<'v>(value: &'v Value, link_type: &str) -> Option<&'v str> {
    let sys = value.get("sys")?;
    if sys.get("linkType")?.as_str()? != link_type {
        return None;
    }
    sys.get("id")?.as_str()
}

fn str_field<'e>(fields: &'e Map<String, Value>, key: &str) -> Option<&'e str> {
    fields.get(key).and_then(Value::as_str)
}

fn summary_from_entry(entry: &Entry, links: &Links) -> Option<PostSummary> {
    let fields = &entry.fields;
    let (Some(slug), Some(title)) = (str_field(fields, "slug"), str_field(fields, "title")) else {
        log::warn!("Skipping entry {} without slug or title", entry.sys.id);
        return None;
    };
    if !is_url_safe_slug(slug) {
        log::warn!("Skipping entry {} with unusable slug {slug:?}", entry.sys.id);
        return None;
    }

    let category = links
        .entry(fields.get("category"))
        .and_then(|c| str_field(&c.fields, "categoryName").or(str_field(&c.fields, "name")))
        .unwrap_or(UNCATEGORIZED);

    let author = match links.entry(fields.get("author")) {
        Some(author) => Author {
            name: str_field(&author.fields, "name")
                .unwrap_or(UNKNOWN_AUTHOR)
                .to_string(),
            avatar_url: links.asset_url(author.fields.get("picture")),
        },
        None => Author {
            name: UNKNOWN_AUTHOR.to_string(),
            avatar_url: None,
        },
    };

    Some(PostSummary {
        slug: slug.to_string(),
        title: title.to_string(),
        excerpt: str_field(fields, "excerpt").unwrap_or_default().to_string(),
        category: Category {
            name: category.to_string(),
        },
        author,
        publish_date: PublishDate::new(str_field(fields, "publishDate").unwrap_or_default()),
        featured_image_url: links.asset_url(fields.get("featuredImage")),
    })
}

fn detail_from_entry(entry: &Entry, links: &Links) -> Option<PostDetail> {
    let summary = summary_from_entry(entry, links)?;
    Some(PostDetail {
        summary,
        content: str_field(&entry.fields, "content")
            .unwrap_or_default()
            .to_string(),
    })
}

fn summaries_from_collection(collection: &EntryCollection) -> Vec<PostSummary> {
    let links = Links::new(collection);
    collection
        .items
        .iter()
        .filter_map(|entry| summary_from_entry(entry, &links))
        .collect()
}

fn first_detail_from_collection(collection: &EntryCollection) -> Option<PostDetail> {
    let links = Links::new(collection);
    collection
        .items
        .first()
        .and_then(|entry| detail_from_entry(entry, &links))
}

/// The first item, provided it really is the requested post.
fn detail_for_slug(collection: &EntryCollection, slug: &str) -> Option<PostDetail> {
    let detail = first_detail_from_collection(collection)?;
    if detail.slug() != slug {
        log::warn!(
            "Query for slug {slug:?} returned {:?}; treating as not found",
            detail.slug()
        );
        return None;
    }
    Some(detail)
}

/// `{api_url}/spaces/{space}/environments/{env}/entries`
fn entries_url(api_url: &str, space: &str, environment: &str) -> Result<Url, ContentError> {
    let mut url = Url::parse(api_url)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["spaces", space, "environments", environment, "entries"]);
    Ok(url)
}

// ============================================================================
// Client
// ============================================================================

/// Blocking Contentful Delivery API client.
pub struct ContentfulClient {
    http: reqwest::blocking::Client,
    entries_url: Url,
    access_token: String,
    content_type: String,
}

impl ContentfulClient {
    /// Build a client from config. Fails when either credential is missing.
    pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
        if config.space_id.is_empty() {
            return Err(ContentError::MissingCredential(ENV_SPACE_ID));
        }
        if config.access_token.is_empty() {
            return Err(ContentError::MissingCredential(ENV_ACCESS_TOKEN));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            entries_url: entries_url(&config.api_url, &config.space_id, &config.environment)?,
            access_token: config.access_token.clone(),
            content_type: config.content_type.clone(),
        })
    }

    /// URL of the listing query.
    pub fn listing_url(&self) -> Url {
        let mut url = self.entries_url.clone();
        url.query_pairs_mut()
            .append_pair("content_type", &self.content_type)
            .append_pair("select", LISTING_FIELDS);
        url
    }

    /// URL of the by-slug query.
    pub fn detail_url(&self, slug: &str) -> Url {
        let mut url = self.entries_url.clone();
        url.query_pairs_mut()
            .append_pair("content_type", &self.content_type)
            .append_pair("fields.slug", slug);
        url
    }

    fn fetch(&self, url: Url) -> Result<EntryCollection, ContentError> {
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ContentError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        Ok(response.json::<EntryCollection>()?)
    }
}

impl ContentSource for ContentfulClient {
    fn list_post_summaries(&self) -> Result<Fetched<Vec<PostSummary>>, ContentError> {
        let collection = self.fetch(self.listing_url())?;
        let summaries = summaries_from_collection(&collection);
        if summaries.is_empty() {
            log::warn!("Could not fetch blog posts!");
        }
        Ok(Fetched::from_items(summaries))
    }

    fn get_post_by_slug(&self, slug: &str) -> Result<Fetched<PostDetail>, ContentError> {
        let collection = self.fetch(self.detail_url(slug))?;
        match detail_for_slug(&collection, slug) {
            Some(detail) => Ok(Fetched::Found(detail)),
            None => {
                log::warn!("Could not fetch blog post: {slug}!");
                Ok(Fetched::Empty)
            }
        }
    }
}
