//! Static paths and page props.
//!
//! Stage 1 of the build. Turns the content store's listing into the set of
//! static routes and fetches each post's detail as the props for its page.
//!
//! ```text
//! listing ──dedupe──▶ routes (/blog/post/{slug}, listing order)
//!    │
//!    └── per slug: get_post_by_slug ──▶ PostPage::Ready | PostPage::Missing
//! ```
//!
//! ## Duplicate slugs
//!
//! Slugs are assumed unique but not enforced by the CMS. When two listing
//! entries share a slug the **first one wins**: it keeps its position, later
//! duplicates are dropped with a warning, and exactly one route is emitted.
//!
//! ## Unusable slugs
//!
//! A slug becomes a directory under `blog/post/`, so entries whose slug is
//! empty or contains anything but letters, digits, `-` and `_` are skipped
//! with a warning before de-duplication.
//!
//! ## Missing details
//!
//! A slug that lists but whose detail query comes back empty still gets a
//! route; its page renders the not-found view. There is no fallback route for
//! slugs that never listed.
//!
//! ## Paths manifest
//!
//! The stage's output is persisted as `routes.json` (listing + routes) next to
//! the metadata sidecar, so `generate` and `sitemap` can run as separate
//! invocations.

use crate::content::{ContentError, ContentSource, Fetched};
use crate::sidecar::Sidecar;
use crate::types::{PostDetail, PostSummary, RouteDescriptor, is_url_safe_slug};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// File name of the paths manifest inside the temp directory.
pub const PATHS_MANIFEST_FILE: &str = "routes.json";

/// Props for one post route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPage {
    Ready(PostDetail),
    /// Listed, but the detail query returned nothing.
    Missing { slug: String },
}

impl PostPage {
    pub fn slug(&self) -> &str {
        match self {
            PostPage::Ready(detail) => detail.slug(),
            PostPage::Missing { slug } => slug,
        }
    }

    pub fn route(&self) -> RouteDescriptor {
        RouteDescriptor::for_slug(self.slug())
    }
}

/// Persisted output of the paths stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsManifest {
    /// De-duplicated listing, in store order.
    pub posts: Vec<PostSummary>,
    /// One route per post, same order.
    pub routes: Vec<RouteDescriptor>,
}

impl PathsManifest {
    pub fn write(&self, path: &Path) -> Result<(), ContentError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, ContentError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Everything the later stages need: listing, routes and per-post props.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProps {
    pub posts: Vec<PostSummary>,
    pub routes: Vec<RouteDescriptor>,
    pub pages: Vec<PostPage>,
    /// Slugs dropped by first-wins de-duplication, in listing order.
    pub duplicates: Vec<String>,
}

impl StaticProps {
    /// Sidecar records: every post whose detail was found, in route order.
    pub fn sidecar(&self) -> Sidecar {
        Sidecar::new(
            self.pages
                .iter()
                .filter_map(|page| match page {
                    PostPage::Ready(detail) => Some(detail.clone()),
                    PostPage::Missing { .. } => None,
                })
                .collect(),
        )
    }

    pub fn manifest(&self) -> PathsManifest {
        PathsManifest {
            posts: self.posts.clone(),
            routes: self.routes.clone(),
        }
    }

    /// Rebuild props from a paths manifest and the sidecar it was written
    /// alongside, without touching the content store.
    pub fn from_artifacts(manifest: PathsManifest, sidecar: &Sidecar) -> Self {
        let pages = manifest
            .posts
            .iter()
            .map(|post| match sidecar.find(&post.slug) {
                Some(detail) => PostPage::Ready(detail.clone()),
                None => PostPage::Missing {
                    slug: post.slug.clone(),
                },
            })
            .collect();
        Self {
            posts: manifest.posts,
            routes: manifest.routes,
            pages,
            duplicates: Vec::new(),
        }
    }

    /// Posts whose detail was found; the number of sidecar records.
    pub fn ready_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p, PostPage::Ready(_)))
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p, PostPage::Missing { .. }))
            .count()
    }
}

/// Drop entries whose slug cannot be a single route segment.
pub fn drop_unsafe_slugs(summaries: Vec<PostSummary>) -> Vec<PostSummary> {
    summaries
        .into_iter()
        .filter(|summary| {
            let safe = is_url_safe_slug(&summary.slug);
            if !safe {
                log::warn!(
                    "Skipping {:?} with unusable slug {:?}",
                    summary.title,
                    summary.slug
                );
            }
            safe
        })
        .collect()
}

/// Drop later entries whose slug was already seen. Returns the kept summaries
/// and the dropped slugs.
pub fn dedupe_by_slug(summaries: Vec<PostSummary>) -> (Vec<PostSummary>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(summaries.len());
    let mut dropped = Vec::new();
    for summary in summaries {
        if seen.insert(summary.slug.clone()) {
            kept.push(summary);
        } else {
            log::warn!(
                "Duplicate slug {:?} ({:?}); keeping the first entry",
                summary.slug,
                summary.title
            );
            dropped.push(summary.slug);
        }
    }
    (kept, dropped)
}

/// One route per unique slug, in listing order.
pub fn static_paths(summaries: &[PostSummary]) -> Vec<RouteDescriptor> {
    let mut seen = HashSet::new();
    summaries
        .iter()
        .filter(|s| seen.insert(s.slug.as_str()))
        .map(PostSummary::route)
        .collect()
}

/// Run the paths stage against a content source.
pub fn build_static_props(source: &dyn ContentSource) -> Result<StaticProps, ContentError> {
    let listing = drop_unsafe_slugs(source.list_post_summaries()?.into_items());
    let (posts, duplicates) = dedupe_by_slug(listing);
    let routes = static_paths(&posts);

    let mut pages = Vec::with_capacity(posts.len());
    for post in &posts {
        let page = match source.get_post_by_slug(&post.slug)? {
            Fetched::Found(detail) => PostPage::Ready(detail),
            Fetched::Empty => PostPage::Missing {
                slug: post.slug.clone(),
            },
        };
        pages.push(page);
    }

    Ok(StaticProps {
        posts,
        routes,
        pages,
        duplicates,
    })
}
