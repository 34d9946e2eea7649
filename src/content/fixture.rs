//! File-backed content source.
//!
//! Reads a JSON array of post records (the same shape as the metadata
//! sidecar) and answers both queries from memory. Used for offline builds
//! (`--fixture posts.json`) and throughout the test suite.

use super::{ContentError, ContentSource, Fetched};
use crate::types::{PostDetail, PostSummary};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    posts: Vec<PostDetail>,
}

impl FixtureSource {
    pub fn from_posts(posts: Vec<PostDetail>) -> Self {
        Self { posts }
    }

    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let content = fs::read_to_string(path)?;
        let posts: Vec<PostDetail> = serde_json::from_str(&content)?;
        Ok(Self { posts })
    }
}

impl ContentSource for FixtureSource {
    fn list_post_summaries(&self) -> Result<Fetched<Vec<PostSummary>>, ContentError> {
        let summaries: Vec<PostSummary> = self.posts.iter().map(|p| p.summary.clone()).collect();
        if summaries.is_empty() {
            log::warn!("Could not fetch blog posts!");
        }
        Ok(Fetched::from_items(summaries))
    }

    fn get_post_by_slug(&self, slug: &str) -> Result<Fetched<PostDetail>, ContentError> {
        match self.posts.iter().find(|p| p.slug() == slug) {
            Some(post) => Ok(Fetched::Found(post.clone())),
            None => {
                log::warn!("Could not fetch blog post: {slug}!");
                Ok(Fetched::Empty)
            }
        }
    }
}
