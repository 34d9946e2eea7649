//! Shared test utilities for the simple-blog test suite.
//!
//! Builders for post records with predictable field values, so tests only
//! spell out the fields they care about:
//!
//! ```text
//! let mut post = sample_detail("hello");
//! post.summary.featured_image_url = None;
//! ```

use crate::types::{Author, Category, PostDetail, PostSummary, PublishDate};

/// Summary with title `Post {slug}`, a category, an author with avatar and a
/// featured image under `https://images.example.net/`.
pub fn sample_summary(slug: &str) -> PostSummary {
    PostSummary {
        slug: slug.to_string(),
        title: format!("Post {slug}"),
        excerpt: format!("Excerpt for {slug}"),
        category: Category {
            name: "Engineering".to_string(),
        },
        author: Author {
            name: "Ada Lovelace".to_string(),
            avatar_url: Some("https://images.example.net/ada.png".to_string()),
        },
        publish_date: PublishDate::new("2021-03-05"),
        featured_image_url: Some(format!("https://images.example.net/{slug}.png")),
    }
}

/// [`sample_summary`] plus a small markdown body.
pub fn sample_detail(slug: &str) -> PostDetail {
    PostDetail {
        summary: sample_summary(slug),
        content: format!("# {slug}\n\nBody of {slug}."),
    }
}

/// Detail without a featured image.
pub fn sample_detail_without_image(slug: &str) -> PostDetail {
    let mut detail = sample_detail(slug);
    detail.summary.featured_image_url = None;
    detail
}
