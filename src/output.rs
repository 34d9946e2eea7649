//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every post is its semantic identity (positional index and title) with
//! routes and output files shown as secondary, indented context lines. This
//! makes the output readable as a content inventory while still letting users
//! trace every page back to its slug.
//!
//! # Output Format
//!
//! ## Paths
//!
//! ```text
//! Posts
//! 001 Hello World
//!     Route: /blog/post/hello-world
//!     Category: Engineering
//! 002 Ghost
//!     Route: /blog/post/ghost
//!     Detail: missing (renders 404)
//!
//! Duplicates
//!     hello-world (dropped)
//!
//! Sidecar: .simple-blog-temp/blogPostMeta.json (1 record)
//! ```
//!
//! ## Generate
//!
//! ```text
//! Listing → blog/index.html
//! 001 hello-world → blog/post/hello-world/index.html
//! 002 ghost → blog/post/ghost/index.html (not found)
//! Not found → 404.html
//!
//! Generated 2 post pages, 1 missing, 3 assets
//! ```
//!
//! ## Sitemap
//!
//! ```text
//! 001 https://example.com/blog
//! 002 https://example.com/blog/post/hello-world
//!     Image: https://images.ctfassets.net/cover.png
//!
//! Wrote sitemap.xml (2 urls, 1 image), robots.txt
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::SiteConfig;
use crate::generate::{GenerateReport, LISTING_PAGE, NOT_FOUND_PAGE};
use crate::paths::{PostPage, StaticProps};
use crate::sitemap::SitemapEntry;
use crate::types::PostSummary;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 record`, `2 records`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head.trim_end())
    }
}

// ============================================================================
// Stage 1: Paths output
// ============================================================================

/// Format paths stage output: one entry per route, then dropped duplicates
/// and the sidecar location.
pub fn format_paths_output(props: &StaticProps, sidecar_path: &Path) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];

    if props.posts.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }

    for (i, post) in props.posts.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), post.title));
        lines.push(format!("{}Route: {}", indent(1), post.route().path));
        lines.push(format!("{}Category: {}", indent(1), post.category.name));
        let missing = props
            .pages
            .iter()
            .any(|p| matches!(p, PostPage::Missing { slug } if *slug == post.slug));
        if missing {
            lines.push(format!("{}Detail: missing (renders 404)", indent(1)));
        }
    }

    if !props.duplicates.is_empty() {
        lines.push(String::new());
        lines.push("Duplicates".to_string());
        for slug in &props.duplicates {
            lines.push(format!("{}{} (dropped)", indent(1), slug));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Sidecar: {} ({})",
        sidecar_path.display(),
        plural(props.ready_count(), "record")
    ));

    lines
}

/// Print paths output to stdout.
pub fn print_paths_output(props: &StaticProps, sidecar_path: &Path) {
    for line in format_paths_output(props, sidecar_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format generate stage output: page → output file, in write order.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut post_index = 0;

    for page in &report.pages {
        if page == LISTING_PAGE {
            lines.push(format!("Listing \u{2192} {page}"));
        } else if page == NOT_FOUND_PAGE {
            lines.push(format!("Not found \u{2192} {page}"));
        } else {
            post_index += 1;
            let slug = page
                .trim_end_matches("/index.html")
                .rsplit('/')
                .next()
                .unwrap_or(page);
            let marker = if report.missing.iter().any(|m| m == slug) {
                " (not found)"
            } else {
                ""
            };
            lines.push(format!(
                "{} {} \u{2192} {}{}",
                format_index(post_index),
                slug,
                page,
                marker
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {} missing, {}",
        plural(post_index, "post page"),
        report.missing.len(),
        plural(report.assets_copied, "asset")
    ));

    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Sitemap output
// ============================================================================

/// Format sitemap stage output: one line per URL, image extensions as context.
pub fn format_sitemap_output(entries: &[SitemapEntry], wrote_robots: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), entry.loc));
        if let Some(image) = &entry.image {
            lines.push(format!("{}Image: {}", indent(1), image));
        }
    }

    let images = entries.iter().filter(|e| e.image.is_some()).count();
    let robots = if wrote_robots { ", robots.txt" } else { "" };
    lines.push(String::new());
    lines.push(format!(
        "Wrote sitemap.xml ({}, {}){}",
        plural(entries.len(), "url"),
        plural(images, "image"),
        robots
    ));

    lines
}

/// Print sitemap output to stdout.
pub fn print_sitemap_output(entries: &[SitemapEntry], wrote_robots: bool) {
    for line in format_sitemap_output(entries, wrote_robots) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format `check` output: resolved config summary and the fetched listing.
pub fn format_check_output(config: &SiteConfig, posts: &[PostSummary]) -> Vec<String> {
    let mut lines = vec![
        "Config".to_string(),
        format!("{}Site: {} ({})", indent(1), config.site.title, config.base_url()),
        format!(
            "{}Content: {} / {} [{}]",
            indent(1),
            config.content.api_url,
            config.content.environment,
            config.content.content_type
        ),
        String::new(),
        format!("Listing ({})", plural(posts.len(), "post")),
    ];

    for (i, post) in posts.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), post.title));
        lines.push(format!("{}{}", indent(1), truncate(&post.excerpt, 60)));
    }

    lines
}

/// Print check output to stdout.
pub fn print_check_output(config: &SiteConfig, posts: &[PostSummary]) {
    for line in format_check_output(config, posts) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_detail, sample_summary};
    use crate::types::RouteDescriptor;

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(123), "123");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "url"), "1 url");
        assert_eq!(plural(0, "url"), "0 urls");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
    }

    fn props_with_missing() -> StaticProps {
        StaticProps {
            posts: vec![sample_summary("a"), sample_summary("ghost")],
            routes: vec![RouteDescriptor::for_slug("a"), RouteDescriptor::for_slug("ghost")],
            pages: vec![
                PostPage::Ready(sample_detail("a")),
                PostPage::Missing {
                    slug: "ghost".into(),
                },
            ],
            duplicates: vec!["a".into()],
        }
    }

    #[test]
    fn paths_output_lists_posts_and_sidecar() {
        let lines = format_paths_output(&props_with_missing(), Path::new("tmp/blogPostMeta.json"));
        assert_eq!(lines[0], "Posts");
        assert_eq!(lines[1], "001 Post a");
        assert_eq!(lines[2], "    Route: /blog/post/a");
        assert!(lines.contains(&"    Detail: missing (renders 404)".to_string()));
        assert!(lines.contains(&"    a (dropped)".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Sidecar: tmp/blogPostMeta.json (1 record)"
        );
    }

    #[test]
    fn paths_output_empty_listing() {
        let lines = format_paths_output(&StaticProps::default(), Path::new("m.json"));
        assert_eq!(lines[1], "    (none)");
        assert_eq!(lines.last().unwrap(), "Sidecar: m.json (0 records)");
    }

    #[test]
    fn generate_output_marks_missing() {
        let report = GenerateReport {
            pages: vec![
                LISTING_PAGE.into(),
                "blog/post/a/index.html".into(),
                "blog/post/ghost/index.html".into(),
                NOT_FOUND_PAGE.into(),
            ],
            missing: vec!["ghost".into()],
            assets_copied: 3,
        };
        let lines = format_generate_output(&report);
        assert_eq!(lines[0], "Listing \u{2192} blog/index.html");
        assert_eq!(lines[1], "001 a \u{2192} blog/post/a/index.html");
        assert_eq!(
            lines[2],
            "002 ghost \u{2192} blog/post/ghost/index.html (not found)"
        );
        assert_eq!(lines[3], "Not found \u{2192} 404.html");
        assert_eq!(
            lines.last().unwrap(),
            "Generated 2 post pages, 1 missing, 3 assets"
        );
    }

    #[test]
    fn sitemap_output_shows_images() {
        let entries = vec![
            SitemapEntry {
                loc: "https://example.com/blog".into(),
                changefreq: "monthly".into(),
                priority: 0.7,
                lastmod: None,
                image: None,
            },
            SitemapEntry {
                loc: "https://example.com/blog/post/a".into(),
                changefreq: "monthly".into(),
                priority: 0.7,
                lastmod: None,
                image: Some("https://img/a.png".into()),
            },
        ];
        let lines = format_sitemap_output(&entries, true);
        assert_eq!(lines[0], "001 https://example.com/blog");
        assert_eq!(lines[2], "    Image: https://img/a.png");
        assert_eq!(
            lines.last().unwrap(),
            "Wrote sitemap.xml (2 urls, 1 image), robots.txt"
        );

        let lines = format_sitemap_output(&entries, false);
        assert!(!lines.last().unwrap().contains("robots"));
    }

    #[test]
    fn check_output_summarizes_config_and_listing() {
        let config = SiteConfig::default();
        let lines = format_check_output(&config, &[sample_summary("a")]);
        assert_eq!(lines[0], "Config");
        assert!(lines[1].contains("My Blog"));
        assert!(lines[2].contains("cdn.contentful.com"));
        assert!(lines.contains(&"Listing (1 post)".to_string()));
        assert!(lines.contains(&"001 Post a".to_string()));
    }
}
