//! HTML site generation.
//!
//! Stage 2 of the simple-blog build pipeline. Takes the static props from the
//! paths stage and writes the final static HTML site.
//!
//! ## Generated Pages
//!
//! - **Listing page** (`/blog/index.html`): one card per post
//! - **Post pages** (`/blog/post/{slug}/index.html`): header, by-line, cover
//!   image and the rendered markdown body, plus `BlogPosting` JSON-LD
//! - **Not-found page** (`/404.html`): also used as the body of post routes
//!   whose detail could not be fetched
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── 404.html
//! ├── assets/                    # Copied verbatim from <source>/assets
//! └── blog/
//!     ├── index.html             # Listing
//!     └── post/
//!         ├── hello-world/
//!         │   └── index.html
//!         └── ...
//! ```
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: Base styles (theme properties injected from config)
//! - `static/popup.js`: Popup image viewer
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::config::{self, SiteConfig};
use crate::markdown::{self, RenderOptions};
use crate::paths::{PostPage, StaticProps};
use crate::popup;
use crate::types::{PostDetail, PostSummary, RouteDescriptor, https_url, is_url_safe_slug};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

pub const LISTING_PAGE: &str = "blog/index.html";
pub const NOT_FOUND_PAGE: &str = "404.html";
/// Directory under the source root copied into the output as-is.
pub const ASSETS_DIR: &str = "assets";

const CSS_STATIC: &str = include_str!("../static/style.css");
const POPUP_JS: &str = include_str!("../static/popup.js");

/// What the stage wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Output paths relative to the output directory, in write order.
    pub pages: Vec<String>,
    /// Slugs whose route got the not-found body.
    pub missing: Vec<String>,
    pub assets_copied: usize,
}

/// Head metadata for one page.
#[derive(Debug, Default)]
pub struct PageHead<'a> {
    /// Page title; `None` renders just the site title.
    pub title: Option<&'a str>,
    /// Falls back to the site description.
    pub description: Option<&'a str>,
    /// Site-relative route, e.g. `/blog`.
    pub path: &'a str,
    pub image: Option<&'a str>,
    /// Extra head content (JSON-LD).
    pub custom: Option<Markup>,
}

/// `"{site} | {page}"`, or just the site title.
pub fn page_title(site_title: &str, title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => format!("{site_title} | {title}"),
        _ => site_title.to_string(),
    }
}

/// Output file for a route: `/blog/post/x` → `blog/post/x/index.html`.
pub fn page_file(route: &RouteDescriptor) -> String {
    format!("{}/index.html", route.path.trim_matches('/'))
}

pub fn generate(
    props: &StaticProps,
    config: &SiteConfig,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let css = format!(
        "{}\n\n{}",
        config::generate_theme_css(&config.theme),
        CSS_STATIC
    );
    let options = RenderOptions::from(&config.markdown);
    let mut report = GenerateReport::default();

    fs::create_dir_all(output_dir)?;

    let listing = render_listing_page(&props.posts, config, &css);
    write_page(output_dir, LISTING_PAGE, listing)?;
    report.pages.push(LISTING_PAGE.to_string());

    for page in &props.pages {
        // routes.json may be edited between stages
        if !is_url_safe_slug(page.slug()) {
            log::warn!("Skipping page with unusable slug {:?}", page.slug());
            continue;
        }
        let file = page_file(&page.route());
        let markup = match page {
            PostPage::Ready(detail) => render_post_page(detail, config, &css, &options)?,
            PostPage::Missing { slug } => {
                log::warn!("No detail for {slug:?}; rendering not-found page at its route");
                report.missing.push(slug.clone());
                render_not_found_page(config, &css, &page.route().path)
            }
        };
        write_page(output_dir, &file, markup)?;
        report.pages.push(file);
    }

    write_page(
        output_dir,
        NOT_FOUND_PAGE,
        render_not_found_page(config, &css, "/404"),
    )?;
    report.pages.push(NOT_FOUND_PAGE.to_string());

    report.assets_copied = copy_assets(&source_dir.join(ASSETS_DIR), &output_dir.join(ASSETS_DIR))?;

    Ok(report)
}

fn write_page(output_dir: &Path, file: &str, markup: Markup) -> Result<(), GenerateError> {
    let path = output_dir.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, markup.into_string())?;
    Ok(())
}

/// Copy `src` into `dst` recursively. A missing `src` copies nothing.
fn copy_assets(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|source| GenerateError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document: head metadata, navbar, progress bar.
fn base_document(config: &SiteConfig, css: &str, head: PageHead<'_>, content: Markup) -> Markup {
    let title = page_title(&config.site.title, head.title);
    let description = head.description.unwrap_or(&config.site.description);
    let canonical = config.absolute_url(head.path);

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(description);
                link rel="canonical" href=(canonical);
                meta property="og:url" content=(canonical);
                meta property="og:type" content="article";
                meta property="og:title" content=(title);
                meta property="og:description" content=(description);
                @if let Some(image) = head.image {
                    meta property="og:image" content=(image);
                }
                @if let Some(custom) = head.custom {
                    (custom)
                }
                style { (PreEscaped(css)) }
            }
            body {
                div.page-progress {}
                (navbar(&config.site.title, head.path))
                (content)
            }
        }
    }
}

fn navbar(brand: &str, current_path: &str) -> Markup {
    let on_blog = current_path.starts_with("/blog");
    html! {
        nav.navbar {
            a.navbar-brand href="/" { (brand) }
            ul.navbar-nav {
                li {
                    a.nav-link.active[on_blog] href="/blog" { "Blog" }
                }
            }
        }
    }
}

fn avatar(name: &str, url: Option<&str>) -> Markup {
    html! {
        @if let Some(url) = url {
            img.avatar src=(https_url(url)) alt=(name) width="40" height="40";
        }
    }
}

/// Listing card linking to the post route.
pub fn post_card(post: &PostSummary) -> Markup {
    html! {
        a.post-card href=(post.route().path) {
            @if let Some(image) = &post.featured_image_url {
                img.post-card-image src=(https_url(image)) alt=(post.title) loading="lazy";
            }
            div.post-card-body {
                span.tag { (post.category.name) }
                h4 { (post.title) }
                p { (post.excerpt) }
                div.post-card-author {
                    (avatar(&post.author.name, post.author.avatar_url.as_deref()))
                    div.author-info {
                        strong { (post.author.name) }
                        small { (post.publish_date.display()) }
                    }
                }
            }
        }
    }
}

/// Structured data for a post page. `</` is escaped so the payload cannot
/// close its `<script>` element.
pub fn blog_posting_json_ld(detail: &PostDetail, canonical: &str) -> Result<String, GenerateError> {
    let post = &detail.summary;
    let images: Vec<String> = post.featured_image_url.iter().map(|u| https_url(u)).collect();
    let value = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "about": post.excerpt,
        "image": images,
        "datePublished": post.publish_date.as_str(),
        "dateModified": post.publish_date.as_str(),
        "author": {
            "@type": "Person",
            "name": post.author.name,
            "image": post.author.avatar_url.as_deref().map(https_url),
            "url": canonical,
        },
    });
    Ok(serde_json::to_string(&value)?.replace("</", "<\\/"))
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the listing page with one card per post.
pub fn render_listing_page(posts: &[PostSummary], config: &SiteConfig, css: &str) -> Markup {
    let content = html! {
        main.container.listing-page {
            @if posts.is_empty() {
                p.empty-listing { "No posts yet." }
            } @else {
                div.post-grid {
                    @for post in posts {
                        (post_card(post))
                    }
                }
            }
        }
    };

    let head = PageHead {
        title: Some("Blog"),
        path: crate::types::LISTING_ROUTE,
        ..PageHead::default()
    };
    base_document(config, css, head, content)
}

/// Renders a post page.
pub fn render_post_page(
    detail: &PostDetail,
    config: &SiteConfig,
    css: &str,
    options: &RenderOptions,
) -> Result<Markup, GenerateError> {
    let post = &detail.summary;
    let route = post.route();
    let canonical = config.absolute_url(&route.path);
    let featured = post.featured_image_url.as_deref().map(https_url);
    let json_ld = blog_posting_json_ld(detail, &canonical)?;
    let body = markdown::render(&detail.content, options);

    let content = html! {
        main.container.post-page {
            article {
                header.post-header {
                    (avatar(&post.author.name, post.author.avatar_url.as_deref()))
                    h1 { (post.title) }
                    p.post-byline {
                        "Published by " (post.author.name) " on " (post.publish_date.display())
                    }
                }
                @if let Some(image) = &featured {
                    img.featured-image src=(image) alt=(post.title);
                }
                (PreEscaped(body))
            }
        }
        (popup::viewer_shell())
        script { (PreEscaped(POPUP_JS)) }
    };

    let head = PageHead {
        title: Some(&post.title),
        description: Some(&post.excerpt),
        path: &route.path,
        image: featured.as_deref(),
        custom: Some(html! {
            script type="application/ld+json" { (PreEscaped(json_ld)) }
        }),
    };
    Ok(base_document(config, css, head, content))
}

/// Renders the not-found page for `path`.
pub fn render_not_found_page(config: &SiteConfig, css: &str, path: &str) -> Markup {
    let content = html! {
        main.container.not-found {
            h1 { "404" }
            p { "This page could not be found." }
            a href="/blog" { "Back to the blog" }
        }
    };

    let head = PageHead {
        title: Some("Not Found"),
        path,
        ..PageHead::default()
    };
    base_document(config, css, head, content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_detail, sample_detail_without_image, sample_summary};
    use tempfile::TempDir;

    fn config() -> SiteConfig {
        SiteConfig::default()
    }

    fn post_html(detail: &PostDetail) -> String {
        render_post_page(detail, &config(), "", &RenderOptions::default())
            .unwrap()
            .into_string()
    }

    #[test]
    fn page_title_joins_site_and_page() {
        assert_eq!(page_title("My Blog", Some("Hello")), "My Blog | Hello");
        assert_eq!(page_title("My Blog", None), "My Blog");
        assert_eq!(page_title("My Blog", Some("")), "My Blog");
    }

    #[test]
    fn page_file_for_routes() {
        assert_eq!(page_file(&RouteDescriptor::for_slug("x")), "blog/post/x/index.html");
        assert_eq!(page_file(&RouteDescriptor::listing()), LISTING_PAGE);
    }

    #[test]
    fn base_document_head_metadata() {
        let head = PageHead {
            title: Some("Hello"),
            path: "/blog/post/hello",
            image: Some("https://img/x.png"),
            ..PageHead::default()
        };
        let doc = base_document(&config(), "", head, html! {}).into_string();

        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>My Blog | Hello</title>"));
        assert!(doc.contains(r#"<link rel="canonical" href="https://example.com/blog/post/hello">"#));
        assert!(doc.contains(r#"<meta property="og:type" content="article">"#));
        assert!(doc.contains(r#"<meta property="og:image" content="https://img/x.png">"#));
        assert!(doc.contains(r#"content="My blog site default description""#));
    }

    #[test]
    fn og_image_omitted_without_image() {
        let doc = base_document(&config(), "", PageHead::default(), html! {}).into_string();
        assert!(!doc.contains("og:image"));
    }

    #[test]
    fn navbar_marks_blog_active() {
        let html = navbar("My Blog", "/blog/post/x").into_string();
        assert!(html.contains(r#"class="nav-link active""#));
        assert!(html.contains("My Blog"));
    }

    #[test]
    fn post_card_contents() {
        let html = post_card(&sample_summary("hello")).into_string();
        assert!(html.contains(r#"href="/blog/post/hello""#));
        assert!(html.contains("Engineering"));
        assert!(html.contains("<h4>Post hello</h4>"));
        assert!(html.contains("Excerpt for hello"));
        assert!(html.contains("Ada Lovelace"));
        assert!(html.contains("March 5, 2021"));
        assert!(html.contains("https://images.example.net/hello.png"));
    }

    #[test]
    fn listing_page_renders_every_card() {
        let posts = vec![sample_summary("a"), sample_summary("b")];
        let html = render_listing_page(&posts, &config(), "").into_string();
        assert_eq!(html.matches(r#"class="post-card""#).count(), 2);
        assert!(html.contains("<title>My Blog | Blog</title>"));
    }

    #[test]
    fn empty_listing_says_so() {
        let html = render_listing_page(&[], &config(), "").into_string();
        assert!(html.contains("No posts yet."));
    }

    #[test]
    fn post_page_header_and_body() {
        let html = post_html(&sample_detail("hello"));
        assert!(html.contains("<title>My Blog | Post hello</title>"));
        assert!(html.contains("Published by Ada Lovelace on March 5, 2021"));
        assert!(html.contains(r#"class="featured-image""#));
        assert!(html.contains(r#"<div class="post-markdown">"#));
        assert!(html.contains(r#"<h1 class="post-heading">hello</h1>"#));
        assert!(html.contains(r#"id="pop-image-viewer""#));
        assert!(html.contains(r#"content="Excerpt for hello""#));
    }

    #[test]
    fn post_page_without_image_has_no_cover() {
        let html = post_html(&sample_detail_without_image("plain"));
        assert!(!html.contains("featured-image"));
        assert!(!html.contains("og:image"));
    }

    #[test]
    fn json_ld_blog_posting() {
        let detail = sample_detail("hello");
        let json = blog_posting_json_ld(&detail, "https://example.com/blog/post/hello").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["@type"], "BlogPosting");
        assert_eq!(value["headline"], "Post hello");
        assert_eq!(value["about"], "Excerpt for hello");
        assert_eq!(value["image"][0], "https://images.example.net/hello.png");
        assert_eq!(value["datePublished"], "2021-03-05");
        assert_eq!(value["author"]["@type"], "Person");
        assert_eq!(value["author"]["url"], "https://example.com/blog/post/hello");
    }

    #[test]
    fn json_ld_cannot_close_script() {
        let mut detail = sample_detail("x");
        detail.summary.title = "</script><script>alert(1)".into();
        let json = blog_posting_json_ld(&detail, "https://example.com").unwrap();
        assert!(!json.contains("</script>"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["headline"], "</script><script>alert(1)");
    }

    #[test]
    fn html_escape_in_maud() {
        let mut post = sample_summary("x");
        post.title = "<script>alert('xss')</script>".into();
        let html = post_card(&post).into_string();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn generate_writes_all_pages() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("site");
        let output = tmp.path().join("dist");
        fs::create_dir_all(source.join("assets/img")).unwrap();
        fs::write(source.join("assets/img/logo.png"), b"png").unwrap();

        let props = StaticProps {
            posts: vec![sample_summary("a"), sample_summary("ghost")],
            routes: vec![RouteDescriptor::for_slug("a"), RouteDescriptor::for_slug("ghost")],
            pages: vec![
                PostPage::Ready(sample_detail("a")),
                PostPage::Missing {
                    slug: "ghost".into(),
                },
            ],
            duplicates: vec![],
        };

        let report = generate(&props, &config(), &source, &output).unwrap();

        assert!(output.join(LISTING_PAGE).exists());
        assert!(output.join("blog/post/a/index.html").exists());
        assert!(output.join(NOT_FOUND_PAGE).exists());
        assert!(output.join("assets/img/logo.png").exists());
        assert_eq!(report.assets_copied, 1);
        assert_eq!(report.missing, vec!["ghost"]);

        let ghost = fs::read_to_string(output.join("blog/post/ghost/index.html")).unwrap();
        assert!(ghost.contains("This page could not be found."));
    }

    #[test]
    fn generate_never_writes_outside_post_dir() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("site/dist");
        let props = StaticProps {
            pages: vec![
                PostPage::Ready(sample_detail("../../escape")),
                PostPage::Missing { slug: String::new() },
            ],
            ..StaticProps::default()
        };

        let report = generate(&props, &config(), tmp.path(), &output).unwrap();

        assert_eq!(report.pages, vec![LISTING_PAGE, NOT_FOUND_PAGE]);
        assert!(!output.join("escape").exists());
        assert!(!output.join("blog/post/index.html").exists());
    }

    #[test]
    fn generate_without_assets_dir() {
        let tmp = TempDir::new().unwrap();
        let report = generate(
            &StaticProps::default(),
            &config(),
            tmp.path(),
            &tmp.path().join("dist"),
        )
        .unwrap();
        assert_eq!(report.assets_copied, 0);
        assert_eq!(report.pages, vec![LISTING_PAGE, NOT_FOUND_PAGE]);
    }

    #[test]
    fn walk_error_names_the_directory() {
        let missing = Path::new("/definitely/not/here");
        let source = WalkDir::new(missing)
            .into_iter()
            .next()
            .unwrap()
            .unwrap_err();
        let err = GenerateError::Walk {
            path: missing.to_path_buf(),
            source,
        };
        assert!(
            err.to_string()
                .starts_with("Failed to walk /definitely/not/here: ")
        );
    }
}
