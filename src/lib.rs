//! # Simple Blog
//!
//! A static blog generator for posts kept in a headless CMS (Contentful).
//! Every page is rendered at build time: a listing, one page per post, a
//! not-found page, plus the SEO files search engines expect (sitemap with
//! cover images, robots.txt, canonical links, Open Graph, JSON-LD).
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Paths     content store  →  routes.json + blogPostMeta.json (temp dir)
//! 2. Generate  page props     →  dist/blog/**, dist/404.html
//! 3. Sitemap   sidecar+routes →  dist/sitemap.xml, dist/robots.txt
//! ```
//!
//! The metadata sidecar (`blogPostMeta.json`) is the bridge between stage 1 and
//! stage 3: a JSON array holding every fetched post, written once after the
//! last post has been fetched. The sitemap stage only accepts the
//! [`sidecar::SidecarArtifact`] handle that writing returns, so it can never
//! read a sidecar from before the current post set.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`content`] | `ContentSource` trait; Contentful HTTP client and JSON fixture source |
//! | [`paths`] | Stage 1: routes from the listing, per-post props, first-wins de-duplication |
//! | [`sidecar`] | The post metadata JSON file and its write-once artifact handle |
//! | [`generate`] | Stage 2: listing, post and 404 pages with Maud |
//! | [`markdown`] | Post body rendering with the element → class substitution table |
//! | [`highlight`] | `Highlighter` trait and the syntect-backed class highlighter |
//! | [`popup`] | Popup image viewer state machine and markup |
//! | [`sitemap`] | Stage 3: sitemap entries with cover images, robots.txt |
//! | [`pipeline`] | Stage functions and the temp-dir files connecting them |
//! | [`config`] | `config.toml` loading, validation, env overrides, theme CSS |
//! | [`types`] | Post records and routes shared by every stage |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## Typed Empty Results
//!
//! Both content queries return `Result<Fetched<T>, ContentError>`. "The store
//! has no posts" (`Fetched::Empty`) and "the store could not be reached"
//! (`Err`) are different outcomes: the first builds an empty blog, the second
//! aborts the build.
//!
//! ## Missing Details Keep Their Route
//!
//! A post that shows up in the listing but whose detail query comes back empty
//! still gets a page at `/blog/post/{slug}`, rendering the not-found view.
//! Slugs that never listed get no page at all.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed templates are build errors, interpolation is
//! auto-escaped, and there is no template directory to ship.

pub mod config;
pub mod content;
pub mod generate;
pub mod highlight;
pub mod markdown;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod popup;
pub mod sidecar;
pub mod sitemap;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
