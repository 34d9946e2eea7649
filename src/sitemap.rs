//! Sitemap and robots.txt generation.
//!
//! Final stage of the build. Each generated route becomes a [`SitemapEntry`];
//! post routes whose slug has a sidecar record with a featured image also get
//! a Google image-sitemap extension pointing at the cover image.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
//!         xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
//!   <url>
//!     <loc>https://example.com/blog/post/hello-world</loc>
//!     <changefreq>monthly</changefreq>
//!     <priority>0.7</priority>
//!     <lastmod>2025-01-01T00:00:00.000Z</lastmod>
//!     <image:image>
//!       <image:loc>https://images.ctfassets.net/cover.png</image:loc>
//!     </image:image>
//!   </url>
//! </urlset>
//! ```

use crate::config::SiteConfig;
use crate::sidecar::Sidecar;
use crate::types::{RouteDescriptor, https_url};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Per-build values stamped on every entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapSettings {
    /// Base URL without trailing slash.
    pub base_url: String,
    pub changefreq: String,
    pub priority: f64,
    /// Build timestamp when `autolastmod` is on.
    pub lastmod: Option<String>,
}

impl SitemapSettings {
    /// Settings from config, with `now` used as `lastmod` if enabled.
    pub fn from_config(config: &SiteConfig, now: &str) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            changefreq: config.sitemap.changefreq.clone(),
            priority: config.sitemap.priority,
            lastmod: config.sitemap.autolastmod.then(|| now.to_string()),
        }
    }
}

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub changefreq: String,
    pub priority: f64,
    pub lastmod: Option<String>,
    /// Cover image (`image:image`), post routes only.
    pub image: Option<String>,
}

/// Build the entry for `route`, annotating post routes whose slug is in the
/// sidecar with their cover image. Everything else passes through bare.
pub fn transform(
    route: &RouteDescriptor,
    sidecar: &Sidecar,
    settings: &SitemapSettings,
) -> SitemapEntry {
    let image = route
        .post_slug()
        .and_then(|slug| sidecar.find(slug))
        .and_then(|record| record.summary.featured_image_url.as_deref())
        .map(https_url);

    SitemapEntry {
        loc: format!("{}{}", settings.base_url, route.path),
        changefreq: settings.changefreq.clone(),
        priority: settings.priority,
        lastmod: settings.lastmod.clone(),
        image,
    }
}

/// Entries for the listing route followed by every post route.
pub fn build_entries(
    routes: &[RouteDescriptor],
    sidecar: &Sidecar,
    settings: &SitemapSettings,
) -> Vec<SitemapEntry> {
    std::iter::once(RouteDescriptor::listing())
        .chain(routes.iter().cloned())
        .map(|route| transform(&route, sidecar, settings))
        .collect()
}

/// Render `sitemap.xml`.
pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 256);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<urlset xmlns="{SITEMAP_NS}" xmlns:image="{IMAGE_NS}">"#
    ));
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            escape_xml(&entry.changefreq)
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(lastmod)));
        }
        if let Some(image) = &entry.image {
            xml.push_str("    <image:image>\n");
            xml.push_str(&format!(
                "      <image:loc>{}</image:loc>\n",
                escape_xml(image)
            ));
            xml.push_str("    </image:image>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Render `robots.txt`: allow everything, advertise the sitemap.
pub fn render_robots_txt(base_url: &str) -> String {
    format!(
        "# *\nUser-agent: *\nAllow: /\n\n# Host\nHost: {base_url}\n\n# Sitemaps\nSitemap: {base_url}/sitemap.xml\n"
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
