//! Site configuration module.
//!
//! Handles loading, validating, and overriding `config.toml`. Stock defaults
//! are overridden by the user's `config.toml` in the source directory, which
//! in turn is overridden by environment variables for the values a deploy
//! environment usually injects (credentials and the public base URL).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "My Blog"
//! description = "My blog site default description"
//! base_url = "https://example.com"     # env: SITE_BASE_URL
//!
//! [content]
//! space_id = ""                         # env: CONTENTFUL_SPACE_ID
//! access_token = ""                     # env: CONTENTFUL_ACCESS_TOKEN
//! environment = "master"
//! content_type = "blogPost"
//! api_url = "https://cdn.contentful.com"
//! timeout_secs = 60
//!
//! [sitemap]
//! changefreq = "monthly"
//! priority = 0.7
//! autolastmod = true
//! generate_robots_txt = true
//!
//! [markdown]
//! allow_raw_html = true
//! external_links_new_tab = true
//!
//! [theme]
//! accent = "#2c85ba"
//! navbar_background = "#212529"
//! card_radius = "10px"
//! content_width = "960px"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ENV_SPACE_ID: &str = "CONTENTFUL_SPACE_ID";
pub const ENV_ACCESS_TOKEN: &str = "CONTENTFUL_ACCESS_TOKEN";
pub const ENV_BASE_URL: &str = "SITE_BASE_URL";

const CHANGEFREQ_VALUES: &[&str] = &[
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public identity of the site (title, description, base URL).
    pub site: SiteSettings,
    /// Content API connection.
    pub content: ContentConfig,
    /// Sitemap and robots.txt generation.
    pub sitemap: SitemapConfig,
    /// Markdown rendering switches.
    pub markdown: MarkdownConfig,
    /// Theme values injected as CSS custom properties.
    pub theme: ThemeConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.site.base_url;
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "site.base_url must be an absolute http(s) URL, got {base:?}"
            )));
        }
        if !(0.0..=1.0).contains(&self.sitemap.priority) {
            return Err(ConfigError::Validation(
                "sitemap.priority must be between 0.0 and 1.0".into(),
            ));
        }
        if !CHANGEFREQ_VALUES.contains(&self.sitemap.changefreq.as_str()) {
            return Err(ConfigError::Validation(format!(
                "sitemap.changefreq must be one of {}",
                CHANGEFREQ_VALUES.join(", ")
            )));
        }
        if self.content.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "content.timeout_secs must be non-zero".into(),
            ));
        }
        if self.content.content_type.is_empty() {
            return Err(ConfigError::Validation(
                "content.content_type must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production;
    /// empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(space) = get(ENV_SPACE_ID) {
            self.content.space_id = space;
        }
        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            self.content.access_token = token;
        }
        if let Some(base) = get(ENV_BASE_URL) {
            self.site.base_url = base;
        }
    }

    /// Base URL without a trailing slash, ready to have a route appended.
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    /// Absolute URL of a site path (`/blog/post/x` → `https://host/blog/post/x`).
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

/// Public identity of the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    /// Prefix of every `<title>` and the navbar brand.
    pub title: String,
    /// Meta description for pages that don't provide their own.
    pub description: String,
    /// Externally visible base URL used for canonical links, Open Graph and
    /// the sitemap root.
    pub base_url: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: "My blog site default description".to_string(),
            base_url: "https://example.com".to_string(),
        }
    }
}

/// Content API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    pub space_id: String,
    pub access_token: String,
    pub environment: String,
    /// Content type id of blog post entries.
    pub content_type: String,
    /// Delivery API root. Point at `https://preview.contentful.com` for drafts.
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            space_id: String::new(),
            access_token: String::new(),
            environment: "master".to_string(),
            content_type: "blogPost".to_string(),
            api_url: "https://cdn.contentful.com".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Sitemap generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    pub changefreq: String,
    pub priority: f64,
    /// Stamp every entry with the build time as `lastmod`.
    pub autolastmod: bool,
    pub generate_robots_txt: bool,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            changefreq: "monthly".to_string(),
            priority: 0.7,
            autolastmod: true,
            generate_robots_txt: true,
        }
    }
}

/// Markdown rendering switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Pass raw HTML embedded in post bodies through unescaped. The content
    /// store is trusted by default; turn off to escape it instead.
    pub allow_raw_html: bool,
    /// Open links in post bodies in a new tab.
    pub external_links_new_tab: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            allow_raw_html: true,
            external_links_new_tab: true,
        }
    }
}

/// Theme values injected into the stylesheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Progress bar, tags and link accents.
    pub accent: String,
    pub navbar_background: String,
    pub card_radius: String,
    /// Max width of the post column.
    pub content_width: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "#2c85ba".to_string(),
            navbar_background: "#212529".to_string(),
            card_radius: "10px".to_string(),
            content_width: "960px".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    Ok(config)
}

/// Load config from `config.toml` in `root` without environment overrides.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_with_env(root, |_| None)
}

/// Load config from `config.toml` in `root`, apply environment overrides,
/// then validate the result.
pub fn load_config_with_env<F>(root: &Path, lookup: F) -> Result<SiteConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = resolve_config(stock_defaults_value(), load_raw_config(root)?)?;
    config.apply_env(lookup);
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`. Used by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Blog Configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Prefix of every page title and the navbar brand.
title = "My Blog"

# Meta description for pages without their own.
description = "My blog site default description"

# Public base URL for canonical links, Open Graph and the sitemap.
# Overridden by the SITE_BASE_URL environment variable.
base_url = "https://example.com"

# ---------------------------------------------------------------------------
# Content API (Contentful Delivery API)
# ---------------------------------------------------------------------------
[content]
# Overridden by CONTENTFUL_SPACE_ID / CONTENTFUL_ACCESS_TOKEN.
space_id = ""
access_token = ""
environment = "master"
content_type = "blogPost"
api_url = "https://cdn.contentful.com"
timeout_secs = 60

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
# One of: always, hourly, daily, weekly, monthly, yearly, never
changefreq = "monthly"
priority = 0.7
# Stamp entries with the build time.
autolastmod = true
generate_robots_txt = true

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
[markdown]
# Raw HTML inside post bodies is passed through when true, escaped when false.
allow_raw_html = true
external_links_new_tab = true

# ---------------------------------------------------------------------------
# Theme
# ---------------------------------------------------------------------------
[theme]
accent = "#2c85ba"
navbar_background = "#212529"
card_radius = "10px"
content_width = "960px"
"##
}

/// Generate CSS custom properties from theme config.
pub fn generate_theme_css(theme: &ThemeConfig) -> String {
    format!(
        r#":root {{
    --accent: {accent};
    --navbar-bg: {navbar};
    --card-radius: {radius};
    --content-width: {width};
}}"#,
        accent = theme.accent,
        navbar = theme.navbar_background,
        radius = theme.card_radius,
        width = theme.content_width,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.site.title, "My Blog");
        assert_eq!(config.site.base_url, "https://example.com");
        assert_eq!(config.content.content_type, "blogPost");
        assert_eq!(config.sitemap.changefreq, "monthly");
        assert!(config.markdown.allow_raw_html);
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(
            r#"
[site]
title = "Field Notes"
"#,
        )
        .unwrap();
        assert_eq!(config.site.title, "Field Notes");
        assert_eq!(config.site.base_url, "https://example.com");
        assert_eq!(config.content.timeout_secs, 60);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.title, "My Blog");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[site]
base_url = "https://blog.example.org/"

[sitemap]
changefreq = "weekly"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.sitemap.changefreq, "weekly");
        assert_eq!(config.base_url(), "https://blog.example.org");
        assert_eq!(config.sitemap.priority, 0.7);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "not valid [[[").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
[site]
titel = "typo"
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn env_overrides_file_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[content]
space_id = "from-file"
"#,
        )
        .unwrap();

        let env = env_of(&[
            (ENV_SPACE_ID, "from-env"),
            (ENV_ACCESS_TOKEN, "secret"),
            (ENV_BASE_URL, "https://prod.example.com"),
        ]);
        let config = load_config_with_env(tmp.path(), env).unwrap();
        assert_eq!(config.content.space_id, "from-env");
        assert_eq!(config.content.access_token, "secret");
        assert_eq!(config.site.base_url, "https://prod.example.com");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = SiteConfig::default();
        config.content.space_id = "kept".into();
        config.apply_env(env_of(&[(ENV_SPACE_ID, "  ")]));
        assert_eq!(config.content.space_id, "kept");
    }

    #[test]
    fn env_base_url_is_validated() {
        let tmp = TempDir::new().unwrap();
        let env = env_of(&[(ENV_BASE_URL, "example.com")]);
        let result = load_config_with_env(tmp.path(), env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn absolute_url_joins_without_double_slash() {
        let mut config = SiteConfig::default();
        config.site.base_url = "https://example.com/".into();
        assert_eq!(
            config.absolute_url("/blog/post/a"),
            "https://example.com/blog/post/a"
        );
    }

    #[test]
    fn validate_priority_range() {
        let mut config = SiteConfig::default();
        config.sitemap.priority = 1.0;
        assert!(config.validate().is_ok());
        config.sitemap.priority = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_changefreq() {
        let mut config = SiteConfig::default();
        config.sitemap.changefreq = "fortnightly".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("changefreq"));
    }

    #[test]
    fn validate_timeout_nonzero() {
        let mut config = SiteConfig::default();
        config.content.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r#"
[site]
title = "A"
description = "B"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[site]
title = "C"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let site = merged.get("site").unwrap();
        assert_eq!(site.get("title").unwrap().as_str(), Some("C"));
        assert_eq!(site.get("description").unwrap().as_str(), Some("B"));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.site.title, defaults.site.title);
        assert_eq!(config.content.api_url, defaults.content.api_url);
        assert_eq!(config.sitemap.priority, defaults.sitemap.priority);
        assert_eq!(config.theme.accent, defaults.theme.accent);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        for section in ["site", "content", "sitemap", "markdown", "theme"] {
            assert!(val.get(section).is_some(), "missing [{section}]");
        }
    }

    #[test]
    fn theme_css_includes_variables() {
        let css = generate_theme_css(&ThemeConfig::default());
        assert!(css.contains("--accent: #2c85ba"));
        assert!(css.contains("--navbar-bg: #212529"));
        assert!(css.contains("--content-width: 960px"));
    }
}
