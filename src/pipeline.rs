//! Build stages and the files that connect them.
//!
//! ```text
//! 1. Paths     content store  →  <temp>/routes.json + <temp>/blogPostMeta.json
//! 2. Generate  props          →  <output>/blog/**, 404.html, assets/
//! 3. Sitemap   sidecar+routes →  <output>/sitemap.xml, robots.txt
//! ```
//!
//! `build` runs the stages back to back in one process. The standalone
//! subcommands pick up where an earlier run left off through
//! [`load_paths`], which reads both temp files back.

use crate::config::SiteConfig;
use crate::content::{ContentError, ContentSource};
use crate::generate::{self, GenerateError, GenerateReport};
use crate::paths::{self, PATHS_MANIFEST_FILE, PathsManifest, StaticProps};
use crate::sidecar::{SIDECAR_FILE, SidecarArtifact, SidecarError};
use crate::sitemap::{self, SitemapEntry, SitemapSettings};
use crate::types::RouteDescriptor;
use chrono::{SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Sidecar(#[from] SidecarError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directories a build reads from and writes to.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub source: PathBuf,
    pub output: PathBuf,
    pub temp_dir: PathBuf,
}

impl Workspace {
    pub fn sidecar_path(&self) -> PathBuf {
        self.temp_dir.join(SIDECAR_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.temp_dir.join(PATHS_MANIFEST_FILE)
    }
}

/// Output of the paths stage.
#[derive(Debug)]
pub struct PathsOutcome {
    pub props: StaticProps,
    pub artifact: SidecarArtifact,
}

/// Output of the sitemap stage.
#[derive(Debug)]
pub struct SitemapOutcome {
    pub entries: Vec<SitemapEntry>,
    pub wrote_robots: bool,
}

/// `lastmod` stamp for this build, e.g. `2025-01-01T00:00:00.000Z`.
pub fn build_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stage 1: fetch the listing and details, write the routes manifest and the
/// sidecar. The sidecar is written once, after every post has been fetched.
pub fn paths_stage(
    source: &dyn ContentSource,
    workspace: &Workspace,
) -> Result<PathsOutcome, PipelineError> {
    let props = paths::build_static_props(source)?;
    props.manifest().write(&workspace.manifest_path())?;
    let artifact = props.sidecar().write(&workspace.sidecar_path())?;
    log::debug!(
        "Wrote {} sidecar records to {}",
        artifact.record_count(),
        artifact.path().display()
    );
    Ok(PathsOutcome { props, artifact })
}

/// Rebuild stage 1 output from the temp directory.
pub fn load_paths(workspace: &Workspace) -> Result<PathsOutcome, PipelineError> {
    let artifact = SidecarArtifact::existing(&workspace.sidecar_path())?;
    let manifest = PathsManifest::read(&workspace.manifest_path())?;
    let props = StaticProps::from_artifacts(manifest, &artifact.load()?);
    Ok(PathsOutcome { props, artifact })
}

/// Stage 2: render every page into the output directory.
pub fn generate_stage(
    props: &StaticProps,
    config: &SiteConfig,
    workspace: &Workspace,
) -> Result<GenerateReport, PipelineError> {
    Ok(generate::generate(
        props,
        config,
        &workspace.source,
        &workspace.output,
    )?)
}

/// Stage 3: sitemap (and robots.txt) from a written sidecar.
pub fn sitemap_stage(
    artifact: &SidecarArtifact,
    routes: &[RouteDescriptor],
    config: &SiteConfig,
    output_dir: &Path,
    now: &str,
) -> Result<SitemapOutcome, PipelineError> {
    let sidecar = artifact.load()?;
    let settings = SitemapSettings::from_config(config, now);
    let entries = sitemap::build_entries(routes, &sidecar, &settings);

    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(SITEMAP_FILE), sitemap::render_sitemap(&entries))?;

    let wrote_robots = config.sitemap.generate_robots_txt;
    if wrote_robots {
        fs::write(
            output_dir.join(ROBOTS_FILE),
            sitemap::render_robots_txt(config.base_url()),
        )?;
    }

    Ok(SitemapOutcome {
        entries,
        wrote_robots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixture::FixtureSource;
    use crate::generate::LISTING_PAGE;
    use crate::test_helpers::{sample_detail, sample_detail_without_image};
    use tempfile::TempDir;

    fn workspace(tmp: &TempDir) -> Workspace {
        Workspace {
            source: tmp.path().join("site"),
            output: tmp.path().join("dist"),
            temp_dir: tmp.path().join("temp"),
        }
    }

    fn source() -> FixtureSource {
        FixtureSource::from_posts(vec![sample_detail("a"), sample_detail_without_image("b")])
    }

    #[test]
    fn timestamp_is_rfc3339_millis_utc() {
        let now = build_timestamp();
        assert!(now.ends_with('Z'));
        assert_eq!(now.len(), "2025-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn paths_stage_writes_manifest_and_sidecar() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let outcome = paths_stage(&source(), &ws).unwrap();

        assert!(ws.manifest_path().exists());
        assert_eq!(outcome.artifact.path(), ws.sidecar_path());
        assert_eq!(outcome.artifact.record_count(), 2);

        let raw = fs::read_to_string(ws.sidecar_path()).unwrap();
        assert!(raw.starts_with("[\n    {"));
    }

    #[test]
    fn load_paths_round_trips_stage_output() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let written = paths_stage(&source(), &ws).unwrap();
        let loaded = load_paths(&ws).unwrap();

        assert_eq!(loaded.props.pages, written.props.pages);
        assert_eq!(loaded.props.routes, written.props.routes);
        assert_eq!(loaded.artifact, written.artifact);
    }

    #[test]
    fn load_paths_without_earlier_run_fails() {
        let tmp = TempDir::new().unwrap();
        let err = load_paths(&workspace(&tmp)).unwrap_err();
        assert!(matches!(err, PipelineError::Sidecar(SidecarError::Missing(_))));
    }

    #[test]
    fn full_build_writes_site_and_sitemap() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let config = SiteConfig::default();

        let paths = paths_stage(&source(), &ws).unwrap();
        let report = generate_stage(&paths.props, &config, &ws).unwrap();
        let sitemap = sitemap_stage(
            &paths.artifact,
            &paths.props.routes,
            &config,
            &ws.output,
            "2025-01-01T00:00:00.000Z",
        )
        .unwrap();

        assert!(ws.output.join(LISTING_PAGE).exists());
        assert_eq!(report.pages.len(), 4);
        assert_eq!(sitemap.entries.len(), 3);
        assert_eq!(sitemap.entries.iter().filter(|e| e.image.is_some()).count(), 1);

        let xml = fs::read_to_string(ws.output.join(SITEMAP_FILE)).unwrap();
        assert!(xml.contains("<image:loc>https://images.example.net/a.png</image:loc>"));
        assert!(xml.contains("<lastmod>2025-01-01T00:00:00.000Z</lastmod>"));

        let robots = fs::read_to_string(ws.output.join(ROBOTS_FILE)).unwrap();
        assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));
    }

    #[test]
    fn robots_txt_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let mut config = SiteConfig::default();
        config.sitemap.generate_robots_txt = false;

        let paths = paths_stage(&source(), &ws).unwrap();
        let outcome =
            sitemap_stage(&paths.artifact, &paths.props.routes, &config, &ws.output, "now").unwrap();

        assert!(!outcome.wrote_robots);
        assert!(!ws.output.join(ROBOTS_FILE).exists());
    }

    #[test]
    fn sitemap_reads_what_paths_stage_wrote() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let config = SiteConfig::default();
        let paths = paths_stage(&source(), &ws).unwrap();

        // a later paths run with a different post set replaces the sidecar
        let newer = FixtureSource::from_posts(vec![sample_detail_without_image("a")]);
        let rerun = paths_stage(&newer, &ws).unwrap();

        let outcome =
            sitemap_stage(&rerun.artifact, &paths.props.routes, &config, &ws.output, "now").unwrap();
        assert!(outcome.entries.iter().all(|e| e.image.is_none()));
    }
}
