//! Post metadata sidecar.
//!
//! The sidecar is the JSON file that carries every post's field set from the
//! paths stage to later stages (generate, sitemap). It is a plain JSON array,
//! 4-space indented, one record per post, keyed by position and looked up by
//! slug.
//!
//! ## Producer/consumer order
//!
//! [`Sidecar::write`] is the only way to obtain a [`SidecarArtifact`], and the
//! sitemap stage takes an artifact rather than a path. A sitemap can therefore
//! only be built from a sidecar that this build has flushed to disk, never from
//! a stale file left over from an earlier post set. Standalone subcommands that
//! start from an existing file go through [`SidecarArtifact::existing`], which
//! checks the file is there.

use crate::types::PostDetail;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the sidecar inside the temp directory.
pub const SIDECAR_FILE: &str = "blogPostMeta.json";

/// One sidecar entry: the full field set of a fetched post.
pub type SidecarRecord = PostDetail;

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Sidecar not found at {0} (run the paths stage first)")]
    Missing(PathBuf),
}

/// In-memory sidecar contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sidecar {
    records: Vec<SidecarRecord>,
}

impl Sidecar {
    pub fn new(records: Vec<SidecarRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SidecarRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose slug equals `slug` exactly.
    pub fn find(&self, slug: &str) -> Option<&SidecarRecord> {
        self.records.iter().find(|r| r.slug() == slug)
    }

    /// Serialize as a 4-space indented JSON array.
    pub fn to_json(&self) -> Result<String, SidecarError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.records.serialize(&mut ser)?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_json(json: &str) -> Result<Self, SidecarError> {
        Ok(Self {
            records: serde_json::from_str(json)?,
        })
    }

    /// Flush to `path`, replacing any previous file, and hand back the
    /// artifact later stages read from.
    pub fn write(&self, path: &Path) -> Result<SidecarArtifact, SidecarError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(SidecarArtifact {
            path: path.to_path_buf(),
            records: self.records.len(),
        })
    }
}

/// Handle to a sidecar that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarArtifact {
    path: PathBuf,
    records: usize,
}

impl SidecarArtifact {
    /// Adopt a sidecar written by an earlier run.
    pub fn existing(path: &Path) -> Result<Self, SidecarError> {
        if !path.is_file() {
            return Err(SidecarError::Missing(path.to_path_buf()));
        }
        let sidecar = Self {
            path: path.to_path_buf(),
            records: 0,
        }
        .load()?;
        Ok(Self {
            path: path.to_path_buf(),
            records: sidecar.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written.
    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn load(&self) -> Result<Sidecar, SidecarError> {
        let content = fs::read_to_string(&self.path)?;
        Sidecar::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_detail;
    use tempfile::TempDir;

    #[test]
    fn write_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SIDECAR_FILE);
        let sidecar = Sidecar::new(vec![sample_detail("a"), sample_detail("b")]);

        let artifact = sidecar.write(&path).unwrap();
        assert_eq!(artifact.record_count(), 2);
        assert_eq!(artifact.load().unwrap(), sidecar);
    }

    #[test]
    fn write_replaces_previous_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SIDECAR_FILE);
        Sidecar::new(vec![sample_detail("old")]).write(&path).unwrap();

        let artifact = Sidecar::new(vec![sample_detail("new")]).write(&path).unwrap();
        let loaded = artifact.load().unwrap();
        assert!(loaded.find("old").is_none());
        assert!(loaded.find("new").is_some());
    }

    #[test]
    fn write_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir").join(SIDECAR_FILE);
        Sidecar::default().write(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn json_is_four_space_indented_array() {
        let json = Sidecar::new(vec![sample_detail("a")]).to_json().unwrap();
        assert!(json.starts_with("[\n    {\n        \""));
    }

    #[test]
    fn find_first_match_wins() {
        let mut second = sample_detail("dup");
        second.summary.title = "Second".into();
        let sidecar = Sidecar::new(vec![sample_detail("dup"), second]);
        assert_eq!(sidecar.find("dup").unwrap().summary.title, "Post dup");
    }

    #[test]
    fn find_requires_exact_slug() {
        let sidecar = Sidecar::new(vec![sample_detail("hello-world")]);
        assert!(sidecar.find("hello").is_none());
        assert!(sidecar.find("Hello-World").is_none());
    }

    #[test]
    fn existing_requires_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SIDECAR_FILE);
        assert!(matches!(
            SidecarArtifact::existing(&path),
            Err(SidecarError::Missing(_))
        ));

        Sidecar::new(vec![sample_detail("a")]).write(&path).unwrap();
        assert_eq!(SidecarArtifact::existing(&path).unwrap().record_count(), 1);
    }
}
