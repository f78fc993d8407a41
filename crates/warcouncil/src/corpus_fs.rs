//! Filesystem corpus loader.
//!
//! `corpus.path` may name a single JSON file holding an array of documents,
//! or a directory. Directories are walked recursively; files whose relative
//! path matches `include_globs` and none of `exclude_globs` are read and
//! concatenated in sorted path order so repeated loads see the same corpus.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use warcouncil_core::corpus::CorpusLoader;
use warcouncil_core::models::Document;

use crate::config::CorpusConfig;

pub struct FsCorpusLoader {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl FsCorpusLoader {
    pub fn new(config: &CorpusConfig) -> Result<Self> {
        let mut excludes = vec!["**/.git/**".to_string()];
        excludes.extend(config.exclude_globs.iter().cloned());

        Ok(Self {
            root: config.path.clone(),
            include: build_globset(&config.include_globs)?,
            exclude: build_globset(&excludes)?,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Corpus files in load order.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            bail!("Corpus path does not exist: {}", self.root.display());
        }
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(self.follow_symlinks) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let rel_str = relative.to_string_lossy();

            if self.exclude.is_match(rel_str.as_ref()) || !self.include.is_match(rel_str.as_ref()) {
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl CorpusLoader for FsCorpusLoader {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn load(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for path in self.files()? {
            let batch = read_documents(&path)?;
            debug!(file = %path.display(), documents = batch.len(), "corpus file read");
            documents.extend(batch);
        }
        Ok(documents)
    }
}

fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid corpus JSON in {}", path.display()))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path: &Path, exclude: &[&str]) -> CorpusConfig {
        CorpusConfig {
            path: path.to_path_buf(),
            include_globs: vec!["**/*.json".to_string()],
            exclude_globs: exclude.iter().map(|s| s.to_string()).collect(),
            follow_symlinks: false,
        }
    }

    fn write_doc(path: &Path, id: &str) {
        let json = format!(
            r#"[{{"id":"{id}","content":"{id} text","metadata":{{"name":"{id}","type":"troop","category":"stats"}},"embedding":[1.0,0.0]}}]"#
        );
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    #[tokio::test]
    async fn test_directory_walk_is_sorted_and_filtered() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_doc(&tmp.path().join("troops/b.json"), "b");
        write_doc(&tmp.path().join("defenses/a.json"), "a");
        write_doc(&tmp.path().join("drafts/c.json"), "c");
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let loader = FsCorpusLoader::new(&config(tmp.path(), &["drafts/**"])).unwrap();
        let docs = loader.load().await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_single_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("corpus.json");
        write_doc(&file, "cannon");

        let loader = FsCorpusLoader::new(&config(&file, &[])).unwrap();
        let docs = loader.load().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata.kind, "troop");
        assert_eq!(docs[0].metadata.url, None);
    }

    #[tokio::test]
    async fn test_missing_path_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let loader = FsCorpusLoader::new(&config(&tmp.path().join("nope"), &[])).unwrap();
        let err = loader.load().await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_malformed_json_names_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("bad.json");
        std::fs::write(&file, "{not json").unwrap();
        let loader = FsCorpusLoader::new(&config(&file, &[])).unwrap();
        let err = loader.load().await.unwrap_err();
        assert!(format!("{:#}", err).contains("bad.json"));
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut cfg = config(tmp.path(), &[]);
        cfg.include_globs = vec!["[".to_string()];
        assert!(FsCorpusLoader::new(&cfg).is_err());
    }
}
