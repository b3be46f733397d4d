//! Source file discovery: walk directories and filter with include/exclude globs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Files picked up when the configuration names no `include` globs.
pub(crate) const DEFAULT_INCLUDE: &[&str] = &["**/*.{js,jsx,ts,tsx,mjs,cjs,svelte,vue}"];

/// Directories skipped when the configuration names no `exclude` globs.
pub(crate) const DEFAULT_EXCLUDE: &[&str] = &["**/node_modules/**", "**/.git/**"];

fn build_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        builder.add(
            GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid glob pattern '{pattern}'"))?,
        );
    }
    builder.build().context("failed to compile glob set")
}

/// Include/exclude filter over paths relative to a walk root.
pub(crate) struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileFilter {
    /// Build from configured globs, substituting defaults for empty lists.
    pub(crate) fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            build_set(DEFAULT_INCLUDE)?
        } else {
            build_set(include)?
        };
        let exclude = if exclude.is_empty() {
            build_set(DEFAULT_EXCLUDE)?
        } else {
            build_set(exclude)?
        };
        Ok(Self { include, exclude })
    }

    fn excluded(&self, rel: &Path) -> bool {
        self.exclude.is_match(rel)
    }

    fn accepts(&self, rel: &Path) -> bool {
        self.include.is_match(rel) && !self.excluded(rel)
    }
}

/// Expand `paths` into a sorted, deduplicated file list.
///
/// Files named explicitly are always kept. Directories are walked and only
/// files accepted by `filter` (matched relative to that directory) are kept.
pub(crate) fn collect_files(paths: &[PathBuf], filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            anyhow::bail!("no such file or directory: {}", root.display());
        }
        let walker = walkdir::WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                let rel = e.path().strip_prefix(root).unwrap_or(e.path());
                rel.as_os_str().is_empty() || !filter.excluded(rel)
            });
        for entry in walker {
            let entry = entry.map_err(|e| {
                let at = e
                    .path()
                    .map_or(String::new(), |p| format!(" at '{}'", p.display()));
                anyhow::anyhow!("error walking {}{at}: {e}", root.display())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if filter.accepts(rel) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    log::debug!("discovered {} files", files.len());
    Ok(files)
}
