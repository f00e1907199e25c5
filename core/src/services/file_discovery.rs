//! Project file enumeration.
//!
//! A gitignore-aware walk produces candidates; the configuration's
//! analyze/exclude globs select the analyzed set. Output order is
//! lexicographic by absolute path, which fixes the iteration order of the
//! whole pipeline.

use std::path::PathBuf;

use anyhow::Result;
use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileDiscoveryConfig {
    /// Maximum directory depth to traverse.
    pub max_depth: Option<usize>,
    pub follow_links: bool,
    pub respect_gitignore: bool,
    /// Safety cap on the number of discovered files.
    pub max_files: Option<usize>,
}

impl Default for FileDiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(15),
            follow_links: false,
            respect_gitignore: true,
            max_files: Some(50_000),
        }
    }
}

pub struct FileDiscovery {
    root: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    config: FileDiscoveryConfig,
}

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl FileDiscovery {
    pub fn new(root: PathBuf, analyze_paths: &[String], exclude_paths: &[String]) -> Self {
        Self {
            root,
            include: compile_patterns(analyze_paths),
            exclude: compile_patterns(exclude_paths),
            config: FileDiscoveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FileDiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Walk the root and return the matching files as absolute paths in
    /// lexicographic order.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(self.config.respect_gitignore)
            .hidden(true)
            .follow_links(self.config.follow_links)
            .max_depth(self.config.max_depth);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("walk error under {}: {err}", self.root.display());
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(relative) => relative.to_string_lossy().into_owned(),
                Err(_) => continue,
            };
            if self.is_selected(&relative) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        if let Some(cap) = self.config.max_files {
            if files.len() > cap {
                debug!("truncating discovery at {cap} files");
                files.truncate(cap);
            }
        }
        Ok(files)
    }

    fn is_selected(&self, relative: &str) -> bool {
        let included = self
            .include
            .iter()
            .any(|pattern| matches_portably(pattern, relative));
        if !included {
            return false;
        }
        !self
            .exclude
            .iter()
            .any(|pattern| matches_portably(pattern, relative))
    }
}

fn compile_patterns(raw: &[String]) -> Vec<Pattern> {
    raw.iter()
        .filter_map(|text| match Pattern::new(text) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                warn!("ignoring invalid glob pattern '{text}': {err}");
                None
            }
        })
        .collect()
}

/// `**/x` also matches a root-level `x`, the way gitignore-style globs do.
fn matches_portably(pattern: &Pattern, relative: &str) -> bool {
    if pattern.matches_with(relative, GLOB_OPTIONS) {
        return true;
    }
    pattern
        .as_str()
        .strip_prefix("**/")
        .map(|stripped| {
            Pattern::new(stripped)
                .map(|p| p.matches_with(relative, GLOB_OPTIONS))
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "const x = 1;\n").unwrap();
        }
        dir
    }

    fn discover(dir: &TempDir, include: &[&str], exclude: &[&str]) -> Vec<String> {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        FileDiscovery::new(dir.path().to_path_buf(), &include, &exclude)
            .discover()
            .unwrap()
            .into_iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn globs_select_and_exclude() {
        let dir = project(&[
            "src/app.ts",
            "src/ui/button.tsx",
            "src/notes.md",
            "node_modules/pkg/index.ts",
        ]);
        let found = discover(
            &dir,
            &["**/*.ts", "**/*.tsx"],
            &["**/node_modules/**"],
        );
        assert_eq!(found, vec!["src/app.ts", "src/ui/button.tsx"]);
    }

    #[test]
    fn root_level_files_match_recursive_globs() {
        let dir = project(&["index.ts", "lib/util.ts"]);
        let found = discover(&dir, &["**/*.ts"], &[]);
        assert_eq!(found, vec!["index.ts", "lib/util.ts"]);
    }

    #[test]
    fn output_is_sorted() {
        let dir = project(&["b.ts", "a.ts", "c/a.ts"]);
        let found = discover(&dir, &["**/*.ts"], &[]);
        assert_eq!(found, vec!["a.ts", "b.ts", "c/a.ts"]);
    }

    #[test]
    fn invalid_patterns_are_ignored() {
        let dir = project(&["a.ts"]);
        let found = discover(&dir, &["[", "**/*.ts"], &[]);
        assert_eq!(found, vec!["a.ts"]);
    }

    #[test]
    fn max_files_caps_the_result() {
        let dir = project(&["a.ts", "b.ts", "c.ts"]);
        let include = vec!["**/*.ts".to_string()];
        let files = FileDiscovery::new(dir.path().to_path_buf(), &include, &[])
            .with_config(FileDiscoveryConfig {
                max_files: Some(2),
                ..FileDiscoveryConfig::default()
            })
            .discover()
            .unwrap();
        assert_eq!(files.len(), 2);
    }
}
