//! Project dependency graph construction.
//!
//! Raw import specifiers from each file are resolved against the set of
//! analyzed paths; anything that does not land on an analyzed file (package
//! names, unresolved aliases) never becomes an edge.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::models::graph::DependencyGraph;
use crate::models::result::FileAnalysisResult;
use crate::models::unified::Language;

/// Build the module graph from per-file results, in file order.
pub fn build_graph(files: &[Arc<FileAnalysisResult>]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let analyzed: FxHashSet<&str> = files.iter().map(|f| f.file_path.as_str()).collect();

    // pre-seed so isolated files are still graph nodes
    for file in files {
        graph.ensure_node(&file.file_path);
        debug!("added node: {}", file.file_path);
    }

    for file in files {
        for specifier in &file.dependencies {
            match resolve_specifier(&file.file_path, specifier, file.language, &analyzed) {
                Some(target) => {
                    graph.add_edge(&file.file_path, &target);
                    debug!("added edge: {} -> {}", file.file_path, target);
                }
                None => {
                    debug!("dropping unresolved import '{specifier}' in {}", file.file_path);
                }
            }
        }
    }

    graph.compute_instability();
    graph
}

/// Resolve one raw specifier to an analyzed file path, or `None` when the
/// import is external or unresolvable.
fn resolve_specifier(
    importer: &str,
    specifier: &str,
    language: Language,
    analyzed: &FxHashSet<&str>,
) -> Option<String> {
    let base = if specifier.starts_with('.') {
        let dir = Path::new(importer).parent()?;
        normalize_lexically(&dir.join(specifier))
    } else if specifier.starts_with('/') || specifier.starts_with('~') {
        // absolute or alias specifiers pass through unresolved
        PathBuf::from(specifier)
    } else {
        // bare package name: external module, not a graph node
        return None;
    };

    let candidate = complete_extension(base, language);
    let candidate = candidate.to_string_lossy().into_owned();
    analyzed.contains(candidate.as_str()).then_some(candidate)
}

/// Append the language's source extension when the specifier has none.
/// A trailing `.d` in TypeScript completes to `.d.ts`.
fn complete_extension(path: PathBuf, language: Language) -> PathBuf {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_owned);
    match extension.as_deref() {
        None => match language {
            Language::TypeScript => append(path, ".ts"),
            Language::JavaScript => append(path, ".js"),
            Language::Python => path,
        },
        Some("d") if language == Language::TypeScript => append(path, ".ts"),
        Some(_) => path,
    }
}

fn append(path: PathBuf, suffix: &str) -> PathBuf {
    let mut raw = path.into_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Remove `.` and `..` components without touching the filesystem, so
/// resolution stays deterministic for files that have just been deleted.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::unified::Language;
    use std::collections::BTreeMap;

    fn file(path: &str, language: Language, deps: &[&str]) -> Arc<FileAnalysisResult> {
        Arc::new(FileAnalysisResult {
            file_path: path.to_string(),
            language,
            metrics: BTreeMap::new(),
            findings: vec![],
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        })
    }

    #[test]
    fn relative_imports_resolve_with_extension_completion() {
        let files = vec![
            file("/proj/src/a.ts", Language::TypeScript, &["./b", "../src/c"]),
            file("/proj/src/b.ts", Language::TypeScript, &[]),
            file("/proj/src/c.ts", Language::TypeScript, &[]),
        ];
        let graph = build_graph(&files);
        let a = graph.node("/proj/src/a.ts").unwrap();
        assert_eq!(a.imports, vec!["/proj/src/b.ts", "/proj/src/c.ts"]);
        assert_eq!(
            graph.node("/proj/src/b.ts").unwrap().imported_by,
            vec!["/proj/src/a.ts"]
        );
    }

    #[test]
    fn package_imports_are_dropped() {
        let files = vec![file(
            "/proj/src/a.ts",
            Language::TypeScript,
            &["react", "lodash/merge"],
        )];
        let graph = build_graph(&files);
        assert!(graph.node("/proj/src/a.ts").unwrap().imports.is_empty());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn unresolvable_relative_import_is_omitted() {
        let files = vec![file("/proj/src/a.ts", Language::TypeScript, &["./missing"])];
        let graph = build_graph(&files);
        assert!(graph.node("/proj/src/a.ts").unwrap().imports.is_empty());
    }

    #[test]
    fn declaration_files_complete_to_d_ts() {
        let files = vec![
            file("/proj/src/a.ts", Language::TypeScript, &["./types.d"]),
            file("/proj/src/types.d.ts", Language::TypeScript, &[]),
        ];
        let graph = build_graph(&files);
        assert_eq!(
            graph.node("/proj/src/a.ts").unwrap().imports,
            vec!["/proj/src/types.d.ts"]
        );
    }

    #[test]
    fn javascript_gets_js_extension() {
        let files = vec![
            file("/proj/a.js", Language::JavaScript, &["./util"]),
            file("/proj/util.js", Language::JavaScript, &[]),
        ];
        let graph = build_graph(&files);
        assert_eq!(
            graph.node("/proj/a.js").unwrap().imports,
            vec!["/proj/util.js"]
        );
    }

    #[test]
    fn explicit_extension_is_kept() {
        let files = vec![
            file("/proj/a.ts", Language::TypeScript, &["./style.css", "./b.ts"]),
            file("/proj/b.ts", Language::TypeScript, &[]),
        ];
        let graph = build_graph(&files);
        assert_eq!(graph.node("/proj/a.ts").unwrap().imports, vec!["/proj/b.ts"]);
    }

    #[test]
    fn duplicate_imports_create_one_edge() {
        let files = vec![
            file("/proj/a.ts", Language::TypeScript, &["./b", "./b.ts"]),
            file("/proj/b.ts", Language::TypeScript, &[]),
        ];
        let graph = build_graph(&files);
        assert_eq!(graph.node("/proj/a.ts").unwrap().imports.len(), 1);
    }

    #[test]
    fn instability_is_populated() {
        let files = vec![
            file("/p/a.ts", Language::TypeScript, &["./b"]),
            file("/p/b.ts", Language::TypeScript, &[]),
        ];
        let graph = build_graph(&files);
        assert_eq!(graph.node("/p/a.ts").unwrap().instability, Some(1.0));
        assert_eq!(graph.node("/p/b.ts").unwrap().instability, Some(0.0));
    }
}
