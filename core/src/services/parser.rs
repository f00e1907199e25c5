//! Grammar registry and source parsing.
//!
//! One `SourceParser` per analysis invocation; the underlying tree-sitter
//! parser is re-targeted per file via `set_language`, and a previous tree
//! may be supplied to seed an incremental parse.

use std::path::Path;

use tracing::{debug, warn};
use tree_sitter::{InputEdit, Parser, Point, Tree};

use crate::models::error::AnalyzeError;
use crate::models::unified::{Language, UnifiedNode};
use crate::services::adapters::AdapterRegistry;

/// Outcome of parsing one file.
pub struct ParseResult {
    pub tree: Tree,
    /// Language-neutral view; absent when the adapter failed (the raw tree
    /// is still usable for metrics).
    pub unified: Option<Vec<UnifiedNode>>,
    pub has_errors: bool,
    /// `error nodes / total nodes` over the whole tree.
    pub error_ratio: f64,
}

/// Map a file path to its language by extension. `.js`/`.jsx` and every
/// unknown extension parse as JavaScript, the most permissive grammar in
/// the set.
pub fn detect_language(path: &Path) -> Language {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts") | Some("tsx") => Language::TypeScript,
        Some("py") => Language::Python,
        _ => Language::JavaScript,
    }
}

pub fn supported_languages() -> &'static [Language] {
    #[cfg(feature = "python-ast")]
    {
        &[Language::TypeScript, Language::JavaScript, Language::Python]
    }
    #[cfg(not(feature = "python-ast"))]
    {
        &[Language::TypeScript, Language::JavaScript]
    }
}

pub struct SourceParser {
    parser: Parser,
    adapters: AdapterRegistry,
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            adapters: AdapterRegistry::default(),
        }
    }

    /// Parse a file's content into a tree plus the unified view.
    pub fn parse(
        &mut self,
        content: &str,
        language: Language,
        path: Option<&Path>,
    ) -> Result<ParseResult, AnalyzeError> {
        self.parse_with(content, language, path, None)
    }

    /// Re-parse reusing a previous tree. Any failure falls back to a full
    /// parse; the caller cannot observe which path ran.
    ///
    /// Callers hand in no edit list, so the whole span is marked dirty on a
    /// copy of the previous tree before it seeds the parser.
    pub fn parse_incremental(
        &mut self,
        previous: &Tree,
        content: &str,
        language: Language,
        path: Option<&Path>,
    ) -> Result<ParseResult, AnalyzeError> {
        let mut seeded = previous.clone();
        let old_root = seeded.root_node();
        let (old_end_byte, old_end_position) = (old_root.end_byte(), old_root.end_position());
        seeded.edit(&InputEdit {
            start_byte: 0,
            old_end_byte,
            new_end_byte: content.len(),
            start_position: Point { row: 0, column: 0 },
            old_end_position,
            new_end_position: end_point(content),
        });

        match self.parse_with(content, language, path, Some(&seeded)) {
            Ok(result) => Ok(result),
            Err(err) => {
                debug!(
                    "incremental parse failed ({err}), re-parsing {} from scratch",
                    path.map(|p| p.display().to_string()).unwrap_or_default()
                );
                self.parse_with(content, language, path, None)
            }
        }
    }

    fn parse_with(
        &mut self,
        content: &str,
        language: Language,
        path: Option<&Path>,
        previous: Option<&Tree>,
    ) -> Result<ParseResult, AnalyzeError> {
        let grammar = grammar_for(language, path)?;
        self.parser
            .set_language(&grammar)
            .map_err(|e| AnalyzeError::Parse {
                path: path.unwrap_or_else(|| Path::new("<memory>")).to_path_buf(),
                message: format!("failed to load grammar: {e}"),
            })?;

        let tree = self
            .parser
            .parse(content, previous)
            .ok_or_else(|| AnalyzeError::Parse {
                path: path.unwrap_or_else(|| Path::new("<memory>")).to_path_buf(),
                message: "parser returned no tree".to_string(),
            })?;

        let adapter = self.adapters.adapter_for(language);
        let error_ratio = adapter.error_ratio(&tree);
        let display_path = path.unwrap_or_else(|| Path::new("<memory>"));
        let unified = match adapter.to_unified_nodes(&tree, content, display_path) {
            Ok(nodes) => Some(nodes),
            Err(err) => {
                warn!(
                    "unified view unavailable for {}: {err}",
                    display_path.display()
                );
                None
            }
        };

        Ok(ParseResult {
            tree,
            unified,
            has_errors: error_ratio > 0.0,
            error_ratio,
        })
    }
}

fn end_point(text: &str) -> Point {
    let row = text.bytes().filter(|b| *b == b'\n').count();
    let column = text.len() - text.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Point { row, column }
}

fn grammar_for(
    language: Language,
    path: Option<&Path>,
) -> Result<tree_sitter::Language, AnalyzeError> {
    match language {
        Language::TypeScript => {
            let tsx = path
                .and_then(|p| p.extension())
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("tsx"))
                .unwrap_or(false);
            if tsx {
                Ok(tree_sitter_typescript::language_tsx())
            } else {
                Ok(tree_sitter_typescript::language_typescript())
            }
        }
        Language::JavaScript => Ok(tree_sitter_javascript::language()),
        #[cfg(feature = "python-ast")]
        Language::Python => Ok(tree_sitter_python::language()),
        #[cfg(not(feature = "python-ast"))]
        Language::Python => Err(AnalyzeError::UnsupportedLanguage {
            language: language.to_string(),
        }),
    }
}
