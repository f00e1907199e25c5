use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced through the public analyzer API.
///
/// Recoverable per-file conditions (unreadable file, failing rule, broken
/// import) never reach this type; the orchestrator degrades and logs them.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("unsupported language: {language}")]
    UnsupportedLanguage { language: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid path: {path}")]
    InvalidPath { path: PathBuf },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("analysis failed: {0}")]
    Internal(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path_and_message() {
        let err = AnalyzeError::Parse {
            path: PathBuf::from("src/app.ts"),
            message: "tree-sitter returned no tree".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse src/app.ts: tree-sitter returned no tree"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AnalyzeError = io.into();
        assert!(matches!(err, AnalyzeError::Io(_)));
    }
}
