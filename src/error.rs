use std::path::PathBuf;
use thiserror::Error;

/// Draughtsman error types
///
/// Per-translation-unit failures are local (`TranslationUnit`); everything
/// else halts emission of the affected diagram.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Unknown diagram type: {0}")]
    UnknownDiagramType(String),

    #[error("No diagram named '{0}' in configuration")]
    UnknownDiagram(String),

    #[error("Invalid user data path '{path}': {message}")]
    UserDataPath { path: String, message: String },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Compilation database error in {path}: {message}")]
    CompilationDatabase { path: PathBuf, message: String },

    #[error("Failed to parse translation unit {path}: {message}")]
    TranslationUnit { path: PathBuf, message: String },

    #[error("Diagram '{0}' matched no elements")]
    EmptyDiagram(String),

    #[error("Identity collision: '{first}' and '{second}' both hash to {id}")]
    IdentityCollision {
        first: String,
        second: String,
        id: u64,
    },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for draughtsman operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a translation unit parse error
    pub fn translation_unit(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::TranslationUnit {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a compilation database error
    pub fn compilation_database(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::CompilationDatabase {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        Error::Generation(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error is local to a single translation unit
    pub fn is_local(&self) -> bool {
        matches!(self, Error::TranslationUnit { .. })
    }
}
