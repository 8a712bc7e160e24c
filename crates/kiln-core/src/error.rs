use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    // Tokenizer and compiler errors
    #[error("SYNTAX_ERROR: {message} at position {offset} (line {line}) in template {}", .path.display())]
    Syntax {
        path: PathBuf,
        offset: usize,
        line: usize,
        message: String,
    },

    #[error("LOAD_ORDER: template {} was compiled before its text was loaded", .path.display())]
    LoadOrder { path: PathBuf },

    #[error(
        "MISSING_DEPENDENCY: partial {} rendered from {} was never declared with '@'",
        .path.display(),
        .from.display()
    )]
    MissingDependency { path: PathBuf, from: PathBuf },

    // IO errors
    #[error("IO_ERROR: failed to read template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("RUNTIME_ERROR: {message} at line {line} in template {}", .path.display())]
    Runtime {
        path: PathBuf,
        line: usize,
        message: String,
    },

    // Config errors
    #[error("CONFIG_INVALID: {0}")]
    ConfigInvalid(String),

    #[error("LOADER_TASK_FAILED: {0}")]
    LoaderTask(String),
}

impl From<toml::de::Error> for TemplateError {
    fn from(err: toml::de::Error) -> Self {
        TemplateError::ConfigInvalid(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TemplateError {
    fn from(err: tokio::task::JoinError) -> Self {
        TemplateError::LoaderTask(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
