use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by [`crate::Compiler`].
///
/// Configuration variants are raised before any file is read or any
/// process is spawned.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("output file path is required (set `filename`)")]
    MissingOutputPath,

    #[error("invalid option `{option}`: {reason}")]
    InvalidOption { option: &'static str, reason: String },

    #[error("invalid requirement `{name}`: {reason}")]
    InvalidRequire { name: String, reason: String },

    #[error("failed to read core library {path}: {source}")]
    CoreLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dependency bundling failed: {0}")]
    Bundle(#[from] BundleError),

    #[error("failed to encode source map: {0}")]
    SourceMap(#[from] serde_json::Error),
}

/// Failures of the external package bundler.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("could not run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("`{program}` produced non UTF-8 output")]
    InvalidOutput { program: String },

    #[error("cannot resolve package `{package}`")]
    Unresolved { package: String },
}

/// Failures loading a project file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

pub type Result<T> = std::result::Result<T, CompileError>;
