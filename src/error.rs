use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{}:{line}: {message}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid input: {0}")]
    Domain(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot write {target}: {reason}")]
    Write { target: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    NetCdf(#[from] netcdf::Error),
}

impl Error {
    pub(crate) fn format(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(target: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Error::Write {
            target: target.to_string(),
            reason: reason.into(),
        }
    }
}

/// Problems found while resolving global-file options.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Unknown extension .{extension} for {field} file {path}")]
    UnknownExtension {
        field: &'static str,
        extension: String,
        path: String,
    },

    #[error("{field} file {path} has no extension")]
    MissingExtension { field: &'static str, path: String },

    #[error("Model {model} expects {expected} global parameters, found {found}")]
    ParameterCount {
        model: u32,
        expected: usize,
        found: usize,
    },

    #[error("Binary rainfall requires {0}")]
    MissingRainfallParameter(&'static str),

    #[error("Save path {0} given together with all-links save mode")]
    SaveConflict(String),

    #[error("Template placeholder ${0} has no value")]
    UnboundPlaceholder(String),

    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}
