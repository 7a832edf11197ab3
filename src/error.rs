use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Problems building the run configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    MissingVar(&'static str),
    #[error("environment variable `{0}` is not valid unicode")]
    InvalidVar(&'static str),
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),
    #[error("delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(String),
}

/// Errors that abort the whole run before any file is processed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot list source directory {}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot connect to {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: tokio_postgres::Error,
    },
}

/// Errors confined to a single source file; the run carries on.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot read file")]
    Io(#[from] std::io::Error),
    #[error("malformed csv")]
    Csv(#[from] csv_async::Error),
    #[error("file has no header row")]
    EmptyFile,
    #[error("line {line}: expected {expected} fields, saw {got}")]
    RowTooLong {
        line: u64,
        got: usize,
        expected: usize,
    },
    #[error("table write failed")]
    Write(#[source] BoxError),
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Render an error and all of its sources as `outer: inner: root`.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut msg = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        // Some wrappers already embed their source's text.
        if !msg.ends_with(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        current = source.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_every_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = FileError::Write(Box::new(io));
        assert_eq!(error_chain(&err), "table write failed: permission denied");
    }

    #[test]
    fn chain_of_leaf_error_is_its_message() {
        let err = FileError::RowTooLong {
            line: 3,
            got: 4,
            expected: 2,
        };
        assert_eq!(error_chain(&err), "line 3: expected 2 fields, saw 4");
    }
}
