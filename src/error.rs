use std::path::PathBuf;

use thiserror::Error;

/// Failures while discovering, decoding or splicing ISM scalar output.
#[derive(Error, Debug)]
pub enum IsmError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{}: {msg}", path.display())]
    Parse { path: PathBuf, msg: String },
    #[error("netcdf error in {}: {source}", path.display())]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },
    #[error("series length mismatch: {times} timestamps, {values} values")]
    LengthMismatch { times: usize, values: usize },
    #[error("cannot rebase an empty {0} series")]
    EmptySeries(&'static str),
    #[error("bad glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IsmError {
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        IsmError::Parse { path: path.into(), msg: msg.into() }
    }
}

/// Convenience type for `Result<T, IsmError>`.
pub type IsmResult<T> = Result<T, IsmError>;
