use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoregenError>;

#[derive(Debug, Error)]
pub enum CoregenError {
    #[error("source root {0} does not exist or is not a directory")]
    MissingSourceRoot(PathBuf),
    #[error("module directory {0} does not exist under the source root")]
    MissingModule(String),
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("invalid identity {identity:?}: {reason}")]
    InvalidIdentity { identity: String, reason: String },
    #[error("invalid unit catalog: {0}")]
    InvalidCatalog(#[from] serde_json::Error),
    #[error("failed to serialize manifest {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} unclassified file(s) found in strict mode: {}", .0.len(), .0.join(", "))]
    Unclassified(Vec<String>),
}

impl CoregenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
