use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a remote backend for a single command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RemoteError(pub String);

impl From<suppaftp::FtpError> for RemoteError {
    fn from(err: suppaftp::FtpError) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirOp {
    Create,
    DeleteFile,
    Remove,
}

impl DirOp {
    fn as_str(self) -> &'static str {
        match self {
            DirOp::Create => "make directory",
            DirOp::DeleteFile => "delete file",
            DirOp::Remove => "remove directory",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid server address '{0}'")]
    InvalidAddress(String),

    /// Transport failure or a greeting that is not a positive completion.
    #[error("failed to connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: RemoteError,
    },

    #[error("login rejected for '{login}': {source}")]
    Authentication {
        login: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to store {path}: {source}")]
    Transfer {
        path: String,
        #[source]
        source: RemoteError,
    },

    #[error("{} failed for {path}: {source}", .op.as_str())]
    DirectoryOp {
        op: DirOp,
        path: String,
        #[source]
        source: RemoteError,
    },

    #[error("{} has no directory name to upload under", .0.display())]
    UnnamedBackupDir(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// One item a best-effort walk could not process.
#[derive(Debug, Serialize)]
pub struct Failure {
    pub path: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: Error,
}

impl Failure {
    pub fn new(path: impl Into<String>, error: Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

fn serialize_display<S: serde::Serializer>(
    err: &Error,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}
