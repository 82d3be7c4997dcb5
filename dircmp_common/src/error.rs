use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirCmpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Inspection(#[from] InspectionError),
}

pub type Result<T> = std::result::Result<T, DirCmpError>;

/// Filesystem operation that failed while inspecting a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectOp {
    /// Reading metadata (stat or lstat)
    Stat,
    /// Opening or iterating a directory listing
    ListDir,
    /// Opening a file for reading
    Open,
    /// Reading file content
    Read,
    /// Reading a symbolic link target
    ReadLink,
}

impl InspectOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectOp::Stat => "stat",
            InspectOp::ListDir => "list",
            InspectOp::Open => "open",
            InspectOp::Read => "read",
            InspectOp::ReadLink => "readlink",
        }
    }
}

impl fmt::Display for InspectOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path could not be inspected, as opposed to a comparison that found a difference.
#[derive(Error, Debug)]
#[error("cannot {op} {}: {source}", .path.display())]
pub struct InspectionError {
    pub path: PathBuf,
    pub op: InspectOp,
    #[source]
    pub source: std::io::Error,
}

impl InspectionError {
    pub fn new(path: impl Into<PathBuf>, op: InspectOp, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            op,
            source,
        }
    }

    pub fn kind(&self) -> std::io::ErrorKind {
        self.source.kind()
    }
}
