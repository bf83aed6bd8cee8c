//! Error types for image commands.
//!
//! Every command failure maps to one [`ErrorKind`], which is what callers
//! match on; the enums carry the detail shown to the user.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ArgumentCount,
    InvalidFormat,
    PreconditionFailed,
    Io,
    DriveRegistration,
    UnknownCommand,
}

/// Size specification could not be turned into a byte count.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizeError {
    #[error("could not parse size specification '{0}'")]
    InvalidFormat(String),

    /// Only produced in checked mode.
    #[error("size specification '{0}' does not fit in 64 bits")]
    Overflow(String),
}

/// Rejections from a drive manager.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("already launched")]
    AlreadyLaunched,

    #[error("{}: no such file", .0.display())]
    NotFound(PathBuf),

    #[error("{}: not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("no drives added")]
    NoDrives,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that terminate a single command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Wrong number of positional arguments; carries the usage hint.
    #[error("{0}")]
    ArgumentCount(&'static str),

    #[error(transparent)]
    InvalidFormat(#[from] SizeError),

    #[error("can't allocate or add disks after launching")]
    PreconditionFailed,

    /// File system operation failed, `op` names the failing step.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    DriveRegistration(#[from] DriveError),

    #[error("unknown command '{0}', use 'help' for a list of commands")]
    UnknownCommand(String),
}

impl CommandError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        CommandError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArgumentCount(_) => ErrorKind::ArgumentCount,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::PreconditionFailed => ErrorKind::PreconditionFailed,
            Self::Io { .. } => ErrorKind::Io,
            Self::DriveRegistration(_) => ErrorKind::DriveRegistration,
            Self::UnknownCommand(_) => ErrorKind::UnknownCommand,
        }
    }
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;
