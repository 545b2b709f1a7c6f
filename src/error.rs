//! Error handling.
//!
//! Errors fall into two groups. An [`ObjectError`] concerns a single object
//! and is recoverable: whoever processes many objects reports it and moves
//! on to the next one. A [`WalkError`] means a directory tree couldn’t be
//! traversed and ends the traversal.

use std::{error, fmt, io};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use bcder::Oid;
use bcder::decode::DecodeError;
use bytes::Bytes;
use crate::oid;
use crate::prefix::FromStrError;


//------------ ObjectError ---------------------------------------------------

/// Decoding a single signed object failed.
#[derive(Debug)]
pub enum ObjectError {
    /// The object’s file couldn’t be read.
    Read(io::Error),

    /// The signed message envelope is malformed.
    Envelope(DecodeError<Infallible>),

    /// The signed message has no encapsulated content.
    MissingContent,

    /// The signed message contains an unexpected type of content.
    ContentType(Oid<Bytes>),

    /// The content is not a well-formed ROA.
    Roa(DecodeError<Infallible>),

    /// The content is not a well-formed manifest.
    Manifest(DecodeError<Infallible>),
}

impl From<io::Error> for ObjectError {
    fn from(err: io::Error) -> Self {
        ObjectError::Read(err)
    }
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ObjectError::Read(ref err) => {
                write!(f, "Couldn't read file: {}", err)
            }
            ObjectError::Envelope(ref err) => {
                write!(f, "Couldn't parse CMS: {}", err)
            }
            ObjectError::MissingContent => {
                f.write_str("Couldn't parse CMS: no encapsulated content")
            }
            ObjectError::ContentType(ref oid) => {
                write!(f, "Unexpected content type {}", oid::describe(oid))
            }
            ObjectError::Roa(ref err) => {
                write!(f, "Malformed ROA: {}", err)
            }
            ObjectError::Manifest(ref err) => {
                write!(f, "Malformed manifest: {}", err)
            }
        }
    }
}

impl error::Error for ObjectError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ObjectError::Read(ref err) => Some(err),
            _ => None
        }
    }
}


//------------ WalkError -----------------------------------------------------

/// Traversing a directory tree failed.
#[derive(Debug)]
pub enum WalkError {
    /// A directory couldn’t be opened or read.
    Io {
        path: PathBuf,
        err: io::Error,
    },

    /// The path of a directory entry would have been too long.
    PathTooLong {
        path: PathBuf,
        max: usize,
    },
}

impl WalkError {
    pub(crate) fn io(path: &Path, err: io::Error) -> Self {
        WalkError::Io { path: path.into(), err }
    }

    /// Returns the path the error happened at.
    pub fn path(&self) -> &Path {
        match *self {
            WalkError::Io { ref path, .. } => path,
            WalkError::PathTooLong { ref path, .. } => path,
        }
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WalkError::Io { ref path, ref err } => {
                write!(
                    f, "Couldn't open directory {}: {}", path.display(), err
                )
            }
            WalkError::PathTooLong { ref path, max } => {
                write!(
                    f, "Constructed path name too long (max {}): {}",
                    max, path.display()
                )
            }
        }
    }
}

impl error::Error for WalkError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            WalkError::Io { ref err, .. } => Some(err),
            WalkError::PathTooLong { .. } => None,
        }
    }
}


//------------ ArgumentError -------------------------------------------------

/// A command line argument couldn’t be used.
#[derive(Clone, Debug)]
pub struct ArgumentError {
    arg: String,
    err: FromStrError,
}

impl ArgumentError {
    pub fn new(arg: impl Into<String>, err: FromStrError) -> Self {
        ArgumentError { arg: arg.into(), err }
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.arg, self.err)
    }
}

impl error::Error for ArgumentError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.err)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use crate::prefix::Prefix;
    use super::*;

    #[test]
    fn messages() {
        let err = ObjectError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ObjectError::Read(_)));
        assert!(error::Error::source(&err).is_some());
        assert_eq!(
            ObjectError::MissingContent.to_string(),
            "Couldn't parse CMS: no encapsulated content"
        );

        let err = WalkError::PathTooLong { path: "a/b".into(), max: 3 };
        assert_eq!(err.path(), Path::new("a/b"));
        assert_eq!(
            err.to_string(), "Constructed path name too long (max 3): a/b"
        );

        let arg = "10.0.0.0/40";
        let err = ArgumentError::new(
            arg, Prefix::from_str(arg).unwrap_err()
        );
        assert_eq!(
            err.to_string(), "10.0.0.0/40: bad prefix length: 40 too large"
        );
    }
}
