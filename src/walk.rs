//! Searching a repository tree for ROAs covering a prefix.
//!
//! The walk visits every entry below a root directory in name order.
//! Directories are descended into, files whose name ends in the configured
//! suffix are decoded as ROAs and checked against the query prefix. Every
//! match is written as a line of the form
//!
//! ```text
//! ASN <as id> prefix <query prefix> ROA <path>
//! ```
//!
//! A file that can’t be read or decoded is logged and skipped. Failing to
//! read a directory or building a path longer than the configured maximum
//! ends the whole walk with an error.

use std::{fs, io};
use std::path::Path;
use bytes::Bytes;
use log::{debug, warn};
use crate::error::{ObjectError, WalkError};
use crate::prefix::Prefix;
use crate::roa::Roa;


//------------ WalkOptions ---------------------------------------------------

/// The maximum length of a constructed path in octets.
pub const DEFAULT_MAX_PATH_LEN: usize = 1024;

/// The file name suffix of ROAs.
pub const DEFAULT_SUFFIX: &str = ".roa";

/// Options for walking a repository tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WalkOptions {
    /// Only files whose name ends in this suffix are considered.
    ///
    /// The comparison is case sensitive.
    pub suffix: String,

    /// The upper bound for the length of constructed paths.
    ///
    /// A path of the directory, a slash if needed, and an entry name must
    /// be shorter than this many octets.
    pub max_path_len: usize,

    /// Whether to decode objects using DER rather than BER.
    pub strict: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            suffix: DEFAULT_SUFFIX.into(),
            max_path_len: DEFAULT_MAX_PATH_LEN,
            strict: false,
        }
    }
}


//------------ Walker --------------------------------------------------------

/// A walk over one repository tree for one query prefix.
pub struct Walker<'a, W> {
    query: &'a Prefix,
    options: &'a WalkOptions,
    target: W,
    matches: usize,
}

impl<'a, W: io::Write> Walker<'a, W> {
    /// Creates a new walker writing matches to `target`.
    pub fn new(
        query: &'a Prefix, options: &'a WalkOptions, target: W
    ) -> Self {
        Walker { query, options, target, matches: 0 }
    }

    /// Returns the number of matches written so far.
    pub fn matches(&self) -> usize {
        self.matches
    }

    /// Walks the tree below `root`.
    pub fn walk(&mut self, root: &Path) -> Result<(), WalkError> {
        self.walk_dir(root)
    }

    fn walk_dir(&mut self, dir: &Path) -> Result<(), WalkError> {
        debug!("Entering directory {}", dir.display());
        let mut entries = fs::read_dir(dir).and_then(|entries| {
            entries.collect::<Result<Vec<_>, _>>()
        }).map_err(|err| WalkError::io(dir, err))?;
        entries.sort_by_key(|entry| entry.file_name());

        let dir_len = dir.as_os_str().len();
        let need_slash = usize::from(
            dir.as_os_str().as_encoded_bytes().last() != Some(&b'/')
        );
        for entry in entries {
            let name = entry.file_name();
            let path = dir.join(&name);
            if dir_len + name.len() + need_slash >= self.options.max_path_len {
                return Err(WalkError::PathTooLong {
                    path,
                    max: self.options.max_path_len,
                })
            }
            let file_type = entry.file_type().map_err(|err| {
                WalkError::io(&path, err)
            })?;
            if file_type.is_dir() {
                self.walk_dir(&path)?;
            }
            else if name.as_encoded_bytes().ends_with(
                self.options.suffix.as_bytes()
            ) {
                self.handle_file(&path)?;
            }
            else {
                debug!("Skipping {}", path.display());
            }
        }
        Ok(())
    }

    /// Checks a single candidate file.
    ///
    /// Only a failure to write the output is an error.
    fn handle_file(&mut self, path: &Path) -> Result<(), WalkError> {
        debug!("Checking {}", path.display());
        let roa = match read_roa(path, self.options.strict) {
            Ok(roa) => roa,
            Err(err) => {
                warn!("{}: {}", path.display(), err);
                return Ok(())
            }
        };
        let entry = match roa.content.find_match(self.query) {
            Some(entry) => entry,
            None => return Ok(())
        };
        debug!(
            "{}: {} covered by {} with max length {}",
            path.display(), self.query, entry.prefix(), entry.max_length()
        );
        writeln!(
            self.target, "ASN {} prefix {} ROA {}",
            roa.content.as_id(), self.query, path.display()
        ).map_err(|err| WalkError::io(path, err))?;
        self.matches += 1;
        Ok(())
    }
}

fn read_roa(path: &Path, strict: bool) -> Result<Roa, ObjectError> {
    let data = fs::read(path)?;
    Roa::decode(Bytes::from(data), strict)
}


//------------ walk ----------------------------------------------------------

/// Walks the tree below `root` looking for ROAs covering `query`.
///
/// Writes one line per matching ROA to `target` and returns the number of
/// matches.
pub fn walk<W: io::Write>(
    root: &Path,
    query: &Prefix,
    options: &WalkOptions,
    target: W,
) -> Result<usize, WalkError> {
    let mut walker = Walker::new(query, options, target);
    walker.walk(root)?;
    Ok(walker.matches())
}


//============ Tests =========================================================
