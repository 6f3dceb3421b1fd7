//! Path schema for store-managed files
//!
//! The storage engine addresses its data directory with ordinary paths; the
//! adapter only ever manages a few shapes of them, all relative to the data
//! root:
//!
//! - `./<db>/` (or without the trailing slash) - a database folder
//! - `./<db>/db.opt` - the database options entry
//! - `./<db>/<table>.frm` - a table definition entry
//! - `./<db>/<table>.frm~` - an in-progress temp copy of a definition
//!
//! Segment names may not contain `.` or `/`, so nothing nests deeper than
//! one folder and none of the reserved extensions can appear in a name.
//! Every match is anchored at both ends; a path that merely contains a
//! valid shape somewhere inside it does not qualify.

use crate::core::store::ColumnFamily;
use crate::error::{KvfsError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Suffix marking an in-progress table definition copy
pub const TEMP_FRM_EXT: &str = ".frm~";

/// Pattern for a database folder, with or without the trailing slash
const FOLDER_PATTERN: &str = r"^\./[^./]+/?$";

/// Pattern for the two store-managed file kinds
const KNOWN_FILE_PATTERN: &str = r"^\./[^./]+/(db\.opt|[^./]+\.frm)$";

/// Pattern for a temp table definition file
const TEMP_FRM_PATTERN: &str = r"^\./[^./]+/[^./]+\.frm~$";

static FOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(FOLDER_PATTERN).unwrap());
static KNOWN_FILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(KNOWN_FILE_PATTERN).unwrap());
static TEMP_FRM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(TEMP_FRM_PATTERN).unwrap());

/// Rewrite an engine path relative to the data root
///
/// Paths under `data_root` are rewritten to the `./`-relative form the
/// store is keyed by; the root itself becomes `.`. Anything else is
/// returned unchanged, including paths that are already relative.
///
/// # Examples
///
/// ```
/// use kvfs::core::path::normalize;
///
/// assert_eq!(normalize("/data/", "/data/db1/t1.frm"), "./db1/t1.frm");
/// assert_eq!(normalize("/data/", "/data/"), ".");
/// assert_eq!(normalize("/data/", "/etc/hosts"), "/etc/hosts");
/// assert_eq!(normalize("/data/", "./db1/t1.frm"), "./db1/t1.frm");
/// ```
pub fn normalize(data_root: &str, path: &str) -> String {
    if !path.starts_with(data_root) {
        return path.to_string();
    }
    if path == data_root {
        return ".".to_string();
    }
    format!("./{}", &path[data_root.len()..])
}

/// Whether the path names a database folder
pub fn is_folder(path: &str) -> bool {
    FOLDER_RE.is_match(path)
}

/// Whether the path names one of the two store-managed file kinds
pub fn is_known_file(path: &str) -> bool {
    KNOWN_FILE_RE.is_match(path)
}

/// Whether the path names a temp table definition file
pub fn is_temp_frm(path: &str) -> bool {
    TEMP_FRM_RE.is_match(path)
}

/// Whether the path ends in an extension the adapter manages
///
/// This is the interception filter: calls on other extensions belong to
/// the host filesystem and are never inspected further.
pub fn is_known_extension(path: &str) -> bool {
    path.ends_with(".frm") || path.ends_with(".opt")
}

/// Column family an extension maps to
///
/// Only meaningful for paths that passed [`is_known_extension`]; anything
/// else is a caller bug and comes back as [`KvfsError::UnexpectedExtension`].
pub fn column_family_for(path: &str) -> Result<ColumnFamily> {
    if path.ends_with(".frm") {
        Ok(ColumnFamily::Frm)
    } else if path.ends_with(".opt") {
        Ok(ColumnFamily::Db)
    } else {
        Err(KvfsError::UnexpectedExtension {
            path: path.to_string(),
        })
    }
}

/// Directory part of a path, through the final `/`
pub(crate) fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// Key of the `db.opt` entry in the same folder as `path`
///
/// A table definition may only live inside a database that exists, and a
/// database exists exactly when its `db.opt` entry does.
pub fn db_opt_sibling(path: &str) -> String {
    format!("{}db.opt", parent_dir(path))
}
