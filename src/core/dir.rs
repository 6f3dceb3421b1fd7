//! Directory listings synthesized from store keys
//!
//! The store has no directories; listing the data root means scanning the
//! `db.opt` family and stripping each key down to its database name, and
//! listing a database folder means scanning the `frm` family under the
//! folder prefix and keeping the file names.

/// Reduce `./<db>/db.opt` keys to bare database names
pub(crate) fn database_names(keys: Vec<String>) -> Vec<String> {
    keys.into_iter()
        .map(|key| {
            let name = key.strip_prefix("./").unwrap_or(&key);
            let name = name.strip_suffix("/db.opt").unwrap_or(name);
            name.to_string()
        })
        .collect()
}

/// Reduce `./<db>/<file>` keys to bare file names
pub(crate) fn file_names(keys: Vec<String>) -> Vec<String> {
    keys.into_iter()
        .map(|key| match key.rfind('/') {
            Some(idx) => key[idx + 1..].to_string(),
            None => key,
        })
        .collect()
}
