//! Path validation for corpus file references.
//!
//! Catalog entries name their data file with a relative path. Those paths come
//! from outside the process, so they are checked before any backend sees them.

use crate::error::{ErrorKind, Result};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Normalise a relative corpus path, refusing anything that would leave the
/// source root.
///
/// `.` and empty components are dropped and `..` is resolved lexically; a
/// path that climbs above the root, resolves to nothing, or contains a null
/// byte is [`InvalidPath`](crate::error::ErrorKind::InvalidPath). Backslashes
/// are not treated as separators.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use lectio_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("ot/genesis.json").is_ok());
/// assert!(validate_path("ot/../nt/john.json").is_ok()); // (never leaves corpus root)
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("nt/../../john.json").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("./nt//./john.json/").unwrap(),
///     Path::new("nt/john.json")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut kept: Vec<&OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir => {},
            // Null bytes survive `components()` on Unix but truncate C strings.
            Component::Normal(name) if name.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(name) => kept.push(name),
            Component::ParentDir => {
                kept.pop().ok_or_else(invalid)?;
            },
            Component::Prefix(_) => exn::bail!(invalid()),
        }
    }
    if kept.is_empty() {
        exn::bail!(invalid());
    }
    Ok(kept.into_iter().collect())
}
