//! Capability-scoped reads and atomic replacement of store files.

use super::document::Document;
use crate::server_config::ports::{ConfigStoreError, ConfigStoreResult};
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Reads a store file as a JSON object.
///
/// A missing or whitespace-only file yields `None`. Anything else that is
/// not a JSON object is a read error.
pub(crate) fn read_document(path: &Utf8Path) -> ConfigStoreResult<Option<Document>> {
    let read_error = |err| ConfigStoreError::read(path.as_str(), err);
    let Some((dir, file_name)) = open_parent_dir(path, false).map_err(read_error)? else {
        return Ok(None);
    };

    let contents = match dir.read_to_string(file_name) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(read_error(err)),
    };
    if contents.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(doc)) => Ok(Some(doc)),
        Ok(_) => Err(read_error(std::io::Error::new(
            ErrorKind::InvalidData,
            "configuration root is not a JSON object",
        ))),
        Err(err) => Err(ConfigStoreError::read(path.as_str(), err)),
    }
}

/// Replaces a store file with `doc`.
///
/// The document is written to a uniquely named sibling temporary file,
/// flushed to disk, and renamed over the target, so readers never observe a
/// partial file. The parent directory is synced after the rename. Existing
/// permissions carry over to the replacement.
pub(crate) fn write_document(path: &Utf8Path, doc: &Document) -> ConfigStoreResult<()> {
    let write_error = |err| ConfigStoreError::write(path.as_str(), err);
    let (dir, file_name) = open_parent_dir(path, true)
        .map_err(write_error)?
        .ok_or_else(|| write_error(std::io::Error::from(ErrorKind::NotFound)))?;

    let mut rendered = serde_json::to_vec_pretty(doc)
        .map_err(|err| ConfigStoreError::write(path.as_str(), err))?;
    rendered.push(b'\n');

    let temp_name = temp_file_name(file_name);
    let result = replace_file(&dir, file_name, &temp_name, &rendered);
    if result.is_err()
        && let Err(cleanup_error) = dir.remove_file(&temp_name)
    {
        debug!(path = %path, error = %cleanup_error, "failed to remove temporary store file");
    }
    result.map_err(write_error)
}

fn replace_file(
    dir: &Dir,
    file_name: &str,
    temp_name: &str,
    contents: &[u8],
) -> std::io::Result<()> {
    let existing_permissions = match dir.metadata(file_name) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => return Err(err),
    };

    let mut file = dir.create(temp_name)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    if let Some(permissions) = existing_permissions {
        dir.set_permissions(temp_name, permissions)?;
    }
    dir.rename(temp_name, dir, file_name)?;
    sync_dir(dir)
}

/// Returns a temporary name unique across processes and concurrent writers.
fn temp_file_name(file_name: &str) -> String {
    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(".{file_name}.{}.{sequence}.tmp", std::process::id())
}

#[cfg(unix)]
fn sync_dir(dir: &Dir) -> std::io::Result<()> {
    dir.open(".")?.sync_all()
}

#[cfg(not(unix))]
const fn sync_dir(_dir: &Dir) -> std::io::Result<()> {
    Ok(())
}

/// Opens the directory containing `path`, optionally creating it.
///
/// Returns `None` when the directory does not exist and `create` is false.
fn open_parent_dir(path: &Utf8Path, create: bool) -> std::io::Result<Option<(Dir, &str)>> {
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("store path must include a file name"))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    if create {
        Dir::create_ambient_dir_all(parent, ambient_authority())?;
    }
    match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => Ok(Some((dir, file_name))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}
