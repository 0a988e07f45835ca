//! Atomic filesystem operations.
//!
//! All record writes follow this pattern:
//! 1. Write content to a uniquely named temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Move it into place, either replacing the target (`atomic_write`) or
//!    only when the target does not exist yet (`publish_exclusive`)
//!
//! Source and destination must be on the same filesystem. On crash a
//! temporary file may remain (named `.{filename}.{pid}.{random}.tmp`); it is
//! never mistaken for a record because it does not end in `.lock`.

use crate::error::{ProviderError, ProviderResult};
use rand::Rng;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Atomically replace the contents of `path`.
///
/// The target is never in a partial state: readers see either the previous
/// content or the new content.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> ProviderResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = temp_sibling(path);
    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ProviderError::io(path, e)
    })?;

    sync_parent(path);
    Ok(())
}

/// Atomically create `path` with `content` unless it already exists.
///
/// Returns `Ok(false)` if another writer got there first. The content is fully
/// written before the name appears, so no reader can see an empty record.
pub fn publish_exclusive<P: AsRef<Path>>(path: P, content: &[u8]) -> ProviderResult<bool> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = temp_sibling(path);
    write_and_sync(&temp_path, content)?;

    let linked = fs::hard_link(&temp_path, path);
    let _ = fs::remove_file(&temp_path);

    match linked {
        Ok(()) => {
            sync_parent(path);
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(ProviderError::io(path, e)),
    }
}

/// A unique temporary path in the same directory as `target`.
pub fn temp_sibling(target: &Path) -> PathBuf {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let salt: u32 = rand::rng().random();
    parent.join(format!(
        ".{}.{}.{:08x}.tmp",
        filename,
        std::process::id(),
        salt
    ))
}

/// Write content to a new file and sync it to disk.
pub fn write_and_sync(path: &Path, content: &[u8]) -> ProviderResult<()> {
    let mut file = File::create(path).map_err(|e| ProviderError::io(path, e))?;

    let written = file.write_all(content).and_then(|()| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(path);
        return Err(ProviderError::io(path, e));
    }

    Ok(())
}

fn ensure_parent(path: &Path) -> ProviderResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| ProviderError::io(parent, e))?;
    }
    Ok(())
}

/// Persist the directory entry; best effort.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
