//! File system utilities.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWriteExt};

/// Return a path inside `directory` that does not exist yet.
///
/// `candidate` is returned unchanged when it is free. Otherwise
/// `"{base_name} (1){ext}"`, `"{base_name} (2){ext}"`, ... are probed in
/// order, where `ext` is the extension of `candidate`. The file itself is
/// not created.
pub fn resolve_unique_path(directory: &Path, base_name: &str, candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }

    let suffix = candidate
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    (1u64..)
        .map(|i| directory.join(format!("{base_name} ({i}){suffix}")))
        .find(|path| !path.exists())
        .unwrap_or_else(|| candidate.to_path_buf())
}

/// Ensure a directory exists; an existing directory is not an error.
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// Removes the staging file on drop unless the write was committed.
struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".part");
    path.with_file_name(name)
}

/// Write bytes atomically (write to a staging file, then rename).
///
/// The staging file is removed if the write fails or the future is
/// dropped before completion, so `path` either holds all of `bytes` or
/// does not exist.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    write_atomic_from(path, bytes).await.map(|_| ())
}

/// Like [`write_atomic`], but copies everything `reader` yields until end
/// of input. Returns the number of bytes written.
pub async fn write_atomic_from<R>(path: &Path, mut reader: R) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let tmp = staging_path(path);
    let mut guard = StagingGuard {
        path: tmp.clone(),
        armed: true,
    };

    let mut file = tokio::fs::File::create(&tmp).await?;
    let written = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    guard.armed = false;
    Ok(written)
}
