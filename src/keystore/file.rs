//! Keystore file I/O.
//!
//! Writes go to a sibling temporary file which is flushed, synced and then
//! renamed over the target, so a crash mid-write leaves either the old file
//! or the new one, never a truncated keystore.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{WalletError, WalletResult};

/// Default keystore filename
pub const DEFAULT_KEYSTORE_FILE: &str = "my-wallet.json";

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_KEYSTORE_FILE.to_string());
    path.with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()))
}

/// Atomically replace `path` with `contents`
pub fn write_atomic(path: &Path, contents: &str) -> WalletResult<()> {
    if path.as_os_str().is_empty() {
        return Err(WalletError::configuration("Keystore path is empty"));
    }

    let tmp = temp_path_for(path);
    let result = (|| -> WalletResult<()> {
        let mut file = create_private(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result?;

    sync_parent_dir(path);
    Ok(())
}

/// Persist the rename itself
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}

#[cfg(unix)]
fn create_private(path: &Path) -> WalletResult<File> {
    use std::os::unix::fs::OpenOptionsExt;
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> WalletResult<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

/// Read a keystore file as UTF-8 text
pub fn read_keystore(path: &Path) -> WalletResult<String> {
    fs::read_to_string(path).map_err(|e| {
        WalletError::from(e).with_details(format!("path {}", path.display()))
    })
}
