//! Persisted per-broker session cookies.
//!
//! Each broker keeps a flat JSON object of cookie name to value in
//! `cookies-<url-safe>.json` inside the state directory.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::SESSION_TARGET;

/// Cookie name to value, kept sorted by name.
pub type Cookies = BTreeMap<String, String>;

/// Loads the cookies stored at `path`.
///
/// A missing file yields no cookies. A file that cannot be read or parsed is
/// removed and treated as empty so a stale session never blocks the client.
pub(crate) fn load_cookies(path: &Path) -> Cookies {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Cookies::new(),
        Err(error) => {
            discard_corrupt(path, &error.to_string());
            return Cookies::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(cookies) => cookies,
        Err(error) => {
            discard_corrupt(path, &error.to_string());
            Cookies::new()
        }
    }
}

fn discard_corrupt(path: &Path, reason: &str) {
    warn!(
        target: SESSION_TARGET,
        file = %path.display(),
        reason,
        "discarding unreadable cookies file"
    );
    if let Err(error) = fs::remove_file(path)
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: SESSION_TARGET,
            file = %path.display(),
            %error,
            "failed to remove unreadable cookies file"
        );
    }
}

/// Removes the cookies file at `path`; a missing file is not an error.
pub(crate) fn remove_cookies(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(target: SESSION_TARGET, file = %path.display(), "cookies removed");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

/// Writes `contents` to `path` through a synced temporary file that is then
/// renamed into place, owner-readable only.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "cookies path did not have a parent directory",
        )
    })?;

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("cookies"),
    );
    #[cfg(unix)]
    {
        builder.permissions(fs::Permissions::from_mode(0o600));
    }

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
