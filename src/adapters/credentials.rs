//! File-backed credential store.
//!
//! Stores `{"ssid": "...", "password": "..."}` at a fixed path. Writes go
//! to `<path>.tmp`, are synced, then renamed over the target, so a crash
//! mid-write leaves either the old record or none.
//!
//! SPIFFS will not rename onto an existing file. When the rename fails
//! and the target is present, the target is removed and the rename
//! retried; a crash between the two leaves no record and the station
//! falls back to setup mode.
//!
//! On the device the path lives on the SPIFFS partition mounted at
//! `/storage` by the binary; on the host it is any writable file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::CredentialStore;
use crate::credentials::Credentials;
use crate::error::StoreError;

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credentials> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Store: read {} failed: {}", self.path.display(), e);
                return None;
            }
        };

        let credentials: Credentials = match serde_json::from_slice(&raw) {
            Ok(c) => c,
            Err(e) => {
                warn!("Store: malformed credential file: {}", e);
                return None;
            }
        };
        if let Err(e) = credentials.validate() {
            warn!("Store: stored credentials rejected: {}", e);
            return None;
        }
        Some(credentials)
    }

    fn save(&mut self, credentials: &Credentials) -> Result<(), StoreError> {
        credentials
            .validate()
            .map_err(|_| StoreError::InvalidCredentials)?;
        let encoded = serde_json::to_vec(credentials).map_err(|_| StoreError::Encode)?;

        let tmp = self.temp_path();
        let written = fs::File::create(&tmp).and_then(|mut f| {
            f.write_all(&encoded)?;
            f.sync_all()
        });
        let replaced = written.and_then(|()| replace(&tmp, &self.path, |from, to| fs::rename(from, to)));
        if let Err(e) = replaced {
            warn!("Store: write {} failed: {}", self.path.display(), e);
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::Io);
        }

        info!("Store: saved credentials for '{}'", credentials.name);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Store: credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Store: remove {} failed: {}", self.path.display(), e);
                Err(StoreError::Io)
            }
        }
    }
}

/// Move `tmp` onto `target`, removing an existing target first if the
/// filesystem refuses to overwrite it.
fn replace<F>(tmp: &Path, target: &Path, rename: F) -> std::io::Result<()>
where
    F: Fn(&Path, &Path) -> std::io::Result<()>,
{
    match rename(tmp, target) {
        Ok(()) => Ok(()),
        Err(e) if target.exists() => {
            warn!("Store: rename over {} refused ({}), replacing", target.display(), e);
            fs::remove_file(target)?;
            rename(tmp, target)
        }
        Err(e) => Err(e),
    }
}
