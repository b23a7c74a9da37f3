//! Single instance lock using Unix socket.
//!
//! Prevents two bridges from polling and writing the same heat pump. The lock
//! is keyed by the heat pump's hostname, so bridges for different heat pumps
//! can run side by side. Uses a Unix socket which is automatically cleaned up
//! by the OS when the process dies, avoiding stale lock files.

use crate::device::slugify;
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for instance lock operations.
#[derive(Debug, Error)]
pub enum InstanceLockError {
    /// Another bridge for the same heat pump is already running.
    #[error("another bridge for {0} is already running")]
    AlreadyRunning(String),

    /// I/O error during lock acquisition.
    #[error("failed to acquire instance lock: {0}")]
    Io(#[from] io::Error),
}

/// Single instance lock using a Unix socket.
///
/// The lock is held as long as this struct exists. When dropped, the socket
/// file is removed.
pub struct InstanceLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock for `hostname` in the runtime directory.
    pub fn acquire(hostname: &str) -> Result<Self, InstanceLockError> {
        Self::acquire_in(&runtime_dir(), hostname)
    }

    /// Acquire the lock for `hostname` with the socket placed in `dir`.
    pub fn acquire_in(dir: &Path, hostname: &str) -> Result<Self, InstanceLockError> {
        let path = socket_path(dir, hostname);

        // A socket nobody listens on was left by a killed process
        if path.exists() {
            match UnixStream::connect(&path) {
                Ok(_) => return Err(InstanceLockError::AlreadyRunning(hostname.to_string())),
                Err(_) => {
                    let _ = std::fs::remove_file(&path);
                }
            }
        }

        match UnixListener::bind(&path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path,
            }),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                // Race condition: another instance bound between our check and bind
                Err(InstanceLockError::AlreadyRunning(hostname.to_string()))
            }
            Err(e) => Err(InstanceLockError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// `XDG_RUNTIME_DIR` if set (auto-cleaned on logout), else `/tmp`.
pub fn runtime_dir() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

pub fn socket_path(dir: &Path, hostname: &str) -> PathBuf {
    dir.join(format!("idm-heatpump-{}.sock", slugify(hostname)))
}
