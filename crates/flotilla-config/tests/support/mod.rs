//! Process-environment and file fixtures shared by the configuration tests.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use tempfile::TempDir;

static ENVIRONMENT: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises environment mutation and undoes it on drop.
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    pub fn acquire() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENVIRONMENT.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.saved.push((key.to_owned(), std::env::var_os(key)));
        // SAFETY: every writer holds the `ENVIRONMENT` lock.
        unsafe { std::env::set_var(key, value) };
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            // SAFETY: the `ENVIRONMENT` lock is still held.
            match previous {
                Some(value) => unsafe { std::env::set_var(&key, value) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

/// A TOML file in a private temporary directory.
pub struct ConfigFile {
    _dir: TempDir,
    path: PathBuf,
}

impl ConfigFile {
    pub fn with_contents(contents: &str) -> Self {
        let dir = TempDir::new().expect("temporary directory");
        let path = dir.path().join("flotilla.toml");
        fs::write(&path, contents).expect("write configuration file");
        Self { _dir: dir, path }
    }

    /// Flag pair pointing the loader at this file.
    pub fn flag(&self) -> [OsString; 2] {
        [
            OsString::from("--config-path"),
            self.path.clone().into_os_string(),
        ]
    }
}
