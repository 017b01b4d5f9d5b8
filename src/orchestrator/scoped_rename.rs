//! `ScopedRename` — a `Drop`-based guard realizing the "metric.mesh dance"
//! of spec.md §4.8/§9: before the orchestrator writes one of its reserved
//! scratch file names, any file already sitting at that path is moved aside;
//! the guard moves it back on every exit path, including an early return via
//! `?`.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::io::io_err;

pub struct ScopedRename {
    original: PathBuf,
    backup: PathBuf,
    active: bool,
}

impl ScopedRename {
    /// If `path` exists, renames it to `path` with a `.bak` extension
    /// appended and remembers to move it back on drop. A no-op guard is
    /// returned if nothing is there to protect.
    pub fn guard(path: &Path) -> Result<Self, Error> {
        let active = path.exists();
        let mut backup_name = path.as_os_str().to_owned();
        backup_name.push(".bak");
        let backup = PathBuf::from(backup_name);

        if active {
            std::fs::rename(path, &backup).map_err(|e| io_err("orchestrator", &path.display().to_string(), e))?;
        }

        Ok(Self {
            original: path.to_path_buf(),
            backup,
            active,
        })
    }
}

impl Drop for ScopedRename {
    fn drop(&mut self) {
        if self.active {
            let _ = std::fs::rename(&self.backup, &self.original);
        }
    }
}
