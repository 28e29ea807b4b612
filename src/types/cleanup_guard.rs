use std::{fs, path::PathBuf};

/// Removes a scratch file when dropped, unless it was [`disarm`](CleanupGuard::disarm)ed.
pub struct CleanupGuard {
    path: PathBuf,
    armed: bool,
}

impl CleanupGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// The file was moved into place; nothing left to clean up.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_file_unless_disarmed() {
        let dir = tempfile::tempdir().unwrap();
        let dropped = dir.path().join("a.tmp");
        let kept = dir.path().join("b.tmp");
        fs::write(&dropped, "x").unwrap();
        fs::write(&kept, "x").unwrap();

        drop(CleanupGuard::new(dropped.clone()));
        CleanupGuard::new(kept.clone()).disarm();

        assert!(!dropped.exists());
        assert!(kept.exists());
    }
}
