use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::error::{DataError, Result};

pub const VISITORS_FILE: &str = "visitors.txt";

/// Site visitor total, stored as a decimal number in `<data_dir>/visitors.txt`.
///
/// Read on first use. A visit holds the lock across the rewrite, so concurrent
/// visits are never lost.
pub struct VisitorCounter {
    path: Option<PathBuf>,
    total: OnceCell<Mutex<u64>>,
}

impl VisitorCounter {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: Some(data_dir.join(VISITORS_FILE)),
            total: OnceCell::new(),
        })
    }

    /// A counter that is never written to disk.
    pub fn in_memory(total: u64) -> Self {
        Self {
            path: None,
            total: OnceCell::with_value(Mutex::new(total)),
        }
    }

    pub fn total(&self) -> Result<u64> {
        Ok(*self.counter()?.lock())
    }

    /// Count one visit and return the new total.
    pub fn visit(&self) -> Result<u64> {
        let mut total = self.counter()?.lock();
        let next = *total + 1;
        if let Some(path) = &self.path {
            write_total(path, next)?;
        }
        *total = next;
        debug!(total = next, "Visit counted");
        Ok(next)
    }

    fn counter(&self) -> Result<&Mutex<u64>> {
        self.total.get_or_try_init(|| {
            let total = match &self.path {
                Some(path) if path.exists() => read_total(path)?,
                _ => 0,
            };
            info!(total, "Visitor counter loaded");
            Ok(Mutex::new(total))
        })
    }
}

fn read_total(path: &Path) -> Result<u64> {
    let raw = std::fs::read_to_string(path)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| DataError::InvalidVisitorTotal(path.display().to_string()))
}

fn write_total(path: &Path, total: u64) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    writeln!(tmp, "{total}")?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
