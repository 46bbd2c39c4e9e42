//! Throwaway SQLite databases.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::adapter::outbound::sqlite::{create_pool, run_migrations, DbPool};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Migrated database file under the system temp dir, removed on drop.
pub struct TempDb {
    path: PathBuf,
    pool: DbPool,
}

impl TempDb {
    /// Create and migrate a fresh database. Panics on failure.
    pub fn create(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!(
            "betsettle-{name}-{}-{nanos}-{seq}.db",
            std::process::id()
        ));

        let pool = create_pool(&path.to_string_lossy()).expect("create sqlite pool");
        run_migrations(&pool).expect("run migrations");
        Self { path, pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        for suffix in ["-wal", "-shm"] {
            let mut side = self.path.clone().into_os_string();
            side.push(suffix);
            let _ = std::fs::remove_file(side);
        }
    }
}
