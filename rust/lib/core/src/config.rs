use std::path::{Path, PathBuf};

const REDB_FILE: &str = "data.redb";
const SQLITE_FILE: &str = "data.sqlite";

/// Storage location and listen address handed from the binary to the stores.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding `data.sqlite` and `data.redb`.
    pub data_dir: Option<PathBuf>,

    /// Listen address for the HTTP server.
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            listen: "0.0.0.0:8000".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Config rooted at `data_dir`, serving on `listen`.
    pub fn new(data_dir: impl AsRef<Path>, listen: impl Into<String>) -> Self {
        Self {
            data_dir: Some(data_dir.as_ref().to_path_buf()),
            listen: listen.into(),
        }
    }

    pub fn resolve_db_path(&self) -> PathBuf {
        self.in_data_dir(REDB_FILE)
    }

    pub fn resolve_sqlite_path(&self) -> PathBuf {
        self.in_data_dir(SQLITE_FILE)
    }

    /// `name` under the data dir, or relative to the working dir without one.
    fn in_data_dir(&self, name: &str) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}
