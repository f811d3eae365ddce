use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const DATA_DIR_ENV: &str = "SEEKART_DATA_DIR";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let root = resolve_root(env::var_os(DATA_DIR_ENV).map(PathBuf::from), data_dir());
    if let Err(err) = fs::create_dir_all(&root) {
        tracing::error!(root = %root.display(), "failed to create data root: {err}");
    }
    root
});

/// An explicit override is used as-is; otherwise `seekart/` under the
/// platform data dir, or under the working directory when there is none.
fn resolve_root(explicit: Option<PathBuf>, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit.filter(|dir| !dir.as_os_str().is_empty()) {
        return dir;
    }
    platform
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
        .join("seekart")
}

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn database_path() -> PathBuf {
    data_root().join("seekart.sqlite")
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::error!(parent = %parent.display(), "failed to create parent: {err}");
        }
    }
}
