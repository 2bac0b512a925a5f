//!
//! Process-wide constants and the data-directory singleton.
//!

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

/////////////////////////////////////////////////////////////////////////////
/////////////////////////////////////////////////////////////////////////////

/// Largest entity id a registry will ever hand out.
pub const ID_MAX: u16 = 32767;

const DATA_DIR_VAR: &str = "MUDCORE_DATA_DIR";

static MUDCORE_DATA_DIR: Lazy<Mutex<PathBuf>> = Lazy::new(|| Mutex::new(gen_data_dir()));

static DATA_DIR_LOCKED: AtomicBool = AtomicBool::new(false);

#[inline(always)]
fn gen_data_dir() -> PathBuf {
    let d = env::var(DATA_DIR_VAR).unwrap_or_else(|_| "data".to_owned());
    PathBuf::from(d)
}

/// `${MUDCORE_DATA_DIR}`, or `data/` if unset.
#[inline(always)]
pub fn mudcore_get_data_dir() -> PathBuf {
    MUDCORE_DATA_DIR.lock().clone()
}

/// Set `${MUDCORE_DATA_DIR}` manually; may only be called once, before any
/// domain is touched. Calling it twice is a programming error, not a
/// recoverable one, so it aborts rather than returning `Result`.
pub fn mudcore_set_data_dir(dir: impl AsRef<Path>) {
    assert!(
        !DATA_DIR_LOCKED.swap(true, Ordering::Relaxed),
        "mudcore data dir has already been initialized"
    );
    *MUDCORE_DATA_DIR.lock() = dir.as_ref().to_path_buf();
}

/// `${MUDCORE_DATA_DIR}/<domain>`
#[inline(always)]
pub(crate) fn domain_dir(domain: &str) -> PathBuf {
    let mut d = mudcore_get_data_dir();
    d.push(domain);
    d
}

/// `${MUDCORE_DATA_DIR}/<domain>/<id>`
#[inline(always)]
pub(crate) fn record_path(domain: &str, id: u16) -> PathBuf {
    let mut p = domain_dir(domain);
    p.push(id.to_string());
    p
}

/// `${MUDCORE_DATA_DIR}/<domain>/<id>.tmp`
#[inline(always)]
pub(crate) fn tmp_path(domain: &str, id: u16) -> PathBuf {
    let mut p = domain_dir(domain);
    p.push(format!("{id}.tmp"));
    p
}

/// Creates `${MUDCORE_DATA_DIR}/<domain>` if it does not already exist.
pub(crate) fn ensure_domain_dir(domain: &str) -> Result<()> {
    let d = domain_dir(domain);
    fs::create_dir_all(&d).map_err(Error::from)
}
