use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

/// Fresh scratch directory for a token store.
#[allow(dead_code)]
pub fn scratch_dir(name: &str) -> PathBuf {
    let seq = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "eko-kampus-it-{}-{}-{}",
        std::process::id(),
        name,
        seq
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
