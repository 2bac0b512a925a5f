//! Shared test fixtures. `mudcore_set_data_dir` may only be called once per
//! process, so every test module points at the same temp directory and
//! instead picks a fresh random domain name per test to avoid collisions.

use std::sync::Once;

static INIT: Once = Once::new();

pub(crate) fn ensure_test_data_dir() {
    INIT.call_once(|| {
        let dir = std::env::temp_dir().join(format!("mudcore_tests_{}", rand::random::<u128>()));
        std::fs::create_dir_all(&dir).unwrap();
        crate::common::mudcore_set_data_dir(&dir);
    });
}

pub(crate) fn unique_domain(tag: &str) -> String {
    ensure_test_data_dir();
    format!("{tag}_{}", rand::random::<u64>())
}
