//! Scoped environment overrides for config tests.

use std::sync::{Mutex, MutexGuard, OnceLock};

fn process_env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    // A panicking test leaves the lock poisoned; the guarded data is `()`.
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[allow(unused_unsafe)]
fn write_var(key: &str, value: Option<&str>) {
    // SAFETY: every writer holds the process env lock.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

/// Exclusive view of the process environment for one test.
///
/// Holds the env lock for its whole lifetime and puts every touched
/// variable back, in reverse order, when dropped.
pub(crate) struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    pub(crate) fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: process_env_lock(),
        }
    }

    pub(crate) fn set(mut self, key: &str, value: &str) -> Self {
        self.save(key);
        write_var(key, Some(value));
        self
    }

    pub(crate) fn unset(mut self, key: &str) -> Self {
        self.save(key);
        write_var(key, None);
        self
    }

    fn save(&mut self, key: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), std::env::var(key).ok()));
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            write_var(&key, previous.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScopedEnv;

    #[test]
    fn scoped_env_restores_values_on_drop() {
        let key = "PASTECTL_SCOPED_ENV_RESTORE";
        let missing = "PASTECTL_SCOPED_ENV_MISSING";
        {
            let _env = ScopedEnv::new().set(key, "before");
        }
        assert!(std::env::var(key).is_err());

        {
            let _env = ScopedEnv::new()
                .set(key, "first")
                .set(key, "second")
                .unset(missing);
            assert_eq!(std::env::var(key).ok().as_deref(), Some("second"));
            assert!(std::env::var(missing).is_err());
        }
        assert!(std::env::var(key).is_err());
        assert!(std::env::var(missing).is_err());
    }
}
