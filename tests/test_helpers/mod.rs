//! Scoped environment overrides for configuration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use agent_supervisor::agent_manager::config::CONFIG_ENV_PREFIX;

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Restores the process environment when dropped.
///
/// Holding the guard also holds a process-wide lock, so concurrent tests
/// never observe each other's overrides.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Replaces every `AGENT_MANAGER_*` variable with `overrides`.
    ///
    /// Keys are given without the prefix, e.g. `("MAX_RETRIES", "4")`.
    pub fn manager_overrides(overrides: &[(&str, &str)]) -> Self {
        let lock = env_lock();
        let mut changes: Vec<(OsString, Option<OsString>)> = env::vars_os()
            .filter(|(key, _)| {
                key.to_str()
                    .is_some_and(|name| name.starts_with(CONFIG_ENV_PREFIX))
            })
            .map(|(key, _)| (key, None))
            .collect();
        changes.extend(overrides.iter().map(|(suffix, value)| {
            (
                OsString::from(format!("{CONFIG_ENV_PREFIX}{suffix}")),
                Some(OsString::from(value)),
            )
        }));

        let mut previous = Vec::with_capacity(changes.len());
        for (key, value) in changes {
            previous.push((key.clone(), env::var_os(&key)));
            apply(&key, value.as_ref());
        }

        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..).rev() {
            apply(&key, value.as_ref());
        }
    }
}

fn apply(key: &OsString, value: Option<&OsString>) {
    unsafe {
        // SAFETY: the global mutex serializes environment mutations in tests.
        match value {
            Some(new_value) => env::set_var(key, new_value),
            None => env::remove_var(key),
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
