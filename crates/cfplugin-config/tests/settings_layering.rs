//! Layering behaviour for host settings loaded through `ortho_config`.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

use cfplugin_config::{HostSettings, LogFormat};
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe in edition 2024; the mutex serialises it.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

#[test]
fn environment_overrides_port() {
    let _env = EnvOverride::set_var("CFPLUGIN_RPC_PORT", OsStr::new("45678"));
    let settings = HostSettings::load_from_iter(vec![OsString::from("cfplugin-host")])
        .expect("settings load");
    assert_eq!(settings.rpc_port(), 45_678);
    assert_eq!(settings.rpc_host(), "127.0.0.1");
}

#[test]
fn cli_flag_selects_log_format() {
    let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
    let settings = HostSettings::load_from_iter(vec![
        OsString::from("cfplugin-host"),
        OsString::from("--log-format"),
        OsString::from("compact"),
    ])
    .expect("settings load");
    assert_eq!(settings.log_format(), LogFormat::Compact);
}
