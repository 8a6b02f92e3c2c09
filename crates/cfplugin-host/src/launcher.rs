//! Host-side plugin process supervisor.
//!
//! [`PluginLauncher`] starts the RPC listener, launches the plugin with the
//! listener's port as its first argument, waits for it to exit and then
//! stops the listener. One launch is one plugin session.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use cfplugin::{PluginMetadata, SEND_METADATA_ARG};
use cfplugin_config::HostSettings;
use thiserror::Error;
use tracing::{debug, info};

use crate::service::RpcService;
use crate::transport::{ListenerError, RpcListener};

const LAUNCHER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launcher");

/// How a plugin process ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOutcome {
    /// Exit status; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output; empty unless capture was requested.
    pub stdout: String,
    /// Captured standard error; empty unless capture was requested.
    pub stderr: String,
}

impl PluginOutcome {
    /// Reports whether the plugin exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Errors raised while supervising a plugin process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The plugin executable does not exist.
    #[error("plugin executable {} does not exist", path.display())]
    MissingExecutable {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The plugin process could not be started.
    #[error("failed to start plugin {}: {source}", path.display())]
    Spawn {
        /// Executable that was started.
        path: PathBuf,
        /// Spawn error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the plugin process failed.
    #[error("failed waiting for plugin {}: {source}", path.display())]
    Wait {
        /// Executable that was started.
        path: PathBuf,
        /// Wait error.
        #[source]
        source: io::Error,
    },

    /// The RPC listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The plugin exited non-zero while sending its metadata.
    #[error("plugin {} failed to send its metadata (exit code {code:?}): {stderr}", path.display())]
    MetadataExit {
        /// Executable that was started.
        path: PathBuf,
        /// Exit code of the plugin.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The plugin exited successfully without registering metadata.
    #[error("plugin {} did not register any metadata", path.display())]
    NoMetadata {
        /// Executable that was started.
        path: PathBuf,
    },
}

/// Launches plugin executables against an [`RpcService`].
pub struct PluginLauncher {
    service: Arc<RpcService>,
    host: String,
    port: u16,
    capture_output: bool,
}

impl PluginLauncher {
    /// Creates a launcher binding the listener as configured in `settings`.
    #[must_use]
    pub fn new(service: Arc<RpcService>, settings: &HostSettings) -> Self {
        Self {
            service,
            host: settings.rpc_host().to_owned(),
            port: settings.rpc_port(),
            capture_output: false,
        }
    }

    /// Captures the plugin's standard streams instead of inheriting them.
    #[must_use]
    pub const fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Returns the service plugins are connected to.
    #[must_use]
    pub const fn service(&self) -> &Arc<RpcService> {
        &self.service
    }

    /// Runs `executable` with `args` and waits for it to exit.
    ///
    /// The listener is stopped once the plugin exits, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] when the executable is missing, the
    /// listener cannot start, or the process cannot be started or awaited.
    /// A plugin exiting non-zero is not an error.
    pub fn run(&self, executable: &Path, args: &[String]) -> Result<PluginOutcome, LaunchError> {
        self.launch(executable, args, self.capture_output)
    }

    /// Asks `executable` for its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::MetadataExit`] when the plugin exits non-zero,
    /// [`LaunchError::NoMetadata`] when it exits without registering, and
    /// any error [`run`](Self::run) can return.
    pub fn fetch_metadata(&self, executable: &Path) -> Result<PluginMetadata, LaunchError> {
        let outcome = self.launch(executable, &[String::from(SEND_METADATA_ARG)], true)?;
        if !outcome.success() {
            return Err(LaunchError::MetadataExit {
                path: executable.to_path_buf(),
                code: outcome.exit_code,
                stderr: outcome.stderr,
            });
        }
        self.service
            .registered_metadata()
            .ok_or_else(|| LaunchError::NoMetadata {
                path: executable.to_path_buf(),
            })
    }

    fn launch(
        &self,
        executable: &Path,
        args: &[String],
        capture: bool,
    ) -> Result<PluginOutcome, LaunchError> {
        if !executable.is_file() {
            return Err(LaunchError::MissingExecutable {
                path: executable.to_path_buf(),
            });
        }

        let listener = RpcListener::bind(&self.host, self.port)?;
        let port = listener.local_addr().port();
        self.service.begin_session();
        let handle = listener.serve(Arc::clone(&self.service))?;

        info!(
            target: LAUNCHER_TARGET,
            executable = %executable.display(),
            port,
            "launching plugin"
        );
        let result = spawn_and_wait(executable, port, args, capture);

        handle.shutdown();
        let joined = handle.join();
        let outcome = result?;
        joined?;

        debug!(
            target: LAUNCHER_TARGET,
            executable = %executable.display(),
            exit_code = ?outcome.exit_code,
            "plugin exited"
        );
        Ok(outcome)
    }
}

fn spawn_and_wait(
    executable: &Path,
    port: u16,
    args: &[String],
    capture: bool,
) -> Result<PluginOutcome, LaunchError> {
    let mut command = Command::new(executable);
    command.arg(port.to_string()).args(args).stdin(Stdio::inherit());

    if capture {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        let Output {
            status,
            stdout,
            stderr,
        } = command
            .spawn()
            .map_err(|source| spawn_error(executable, source))?
            .wait_with_output()
            .map_err(|source| wait_error(executable, source))?;
        return Ok(PluginOutcome {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        });
    }

    let status = command
        .spawn()
        .map_err(|source| spawn_error(executable, source))?
        .wait()
        .map_err(|source| wait_error(executable, source))?;
    Ok(PluginOutcome {
        exit_code: status.code(),
        ..PluginOutcome::default()
    })
}

fn spawn_error(executable: &Path, source: io::Error) -> LaunchError {
    LaunchError::Spawn {
        path: executable.to_path_buf(),
        source,
    }
}

fn wait_error(executable: &Path, source: io::Error) -> LaunchError {
    LaunchError::Wait {
        path: executable.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{self, FakeActor, FakeConfig, ScriptedParser};

    fn launcher() -> PluginLauncher {
        let (collaborators, _) = fakes::collaborators(
            FakeConfig::targeted(),
            FakeActor::sample(),
            ScriptedParser::default(),
        );
        PluginLauncher::new(
            Arc::new(RpcService::new(collaborators, "7.2.0")),
            &HostSettings::default(),
        )
    }

    #[test]
    fn missing_executable_is_reported_before_binding() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("no-such-plugin");
        let error = launcher()
            .run(&path, &[])
            .expect_err("executable is missing");
        assert!(matches!(error, LaunchError::MissingExecutable { .. }));
    }

    #[test]
    fn outcome_success_requires_zero_exit() {
        assert!(PluginOutcome {
            exit_code: Some(0),
            ..PluginOutcome::default()
        }
        .success());
        assert!(!PluginOutcome::default().success());
        assert!(!PluginOutcome {
            exit_code: Some(1),
            ..PluginOutcome::default()
        }
        .success());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_outcome_not_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("failing-plugin");
        std::fs::write(&path, "#!/bin/sh\necho \"port $1\" >&2\nexit 3\n").expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make script executable");

        let outcome = launcher()
            .capture_output(true)
            .run(&path, &[String::from("hello")])
            .expect("plugin ran");

        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.stderr.starts_with("port "));
    }

    #[cfg(unix)]
    #[test]
    fn plugin_that_registers_nothing_has_no_metadata() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("silent-plugin");
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make script executable");

        let error = launcher()
            .fetch_metadata(&path)
            .expect_err("nothing registered");
        assert!(matches!(error, LaunchError::NoMetadata { .. }));
    }
}
