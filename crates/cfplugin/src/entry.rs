//! Plugin-process entry point.
//!
//! [`start`] is the whole of a plugin's `main`: it reads the host's port from
//! the command line, pings the host, answers a metadata request or runs the
//! plugin, and reports the outcome as a process exit status.

use std::any::Any;
use std::cell::Cell;
use std::env;
use std::fmt::Display;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::sync::Once;

use tracing::debug;

use crate::connection::RpcConnection;
use crate::error::StartError;
use crate::handshake::{self, HandshakePolicy};
use crate::plugin::Plugin;

const ENTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::entry");

static QUIET_HOOK: Once = Once::new();

thread_local! {
    static GUARDED: Cell<bool> = const { Cell::new(false) };
}

/// First plugin argument the host passes when it only wants the metadata.
pub const SEND_METADATA_ARG: &str = "SendMetadata";

/// Outcome of a plugin process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginExit {
    /// Exit status 0.
    Success,
    /// Exit status 1.
    Failure,
}

impl PluginExit {
    /// Returns the numeric exit status.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

impl From<PluginExit> for ExitCode {
    fn from(exit: PluginExit) -> Self {
        match exit {
            PluginExit::Success => Self::SUCCESS,
            PluginExit::Failure => Self::FAILURE,
        }
    }
}

/// Runs `plugin` against the host named on this process's command line.
///
/// Expects the argument vector `<program> <port> [plugin args...]` and writes
/// diagnostics to the process's standard streams.
pub fn start<P: Plugin + ?Sized>(plugin: &P) -> PluginExit {
    let args: Vec<String> = env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    start_with(
        plugin,
        &args,
        &mut io::stdout(),
        &mut io::stderr(),
        &HandshakePolicy::default(),
    )
}

/// Runs the entry sequence with explicit arguments and output sinks.
///
/// `args` excludes the program name: the first element is the host's port.
/// In order:
///
/// 1. a missing or malformed port fails;
/// 2. the host is pinged under `policy`;
/// 3. `SendMetadata` pushes [`Plugin::metadata`] and stops;
/// 4. the host is asked whether it satisfies the plugin's minimum CLI
///    version, stopping successfully with a notice on `out` if not;
/// 5. [`Plugin::run`] is called with a panic guard.
///
/// Every failure is written to `err` as a single message.
pub fn start_with<P: Plugin + ?Sized>(
    plugin: &P,
    args: &[String],
    out: &mut dyn Write,
    err: &mut dyn Write,
    policy: &HandshakePolicy,
) -> PluginExit {
    match drive(plugin, args, out, err, policy) {
        Ok(exit) => exit,
        Err(error) => {
            say(err, error);
            PluginExit::Failure
        }
    }
}

fn drive<P: Plugin + ?Sized>(
    plugin: &P,
    args: &[String],
    out: &mut dyn Write,
    err: &mut dyn Write,
    policy: &HandshakePolicy,
) -> Result<PluginExit, StartError> {
    let (port, plugin_args) = split_port(args)?;
    handshake::ping(port, policy)?;
    let connection = RpcConnection::new(port);

    if plugin_args.first().map(String::as_str) == Some(SEND_METADATA_ARG) {
        debug!(target: ENTRY_TARGET, port, "pushing plugin metadata");
        return if connection.send_metadata(&plugin.metadata())? {
            Ok(PluginExit::Success)
        } else {
            Err(StartError::MetadataRejected)
        };
    }

    let required = plugin.metadata().min_cli_version.to_string();
    if !connection.is_min_cli_version(&required)? {
        say(
            out,
            format_args!("Minimum CLI version {required} is required to run this plugin command"),
        );
        return Ok(PluginExit::Success);
    }

    Ok(run_guarded(plugin, &connection, plugin_args, err))
}

fn split_port(args: &[String]) -> Result<(u16, &[String]), StartError> {
    let (raw, rest) = args.split_first().ok_or(StartError::MissingPort)?;
    let port = raw.parse().map_err(|_| StartError::InvalidPort {
        value: raw.clone(),
    })?;
    Ok((port, rest))
}

fn run_guarded<P: Plugin + ?Sized>(
    plugin: &P,
    connection: &RpcConnection,
    args: &[String],
    err: &mut dyn Write,
) -> PluginExit {
    install_quiet_hook();
    GUARDED.with(|guarded| guarded.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| plugin.run(connection, args)));
    GUARDED.with(|guarded| guarded.set(false));

    match outcome {
        Ok(Ok(())) => PluginExit::Success,
        Ok(Err(error)) => {
            say(err, format_args!("{error:#}"));
            PluginExit::Failure
        }
        Err(payload) => {
            say(
                err,
                format_args!("plugin panicked: {}", panic_message(payload.as_ref())),
            );
            PluginExit::Failure
        }
    }
}

/// Wraps the process panic hook once so that panics on a thread inside
/// [`run_guarded`] stay silent; every other thread reports as before.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !GUARDED.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_owned();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    String::from("non-string panic payload")
}

fn say(sink: &mut dyn Write, message: impl Display) {
    if let Err(error) = writeln!(sink, "{message}") {
        debug!(target: ENTRY_TARGET, %error, "could not write plugin output");
    }
}
