//! Plugin binary exercised by the end-to-end tests.
//!
//! Each command touches a different part of the plugin contract: plain
//! output, a capability call back into the CLI, an error, and a panic.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, bail};
use cfplugin::{CliConnection, Command, Plugin, PluginMetadata, Usage, VersionType};

struct CoolTest;

impl Plugin for CoolTest {
    fn run(&self, connection: &dyn CliConnection, args: &[String]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        match args.first().map(String::as_str) {
            Some("CoolTest") => writeln!(out, "I am a test plugin")?,
            Some("ApiEndpoint") => writeln!(out, "{}", connection.api_endpoint()?)?,
            Some("CurrentOrg") => {
                let org = connection
                    .get_current_org()
                    .context("cannot read the targeted organization")?;
                writeln!(out, "{}", org.name)?;
            }
            Some("freak-out") => panic!("freak out"),
            Some(other) => bail!("unknown command '{other}'"),
            None => bail!("no command given"),
        }
        Ok(())
    }

    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: String::from("CoolTest"),
            version: VersionType::new(1, 0, 0),
            min_cli_version: VersionType::new(6, 0, 0),
            commands: vec![
                Command::new("CoolTest", "I am a test plugin")
                    .with_alias("ct")
                    .with_usage(Usage::new("cf CoolTest")),
                Command::new("ApiEndpoint", "Print the targeted API endpoint"),
                Command::new("CurrentOrg", "Print the targeted organization"),
                Command::new("freak-out", "Panic on purpose"),
            ],
            ..PluginMetadata::default()
        }
    }
}

fn main() -> ExitCode {
    cfplugin::start(&CoolTest).into()
}
