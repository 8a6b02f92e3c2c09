//! End-to-end tests launching the test plugin through the host supervisor.

use std::path::Path;
use std::sync::Arc;

use cfplugin_config::HostSettings;
use cfplugin_host::fakes::{self, FakeActor, FakeConfig, RecordingOutput, ScriptedParser};
use cfplugin_host::{PluginLauncher, PluginOutcome, RpcService};
use rstest::rstest;

fn plugin() -> &'static Path {
    Path::new(env!("CARGO_BIN_EXE_cfplugin-test-plugin"))
}

fn launcher(config: FakeConfig, cli_version: &str) -> (PluginLauncher, RecordingOutput) {
    let (collaborators, output) =
        fakes::collaborators(config, FakeActor::sample(), ScriptedParser::default());
    let service = Arc::new(RpcService::new(collaborators, cli_version));
    let launcher = PluginLauncher::new(service, &HostSettings::default()).capture_output(true);
    (launcher, output)
}

fn run(config: FakeConfig, cli_version: &str, command: &str) -> PluginOutcome {
    let (launcher, _) = launcher(config, cli_version);
    launcher
        .run(plugin(), &[String::from(command)])
        .expect("plugin launched")
}

#[rstest]
#[case::plain_output("CoolTest", "I am a test plugin\n")]
#[case::capability_call("ApiEndpoint", "https://api.example.com\n")]
#[case::targeted_org("CurrentOrg", "my-org\n")]
fn commands_print_their_answers(#[case] command: &str, #[case] expected: &str) {
    let outcome = run(FakeConfig::targeted(), "7.2.0", command);
    assert_eq!(outcome.exit_code, Some(0), "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout, expected);
}

#[test]
fn host_faults_surface_as_plugin_errors() {
    let outcome = run(FakeConfig::untargeted(), "7.2.0", "CurrentOrg");
    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(
        outcome.stderr,
        "cannot read the targeted organization: no organization targeted\n"
    );
}

#[test]
fn panicking_plugin_exits_with_failure() {
    let outcome = run(FakeConfig::targeted(), "7.2.0", "freak-out");
    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(outcome.stderr, "plugin panicked: freak out\n");
}

#[test]
fn old_cli_is_told_the_required_version() {
    let outcome = run(FakeConfig::targeted(), "5.9.0", "CoolTest");
    assert!(outcome.success(), "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        "Minimum CLI version 6.0.0 is required to run this plugin command\n"
    );
}

#[test]
fn metadata_is_fetched_from_the_plugin() {
    let (launcher, _) = launcher(FakeConfig::untargeted(), "7.2.0");
    let metadata = launcher.fetch_metadata(plugin()).expect("metadata");

    assert_eq!(metadata.name, "CoolTest");
    assert_eq!(metadata.min_cli_version.to_string(), "6.0.0");
    let command = metadata.find_command("ct").expect("alias registered");
    assert_eq!(command.name, "CoolTest");
    assert_eq!(command.usage_details.usage, "cf CoolTest");
}

#[test]
fn each_launch_starts_a_fresh_session() {
    let (launcher, _) = launcher(FakeConfig::targeted(), "7.2.0");
    launcher.fetch_metadata(plugin()).expect("metadata");
    let outcome = launcher
        .run(plugin(), &[String::from("CoolTest")])
        .expect("plugin launched");

    assert!(outcome.success());
    assert!(launcher.service().registered_metadata().is_none());
}

#[test]
fn inherited_output_leaves_the_outcome_empty() {
    let (collaborators, _) = fakes::collaborators(
        FakeConfig::targeted(),
        FakeActor::sample(),
        ScriptedParser::default(),
    );
    let launcher = PluginLauncher::new(
        Arc::new(RpcService::new(collaborators, "7.2.0")),
        &HostSettings::default(),
    );
    let outcome = launcher
        .run(plugin(), &[String::from("CoolTest")])
        .expect("plugin launched");

    assert!(outcome.success());
    assert!(outcome.stdout.is_empty());
}
