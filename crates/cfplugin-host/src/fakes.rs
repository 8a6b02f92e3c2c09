//! In-memory collaborators for tests.
//!
//! Available to this crate's tests and, with the `test-support` feature, to
//! other crates in the workspace.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::collaborators::records::{
    DetailedAppSummary, Organization, PlatformApplication, PlatformDomain, PlatformSpace,
    ResourceMetadata, TargetedOrganization, TargetedSpace,
};
use crate::collaborators::{
    CliConfig, CollaboratorError, Collaborators, CommandParser, HostOutput, PluginActor,
    UNKNOWN_COMMAND_CODE, Warnings,
};

/// Configuration store with fixed answers.
#[derive(Debug, Clone)]
pub struct FakeConfig {
    /// API endpoint.
    pub target: String,
    /// Targeted organization; empty fields mean untargeted.
    pub organization: TargetedOrganization,
    /// Targeted space; empty fields mean untargeted.
    pub space: TargetedSpace,
    /// Stored access token.
    pub access_token: String,
    /// Answer to `current_user_name`.
    pub user_name: Result<String, CollaboratorError>,
    /// TLS verification skip flag.
    pub skip_ssl_validation: bool,
}

impl FakeConfig {
    /// A logged-in user targeting `my-org` / `dev`.
    #[must_use]
    pub fn targeted() -> Self {
        Self {
            target: String::from("https://api.example.com"),
            organization: TargetedOrganization {
                guid: String::from("org-1"),
                name: String::from("my-org"),
            },
            space: TargetedSpace {
                guid: String::from("space-1"),
                name: String::from("dev"),
                allow_ssh: true,
            },
            access_token: String::from("bearer token"),
            user_name: Ok(String::from("admin")),
            skip_ssl_validation: false,
        }
    }

    /// A logged-out user with nothing targeted.
    #[must_use]
    pub fn untargeted() -> Self {
        Self {
            target: String::from("https://api.example.com"),
            organization: TargetedOrganization::default(),
            space: TargetedSpace::default(),
            access_token: String::new(),
            user_name: Ok(String::new()),
            skip_ssl_validation: false,
        }
    }

    /// Keeps the organization and drops the targeted space.
    #[must_use]
    pub fn without_space(mut self) -> Self {
        self.space = TargetedSpace::default();
        self
    }
}

impl CliConfig for FakeConfig {
    fn target(&self) -> String {
        self.target.clone()
    }

    fn has_targeted_organization(&self) -> bool {
        !self.organization.guid.is_empty()
    }

    fn targeted_organization(&self) -> TargetedOrganization {
        self.organization.clone()
    }

    fn targeted_space(&self) -> TargetedSpace {
        self.space.clone()
    }

    fn access_token(&self) -> String {
        self.access_token.clone()
    }

    fn current_user_name(&self) -> Result<String, CollaboratorError> {
        self.user_name.clone()
    }

    fn skip_ssl_validation(&self) -> bool {
        self.skip_ssl_validation
    }
}

/// Platform client answering from in-memory records.
#[derive(Debug, Clone, Default)]
pub struct FakeActor {
    /// Applications, looked up by name and space GUID.
    pub apps: Vec<DetailedAppSummary>,
    /// Organizations, looked up by name.
    pub organizations: Vec<Organization>,
    /// Spaces, looked up by organization GUID.
    pub spaces: Vec<PlatformSpace>,
    /// Domains, returned for every organization.
    pub domains: Vec<PlatformDomain>,
    /// Warnings attached to every data answer.
    pub warnings: Warnings,
    /// Token handed out on refresh; `None` makes the refresh fail.
    pub access_token: Option<String>,
}

impl FakeActor {
    /// One organization with two spaces, one domain and an app in `dev`.
    #[must_use]
    pub fn sample() -> Self {
        let labels = BTreeMap::from([(String::from("env"), Some(String::from("test")))]);
        Self {
            apps: vec![DetailedAppSummary {
                application: PlatformApplication {
                    guid: String::from("app-1"),
                    name: String::from("web"),
                    state: String::from("STARTED"),
                    lifecycle_type: String::from("buildpack"),
                    stack_name: String::from("cflinuxfs4"),
                    space_guid: String::from("space-1"),
                    ..PlatformApplication::default()
                },
                ..DetailedAppSummary::default()
            }],
            organizations: vec![Organization {
                guid: String::from("org-1"),
                name: String::from("my-org"),
                quota_guid: String::from("quota-1"),
                metadata: ResourceMetadata {
                    labels,
                    annotations: BTreeMap::new(),
                },
                ..Organization::default()
            }],
            spaces: vec![
                space("space-1", "dev", "org-1"),
                space("space-2", "prod", "org-1"),
            ],
            domains: vec![PlatformDomain {
                guid: String::from("domain-1"),
                name: String::from("example.com"),
                internal: false,
            }],
            warnings: Vec::new(),
            access_token: Some(String::from("bearer refreshed")),
        }
    }

    /// Attaches `warning` to every data answer.
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

fn space(guid: &str, name: &str, org_guid: &str) -> PlatformSpace {
    PlatformSpace {
        guid: guid.to_owned(),
        name: name.to_owned(),
        organization_guid: org_guid.to_owned(),
        metadata: ResourceMetadata::default(),
    }
}

impl PluginActor for FakeActor {
    fn get_detailed_app_summary(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> Result<(DetailedAppSummary, Warnings), CollaboratorError> {
        self.apps
            .iter()
            .find(|app| app.application.name == app_name && app.application.space_guid == space_guid)
            .map(|app| (app.clone(), self.warnings.clone()))
            .ok_or_else(|| CollaboratorError::not_found("App", app_name))
    }

    fn get_applications_by_space(
        &self,
        space_guid: &str,
    ) -> Result<(Vec<PlatformApplication>, Warnings), CollaboratorError> {
        let apps = self
            .apps
            .iter()
            .filter(|app| app.application.space_guid == space_guid)
            .map(|app| app.application.clone())
            .collect();
        Ok((apps, self.warnings.clone()))
    }

    fn get_organization_by_name(
        &self,
        org_name: &str,
    ) -> Result<(Organization, Warnings), CollaboratorError> {
        self.organizations
            .iter()
            .find(|org| org.name == org_name)
            .map(|org| (org.clone(), self.warnings.clone()))
            .ok_or_else(|| CollaboratorError::not_found("Organization", org_name))
    }

    fn get_organization_spaces(
        &self,
        org_guid: &str,
    ) -> Result<(Vec<PlatformSpace>, Warnings), CollaboratorError> {
        let spaces = self
            .spaces
            .iter()
            .filter(|space| space.organization_guid == org_guid)
            .cloned()
            .collect();
        Ok((spaces, self.warnings.clone()))
    }

    fn get_organization_domains(
        &self,
        _org_guid: &str,
        _label_selector: &str,
    ) -> Result<(Vec<PlatformDomain>, Warnings), CollaboratorError> {
        Ok((self.domains.clone(), self.warnings.clone()))
    }

    fn get_space_by_name_and_organization(
        &self,
        space_name: &str,
        org_guid: &str,
    ) -> Result<(PlatformSpace, Warnings), CollaboratorError> {
        self.spaces
            .iter()
            .find(|space| space.name == space_name && space.organization_guid == org_guid)
            .map(|space| (space.clone(), self.warnings.clone()))
            .ok_or_else(|| CollaboratorError::not_found("Space", space_name))
    }

    fn refresh_access_token(&self) -> Result<String, CollaboratorError> {
        self.access_token
            .clone()
            .ok_or_else(|| CollaboratorError::failed("refresh token expired"))
    }
}

/// Canned result of one scripted command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedCommand {
    /// Exit code to return.
    pub exit_code: i32,
    /// Text written to stdout.
    pub stdout: String,
    /// Text written to stderr.
    pub stderr: String,
}

/// Command parser that knows a fixed set of commands.
#[derive(Debug, Clone, Default)]
pub struct ScriptedParser {
    commands: BTreeMap<String, ScriptedCommand>,
}

impl ScriptedParser {
    /// Adds a command answering with `exit_code` and the given output.
    #[must_use]
    pub fn with_command(
        mut self,
        name: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.commands.insert(
            name.into(),
            ScriptedCommand {
                exit_code,
                stdout: stdout.into(),
                stderr: stderr.into(),
            },
        );
        self
    }
}

impl CommandParser for ScriptedParser {
    fn parse_command_from_args(
        &self,
        args: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> i32 {
        let Some(command) = args.first().and_then(|name| self.commands.get(name)) else {
            return UNKNOWN_COMMAND_CODE;
        };
        if stdout.write_all(command.stdout.as_bytes()).is_err()
            || stderr.write_all(command.stderr.as_bytes()).is_err()
        {
            return 1;
        }
        command.exit_code
    }
}

#[derive(Debug, Default)]
struct RecordedOutput {
    warnings: Mutex<Vec<String>>,
    disabled: AtomicBool,
}

/// Host output that records warnings; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    inner: Arc<RecordedOutput>,
}

impl RecordingOutput {
    /// Returns the warnings displayed so far.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.inner
            .warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reports whether terminal output is currently disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.inner.disabled.load(Ordering::SeqCst)
    }
}

impl HostOutput for RecordingOutput {
    fn display_warning(&self, warning: &str) {
        self.inner
            .warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning.to_owned());
    }

    fn disable_terminal_output(&self, disable: bool) {
        self.inner.disabled.store(disable, Ordering::SeqCst);
    }
}

/// Bundles fakes into [`Collaborators`], returning the shared output record.
#[must_use]
pub fn collaborators(
    config: FakeConfig,
    actor: FakeActor,
    parser: ScriptedParser,
) -> (Collaborators, RecordingOutput) {
    let output = RecordingOutput::default();
    let collaborators = Collaborators {
        config: Box::new(config),
        actor: Box::new(actor),
        parser: Box::new(parser),
        output: Box::new(output.clone()),
    };
    (collaborators, output)
}
