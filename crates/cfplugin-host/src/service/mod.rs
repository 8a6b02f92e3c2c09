//! The RPC service plugins call into.
//!
//! [`RpcService`] implements every method of the plugin capability surface
//! against the CLI's [`Collaborators`]. Each method is available as a typed
//! function and through [`RpcService::dispatch`], which decodes a wire
//! request, routes it and encodes the outcome.
//!
//! Calls that read platform data check targeting before touching any
//! collaborator, pass collaborator warnings to the host's own output, and
//! re-encode collaborator records into the plugin models.

mod errors;

use std::str::FromStr;

use cfplugin::models::{
    Application, CurrentSpace, DetailedApplicationSummary, Domain, Metadata, Org, OrgSummary,
    Space,
};
use cfplugin::protocol::{PROTOCOL_VERSION, RpcRequest, RpcResponse};
use cfplugin::{PluginMetadata, RpcMethod};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::collaborators::{Collaborators, UNKNOWN_COMMAND_CODE};
use crate::metadata_slot::MetadataSlot;
use crate::shape::reshape;
use crate::version_gate;

pub use self::errors::{ServiceError, TargetScope};

pub(crate) const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// Host-side implementation of the plugin capability surface.
pub struct RpcService {
    collaborators: Collaborators,
    cli_version: String,
    metadata: MetadataSlot,
}

impl RpcService {
    /// Creates a service for a host CLI at `cli_version`.
    #[must_use]
    pub fn new(collaborators: Collaborators, cli_version: impl Into<String>) -> Self {
        Self {
            collaborators,
            cli_version: cli_version.into(),
            metadata: MetadataSlot::default(),
        }
    }

    /// Returns the host CLI version the service compares against.
    #[must_use]
    pub fn cli_version(&self) -> &str {
        &self.cli_version
    }

    /// Returns a copy of the metadata registered in the current session.
    #[must_use]
    pub fn registered_metadata(&self) -> Option<PluginMetadata> {
        self.metadata.snapshot()
    }

    /// Forgets any registered metadata; called when a new plugin session
    /// starts.
    pub(crate) fn begin_session(&self) {
        self.metadata.clear();
    }

    /// Decodes, routes and answers one wire request.
    ///
    /// Every failure becomes a fault response. Internal faults are logged at
    /// error level.
    #[must_use]
    pub fn dispatch(&self, request: &RpcRequest) -> RpcResponse {
        match self.route(request) {
            Ok(result) => RpcResponse::success(result),
            Err(failure) => {
                if failure.is_internal() {
                    error!(
                        target: SERVICE_TARGET,
                        method = request.method(),
                        error = %failure,
                        "plugin call hit an internal fault"
                    );
                } else {
                    debug!(
                        target: SERVICE_TARGET,
                        method = request.method(),
                        kind = %failure.fault_kind(),
                        error = %failure,
                        "plugin call failed"
                    );
                }
                RpcResponse::failure(failure.to_fault())
            }
        }
    }

    fn route(&self, request: &RpcRequest) -> Result<Value, ServiceError> {
        if request.protocol() != PROTOCOL_VERSION {
            return Err(ServiceError::ProtocolMismatch {
                expected: PROTOCOL_VERSION,
                actual: request.protocol(),
            });
        }
        let method =
            RpcMethod::from_str(request.method()).map_err(|_| ServiceError::UnknownMethod {
                method: request.method().to_owned(),
            })?;
        debug!(target: SERVICE_TARGET, method = method.as_str(), "serving plugin call");

        match method {
            RpcMethod::AccessToken => encode(method, &self.access_token()?),
            RpcMethod::ApiEndpoint => encode(method, &self.api_endpoint()),
            RpcMethod::CliCommand => {
                let args: Vec<String> = params(request, method)?;
                encode(method, &self.cli_command(&args)?)
            }
            RpcMethod::DisableTerminalOutput => {
                let disable: bool = params(request, method)?;
                encode(method, &self.disable_terminal_output(disable))
            }
            RpcMethod::GetApp => {
                let name: String = params(request, method)?;
                encode(method, &self.get_app(&name)?)
            }
            RpcMethod::GetApps => encode(method, &self.get_apps()?),
            RpcMethod::GetCurrentOrg => encode(method, &self.get_current_org()?),
            RpcMethod::GetCurrentSpace => encode(method, &self.get_current_space()?),
            RpcMethod::GetOrg => {
                let name: String = params(request, method)?;
                encode(method, &self.get_org(&name)?)
            }
            RpcMethod::GetSpace => {
                let name: String = params(request, method)?;
                encode(method, &self.get_space(&name)?)
            }
            RpcMethod::GetSpaces => encode(method, &self.get_spaces()?),
            RpcMethod::IsLoggedIn => encode(method, &self.is_logged_in()),
            RpcMethod::IsMinCliVersion => {
                let required: String = params(request, method)?;
                encode(method, &self.is_min_cli_version(&required)?)
            }
            RpcMethod::IsSkipSslValidation => encode(method, &self.is_skip_ssl_validation()),
            RpcMethod::SetPluginMetadata => {
                let metadata: PluginMetadata = params(request, method)?;
                encode(method, &self.set_plugin_metadata(metadata))
            }
            RpcMethod::Username => encode(method, &self.username()?),
        }
    }

    /// Returns the targeted API endpoint.
    #[must_use]
    pub fn api_endpoint(&self) -> String {
        self.collaborators.config.target()
    }

    /// Reports whether the host holds an access token.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        !self.collaborators.config.access_token().is_empty()
    }

    /// Reports whether TLS verification is disabled.
    #[must_use]
    pub fn is_skip_ssl_validation(&self) -> bool {
        self.collaborators.config.skip_ssl_validation()
    }

    /// Returns the logged-in user's name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] when the configuration cannot be
    /// read and [`ServiceError::NotLoggedIn`] when no user is logged in.
    pub fn username(&self) -> Result<String, ServiceError> {
        let name = self
            .collaborators
            .config
            .current_user_name()
            .map_err(ServiceError::Config)?;
        if name.is_empty() {
            return Err(ServiceError::NotLoggedIn);
        }
        Ok(name)
    }

    /// Refreshes and returns the access token.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::TokenRefresh`], an internal fault, when the
    /// refresh fails.
    pub fn access_token(&self) -> Result<String, ServiceError> {
        self.collaborators
            .actor
            .refresh_access_token()
            .map_err(ServiceError::TokenRefresh)
    }

    /// Reports whether this CLI build satisfies `required`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::VersionParse`] when either version is not a
    /// semantic version.
    pub fn is_min_cli_version(&self, required: &str) -> Result<bool, ServiceError> {
        Ok(version_gate::is_min_cli_version(&self.cli_version, required)?)
    }

    /// Stores `metadata` as the session's registered metadata.
    #[must_use]
    pub fn set_plugin_metadata(&self, metadata: PluginMetadata) -> bool {
        debug!(
            target: SERVICE_TARGET,
            plugin = %metadata.name,
            commands = metadata.commands.len(),
            "plugin registered metadata"
        );
        self.metadata.replace(metadata);
        true
    }

    /// Suppresses or restores the host's terminal output.
    #[must_use]
    pub fn disable_terminal_output(&self, disable: bool) -> bool {
        self.collaborators.output.disable_terminal_output(disable);
        true
    }

    /// Runs a CLI command with captured output and returns `[stdout, stderr]`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownCommand`] when the parser does not know
    /// the command and [`ServiceError::CommandFailed`] when it exits non-zero.
    pub fn cli_command(&self, args: &[String]) -> Result<Vec<String>, ServiceError> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit_code =
            self.collaborators
                .parser
                .parse_command_from_args(args, &mut stdout, &mut stderr);
        let command = || args.first().cloned().unwrap_or_default();

        match exit_code {
            0 => Ok(vec![
                String::from_utf8_lossy(&stdout).into_owned(),
                String::from_utf8_lossy(&stderr).into_owned(),
            ]),
            UNKNOWN_COMMAND_CODE => Err(ServiceError::UnknownCommand { command: command() }),
            code => Err(ServiceError::CommandFailed {
                command: command(),
                exit_code: code,
            }),
        }
    }

    /// Returns a detailed summary of an application in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotTargeted`] without querying the platform
    /// when no organization or space is targeted, and the collaborator or
    /// shape error otherwise.
    pub fn get_app(&self, name: &str) -> Result<DetailedApplicationSummary, ServiceError> {
        let config = &self.collaborators.config;
        if !config.has_targeted_organization() {
            return Err(not_targeted(TargetScope::Organization));
        }
        let space_guid = config.targeted_space().guid;
        if space_guid.is_empty() {
            return Err(not_targeted(TargetScope::Space));
        }
        let (summary, warnings) = self
            .collaborators
            .actor
            .get_detailed_app_summary(name, &space_guid)?;
        self.surface_warnings(RpcMethod::GetApp, &warnings);
        Ok(reshape(&summary)?)
    }

    /// Lists applications in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotTargeted`] when no space is targeted, and
    /// the collaborator or shape error otherwise.
    pub fn get_apps(&self) -> Result<Vec<Application>, ServiceError> {
        let space_guid = self.collaborators.config.targeted_space().guid;
        if space_guid.is_empty() {
            return Err(not_targeted(TargetScope::Space));
        }
        let (applications, warnings) = self
            .collaborators
            .actor
            .get_applications_by_space(&space_guid)?;
        self.surface_warnings(RpcMethod::GetApps, &warnings);
        Ok(reshape(&applications)?)
    }

    /// Returns the targeted organization.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotTargeted`] when no organization is targeted.
    pub fn get_current_org(&self) -> Result<Org, ServiceError> {
        let org = self.collaborators.config.targeted_organization();
        if org.name.is_empty() {
            return Err(not_targeted(TargetScope::Organization));
        }
        Ok(reshape(&org)?)
    }

    /// Looks up the targeted space on the platform.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotTargeted`] when no organization or space is
    /// targeted, and the collaborator or shape error otherwise.
    pub fn get_current_space(&self) -> Result<CurrentSpace, ServiceError> {
        let config = &self.collaborators.config;
        let org_guid = config.targeted_organization().guid;
        if org_guid.is_empty() {
            return Err(not_targeted(TargetScope::Organization));
        }
        let space_name = config.targeted_space().name;
        if space_name.is_empty() {
            return Err(not_targeted(TargetScope::Space));
        }
        let (space, warnings) = self
            .collaborators
            .actor
            .get_space_by_name_and_organization(&space_name, &org_guid)?;
        self.surface_warnings(RpcMethod::GetCurrentSpace, &warnings);
        Ok(reshape(&space)?)
    }

    /// Returns an organization with its spaces and domains.
    ///
    /// Needs no targeting. Spaces and domains are copied field by field;
    /// only the organization's metadata goes through the shape adapter.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator or shape error.
    pub fn get_org(&self, name: &str) -> Result<OrgSummary, ServiceError> {
        let actor = &self.collaborators.actor;
        let (org, org_warnings) = actor.get_organization_by_name(name)?;
        self.surface_warnings(RpcMethod::GetOrg, &org_warnings);
        let (spaces, space_warnings) = actor.get_organization_spaces(&org.guid)?;
        self.surface_warnings(RpcMethod::GetOrg, &space_warnings);
        let (domains, domain_warnings) = actor.get_organization_domains(&org.guid, "")?;
        self.surface_warnings(RpcMethod::GetOrg, &domain_warnings);

        let metadata: Metadata = reshape(&org.metadata)?;
        Ok(OrgSummary {
            guid: org.guid,
            name: org.name,
            metadata,
            spaces: spaces
                .into_iter()
                .map(|space| Space {
                    guid: space.guid,
                    name: space.name,
                })
                .collect(),
            domains: domains
                .into_iter()
                .map(|domain| Domain {
                    guid: domain.guid,
                    name: domain.name,
                })
                .collect(),
        })
    }

    /// Looks up a space by name in the targeted organization.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotTargeted`] when no organization is
    /// targeted, and the collaborator or shape error otherwise.
    pub fn get_space(&self, name: &str) -> Result<Space, ServiceError> {
        let org_guid = self.targeted_org_guid()?;
        let (space, warnings) = self
            .collaborators
            .actor
            .get_space_by_name_and_organization(name, &org_guid)?;
        self.surface_warnings(RpcMethod::GetSpace, &warnings);
        Ok(reshape(&space)?)
    }

    /// Lists spaces in the targeted organization.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotTargeted`] when no organization is
    /// targeted, and the collaborator or shape error otherwise.
    pub fn get_spaces(&self) -> Result<Vec<Space>, ServiceError> {
        let org_guid = self.targeted_org_guid()?;
        let (spaces, warnings) = self
            .collaborators
            .actor
            .get_organization_spaces(&org_guid)?;
        self.surface_warnings(RpcMethod::GetSpaces, &warnings);
        Ok(reshape(&spaces)?)
    }

    fn targeted_org_guid(&self) -> Result<String, ServiceError> {
        let guid = self.collaborators.config.targeted_organization().guid;
        if guid.is_empty() {
            return Err(not_targeted(TargetScope::Organization));
        }
        Ok(guid)
    }

    fn surface_warnings(&self, method: RpcMethod, warnings: &[String]) {
        for warning in warnings {
            warn!(target: SERVICE_TARGET, method = method.as_str(), %warning, "platform warning");
            self.collaborators.output.display_warning(warning);
        }
    }
}

const fn not_targeted(scope: TargetScope) -> ServiceError {
    ServiceError::NotTargeted { scope }
}

fn params<T: DeserializeOwned>(request: &RpcRequest, method: RpcMethod) -> Result<T, ServiceError> {
    request
        .decode_params()
        .map_err(|source| ServiceError::InvalidParams {
            method,
            message: source.to_string(),
        })
}

fn encode<T: Serialize + ?Sized>(method: RpcMethod, result: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(result).map_err(|source| ServiceError::Encode { method, source })
}
