//! Plugin-facing snapshots of cloud-platform entities.
//!
//! These are the shapes a plugin decodes RPC results into. The host never
//! sends its own records directly: it re-encodes them into these types, so
//! every struct is `#[serde(default)]` and tolerates fields it does not know
//! about. A field whose *type* disagrees with the host's record is a hard
//! failure on the host side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// User-defined labels attached to a resource.
///
/// A label whose value is `None` is set without a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Label key to optional value.
    pub labels: BTreeMap<String, Option<String>>,
}

/// An organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Org {
    /// Organization GUID.
    pub guid: String,
    /// Organization name.
    pub name: String,
}

/// An organization together with its spaces and domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgSummary {
    /// Organization GUID.
    pub guid: String,
    /// Organization name.
    pub name: String,
    /// Organization labels.
    pub metadata: Metadata,
    /// Spaces in the organization.
    pub spaces: Vec<Space>,
    /// Domains visible to the organization.
    pub domains: Vec<Domain>,
}

/// A space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Space {
    /// Space GUID.
    pub guid: String,
    /// Space name.
    pub name: String,
}

/// The space the host is currently targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentSpace {
    /// Space GUID.
    pub guid: String,
    /// Space name.
    pub name: String,
}

/// A routable domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Domain {
    /// Domain GUID.
    pub guid: String,
    /// Domain name.
    pub name: String,
}

/// An application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    /// Application GUID.
    pub guid: String,
    /// Application name.
    pub name: String,
    /// Desired state, for example `STARTED` or `STOPPED`.
    pub state: String,
    /// Lifecycle type, for example `buildpack` or `docker`.
    pub lifecycle_type: String,
    /// Buildpacks requested for the application.
    pub lifecycle_buildpacks: Vec<String>,
    /// Stack the application runs on.
    pub stack_name: String,
    /// Application labels.
    pub metadata: Metadata,
}

/// Instance counts and quotas for one process type of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSummary {
    /// Process type, for example `web` or `worker`.
    pub process_type: String,
    /// Desired instance count.
    pub instances: u32,
    /// Instances currently running.
    pub running_instances: u32,
    /// Memory quota per instance in MiB.
    pub memory_in_mb: u64,
    /// Disk quota per instance in MiB.
    pub disk_in_mb: u64,
}

/// A route mapped to an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    /// Route GUID.
    pub guid: String,
    /// Host name portion.
    pub host: String,
    /// Domain the route belongs to.
    pub domain_name: String,
    /// Path portion, possibly empty.
    pub path: String,
    /// TCP port for TCP routes.
    pub port: Option<u16>,
    /// Fully assembled URL.
    pub url: String,
}

/// A buildpack that contributed to a droplet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropletBuildpack {
    /// Buildpack name.
    pub name: String,
    /// Output of the buildpack's detect phase.
    pub detect_output: String,
}

/// The staged droplet an application currently runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Droplet {
    /// Droplet GUID.
    pub guid: String,
    /// Staging state, for example `STAGED`.
    pub state: String,
    /// Stack the droplet was staged on.
    pub stack: String,
    /// Buildpacks that produced the droplet.
    pub buildpacks: Vec<DropletBuildpack>,
    /// Creation timestamp as reported by the platform.
    pub created_at: String,
}

/// An application with its processes, routes, and current droplet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedApplicationSummary {
    /// The application itself.
    pub application: Application,
    /// One entry per process type.
    pub process_summaries: Vec<ProcessSummary>,
    /// Routes mapped to the application.
    pub routes: Vec<Route>,
    /// The droplet the application currently runs.
    pub current_droplet: Droplet,
}
