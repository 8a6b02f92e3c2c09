//! Host-native records returned by the platform collaborators.
//!
//! These carry more than plugins see. The service never hands them over
//! directly; it re-encodes them into the plugin-facing models, matching
//! fields by name.

use std::collections::BTreeMap;

use serde::Serialize;

/// Labels and annotations attached to a platform resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceMetadata {
    /// Label key to optional value.
    pub labels: BTreeMap<String, Option<String>>,
    /// Annotation key to optional value.
    pub annotations: BTreeMap<String, Option<String>>,
}

/// The organization recorded in the CLI's configuration as targeted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetedOrganization {
    /// Organization GUID; empty when nothing is targeted.
    pub guid: String,
    /// Organization name; empty when nothing is targeted.
    pub name: String,
}

/// The space recorded in the CLI's configuration as targeted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetedSpace {
    /// Space GUID; empty when nothing is targeted.
    pub guid: String,
    /// Space name; empty when nothing is targeted.
    pub name: String,
    /// Whether SSH access is enabled for the space.
    pub allow_ssh: bool,
}

/// An organization as returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Organization {
    /// Organization GUID.
    pub guid: String,
    /// Organization name.
    pub name: String,
    /// Whether the organization is suspended.
    pub suspended: bool,
    /// GUID of the quota applied to the organization.
    pub quota_guid: String,
    /// Labels and annotations.
    pub metadata: ResourceMetadata,
}

/// A space as returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformSpace {
    /// Space GUID.
    pub guid: String,
    /// Space name.
    pub name: String,
    /// GUID of the owning organization.
    pub organization_guid: String,
    /// Labels and annotations.
    pub metadata: ResourceMetadata,
}

/// A domain as returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformDomain {
    /// Domain GUID.
    pub guid: String,
    /// Domain name.
    pub name: String,
    /// Whether the domain is internal to the platform.
    pub internal: bool,
}

/// An application as returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformApplication {
    /// Application GUID.
    pub guid: String,
    /// Application name.
    pub name: String,
    /// Desired state.
    pub state: String,
    /// Lifecycle type.
    pub lifecycle_type: String,
    /// Requested buildpacks.
    pub lifecycle_buildpacks: Vec<String>,
    /// Stack name.
    pub stack_name: String,
    /// GUID of the owning space.
    pub space_guid: String,
    /// Labels and annotations.
    pub metadata: ResourceMetadata,
}

/// Instance information for one process type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformProcessSummary {
    /// Process type.
    pub process_type: String,
    /// Start command, when one is configured.
    pub command: Option<String>,
    /// Desired instance count.
    pub instances: u32,
    /// Running instance count.
    pub running_instances: u32,
    /// Memory quota in MiB.
    pub memory_in_mb: u64,
    /// Disk quota in MiB.
    pub disk_in_mb: u64,
}

/// A route as returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformRoute {
    /// Route GUID.
    pub guid: String,
    /// Host name portion.
    pub host: String,
    /// Domain name.
    pub domain_name: String,
    /// Path portion.
    pub path: String,
    /// TCP port for TCP routes.
    pub port: Option<u16>,
    /// Assembled URL.
    pub url: String,
    /// GUID of the owning space.
    pub space_guid: String,
}

/// A buildpack entry of a droplet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformDropletBuildpack {
    /// Buildpack name.
    pub name: String,
    /// Buildpack-reported name.
    pub buildpack_name: String,
    /// Detect phase output.
    pub detect_output: String,
    /// Buildpack version.
    pub version: String,
}

/// A droplet as returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformDroplet {
    /// Droplet GUID.
    pub guid: String,
    /// Staging state.
    pub state: String,
    /// Stack name.
    pub stack: String,
    /// Contributing buildpacks.
    pub buildpacks: Vec<PlatformDropletBuildpack>,
    /// Docker image for docker droplets.
    pub image: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Everything the platform reports about one application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailedAppSummary {
    /// The application.
    pub application: PlatformApplication,
    /// One entry per process type.
    pub process_summaries: Vec<PlatformProcessSummary>,
    /// Mapped routes.
    pub routes: Vec<PlatformRoute>,
    /// Current droplet.
    pub current_droplet: PlatformDroplet,
}
