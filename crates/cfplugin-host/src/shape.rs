//! Conversion of host-native records into plugin-facing models.
//!
//! A record is serialized to a `serde_json::Value` and deserialized into the
//! target model. Fields match by name: extra fields on the record are
//! dropped, fields the record lacks take the model's defaults. Only a field
//! present on both sides with incompatible types fails.

use std::any::type_name;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A record could not be re-encoded as the requested model.
#[derive(Debug, Error)]
#[error("cannot convert {record} into {model}: {source}")]
pub struct ShapeError {
    record: &'static str,
    model: &'static str,
    #[source]
    source: serde_json::Error,
}

impl ShapeError {
    /// Returns the type name of the host record.
    #[must_use]
    pub const fn record(&self) -> &'static str {
        self.record
    }

    /// Returns the type name of the plugin model.
    #[must_use]
    pub const fn model(&self) -> &'static str {
        self.model
    }
}

/// Re-encodes `record` as `M`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when `record` cannot be serialized or a shared
/// field has an incompatible type.
pub(crate) fn reshape<R, M>(record: &R) -> Result<M, ShapeError>
where
    R: Serialize + ?Sized,
    M: DeserializeOwned,
{
    let fail = |source| ShapeError {
        record: type_name::<R>(),
        model: type_name::<M>(),
        source,
    };
    let value = serde_json::to_value(record).map_err(fail)?;
    serde_json::from_value(value).map_err(fail)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use cfplugin::models::{
        Application, CurrentSpace, DetailedApplicationSummary, Droplet, DropletBuildpack,
        Metadata, Org, ProcessSummary, Route, Space,
    };
    use rstest::rstest;

    use super::*;
    use crate::collaborators::records::{
        DetailedAppSummary, PlatformApplication, PlatformDroplet, PlatformDropletBuildpack,
        PlatformProcessSummary, PlatformRoute, PlatformSpace, ResourceMetadata,
        TargetedOrganization,
    };

    fn labels() -> BTreeMap<String, Option<String>> {
        BTreeMap::from([
            (String::from("team"), Some(String::from("payments"))),
            (String::from("flagged"), None),
        ])
    }

    #[test]
    fn detailed_summary_matches_direct_construction() {
        let record = DetailedAppSummary {
            application: PlatformApplication {
                guid: String::from("app-1"),
                name: String::from("web"),
                state: String::from("STARTED"),
                lifecycle_type: String::from("buildpack"),
                lifecycle_buildpacks: vec![String::from("ruby_buildpack")],
                stack_name: String::from("cflinuxfs4"),
                space_guid: String::from("space-1"),
                metadata: ResourceMetadata {
                    labels: labels(),
                    annotations: BTreeMap::from([(String::from("owner"), None)]),
                },
            },
            process_summaries: vec![PlatformProcessSummary {
                process_type: String::from("web"),
                command: Some(String::from("bundle exec rackup")),
                instances: 2,
                running_instances: 1,
                memory_in_mb: 256,
                disk_in_mb: 1024,
            }],
            routes: vec![PlatformRoute {
                guid: String::from("route-1"),
                host: String::from("web"),
                domain_name: String::from("example.com"),
                path: String::new(),
                port: None,
                url: String::from("web.example.com"),
                space_guid: String::from("space-1"),
            }],
            current_droplet: PlatformDroplet {
                guid: String::from("droplet-1"),
                state: String::from("STAGED"),
                stack: String::from("cflinuxfs4"),
                buildpacks: vec![PlatformDropletBuildpack {
                    name: String::from("ruby_buildpack"),
                    buildpack_name: String::from("ruby"),
                    detect_output: String::from("ruby 3.3"),
                    version: String::from("1.10.0"),
                }],
                image: None,
                created_at: String::from("2024-01-01T00:00:00Z"),
            },
        };

        let expected = DetailedApplicationSummary {
            application: Application {
                guid: String::from("app-1"),
                name: String::from("web"),
                state: String::from("STARTED"),
                lifecycle_type: String::from("buildpack"),
                lifecycle_buildpacks: vec![String::from("ruby_buildpack")],
                stack_name: String::from("cflinuxfs4"),
                metadata: Metadata { labels: labels() },
            },
            process_summaries: vec![ProcessSummary {
                process_type: String::from("web"),
                instances: 2,
                running_instances: 1,
                memory_in_mb: 256,
                disk_in_mb: 1024,
            }],
            routes: vec![Route {
                guid: String::from("route-1"),
                host: String::from("web"),
                domain_name: String::from("example.com"),
                path: String::new(),
                port: None,
                url: String::from("web.example.com"),
            }],
            current_droplet: Droplet {
                guid: String::from("droplet-1"),
                state: String::from("STAGED"),
                stack: String::from("cflinuxfs4"),
                buildpacks: vec![DropletBuildpack {
                    name: String::from("ruby_buildpack"),
                    detect_output: String::from("ruby 3.3"),
                }],
                created_at: String::from("2024-01-01T00:00:00Z"),
            },
        };

        let reshaped: DetailedApplicationSummary = reshape(&record).expect("reshape summary");
        assert_eq!(reshaped, expected);
    }

    #[derive(Serialize)]
    struct Sparse {
        name: &'static str,
    }

    #[derive(Serialize)]
    struct Skewed {
        name: &'static str,
        instances: &'static str,
    }

    fn platform_space(guid: &str, name: &str) -> PlatformSpace {
        PlatformSpace {
            guid: guid.to_owned(),
            name: name.to_owned(),
            organization_guid: String::from("org-1"),
            metadata: ResourceMetadata {
                labels: labels(),
                annotations: BTreeMap::from([(String::from("owner"), None)]),
            },
        }
    }

    #[test]
    fn targeted_organization_matches_direct_construction() {
        let record = TargetedOrganization {
            guid: String::from("org-1"),
            name: String::from("my-org"),
        };
        let org: Org = reshape(&record).expect("reshape");
        assert_eq!(
            org,
            Org {
                guid: String::from("org-1"),
                name: String::from("my-org"),
            }
        );
    }

    #[test]
    fn space_matches_direct_construction() {
        let space: Space = reshape(&platform_space("space-1", "dev")).expect("reshape");
        assert_eq!(
            space,
            Space {
                guid: String::from("space-1"),
                name: String::from("dev"),
            }
        );
    }

    #[test]
    fn current_space_matches_direct_construction() {
        let space: CurrentSpace = reshape(&platform_space("space-1", "dev")).expect("reshape");
        assert_eq!(
            space,
            CurrentSpace {
                guid: String::from("space-1"),
                name: String::from("dev"),
            }
        );
    }

    #[test]
    fn space_list_keeps_order() {
        let records = vec![platform_space("space-1", "dev"), platform_space("space-2", "prod")];
        let spaces: Vec<Space> = reshape(&records).expect("reshape");
        let names: Vec<&str> = spaces.iter().map(|space| space.name.as_str()).collect();
        assert_eq!(names, ["dev", "prod"]);
        assert_eq!(spaces.get(1).map(|space| space.guid.as_str()), Some("space-2"));
    }

    #[rstest]
    #[case::labelled(labels())]
    #[case::bare(BTreeMap::new())]
    fn resource_metadata_drops_annotations(
        #[case] expected_labels: BTreeMap<String, Option<String>>,
    ) {
        let record = ResourceMetadata {
            labels: expected_labels.clone(),
            annotations: BTreeMap::from([(String::from("owner"), Some(String::from("ops")))]),
        };
        let metadata: Metadata = reshape(&record).expect("reshape");
        assert_eq!(
            metadata,
            Metadata {
                labels: expected_labels,
            }
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let process: ProcessSummary = reshape(&Sparse { name: "ignored" }).expect("reshape");
        assert_eq!(process, ProcessSummary::default());
    }

    #[rstest]
    fn type_mismatch_names_both_types() {
        let error = reshape::<_, ProcessSummary>(&Skewed {
            name: "web",
            instances: "two",
        })
        .expect_err("instances must be numeric");

        assert!(error.record().ends_with("Skewed"));
        assert!(error.model().ends_with("ProcessSummary"));
        assert!(error.to_string().contains("cannot convert"));
    }
}
