//! Metadata a plugin registers with the host.
//!
//! The host asks a freshly installed plugin for its metadata by launching it
//! with the [`SEND_METADATA_ARG`](crate::SEND_METADATA_ARG) argument; the
//! plugin answers by pushing a [`PluginMetadata`] through the
//! `SetPluginMetadata` call. The host uses the commands listed here to route
//! invocations and to render help.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::version::VersionType;

/// Everything the host needs to know about an installed plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginMetadata {
    /// Plugin name, unique among installed plugins.
    pub name: String,
    /// Version of the plugin itself.
    pub version: VersionType,
    /// Version of the plugin library the plugin was built against.
    pub library_version: VersionType,
    /// Oldest host CLI version able to run the plugin.
    pub min_cli_version: VersionType,
    /// Commands contributed by the plugin, in registration order.
    pub commands: Vec<Command>,
}

impl PluginMetadata {
    /// Looks up a command by its name or alias.
    #[must_use]
    pub fn find_command(&self, invocation: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|command| command.matches(invocation))
    }
}

/// A command contributed by a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Command {
    /// Primary invocation name.
    pub name: String,
    /// Optional secondary invocation name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// One-line description shown in command listings.
    pub help_text: String,
    /// Detailed usage shown by `help <command>`.
    pub usage_details: Usage,
}

impl Command {
    /// Creates a command with a name and help text and no usage details.
    #[must_use]
    pub fn new(name: impl Into<String>, help_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help_text: help_text.into(),
            ..Self::default()
        }
    }

    /// Attaches an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attaches usage details.
    #[must_use]
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage_details = usage;
        self
    }

    /// Returns `true` when `invocation` is this command's name or alias.
    #[must_use]
    pub fn matches(&self, invocation: &str) -> bool {
        self.name == invocation || self.alias.as_deref() == Some(invocation)
    }
}

/// Usage text and flag descriptions for a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Usage synopsis.
    pub usage: String,
    /// Flag name to description.
    pub options: BTreeMap<String, String>,
}

impl Usage {
    /// Creates usage details with a synopsis and no flags.
    #[must_use]
    pub fn new(usage: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            options: BTreeMap::new(),
        }
    }

    /// Adds a flag description.
    #[must_use]
    pub fn with_option(mut self, flag: impl Into<String>, description: impl Into<String>) -> Self {
        self.options.insert(flag.into(), description.into());
        self
    }
}
