//! Configuration types.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use steamroller_core::ResourceMap;

use crate::loader::ConfigError;

/// Root configuration, as read from the config file.
///
/// ```yaml
/// resource_map:
///   ci: ~/workspace/ci
///   app: /srv/app
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteamrollerConfig {
    /// Resource root name to directory.
    pub resource_map: BTreeMap<String, String>,
}

impl SteamrollerConfig {
    /// Apply command-line overrides; later overrides win.
    pub fn apply_overrides<'a>(&mut self, overrides: impl IntoIterator<Item = &'a ResourceOverride>) {
        for o in overrides {
            self.resource_map.insert(o.root.clone(), o.dir.clone());
        }
    }

    /// Validate root names and build the resolver map.
    pub fn to_resource_map(&self) -> Result<ResourceMap, ConfigError> {
        ResourceMap::from_entries(
            self.resource_map
                .iter()
                .map(|(root, dir)| (root.as_str(), dir.as_str())),
        )
        .map_err(|e| ConfigError::ValidationError {
            message: e.to_string(),
        })
    }
}

/// A `root=dir` override given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOverride {
    pub root: String,
    pub dir: String,
}

impl FromStr for ResourceOverride {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((root, dir)) if !root.is_empty() => Ok(Self {
                root: root.to_string(),
                dir: dir.to_string(),
            }),
            _ => Err(ConfigError::InvalidOverride {
                value: s.to_string(),
            }),
        }
    }
}
