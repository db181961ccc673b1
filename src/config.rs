//! Configuration for the mock server.
//!
//! Defines the mocks registered at startup and logging settings.

use crate::mock::{MockDefinition, MockPayload, ResponseBody};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Built-in configuration used when no file is given.
pub const DEFAULT_CONFIG: &str = include_str!("../demos/default-config.yaml");

/// Main configuration for the mock server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockServerConfig {
    /// Mocks registered at startup
    #[serde(default)]
    pub mocks: Vec<MockEntry>,

    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,
}

impl MockServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// The built-in configuration with the example mocks.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_yaml(DEFAULT_CONFIG)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.definitions().map(|_| ())
    }

    /// Resolve the configured mocks into definitions, applying defaults.
    pub fn definitions(&self) -> anyhow::Result<Vec<MockDefinition>> {
        self.mocks
            .iter()
            .enumerate()
            .map(|(i, entry)| -> anyhow::Result<MockDefinition> {
                let new_mock = MockPayload::from(entry.clone())
                    .into_mock()
                    .map_err(|e| anyhow::anyhow!("Mock {}: {}", i, e))?;
                if new_mock.delay_clamped {
                    warn!(
                        path = %new_mock.definition.path,
                        method = %new_mock.definition.method,
                        requested_ms = entry.delay_ms,
                        delay_ms = new_mock.definition.delay_ms,
                        "Mock delay capped at maximum"
                    );
                }
                Ok(new_mock.definition)
            })
            .collect()
    }

    /// Register every configured mock. Returns the number registered.
    pub async fn seed(&self, registry: &Registry) -> anyhow::Result<usize> {
        let definitions = self.definitions()?;
        let count = definitions.len();
        for definition in definitions {
            registry.add(definition).await;
        }
        Ok(count)
    }
}

/// A mock registered at startup.
///
/// Same fields as the admin API payload, but unknown keys are rejected so a
/// typo such as `status: 201` fails validation instead of being dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockEntry {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub response_body: Option<ResponseBody>,
    #[serde(default)]
    pub response_headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub delay_ms: i64,
}

impl From<MockEntry> for MockPayload {
    fn from(entry: MockEntry) -> Self {
        MockPayload {
            path: entry.path,
            method: entry.method,
            response_body: entry.response_body,
            response_headers: entry.response_headers,
            status_code: entry.status_code,
            delay_ms: entry.delay_ms,
        }
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Log requests answered by a mock
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log requests that matched no mock
    #[serde(default = "default_true")]
    pub log_unmatched: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
        }
    }
}

fn default_true() -> bool {
    true
}
