//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::reconcile::PollSettings;

/// Default endpoint of the Nscale region service.
pub const DEFAULT_REGION_SERVICE_API_ENDPOINT: &str = "https://region.unikorn.nscale.com";

/// Default endpoint of the Nscale compute service.
pub const DEFAULT_COMPUTE_SERVICE_API_ENDPOINT: &str = "https://compute.unikorn.nscale.com";

/// User agent sent with every API request unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("nscale-reconcile/", env!("CARGO_PKG_VERSION"));

/// Nscale connection and polling settings derived from environment variables
/// and configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "NSCALE",
    discovery(
        app_name = "nscale",
        env_var = "NSCALE_CONFIG_PATH",
        config_file_name = "nscale.toml",
        dotfile_name = ".nscale.toml",
        project_file_name = "nscale.toml"
    )
)]
pub struct NscaleConfig {
    /// Service token used as the bearer credential. This value is required.
    pub service_token: String,
    /// Organization that owns the managed resources.
    pub organization_id: String,
    /// Project that owns the managed resources.
    pub project_id: String,
    /// Region used when a resource does not name one explicitly.
    pub region_id: Option<String>,
    /// Base URL of the region service (networks, security groups, storage).
    #[ortho_config(default = DEFAULT_REGION_SERVICE_API_ENDPOINT.to_owned())]
    pub region_service_api_endpoint: String,
    /// Base URL of the compute service (instances, clusters).
    #[ortho_config(default = DEFAULT_COMPUTE_SERVICE_API_ENDPOINT.to_owned())]
    pub compute_service_api_endpoint: String,
    /// User agent sent with API requests.
    #[ortho_config(default = DEFAULT_USER_AGENT.to_owned())]
    pub user_agent: String,
    /// Seconds between two reads while waiting on a mutation.
    #[ortho_config(default = 5)]
    pub poll_interval_secs: u64,
    /// Upper bound, in seconds, on a single wait.
    #[ortho_config(default = 1800)]
    pub wait_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl NscaleConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to nscale.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("nscale-wait")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and TOML key that supply each missing value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::InvalidPolling`] when the polling bounds are
    /// unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.service_token,
            &FieldMetadata::new(
                "Nscale service token",
                "NSCALE_SERVICE_TOKEN",
                "service_token",
            ),
        )?;
        Self::require_field(
            &self.organization_id,
            &FieldMetadata::new(
                "Nscale organization ID",
                "NSCALE_ORGANIZATION_ID",
                "organization_id",
            ),
        )?;
        Self::require_field(
            &self.project_id,
            &FieldMetadata::new("Nscale project ID", "NSCALE_PROJECT_ID", "project_id"),
        )?;
        Self::require_field(
            &self.region_service_api_endpoint,
            &FieldMetadata::new(
                "region service endpoint",
                "NSCALE_REGION_SERVICE_API_ENDPOINT",
                "region_service_api_endpoint",
            ),
        )?;
        Self::require_field(
            &self.compute_service_api_endpoint,
            &FieldMetadata::new(
                "compute service endpoint",
                "NSCALE_COMPUTE_SERVICE_API_ENDPOINT",
                "compute_service_api_endpoint",
            ),
        )?;
        self.poll_settings().map(|_| ())
    }

    /// Builds the polling bounds used by the reconcilers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPolling`] when the interval is zero or
    /// exceeds the timeout.
    pub fn poll_settings(&self) -> Result<PollSettings, ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPolling(String::from(
                "poll_interval_secs must be greater than zero",
            )));
        }
        if self.wait_timeout_secs < self.poll_interval_secs {
            return Err(ConfigError::InvalidPolling(format!(
                "wait_timeout_secs ({}) must not be shorter than poll_interval_secs ({})",
                self.wait_timeout_secs, self.poll_interval_secs
            )));
        }
        Ok(PollSettings::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.wait_timeout_secs),
        ))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates the polling interval or timeout cannot be used.
    #[error("invalid polling configuration: {0}")]
    InvalidPolling(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
