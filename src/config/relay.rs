//! Relay configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Thread relay behavior
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Random thread code draws before falling back to a full scan
    #[serde(default = "default_id_allocation_attempts")]
    pub id_allocation_attempts: usize,

    /// Author name on instructor notes that carry no name
    #[serde(default = "default_instructor_display_name")]
    pub instructor_display_name: String,
}

impl RelayConfig {
    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id_allocation_attempts == 0 {
            return Err(ValidationError::InvalidAllocationAttempts);
        }
        if self.instructor_display_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "relay.instructor_display_name",
            ));
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            id_allocation_attempts: default_id_allocation_attempts(),
            instructor_display_name: default_instructor_display_name(),
        }
    }
}

fn default_id_allocation_attempts() -> usize {
    64
}

fn default_instructor_display_name() -> String {
    "SYSADMIN".to_string()
}
