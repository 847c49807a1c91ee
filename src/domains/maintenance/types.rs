use serde::{Deserialize, Serialize};

/// The maintenance flag as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub enabled: bool,
    pub message: Option<String>,
}

impl Default for MaintenanceStatus {
    fn default() -> Self {
        Self {
            enabled: false,
            message: None,
        }
    }
}
