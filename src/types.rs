use serde::{Deserialize, Serialize};

// Re-export UserRole and Permission from the permission module
pub use crate::domains::permission::{Permission, PermissionGroup, UserRole};

/// The eight recognized ABO/Rh blood group strings.
///
/// Stored and compared verbatim; matching between a donor and a request
/// is an exact string comparison, never case-folded.
pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Audit log action type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditLogAction {
    Create,
    Update,
    LoginSuccess,
    LoginFail,
    Logout,
    PermissionDenied,
    MaintenanceToggled,
}

impl AuditLogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLogAction::Create => "create",
            AuditLogAction::Update => "update",
            AuditLogAction::LoginSuccess => "login_success",
            AuditLogAction::LoginFail => "login_fail",
            AuditLogAction::Logout => "logout",
            AuditLogAction::PermissionDenied => "permission_denied",
            AuditLogAction::MaintenanceToggled => "maintenance_toggled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(AuditLogAction::Create),
            "update" => Some(AuditLogAction::Update),
            "login_success" => Some(AuditLogAction::LoginSuccess),
            "login_fail" => Some(AuditLogAction::LoginFail),
            "logout" => Some(AuditLogAction::Logout),
            "permission_denied" => Some(AuditLogAction::PermissionDenied),
            "maintenance_toggled" => Some(AuditLogAction::MaintenanceToggled),
            _ => None,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

/// Paginated result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        let total_pages = (total as f64 / params.per_page as f64).ceil() as u32;
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages,
        }
    }

    /// Convert the item type, keeping the paging envelope intact
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}
