use serde::{Deserialize, Serialize};

// --- Role Definition ---

/// Role attached to an authenticated identity.
///
/// `User` identities live in the users store; `Admin` and `Superadmin`
/// live in the admins store. A superadmin implicitly holds every
/// permission and bypasses the per-admin permission set entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    User,
    Admin,
    Superadmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::Superadmin => "superadmin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            "superadmin" => Some(UserRole::Superadmin),
            _ => None,
        }
    }

    /// Whether this role is resolved against the admins store.
    pub fn is_admin_scope(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Superadmin)
    }
}

// --- Permission Enum Definition ---

/// Permission enum representing individual admin capabilities.
///
/// The set is fixed; each admin carries an explicit subset of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Account management
    ManageUsers,
    ManageAdmins,

    // Blood coordination
    ManageBloodRequests,
    ManageDonations,

    // Content
    ManageBlogs,
    ManageEvents,
    ViewEventDonors,
    ManageCertificates,

    // Operations
    SendNotifications,
    ViewPayments,
    ToggleMaintenance,
    ViewDashboard,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ManageAdmins => "manage_admins",
            Permission::ManageBloodRequests => "manage_blood_requests",
            Permission::ManageDonations => "manage_donations",
            Permission::ManageBlogs => "manage_blogs",
            Permission::ManageEvents => "manage_events",
            Permission::ViewEventDonors => "view_event_donors",
            Permission::ManageCertificates => "manage_certificates",
            Permission::SendNotifications => "send_notifications",
            Permission::ViewPayments => "view_payments",
            Permission::ToggleMaintenance => "toggle_maintenance",
            Permission::ViewDashboard => "view_dashboard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manage_users" => Some(Permission::ManageUsers),
            "manage_admins" => Some(Permission::ManageAdmins),
            "manage_blood_requests" => Some(Permission::ManageBloodRequests),
            "manage_donations" => Some(Permission::ManageDonations),
            "manage_blogs" => Some(Permission::ManageBlogs),
            "manage_events" => Some(Permission::ManageEvents),
            "view_event_donors" => Some(Permission::ViewEventDonors),
            "manage_certificates" => Some(Permission::ManageCertificates),
            "send_notifications" => Some(Permission::SendNotifications),
            "view_payments" => Some(Permission::ViewPayments),
            "toggle_maintenance" => Some(Permission::ToggleMaintenance),
            "view_dashboard" => Some(Permission::ViewDashboard),
            _ => None,
        }
    }

    /// Get all permissions in the system
    pub fn all() -> Vec<Permission> {
        vec![
            Permission::ManageUsers,
            Permission::ManageAdmins,
            Permission::ManageBloodRequests,
            Permission::ManageDonations,
            Permission::ManageBlogs,
            Permission::ManageEvents,
            Permission::ViewEventDonors,
            Permission::ManageCertificates,
            Permission::SendNotifications,
            Permission::ViewPayments,
            Permission::ToggleMaintenance,
            Permission::ViewDashboard,
        ]
    }
}

// --- Permission Groups (UI presentation) ---

/// Named grouping of permissions, used by the admin UI to render the
/// permission picker. Grouping is presentational only; authorization
/// always checks individual permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub name: &'static str,
    pub permissions: Vec<Permission>,
}

impl PermissionGroup {
    pub fn all() -> Vec<PermissionGroup> {
        vec![
            PermissionGroup {
                name: "Account Management",
                permissions: vec![Permission::ManageUsers, Permission::ManageAdmins],
            },
            PermissionGroup {
                name: "Blood Coordination",
                permissions: vec![
                    Permission::ManageBloodRequests,
                    Permission::ManageDonations,
                ],
            },
            PermissionGroup {
                name: "Content",
                permissions: vec![
                    Permission::ManageBlogs,
                    Permission::ManageEvents,
                    Permission::ViewEventDonors,
                    Permission::ManageCertificates,
                ],
            },
            PermissionGroup {
                name: "Operations",
                permissions: vec![
                    Permission::SendNotifications,
                    Permission::ViewPayments,
                    Permission::ToggleMaintenance,
                    Permission::ViewDashboard,
                ],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn permission_strings_round_trip() {
        for p in Permission::all() {
            assert_eq!(Permission::from_str(p.as_str()), Some(p));
        }
        assert_eq!(Permission::from_str("not_a_permission"), None);
    }

    #[test]
    fn role_strings_round_trip() {
        for role in [UserRole::User, UserRole::Admin, UserRole::Superadmin] {
            assert_eq!(UserRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::from_str("root"), None);
    }

    #[test]
    fn groups_cover_every_permission_exactly_once() {
        let mut seen = HashSet::new();
        for group in PermissionGroup::all() {
            for p in group.permissions {
                assert!(seen.insert(p), "{:?} appears in two groups", p);
            }
        }
        assert_eq!(seen.len(), Permission::all().len());
    }

    #[test]
    fn admin_scope_excludes_plain_users() {
        assert!(!UserRole::User.is_admin_scope());
        assert!(UserRole::Admin.is_admin_scope());
        assert!(UserRole::Superadmin.is_admin_scope());
    }
}
