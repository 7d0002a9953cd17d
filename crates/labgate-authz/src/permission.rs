//! Closed catalogue of permissions understood by the gateway.
//!
//! # Purpose
//! Every capability a route can demand is one variant of [`Permission`]. The
//! catalogue is compiled in; there is no runtime registration.
//!
//! # How it fits
//! The permission table maps each [`crate::Role`] to a subset of this
//! catalogue, and route guards name the variants they require.
//!
//! # Key invariants
//! - Codes follow `resource:action` and are unique across the catalogue.
//! - [`Permission::ALL`] lists every variant exactly once.
//! - Parsing a code outside the catalogue fails; it never maps to a default.
//!
//! # Examples
//! ```rust
//! use labgate_authz::Permission;
//!
//! let perm: Permission = "sample:update".parse().expect("known code");
//! assert_eq!(perm, Permission::SampleUpdate);
//! assert_eq!(perm.info().resource, "samples");
//! ```
//!
//! # Common pitfalls
//! - Guards should name variants, not raw strings, so a renamed code is a
//!   compile error instead of a silently failing check.
use crate::errors::AuthzError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    UserList,
    UserCreate,
    UserRead,
    UserUpdate,
    UserDelete,
    UserActivate,
    UserDeactivate,
    TeamList,
    TeamCreate,
    TeamRead,
    TeamUpdate,
    TeamDelete,
    PatientList,
    PatientCreate,
    PatientRead,
    PatientUpdate,
    PatientDelete,
    SampleList,
    SampleCreate,
    SampleRead,
    SampleUpdate,
    SampleDelete,
    BatchList,
    BatchCreate,
    BatchRead,
    BatchUpdate,
    BatchDelete,
    SettingsManage,
}

/// Display metadata attached to a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub resource: &'static str,
    pub action: &'static str,
}

impl Permission {
    pub const ALL: [Permission; 28] = [
        Permission::UserList,
        Permission::UserCreate,
        Permission::UserRead,
        Permission::UserUpdate,
        Permission::UserDelete,
        Permission::UserActivate,
        Permission::UserDeactivate,
        Permission::TeamList,
        Permission::TeamCreate,
        Permission::TeamRead,
        Permission::TeamUpdate,
        Permission::TeamDelete,
        Permission::PatientList,
        Permission::PatientCreate,
        Permission::PatientRead,
        Permission::PatientUpdate,
        Permission::PatientDelete,
        Permission::SampleList,
        Permission::SampleCreate,
        Permission::SampleRead,
        Permission::SampleUpdate,
        Permission::SampleDelete,
        Permission::BatchList,
        Permission::BatchCreate,
        Permission::BatchRead,
        Permission::BatchUpdate,
        Permission::BatchDelete,
        Permission::SettingsManage,
    ];

    pub fn as_str(self) -> &'static str {
        self.info().code
    }

    pub fn info(self) -> PermissionInfo {
        match self {
            Permission::UserList => PermissionInfo {
                code: "user:list",
                name: "List Users",
                description: "View list of users",
                resource: "users",
                action: "list",
            },
            Permission::UserCreate => PermissionInfo {
                code: "user:create",
                name: "Create User",
                description: "Create new users",
                resource: "users",
                action: "create",
            },
            Permission::UserRead => PermissionInfo {
                code: "user:read",
                name: "Read User",
                description: "View user details",
                resource: "users",
                action: "read",
            },
            Permission::UserUpdate => PermissionInfo {
                code: "user:update",
                name: "Update User",
                description: "Update user details",
                resource: "users",
                action: "update",
            },
            Permission::UserDelete => PermissionInfo {
                code: "user:delete",
                name: "Delete User",
                description: "Delete users",
                resource: "users",
                action: "delete",
            },
            Permission::UserActivate => PermissionInfo {
                code: "user:activate",
                name: "Activate User",
                description: "Activate user accounts",
                resource: "users",
                action: "activate",
            },
            Permission::UserDeactivate => PermissionInfo {
                code: "user:deactivate",
                name: "Deactivate User",
                description: "Deactivate user accounts",
                resource: "users",
                action: "deactivate",
            },
            Permission::TeamList => PermissionInfo {
                code: "team:list",
                name: "List Teams",
                description: "View list of teams",
                resource: "teams",
                action: "list",
            },
            Permission::TeamCreate => PermissionInfo {
                code: "team:create",
                name: "Create Team",
                description: "Create new teams",
                resource: "teams",
                action: "create",
            },
            Permission::TeamRead => PermissionInfo {
                code: "team:read",
                name: "Read Team",
                description: "View team details",
                resource: "teams",
                action: "read",
            },
            Permission::TeamUpdate => PermissionInfo {
                code: "team:update",
                name: "Update Team",
                description: "Update team details",
                resource: "teams",
                action: "update",
            },
            Permission::TeamDelete => PermissionInfo {
                code: "team:delete",
                name: "Delete Team",
                description: "Delete teams",
                resource: "teams",
                action: "delete",
            },
            Permission::PatientList => PermissionInfo {
                code: "patient:list",
                name: "List Patients",
                description: "View list of patients",
                resource: "patients",
                action: "list",
            },
            Permission::PatientCreate => PermissionInfo {
                code: "patient:create",
                name: "Create Patient",
                description: "Create new patients",
                resource: "patients",
                action: "create",
            },
            Permission::PatientRead => PermissionInfo {
                code: "patient:read",
                name: "Read Patient",
                description: "View patient details",
                resource: "patients",
                action: "read",
            },
            Permission::PatientUpdate => PermissionInfo {
                code: "patient:update",
                name: "Update Patient",
                description: "Update patient details",
                resource: "patients",
                action: "update",
            },
            Permission::PatientDelete => PermissionInfo {
                code: "patient:delete",
                name: "Delete Patient",
                description: "Delete patients",
                resource: "patients",
                action: "delete",
            },
            Permission::SampleList => PermissionInfo {
                code: "sample:list",
                name: "List Samples",
                description: "View list of samples",
                resource: "samples",
                action: "list",
            },
            Permission::SampleCreate => PermissionInfo {
                code: "sample:create",
                name: "Create Sample",
                description: "Create new samples",
                resource: "samples",
                action: "create",
            },
            Permission::SampleRead => PermissionInfo {
                code: "sample:read",
                name: "Read Sample",
                description: "View sample details",
                resource: "samples",
                action: "read",
            },
            Permission::SampleUpdate => PermissionInfo {
                code: "sample:update",
                name: "Update Sample",
                description: "Update sample details",
                resource: "samples",
                action: "update",
            },
            Permission::SampleDelete => PermissionInfo {
                code: "sample:delete",
                name: "Delete Sample",
                description: "Delete samples",
                resource: "samples",
                action: "delete",
            },
            Permission::BatchList => PermissionInfo {
                code: "batch:list",
                name: "List Batches",
                description: "View list of batches",
                resource: "batches",
                action: "list",
            },
            Permission::BatchCreate => PermissionInfo {
                code: "batch:create",
                name: "Create Batch",
                description: "Create new batches",
                resource: "batches",
                action: "create",
            },
            Permission::BatchRead => PermissionInfo {
                code: "batch:read",
                name: "Read Batch",
                description: "View batch details",
                resource: "batches",
                action: "read",
            },
            Permission::BatchUpdate => PermissionInfo {
                code: "batch:update",
                name: "Update Batch",
                description: "Update batch details",
                resource: "batches",
                action: "update",
            },
            Permission::BatchDelete => PermissionInfo {
                code: "batch:delete",
                name: "Delete Batch",
                description: "Delete batches",
                resource: "batches",
                action: "delete",
            },
            Permission::SettingsManage => PermissionInfo {
                code: "settings:manage",
                name: "Manage Settings",
                description: "Manage system settings",
                resource: "settings",
                action: "manage",
            },
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|perm| perm.as_str() == value)
            .ok_or_else(|| AuthzError::UnknownPermission(value.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
