//! Static role to permission table.
//!
//! # Purpose
//! Answers "does role R hold permission P" from a table built once and never
//! mutated afterwards.
//!
//! # Key invariants
//! - Admin satisfies every permission check, including codes absent from its
//!   configured set and codes outside the catalogue.
//! - [`permissions_for`] returns the same reference for the process lifetime.
//! - Lookups take no locks; the table is initialized through a `OnceLock`.
use crate::permission::Permission;
use crate::types::Role;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

static TABLE: OnceLock<HashMap<Role, HashSet<Permission>>> = OnceLock::new();

const DOCTOR: &[Permission] = &[
    Permission::UserRead,
    Permission::TeamList,
    Permission::TeamRead,
    Permission::PatientList,
    Permission::PatientCreate,
    Permission::PatientRead,
    Permission::PatientUpdate,
    Permission::SampleList,
    Permission::SampleCreate,
    Permission::SampleRead,
    Permission::SampleUpdate,
    Permission::BatchList,
    Permission::BatchRead,
];

const ANALYST: &[Permission] = &[
    Permission::UserRead,
    Permission::TeamList,
    Permission::TeamRead,
    Permission::PatientList,
    Permission::PatientRead,
    Permission::SampleList,
    Permission::SampleRead,
    Permission::SampleUpdate,
    Permission::BatchList,
    Permission::BatchCreate,
    Permission::BatchRead,
    Permission::BatchUpdate,
];

const VIEWER: &[Permission] = &[
    Permission::UserRead,
    Permission::TeamList,
    Permission::TeamRead,
    Permission::PatientList,
    Permission::PatientRead,
    Permission::SampleList,
    Permission::SampleRead,
    Permission::BatchList,
    Permission::BatchRead,
];

fn table() -> &'static HashMap<Role, HashSet<Permission>> {
    TABLE.get_or_init(|| {
        let mut table = HashMap::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let granted: HashSet<Permission> = match role {
                Role::Admin => Permission::ALL.into_iter().collect(),
                Role::Doctor => DOCTOR.iter().copied().collect(),
                Role::Analyst => ANALYST.iter().copied().collect(),
                Role::Viewer => VIEWER.iter().copied().collect(),
            };
            table.insert(role, granted);
        }
        table
    })
}

/// Configured permission set of `role`.
pub fn permissions_for(role: Role) -> &'static HashSet<Permission> {
    // Every Role variant is inserted at initialization.
    &table()[&role]
}

pub fn role_has(role: Role, permission: Permission) -> bool {
    role.is_admin() || permissions_for(role).contains(&permission)
}

/// Like [`role_has`] but for a raw code. Unknown codes are only satisfied by Admin.
pub fn role_has_code(role: Role, code: &str) -> bool {
    if role.is_admin() {
        return true;
    }
    code.parse::<Permission>()
        .map(|permission| role_has(role, permission))
        .unwrap_or(false)
}

/// True if `role` holds at least one of `required`. An empty list is never satisfied,
/// except by Admin.
pub fn role_has_any(role: Role, required: &[Permission]) -> bool {
    role.is_admin() || required.iter().any(|perm| role_has(role, *perm))
}

/// True if `role` holds every permission in `required`. Stops at the first miss.
pub fn role_has_all(role: Role, required: &[Permission]) -> bool {
    role.is_admin() || required.iter().all(|perm| role_has(role, *perm))
}

/// Sorted permission set of `role`, for listing endpoints.
pub fn sorted_permissions(role: Role) -> Vec<Permission> {
    let mut perms: Vec<Permission> = permissions_for(role).iter().copied().collect();
    perms.sort();
    perms
}
