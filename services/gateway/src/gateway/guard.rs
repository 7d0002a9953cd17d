//! Declarative per-route-group access requirements.
//!
//! # Purpose
//! A [`RouteGuard`] states what a route group demands of the authenticated
//! principal. The `authorize` middleware evaluates it after `authenticate`
//! has attached a [`Principal`].
//!
//! # Key invariants
//! - Role sets and permission sets are independent mechanisms. Admin bypasses
//!   permission checks, but passes a role check only when `Role::Admin` is in
//!   the allowed set.
//! - The owner escape hatch applies only to guards that declare it through
//!   [`RouteGuard::or_owner`], and compares against a path parameter, never a
//!   client-supplied header or body field.
//!
//! # Examples
//! ```rust
//! use gateway::gateway::guard::RouteGuard;
//! use labgate_authz::{Permission, Role};
//!
//! let admins = RouteGuard::roles(&[Role::Admin]);
//! let deleters = RouteGuard::any_permission(&[Permission::UserDelete]);
//! let profile = RouteGuard::any_permission(&[Permission::UserUpdate]).or_owner("user_id");
//! # let _ = (admins, deleters, profile);
//! ```
use crate::gateway::principal::Principal;
use crate::gateway::rejection::Rejection;
use labgate_authz::{Permission, Role, role_has_all, role_has_any};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any valid access token.
    Authenticated,
    /// Role must be one of these. Admin gets no implicit pass.
    Roles(&'static [Role]),
    /// At least one of these permissions, or Admin.
    AnyPermission(&'static [Permission]),
    /// Every one of these permissions, or Admin.
    AllPermissions(&'static [Permission]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    requirement: Requirement,
    owner_param: Option<&'static str>,
}

impl RouteGuard {
    pub fn authenticated() -> Self {
        Self::new(Requirement::Authenticated)
    }

    pub fn roles(roles: &'static [Role]) -> Self {
        Self::new(Requirement::Roles(roles))
    }

    pub fn any_permission(permissions: &'static [Permission]) -> Self {
        Self::new(Requirement::AnyPermission(permissions))
    }

    pub fn all_permissions(permissions: &'static [Permission]) -> Self {
        Self::new(Requirement::AllPermissions(permissions))
    }

    /// Also admit the principal whose subject id equals path parameter `param`.
    pub fn or_owner(mut self, param: &'static str) -> Self {
        self.owner_param = Some(param);
        self
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn owner_param(&self) -> Option<&'static str> {
        self.owner_param
    }

    /// Decide whether `principal` may proceed. `owner` is the value of the
    /// declared owner path parameter, if the route has one.
    pub fn evaluate(&self, principal: &Principal, owner: Option<&str>) -> Result<(), Rejection> {
        let outcome = match self.requirement {
            Requirement::Authenticated => Ok(()),
            Requirement::Roles(roles) => {
                if roles.contains(&principal.role) {
                    Ok(())
                } else {
                    Err(Rejection::InsufficientRole)
                }
            }
            Requirement::AnyPermission(required) => {
                if role_has_any(principal.role, required) {
                    Ok(())
                } else {
                    Err(Rejection::InsufficientPermission)
                }
            }
            Requirement::AllPermissions(required) => {
                if role_has_all(principal.role, required) {
                    Ok(())
                } else {
                    Err(Rejection::InsufficientPermission)
                }
            }
        };

        match (outcome, self.owner_param, owner) {
            (Err(_), Some(_), Some(owner)) if principal.owns(owner) => Ok(()),
            (outcome, _, _) => outcome,
        }
    }

    fn new(requirement: Requirement) -> Self {
        Self {
            requirement,
            owner_param: None,
        }
    }
}
