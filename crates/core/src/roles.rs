//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_organisation.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DEAN: &str = "dean";
pub const ROLE_DEPARTMENT_HEAD: &str = "department_head";
pub const ROLE_EMPLOYEE: &str = "employee";
pub const ROLE_STUDENT: &str = "student";

/// All seeded role names.
pub const ALL_ROLES: &[&str] = &[
    ROLE_ADMIN,
    ROLE_DEAN,
    ROLE_DEPARTMENT_HEAD,
    ROLE_EMPLOYEE,
    ROLE_STUDENT,
];

/// How far a role's approval authority reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScope {
    /// Only requests from the approver's own department.
    Department,
    /// Only requests from the approver's own college.
    College,
    /// Any request.
    Global,
}

/// Scope of approval authority carried by a role.
pub fn scope_of(role: &str) -> RoleScope {
    match role {
        ROLE_DEPARTMENT_HEAD => RoleScope::Department,
        ROLE_DEAN => RoleScope::College,
        _ => RoleScope::Global,
    }
}

/// Whether `role` is one of the seeded role names.
pub fn is_known_role(role: &str) -> bool {
    ALL_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_roles() {
        assert_eq!(scope_of(ROLE_DEPARTMENT_HEAD), RoleScope::Department);
        assert_eq!(scope_of(ROLE_DEAN), RoleScope::College);
        assert_eq!(scope_of(ROLE_ADMIN), RoleScope::Global);
        assert_eq!(scope_of("registrar"), RoleScope::Global);
    }

    #[test]
    fn known_roles() {
        assert!(is_known_role("student"));
        assert!(!is_known_role("superuser"));
    }
}
