//! Role routing: dashboard roots and navigation menus per role

use crate::user::Role;
use crate::AuthResult;
use serde::Serialize;

/// Where unauthenticated users and logouts land
pub const LOGIN_ROUTE: &str = "/login";

/// Paths reachable without a session or by any role
pub const PUBLIC_ROUTES: &[&str] = &["/", "/login", "/about", "/contact"];

/// One entry of a dashboard navigation menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn item(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

const ADMIN_NAV: &[NavItem] = &[
    item("Dashboard", "/admin"),
    item("Departments", "/admin/departments"),
    item("Faculty", "/admin/faculty"),
    item("Students", "/admin/students"),
    item("Courses", "/admin/courses"),
    item("Reports", "/admin/reports"),
    item("Settings", "/admin/settings"),
];

const HOD_NAV: &[NavItem] = &[
    item("Dashboard", "/hod"),
    item("Faculty", "/hod/faculty"),
    item("Students", "/hod/students"),
    item("Timetable", "/hod/timetable"),
    item("Leave Requests", "/hod/leave-requests"),
    item("Reports", "/hod/reports"),
];

const FACULTY_NAV: &[NavItem] = &[
    item("Dashboard", "/faculty"),
    item("My Courses", "/faculty/courses"),
    item("Attendance", "/faculty/attendance"),
    item("Assignments", "/faculty/assignments"),
    item("Timetable", "/faculty/timetable"),
    item("Profile", "/faculty/profile"),
];

/// Dashboard root for a role
pub fn landing_route_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Hod => "/hod",
        Role::Faculty => "/faculty",
    }
}

/// Dashboard root for a role given as text.
///
/// Anything outside the known roles is a data-integrity bug and fails with
/// `UnknownRole` instead of falling back to some default dashboard.
pub fn landing_route_for_str(role: &str) -> AuthResult<&'static str> {
    Ok(landing_route_for(role.parse()?))
}

/// Navigation menu for a role, in display order
pub fn nav_items(role: Role) -> &'static [NavItem] {
    match role {
        Role::Admin => ADMIN_NAV,
        Role::Hod => HOD_NAV,
        Role::Faculty => FACULTY_NAV,
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path)
}

/// Layout-level gate: a role stays inside its own dashboard tree
pub fn can_access(role: Role, path: &str) -> bool {
    if is_public(path) {
        return true;
    }
    let root = landing_route_for(role);
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}
