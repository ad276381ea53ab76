//! Route table and redirect decisions

use serde::Serialize;

use super::SessionStatus;
use crate::value_objects::Permissions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Public,
    /// Any signed-in member with a complete profile
    Protected,
    /// Needs `permission`; stealth routes never reveal that they exist
    Privileged {
        permission: Permissions,
        stealth: bool,
    },
}

/// Portal routes by path prefix
pub const PORTAL_ROUTES: &[(&str, RouteKind)] = &[
    ("/", RouteKind::Public),
    ("/about", RouteKind::Public),
    ("/login", RouteKind::Public),
    ("/signup", RouteKind::Public),
    ("/forgot-password", RouteKind::Public),
    ("/reset-password", RouteKind::Public),
    ("/confirm-email", RouteKind::Public),
    ("/profile-setup", RouteKind::Public),
    ("/access-denied", RouteKind::Public),
    ("/dashboard", RouteKind::Protected),
    ("/contributions", RouteKind::Protected),
    ("/payments", RouteKind::Protected),
    ("/announcements", RouteKind::Protected),
    ("/profile", RouteKind::Protected),
    ("/members", RouteKind::Privileged {
        permission: Permissions::VIEW_MEMBERS,
        stealth: false,
    }),
    ("/reports", RouteKind::Privileged {
        permission: Permissions::VIEW_FINANCIAL_REPORTS,
        stealth: false,
    }),
    ("/welfare/manage", RouteKind::Privileged {
        permission: Permissions::MANAGE_WELFARE,
        stealth: false,
    }),
    ("/treasurer", RouteKind::Privileged {
        permission: Permissions::MANAGE_PAYMENTS,
        stealth: true,
    }),
    ("/secretary", RouteKind::Privileged {
        permission: Permissions::MANAGE_MEMBERS,
        stealth: true,
    }),
    ("/chairperson", RouteKind::Privileged {
        permission: Permissions::MANAGE_WELFARE,
        stealth: true,
    }),
    ("/admin", RouteKind::Privileged {
        permission: Permissions::MANAGE_ROLES,
        stealth: true,
    }),
    ("/admin/audit-log", RouteKind::Privileged {
        permission: Permissions::VIEW_AUDIT_LOG,
        stealth: true,
    }),
];

pub const LOGIN_PATH: &str = "/login";
pub const CONFIRM_EMAIL_PATH: &str = "/confirm-email";
pub const PROFILE_SETUP_PATH: &str = "/profile-setup";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session state not known yet
    Wait,
    Render,
    Redirect { to: String },
}

impl GuardDecision {
    fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect { to: to.into() }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Longest matching prefix wins; unknown paths are protected
pub fn route_kind(path: &str) -> RouteKind {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    PORTAL_ROUTES
        .iter()
        .filter(|(prefix, _)| matches_prefix(path, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map_or(RouteKind::Protected, |(_, kind)| *kind)
}

/// Decide whether `path` renders for a session in `status` holding `permissions`
pub fn guard(status: SessionStatus, permissions: Permissions, path: &str) -> GuardDecision {
    let kind = route_kind(path);
    if kind == RouteKind::Public {
        return GuardDecision::Render;
    }
    let stealth = matches!(kind, RouteKind::Privileged { stealth: true, .. });

    match status {
        SessionStatus::Checking => GuardDecision::Wait,
        SessionStatus::SignedOut if stealth => GuardDecision::redirect(LOGIN_PATH),
        SessionStatus::SignedOut => {
            let target: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
            GuardDecision::redirect(format!("{LOGIN_PATH}?redirect={target}"))
        }
        SessionStatus::NeedsEmailVerification => GuardDecision::redirect(CONFIRM_EMAIL_PATH),
        SessionStatus::NeedsProfile => GuardDecision::redirect(PROFILE_SETUP_PATH),
        SessionStatus::Ready => match kind {
            RouteKind::Privileged { permission, .. } if !permissions.contains(permission) => {
                if stealth {
                    GuardDecision::redirect(DASHBOARD_PATH)
                } else {
                    GuardDecision::redirect(ACCESS_DENIED_PATH)
                }
            }
            _ => GuardDecision::Render,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::RoleSet;
    use crate::value_objects::MemberRole;

    fn member() -> Permissions {
        RoleSet::new().with(MemberRole::Member).permissions()
    }

    #[test]
    fn test_route_kind_longest_prefix() {
        assert_eq!(route_kind("/"), RouteKind::Public);
        assert_eq!(route_kind("/dashboard/"), RouteKind::Protected);
        assert_eq!(
            route_kind("/admin/audit-log?page=2"),
            RouteKind::Privileged {
                permission: Permissions::VIEW_AUDIT_LOG,
                stealth: true
            }
        );
        assert_eq!(
            route_kind("/admin/users"),
            RouteKind::Privileged {
                permission: Permissions::MANAGE_ROLES,
                stealth: true
            }
        );
        // prefix must end on a segment boundary
        assert_eq!(route_kind("/administrators"), RouteKind::Protected);
        assert_eq!(route_kind("/somewhere-new"), RouteKind::Protected);
    }

    #[test]
    fn test_public_routes_always_render() {
        assert_eq!(
            guard(SessionStatus::Checking, Permissions::empty(), "/login"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_checking_waits() {
        assert_eq!(
            guard(SessionStatus::Checking, Permissions::empty(), "/dashboard"),
            GuardDecision::Wait
        );
    }

    #[test]
    fn test_signed_out_keeps_target_for_ordinary_routes() {
        assert_eq!(
            guard(SessionStatus::SignedOut, Permissions::empty(), "/contributions/2026"),
            GuardDecision::Redirect {
                to: "/login?redirect=%2Fcontributions%2F2026".into()
            }
        );
    }

    #[test]
    fn test_signed_out_hides_stealth_target() {
        assert_eq!(
            guard(SessionStatus::SignedOut, Permissions::empty(), "/treasurer/approvals"),
            GuardDecision::Redirect { to: "/login".into() }
        );
    }

    #[test]
    fn test_recovery_pages() {
        assert_eq!(
            guard(SessionStatus::NeedsEmailVerification, member(), "/dashboard"),
            GuardDecision::Redirect {
                to: "/confirm-email".into()
            }
        );
        assert_eq!(
            guard(SessionStatus::NeedsProfile, member(), "/dashboard"),
            GuardDecision::Redirect {
                to: "/profile-setup".into()
            }
        );
    }

    #[test]
    fn test_denied_stealth_route_looks_like_dashboard_redirect() {
        assert_eq!(
            guard(SessionStatus::Ready, member(), "/admin"),
            GuardDecision::Redirect {
                to: "/dashboard".into()
            }
        );
        assert_eq!(
            guard(SessionStatus::Ready, member(), "/reports"),
            GuardDecision::Redirect {
                to: "/access-denied".into()
            }
        );
    }

    #[test]
    fn test_ready_with_permission_renders() {
        let treasurer = RoleSet::new().with(MemberRole::Treasurer).permissions();
        assert_eq!(
            guard(SessionStatus::Ready, treasurer, "/treasurer"),
            GuardDecision::Render
        );
        assert_eq!(
            guard(SessionStatus::Ready, member(), "/dashboard"),
            GuardDecision::Render
        );
    }
}
