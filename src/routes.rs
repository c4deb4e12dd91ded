/// Dashboard base path for unrecognized roles.
///
/// Fail-open: an unknown or misconfigured role lands on the generic
/// dashboard instead of erroring. Whether this should fail closed instead
/// is an open product question; the policy lives in this one constant.
pub const DEFAULT_DASHBOARD: &str = "/dashboard";

/// Routes reachable without a session. The 401 handler only redirects when
/// the current view is not already one of these.
pub const PUBLIC_ROUTES: &[&str] = &["/login", "/forgot-password", "/reset-password"];

/// Resolves a role or department identifier to its dashboard base path.
///
/// Pure function over a central table. Matching normalizes case,
/// whitespace, and hyphenation so "Lead Qualifier", "lead-qualifier" and
/// "LEAD QUALIFIER" resolve alike.
pub fn resolve_dashboard_path(role_or_department: &str) -> &'static str {
    match normalize(role_or_department).as_str() {
        "super admin" | "superadmin" | "admin" => "/super-admin",
        "lead qualifier" | "leadqualifier" | "qualifier" => "/lead-qualifier",
        "data miner" | "dataminer" | "miner" => "/data-miner",
        "verifier" => "/verifier",
        "manager" => "/manager",
        _ => DEFAULT_DASHBOARD,
    }
}

/// Route guard: `true` when `role` satisfies the requirement list.
///
/// An empty list means "no restriction"; otherwise exact membership.
pub fn has_required_role(role: &str, required_roles: &[&str]) -> bool {
    required_roles.is_empty() || required_roles.contains(&role)
}

/// Returns `true` for routes accessible without authentication.
pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path)
}

fn normalize(identifier: &str) -> String {
    identifier
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_roles_resolve() {
        assert_eq!(resolve_dashboard_path("Super Admin"), "/super-admin");
        assert_eq!(resolve_dashboard_path("Lead Qualifier"), "/lead-qualifier");
        assert_eq!(resolve_dashboard_path("Data Miner"), "/data-miner");
        assert_eq!(resolve_dashboard_path("Verifier"), "/verifier");
        assert_eq!(resolve_dashboard_path("Manager"), "/manager");
    }

    #[test]
    fn test_role_variants_resolve_alike() {
        assert_eq!(resolve_dashboard_path("lead-qualifier"), "/lead-qualifier");
        assert_eq!(resolve_dashboard_path("LEAD QUALIFIER"), "/lead-qualifier");
        assert_eq!(resolve_dashboard_path("  data_miner "), "/data-miner");
        assert_eq!(resolve_dashboard_path("superadmin"), "/super-admin");
    }

    #[test]
    fn test_unknown_role_falls_back_to_default() {
        assert_eq!(resolve_dashboard_path("unknown-role-xyz"), DEFAULT_DASHBOARD);
        assert_eq!(resolve_dashboard_path(""), DEFAULT_DASHBOARD);
    }

    #[test]
    fn test_empty_requirement_allows_all() {
        assert!(has_required_role("Manager", &[]));
        assert!(has_required_role("", &[]));
    }

    #[test]
    fn test_requirement_is_exact_membership() {
        assert!(has_required_role("Manager", &["Manager", "Super Admin"]));
        assert!(!has_required_role("manager", &["Manager"]));
        assert!(!has_required_role("Verifier", &["Manager", "Super Admin"]));
    }

    #[test]
    fn test_public_route_table() {
        assert!(is_public_route("/login"));
        assert!(is_public_route("/forgot-password"));
        assert!(!is_public_route("/leads"));
        assert!(!is_public_route("/"));
    }
}
