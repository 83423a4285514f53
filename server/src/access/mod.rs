//! Read-and-branch gate over a user's approval status and roles. Nothing
//! here changes state; approvals and role grants happen elsewhere.

use serde::Serialize;

use crate::models::{ApprovalStatus, Role, RoleSet};

/// The top-level screen a user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateView {
    PendingApproval,
    Rejected,
    Content,
}

/// Views reserved for particular roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictedView {
    AdminDashboard,
    Moderation,
    ValidationScanner,
}

impl RestrictedView {
    pub const ALL: [RestrictedView; 3] = [
        RestrictedView::AdminDashboard,
        RestrictedView::Moderation,
        RestrictedView::ValidationScanner,
    ];

    pub fn allows(&self, roles: &RoleSet) -> bool {
        match self {
            RestrictedView::AdminDashboard => roles.contains(Role::Admin),
            RestrictedView::Moderation | RestrictedView::ValidationScanner => {
                roles.contains(Role::Admin) || roles.contains(Role::Moderator)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDecision {
    pub view: GateView,
    pub approval: ApprovalStatus,
    pub badges: Vec<Role>,
    /// Restricted views this user may open. Empty unless `view` is `Content`.
    pub views: Vec<RestrictedView>,
}

impl AccessDecision {
    pub fn can_open(&self, view: RestrictedView) -> bool {
        self.views.contains(&view)
    }
}

pub fn gate_view(approval: ApprovalStatus) -> GateView {
    match approval {
        ApprovalStatus::Approved => GateView::Content,
        ApprovalStatus::Rejected => GateView::Rejected,
        ApprovalStatus::Pending | ApprovalStatus::Unset => GateView::PendingApproval,
    }
}

pub fn evaluate_access(roles: &RoleSet, approval: ApprovalStatus) -> AccessDecision {
    let view = gate_view(approval);
    let views = match view {
        GateView::Content => RestrictedView::ALL
            .into_iter()
            .filter(|v| v.allows(roles))
            .collect(),
        GateView::PendingApproval | GateView::Rejected => Vec::new(),
    };

    AccessDecision {
        view,
        approval,
        badges: roles.badges(),
        views,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_selects_screen() {
        let roles = RoleSet::default();
        assert_eq!(evaluate_access(&roles, ApprovalStatus::Approved).view, GateView::Content);
        assert_eq!(evaluate_access(&roles, ApprovalStatus::Rejected).view, GateView::Rejected);
        assert_eq!(
            evaluate_access(&roles, ApprovalStatus::Pending).view,
            GateView::PendingApproval
        );
        assert_eq!(
            evaluate_access(&roles, ApprovalStatus::Unset).view,
            GateView::PendingApproval
        );
    }

    #[test]
    fn test_admin_badge_suppresses_user() {
        let decision = evaluate_access(
            &RoleSet::new([Role::Admin, Role::User]),
            ApprovalStatus::Approved,
        );
        assert_eq!(decision.badges, vec![Role::Admin]);

        let decision = evaluate_access(&RoleSet::new([Role::User]), ApprovalStatus::Approved);
        assert_eq!(decision.badges, vec![Role::User]);
    }

    #[test]
    fn test_restricted_views_by_role() {
        let admin = evaluate_access(&RoleSet::new([Role::Admin]), ApprovalStatus::Approved);
        assert!(admin.can_open(RestrictedView::AdminDashboard));
        assert!(admin.can_open(RestrictedView::ValidationScanner));

        let moderator = evaluate_access(&RoleSet::new([Role::Moderator]), ApprovalStatus::Approved);
        assert!(!moderator.can_open(RestrictedView::AdminDashboard));
        assert!(moderator.can_open(RestrictedView::Moderation));

        let dj = evaluate_access(&RoleSet::new([Role::Dj, Role::Vip]), ApprovalStatus::Approved);
        assert!(dj.views.is_empty());
    }

    #[test]
    fn test_unapproved_admin_sees_no_restricted_views() {
        let decision = evaluate_access(&RoleSet::new([Role::Admin]), ApprovalStatus::Pending);
        assert_eq!(decision.view, GateView::PendingApproval);
        assert!(decision.views.is_empty());
        assert_eq!(decision.badges, vec![Role::Admin]);
    }
}
