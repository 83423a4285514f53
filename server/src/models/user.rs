use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const UNKNOWN_USER: &str = "Unknown User";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub approval_status: Option<String>,
}

impl Profile {
    pub fn approval(&self) -> ApprovalStatus {
        ApprovalStatus::from_column(self.approval_status.as_deref())
    }
}

/// Name printed on a QR payload: full name, then email, then a placeholder.
pub fn display_name(profile: Option<&Profile>) -> String {
    let non_blank = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    profile
        .and_then(|p| non_blank(&p.full_name).or_else(|| non_blank(&p.email)))
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}

/// Role tags. Declaration order is badge precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Dj,
    Photographer,
    Performer,
    Vip,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Dj => "dj",
            Role::Photographer => "photographer",
            Role::Performer => "performer",
            Role::Vip => "vip",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "dj" => Ok(Role::Dj),
            "photographer" => Ok(Role::Photographer),
            "performer" => Ok(Role::Performer),
            "vip" => Ok(Role::Vip),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The roles a user holds. `user` is implicit and always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set: BTreeSet<Role> = roles.into_iter().collect();
        set.insert(Role::User);
        Self(set)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Roles to show as badges: everything held, minus the implicit `user`
    /// whenever something else is present.
    pub fn badges(&self) -> Vec<Role> {
        let explicit: Vec<Role> = self.iter().filter(|r| *r != Role::User).collect();
        if explicit.is_empty() {
            vec![Role::User]
        } else {
            explicit
        }
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::new([])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Unset,
}

impl ApprovalStatus {
    /// Unrecognised column values are treated like a missing one.
    pub fn from_column(raw: Option<&str>) -> Self {
        match raw {
            Some("pending") => ApprovalStatus::Pending,
            Some("approved") => ApprovalStatus::Approved,
            Some("rejected") => ApprovalStatus::Rejected,
            _ => ApprovalStatus::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(full_name: Option<&str>, email: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            full_name: full_name.map(str::to_string),
            approval_status: None,
        }
    }

    #[test]
    fn test_display_name_fallback_order() {
        let both = profile(Some("Ada Lovelace"), Some("ada@example.com"));
        assert_eq!(display_name(Some(&both)), "Ada Lovelace");

        let email_only = profile(Some("  "), Some("ada@example.com"));
        assert_eq!(display_name(Some(&email_only)), "ada@example.com");

        let neither = profile(None, None);
        assert_eq!(display_name(Some(&neither)), "Unknown User");
        assert_eq!(display_name(None), "Unknown User");
    }

    #[test]
    fn test_badges_suppress_implicit_user() {
        let admin = RoleSet::new([Role::Admin, Role::User]);
        assert_eq!(admin.badges(), vec![Role::Admin]);

        let plain = RoleSet::new([Role::User]);
        assert_eq!(plain.badges(), vec![Role::User]);

        let multi = RoleSet::new([Role::Vip, Role::Dj]);
        assert_eq!(multi.badges(), vec![Role::Dj, Role::Vip]);
    }

    #[test]
    fn test_role_parsing_is_closed() {
        assert_eq!("photographer".parse::<Role>().unwrap(), Role::Photographer);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_approval_from_column() {
        assert_eq!(ApprovalStatus::from_column(Some("approved")), ApprovalStatus::Approved);
        assert_eq!(ApprovalStatus::from_column(Some("rejected")), ApprovalStatus::Rejected);
        assert_eq!(ApprovalStatus::from_column(None), ApprovalStatus::Unset);
        assert_eq!(ApprovalStatus::from_column(Some("banana")), ApprovalStatus::Unset);
    }
}
