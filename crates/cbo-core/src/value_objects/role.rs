//! Member roles and the fixed role hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Permissions;

/// Roles a member can hold; a member may hold several at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Chairperson,
    ViceChairperson,
    Secretary,
    ViceSecretary,
    Treasurer,
    OrganizingSecretary,
    CommitteeMember,
    Patron,
    Member,
}

impl MemberRole {
    pub const ALL: [MemberRole; 10] = [
        Self::Admin,
        Self::Chairperson,
        Self::ViceChairperson,
        Self::Secretary,
        Self::ViceSecretary,
        Self::Treasurer,
        Self::OrganizingSecretary,
        Self::CommitteeMember,
        Self::Patron,
        Self::Member,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Chairperson => "chairperson",
            Self::ViceChairperson => "vice_chairperson",
            Self::Secretary => "secretary",
            Self::ViceSecretary => "vice_secretary",
            Self::Treasurer => "treasurer",
            Self::OrganizingSecretary => "organizing_secretary",
            Self::CommitteeMember => "committee_member",
            Self::Patron => "patron",
            Self::Member => "member",
        }
    }

    /// Permissions granted by this role alone, before inheritance
    pub fn direct_permissions(&self) -> Permissions {
        type P = Permissions;
        match self {
            Self::Admin => P::all(),
            Self::Chairperson => {
                P::VIEW_FINANCIAL_REPORTS
                    | P::MANAGE_MEMBERS
                    | P::MANAGE_ANNOUNCEMENTS
                    | P::MANAGE_WELFARE
                    | P::SEND_COMMUNICATIONS
                    | P::VIEW_AUDIT_LOG
            }
            Self::ViceChairperson => {
                P::VIEW_FINANCIAL_REPORTS | P::MANAGE_WELFARE | P::MANAGE_ANNOUNCEMENTS
            }
            Self::Secretary => {
                P::MANAGE_MEMBERS
                    | P::MANAGE_ANNOUNCEMENTS
                    | P::SEND_COMMUNICATIONS
                    | P::MANAGE_MEETINGS
            }
            Self::ViceSecretary => P::MANAGE_ANNOUNCEMENTS,
            Self::Treasurer => {
                P::MANAGE_CONTRIBUTIONS
                    | P::MANAGE_PAYMENTS
                    | P::APPROVE_PAYMENTS
                    | P::VIEW_FINANCIAL_REPORTS
            }
            Self::OrganizingSecretary => {
                P::MANAGE_MEETINGS | P::SEND_COMMUNICATIONS | P::MANAGE_WELFARE
            }
            Self::CommitteeMember => P::VIEW_MEMBERS | P::MANAGE_MEETINGS,
            Self::Patron => P::VIEW_MEMBERS | P::VIEW_FINANCIAL_REPORTS,
            Self::Member => {
                P::VIEW_DASHBOARD
                    | P::VIEW_OWN_CONTRIBUTIONS
                    | P::MAKE_PAYMENTS
                    | P::VIEW_ANNOUNCEMENTS
            }
        }
    }

    /// Subordinate roles whose privileges this role inherits
    pub fn inherits(&self) -> &'static [MemberRole] {
        match self {
            Self::Admin => &[Self::Chairperson],
            Self::Chairperson
            | Self::ViceChairperson
            | Self::Secretary
            | Self::Treasurer
            | Self::OrganizingSecretary => &[Self::CommitteeMember],
            Self::ViceSecretary => &[Self::Secretary, Self::Member],
            Self::CommitteeMember | Self::Patron => &[Self::Member],
            Self::Member => &[],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Chairperson => "Chairperson",
            Self::ViceChairperson => "Vice Chairperson",
            Self::Secretary => "Secretary",
            Self::ViceSecretary => "Vice Secretary",
            Self::Treasurer => "Treasurer",
            Self::OrganizingSecretary => "Organizing Secretary",
            Self::CommitteeMember => "Committee Member",
            Self::Patron => "Patron",
            Self::Member => "Member",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for MemberRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_role() {
        for role in MemberRole::ALL {
            assert_eq!(role.as_str().parse::<MemberRole>().unwrap(), role);
        }
        assert!("overlord".parse::<MemberRole>().is_err());
    }

    #[test]
    fn test_serde_is_snake_case() {
        let json = serde_json::to_string(&MemberRole::ViceSecretary).unwrap();
        assert_eq!(json, "\"vice_secretary\"");
    }

    #[test]
    fn test_hierarchy_is_acyclic() {
        fn depth(role: MemberRole, seen: &mut Vec<MemberRole>) -> usize {
            assert!(!seen.contains(&role), "cycle through {role}");
            seen.push(role);
            let d = role
                .inherits()
                .iter()
                .map(|r| depth(*r, seen) + 1)
                .max()
                .unwrap_or(0);
            seen.pop();
            d
        }
        for role in MemberRole::ALL {
            assert!(depth(role, &mut Vec::new()) < MemberRole::ALL.len());
        }
    }

    #[test]
    fn test_only_treasurer_and_admin_approve_directly() {
        let approvers: Vec<_> = MemberRole::ALL
            .into_iter()
            .filter(|r| r.direct_permissions().contains(Permissions::APPROVE_PAYMENTS))
            .collect();
        assert_eq!(approvers, vec![MemberRole::Admin, MemberRole::Treasurer]);
    }
}
