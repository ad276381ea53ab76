//! Role/permission evaluation
//!
//! Effective permissions are the union of the direct permissions of every held role and of
//! every role reachable from them through [`MemberRole::inherits`]. Evaluation is pure and
//! synchronous; callers decide what a denial means (hide, redirect or reject).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::value_objects::{MemberRole, Permissions};

/// Deduplicated set of roles held by one member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<MemberRole>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: MemberRole) -> bool {
        self.0.insert(role)
    }

    pub fn with(mut self, role: MemberRole) -> Self {
        self.0.insert(role);
        self
    }

    pub fn contains(&self, role: MemberRole) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MemberRole> + '_ {
        self.0.iter().copied()
    }

    /// Permissions granted by this role set
    pub fn permissions(&self) -> Permissions {
        effective_permissions(self)
    }

    pub fn has_permission(&self, permission: Permissions) -> bool {
        has_permission(self, permission)
    }
}

impl FromIterator<MemberRole> for RoleSet {
    fn from_iter<I: IntoIterator<Item = MemberRole>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a MemberRole;
    type IntoIter = std::collections::btree_set::Iter<'a, MemberRole>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Union of direct permissions over the transitive closure of `roles`.
///
/// A member with no roles is treated as an implicit `member` limited to read-only flags.
pub fn effective_permissions(roles: &RoleSet) -> Permissions {
    if roles.is_empty() {
        return MemberRole::Member.direct_permissions() & Permissions::READ_ONLY;
    }

    let mut visited = BTreeSet::new();
    let mut stack: Vec<MemberRole> = roles.iter().collect();
    let mut granted = Permissions::empty();

    while let Some(role) = stack.pop() {
        if !visited.insert(role) {
            continue;
        }
        granted |= role.direct_permissions();
        stack.extend(role.inherits().iter().copied());
    }

    granted
}

/// Whether `roles` grant every flag in `permission`
#[inline]
pub fn has_permission(roles: &RoleSet, permission: Permissions) -> bool {
    effective_permissions(roles).contains(permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(list: &[MemberRole]) -> RoleSet {
        list.iter().copied().collect()
    }

    #[test]
    fn test_secretary_cannot_manage_payments() {
        let set = roles(&[MemberRole::Secretary]);
        assert!(!has_permission(&set, Permissions::MANAGE_PAYMENTS));
        assert!(has_permission(&set, Permissions::MANAGE_MEMBERS));
    }

    #[test]
    fn test_vice_secretary_inherits_secretary_and_member() {
        let set = roles(&[MemberRole::ViceSecretary]);
        let perms = effective_permissions(&set);
        assert!(perms.contains(MemberRole::Secretary.direct_permissions()));
        assert!(perms.contains(MemberRole::Member.direct_permissions()));
        assert!(!perms.contains(Permissions::APPROVE_PAYMENTS));
    }

    #[test]
    fn test_admin_has_everything() {
        assert_eq!(
            effective_permissions(&roles(&[MemberRole::Admin])),
            Permissions::all()
        );
    }

    #[test]
    fn test_treasurer_reaches_member_through_committee() {
        let perms = effective_permissions(&roles(&[MemberRole::Treasurer]));
        assert!(perms.contains(Permissions::APPROVE_PAYMENTS));
        assert!(perms.contains(Permissions::VIEW_MEMBERS));
        assert!(perms.contains(Permissions::MAKE_PAYMENTS));
    }

    #[test]
    fn test_no_roles_is_read_only_member() {
        let perms = effective_permissions(&RoleSet::new());
        assert!(perms.contains(Permissions::VIEW_DASHBOARD));
        assert!(perms.contains(Permissions::VIEW_OWN_CONTRIBUTIONS));
        assert!(!perms.contains(Permissions::MAKE_PAYMENTS));
        assert!(!perms.intersects(
            Permissions::MANAGE_MEMBERS | Permissions::MANAGE_ROLES | Permissions::MANAGE_PAYMENTS
        ));
    }

    #[test]
    fn test_monotonic_over_all_role_subsets() {
        // Every subset of roles, extended by every extra role, keeps all granted flags
        let all = MemberRole::ALL;
        for mask in 0u32..(1 << all.len()) {
            let base: RoleSet = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, r)| *r)
                .collect();
            let before = effective_permissions(&base);
            for extra in all {
                let after = effective_permissions(&base.clone().with(extra));
                assert!(
                    after.contains(before),
                    "adding {extra} to {base:?} removed permissions"
                );
            }
        }
    }

    #[test]
    fn test_role_set_deduplicates() {
        let mut set = RoleSet::new();
        assert!(set.insert(MemberRole::Patron));
        assert!(!set.insert(MemberRole::Patron));
        assert_eq!(set.len(), 1);
    }
}
