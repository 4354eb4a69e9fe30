use super::claims::Identity;
use super::AuthError;

/// Operations that are subject to a role check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateFranchise,
    DeleteFranchise,
    CreateStore,
    DeleteStore,
    CreateMenuItem,
    UpdateMenuItem,
    ReadMenu,
    ReadFranchises,
    ReadUserFranchises,
    CreateOrder,
    ReadOrders,
    UpdateUser,
}

/// The object an action targets, where that matters for ownership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceContext {
    pub franchise_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl ResourceContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn franchise(franchise_id: i64) -> Self {
        Self {
            franchise_id: Some(franchise_id),
            user_id: None,
        }
    }

    pub fn user(user_id: i64) -> Self {
        Self {
            franchise_id: None,
            user_id: Some(user_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allowed
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied => Err(AuthError::Forbidden),
        }
    }
}

/// Decides whether `identity` may perform `action` on `resource`. First matching rule wins.
pub fn authorize(identity: Option<&Identity>, action: Action, resource: &ResourceContext) -> Decision {
    let Some(identity) = identity else {
        return match action {
            Action::ReadMenu => Decision::Allowed,
            _ => Decision::Denied,
        };
    };

    if identity.is_admin() {
        return Decision::Allowed;
    }

    let allowed = match action {
        Action::CreateStore | Action::DeleteStore | Action::DeleteFranchise => resource
            .franchise_id
            .is_some_and(|franchise_id| identity.is_franchisee_of(franchise_id)),
        Action::CreateMenuItem | Action::UpdateMenuItem => false,
        Action::CreateOrder | Action::ReadOrders | Action::ReadFranchises | Action::ReadMenu => true,
        Action::UpdateUser | Action::ReadUserFranchises => resource.user_id == Some(identity.user_id),
        Action::CreateFranchise => false,
    };

    if allowed {
        Decision::Allowed
    } else {
        Decision::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::RoleGrant;

    const ALL_ACTIONS: [Action; 12] = [
        Action::CreateFranchise,
        Action::DeleteFranchise,
        Action::CreateStore,
        Action::DeleteStore,
        Action::CreateMenuItem,
        Action::UpdateMenuItem,
        Action::ReadMenu,
        Action::ReadFranchises,
        Action::ReadUserFranchises,
        Action::CreateOrder,
        Action::ReadOrders,
        Action::UpdateUser,
    ];

    fn identity(user_id: i64, roles: Vec<RoleGrant>) -> Identity {
        Identity {
            user_id,
            name: format!("user {}", user_id),
            email: format!("{}@jwt.com", user_id),
            roles,
        }
    }

    #[test]
    fn admin_is_allowed_everything() {
        let admin = identity(1, vec![RoleGrant::admin()]);
        for action in ALL_ACTIONS {
            assert!(authorize(Some(&admin), action, &ResourceContext::franchise(99)).is_allowed());
            assert!(authorize(Some(&admin), action, &ResourceContext::user(42)).is_allowed());
        }
    }

    #[test]
    fn only_admin_creates_franchises() {
        let non_admins = [
            identity(2, vec![RoleGrant::diner()]),
            identity(3, vec![RoleGrant::franchisee(7)]),
            identity(4, vec![RoleGrant::diner(), RoleGrant::franchisee(1), RoleGrant::franchisee(2)]),
            identity(5, vec![]),
        ];
        for who in &non_admins {
            let decision = authorize(Some(who), Action::CreateFranchise, &ResourceContext::none());
            assert_eq!(decision, Decision::Denied);
        }
        assert_eq!(
            authorize(None, Action::CreateFranchise, &ResourceContext::none()),
            Decision::Denied
        );
    }

    #[test]
    fn franchisee_is_scoped_to_its_franchise() {
        let franchisee = identity(3, vec![RoleGrant::diner(), RoleGrant::franchisee(7)]);
        for action in [Action::CreateStore, Action::DeleteStore, Action::DeleteFranchise] {
            assert!(authorize(Some(&franchisee), action, &ResourceContext::franchise(7)).is_allowed());
            assert!(!authorize(Some(&franchisee), action, &ResourceContext::franchise(8)).is_allowed());
            assert!(!authorize(Some(&franchisee), action, &ResourceContext::none()).is_allowed());
        }
    }

    #[test]
    fn menu_mutation_is_admin_only() {
        let diner = identity(2, vec![RoleGrant::diner()]);
        let franchisee = identity(3, vec![RoleGrant::franchisee(7)]);
        for action in [Action::CreateMenuItem, Action::UpdateMenuItem] {
            assert!(!authorize(Some(&diner), action, &ResourceContext::none()).is_allowed());
            assert!(!authorize(Some(&franchisee), action, &ResourceContext::franchise(7)).is_allowed());
        }
    }

    #[test]
    fn any_authenticated_identity_may_order_and_browse() {
        let diner = identity(2, vec![RoleGrant::diner()]);
        for action in [Action::CreateOrder, Action::ReadOrders, Action::ReadFranchises, Action::ReadMenu] {
            assert!(authorize(Some(&diner), action, &ResourceContext::none()).is_allowed());
        }
    }

    #[test]
    fn anonymous_callers_may_only_read_the_menu() {
        for action in ALL_ACTIONS {
            let expected = if action == Action::ReadMenu {
                Decision::Allowed
            } else {
                Decision::Denied
            };
            assert_eq!(authorize(None, action, &ResourceContext::none()), expected);
        }
    }

    #[test]
    fn user_actions_are_owner_scoped() {
        let diner = identity(2, vec![RoleGrant::diner()]);
        for action in [Action::UpdateUser, Action::ReadUserFranchises] {
            assert!(authorize(Some(&diner), action, &ResourceContext::user(2)).is_allowed());
            assert!(!authorize(Some(&diner), action, &ResourceContext::user(3)).is_allowed());
        }
    }

    #[test]
    fn denied_maps_to_forbidden() {
        assert!(Decision::Allowed.into_result().is_ok());
        assert!(matches!(Decision::Denied.into_result(), Err(AuthError::Forbidden)));
    }
}
