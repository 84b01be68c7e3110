//! # Role-Based Access Control
//!
//! Static role → permission model. Three closed roles, a fixed grant table
//! built once at startup, and a total `permits` lookup that answers false
//! for anything it does not recognize.
//!
//! The grant table is deliberately immutable: it is constructed in
//! [`PermissionModel::new`], stored in shared state, and only ever read.
//! There is no runtime path that adds or removes a grant.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Member, Role::Manager, Role::Admin];

    /// Parses a role string. Anything outside the closed set is `None`;
    /// callers must treat that as "no permissions", never as an error.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "member" => Some(Role::Member),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Display label for account pages.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Member => "Customer",
            Role::Manager => "Restaurant Manager",
            Role::Admin => "Administrator",
        }
    }
}

/// Closed set of capability tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewRestaurants,
    ViewMenu,
    AddToCart,
    PlaceOrder,
    ViewOwnOrders,
    ManageRestaurant,
    ManageMenu,
    ViewRestaurantOrders,
    CancelOrder,
    ManageUsers,
    ViewAllOrders,
    SystemSettings,
}

impl Permission {
    pub const ALL: [Permission; 12] = [
        Permission::ViewRestaurants,
        Permission::ViewMenu,
        Permission::AddToCart,
        Permission::PlaceOrder,
        Permission::ViewOwnOrders,
        Permission::ManageRestaurant,
        Permission::ManageMenu,
        Permission::ViewRestaurantOrders,
        Permission::CancelOrder,
        Permission::ManageUsers,
        Permission::ViewAllOrders,
        Permission::SystemSettings,
    ];
}

const MEMBER_GRANTS: &[Permission] = &[
    Permission::ViewRestaurants,
    Permission::ViewMenu,
    Permission::AddToCart,
    Permission::ViewOwnOrders,
];

const MANAGER_GRANTS: &[Permission] = &[
    Permission::ViewRestaurants,
    Permission::ViewMenu,
    Permission::AddToCart,
    Permission::PlaceOrder,
    Permission::ViewOwnOrders,
    Permission::ManageRestaurant,
    Permission::ManageMenu,
    Permission::ViewRestaurantOrders,
    Permission::CancelOrder,
];

const ADMIN_GRANTS: &[Permission] = &[
    Permission::ViewRestaurants,
    Permission::ViewMenu,
    Permission::AddToCart,
    Permission::PlaceOrder,
    Permission::ViewOwnOrders,
    Permission::ManageRestaurant,
    Permission::ManageMenu,
    Permission::ViewRestaurantOrders,
    Permission::ManageUsers,
    Permission::ViewAllOrders,
    Permission::SystemSettings,
    Permission::CancelOrder,
];

/// The fixed role → permission table.
///
/// Built once at process start and shared by reference; every check is a
/// pure lookup with no I/O and no error path. An unknown role maps to the
/// empty set.
pub struct PermissionModel {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionModel {
    pub fn new() -> Self {
        let mut grants = HashMap::new();
        grants.insert(Role::Member, MEMBER_GRANTS.iter().copied().collect());
        grants.insert(Role::Manager, MANAGER_GRANTS.iter().copied().collect());
        grants.insert(Role::Admin, ADMIN_GRANTS.iter().copied().collect());
        Self { grants }
    }

    /// True iff `permission` is granted to `role`. Total over arbitrary
    /// role strings; unrecognized roles are denied everything.
    pub fn permits(&self, role: &str, permission: Permission) -> bool {
        let Some(role) = Role::parse(role) else {
            return false;
        };
        self.grants
            .get(&role)
            .is_some_and(|set| set.contains(&permission))
    }

    pub fn can_view_restaurants(&self, role: &str) -> bool {
        self.permits(role, Permission::ViewRestaurants)
    }

    pub fn can_view_menu(&self, role: &str) -> bool {
        self.permits(role, Permission::ViewMenu)
    }

    pub fn can_add_to_cart(&self, role: &str) -> bool {
        self.permits(role, Permission::AddToCart)
    }

    /// Placing an order and reaching checkout are the same capability.
    pub fn can_place_order(&self, role: &str) -> bool {
        self.permits(role, Permission::PlaceOrder)
    }

    pub fn can_cancel_order(&self, role: &str) -> bool {
        self.permits(role, Permission::CancelOrder)
    }

    pub fn can_manage_restaurant(&self, role: &str) -> bool {
        self.permits(role, Permission::ManageRestaurant)
    }

    pub fn can_manage_menu(&self, role: &str) -> bool {
        self.permits(role, Permission::ManageMenu)
    }

    /// True for managers and admins only.
    pub fn has_elevated_role(&self, role: &str) -> bool {
        matches!(Role::parse(role), Some(Role::Manager | Role::Admin))
    }
}

impl Default for PermissionModel {
    fn default() -> Self {
        Self::new()
    }
}
