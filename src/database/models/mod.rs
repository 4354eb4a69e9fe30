pub mod franchise;
pub mod menu;
pub mod order;
pub mod user;

pub use franchise::{Franchise, FranchiseAdmin, FranchiseDetail, NewFranchise, NewStore, Store, StoreDetail};
pub use menu::{MenuItem, MenuItemUpdate, NewMenuItem};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderPage};
pub use user::{NewUser, Role, RoleGrant, User, UserRecord, UserUpdate};
