//! Persistence contracts consumed by the token authority and the request handlers.
//!
//! Each entity gets its own trait so the auth core only sees users and sessions.
//! `Gateway` bundles them for the handler layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Franchise, FranchiseDetail, MenuItem, MenuItemUpdate, NewFranchise, NewMenuItem, NewOrder, NewStore,
    NewUser, Order, Store, User, UserRecord, UserUpdate,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user and its role grants. Duplicate email yields `Conflict`.
    async fn add_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Applies the present fields. Unknown id yields `NotFound`, a taken email `Conflict`.
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, DatabaseError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(
        &self,
        token_hash: &str,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    async fn session_exists(&self, token_hash: &str) -> Result<bool, DatabaseError>;

    /// Returns whether a row was removed.
    async fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError>;

    /// Removes sessions issued strictly before `cutoff`, returning how many went away.
    async fn delete_sessions_issued_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait FranchiseRepository: Send + Sync {
    /// Creates the franchise and grants franchisee to each admin. Duplicate name yields `Conflict`.
    async fn create_franchise(&self, franchise: NewFranchise) -> Result<FranchiseDetail, DatabaseError>;

    async fn list_franchises(&self, include_admins: bool) -> Result<Vec<Franchise>, DatabaseError>;

    /// Franchises the user holds a franchisee grant on.
    async fn franchises_for_user(&self, user_id: i64) -> Result<Vec<FranchiseDetail>, DatabaseError>;

    /// Deletes the franchise, its stores and the franchisee grants scoped to it.
    async fn delete_franchise(&self, franchise_id: i64) -> Result<(), DatabaseError>;

    async fn create_store(&self, store: NewStore) -> Result<Store, DatabaseError>;

    async fn delete_store(&self, franchise_id: i64, store_id: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn list_menu(&self) -> Result<Vec<MenuItem>, DatabaseError>;

    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, DatabaseError>;

    async fn update_menu_item(&self, id: i64, update: MenuItemUpdate) -> Result<MenuItem, DatabaseError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores the order and its line items atomically.
    async fn add_order(&self, order: NewOrder) -> Result<Order, DatabaseError>;

    /// One page of a diner's orders, oldest first. Pages start at 1.
    async fn orders_for_diner(&self, diner_id: i64, page: u32, per_page: u32) -> Result<Vec<Order>, DatabaseError>;
}

#[async_trait]
pub trait Gateway:
    UserRepository + SessionRepository + FranchiseRepository + MenuRepository + OrderRepository
{
    async fn health_check(&self) -> Result<(), DatabaseError>;
}

pub(crate) fn page_offset(page: u32, per_page: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(per_page)
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn page_offsets_start_at_one() {
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
    }
}
