use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Franchise, FranchiseAdmin, FranchiseDetail, MenuItem, MenuItemUpdate, NewFranchise, NewMenuItem, NewOrder,
    NewStore, NewUser, Order, OrderItem, Role, RoleGrant, Store, StoreDetail, User, UserRecord, UserUpdate,
};
use crate::database::repository::{
    page_offset, FranchiseRepository, Gateway, MenuRepository, OrderRepository, SessionRepository, UserRepository,
};

/// Process-local gateway. All tables sit behind one lock, so every write is atomic.
#[derive(Default)]
pub struct MemoryGateway {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, UserRow>,
    roles: Vec<(i64, RoleGrant)>,
    sessions: HashMap<String, SessionRow>,
    franchises: BTreeMap<i64, String>,
    stores: BTreeMap<i64, Store>,
    menu: BTreeMap<i64, MenuItem>,
    orders: BTreeMap<i64, Order>,
}

struct UserRow {
    name: String,
    email: String,
    password_hash: String,
}

struct SessionRow {
    issued_at: DateTime<Utc>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .iter()
            .any(|(id, row)| row.email == email && Some(*id) != except)
    }

    fn user(&self, id: i64) -> Option<User> {
        self.users.get(&id).map(|row| User {
            id,
            name: row.name.clone(),
            email: row.email.clone(),
            roles: self
                .roles
                .iter()
                .filter(|(user_id, _)| *user_id == id)
                .map(|(_, grant)| grant.clone())
                .collect(),
        })
    }

    fn admins_of(&self, franchise_id: i64) -> Vec<FranchiseAdmin> {
        let mut admins: Vec<FranchiseAdmin> = self
            .roles
            .iter()
            .filter(|(_, grant)| grant.role == Role::Franchisee && grant.object_id == Some(franchise_id))
            .filter_map(|(user_id, _)| {
                self.users.get(user_id).map(|row| FranchiseAdmin {
                    id: *user_id,
                    name: row.name.clone(),
                    email: row.email.clone(),
                })
            })
            .collect();
        admins.sort_by_key(|admin| admin.id);
        admins
    }

    fn stores_of(&self, franchise_id: i64) -> Vec<Store> {
        self.stores
            .values()
            .filter(|store| store.franchise_id == franchise_id)
            .cloned()
            .collect()
    }

    fn detail(&self, franchise_id: i64, name: &str) -> FranchiseDetail {
        let stores = self
            .stores_of(franchise_id)
            .into_iter()
            .map(|store| {
                let total_revenue: Decimal = self
                    .orders
                    .values()
                    .filter(|order| order.franchise_id == franchise_id && order.store_id == store.id)
                    .map(|order| order.total)
                    .sum();
                StoreDetail {
                    id: store.id,
                    name: store.name,
                    total_revenue,
                }
            })
            .collect();

        FranchiseDetail {
            id: franchise_id,
            name: name.to_string(),
            admins: self.admins_of(franchise_id),
            stores,
        }
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryGateway {
    async fn add_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(DatabaseError::Conflict(format!("email '{}' is already registered", user.email)));
        }

        let id = tables.next_id();
        tables.users.insert(
            id,
            UserRow {
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash,
            },
        );
        tables.roles.extend(user.roles.iter().cloned().map(|grant| (id, grant)));

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            roles: user.roles,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let tables = self.tables.read().await;
        let found = tables.users.iter().find(|(_, row)| row.email == email);

        Ok(found.and_then(|(id, row)| {
            tables.user(*id).map(|user| UserRecord {
                user,
                password_hash: row.password_hash.clone(),
            })
        }))
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.user(id))
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(DatabaseError::NotFound(format!("user {}", id)));
        }
        if let Some(email) = &update.email {
            if tables.email_taken(email, Some(id)) {
                return Err(DatabaseError::Conflict(format!("email '{}' is already registered", email)));
            }
        }

        if let Some(row) = tables.users.get_mut(&id) {
            if let Some(name) = update.name {
                row.name = name;
            }
            if let Some(email) = update.email {
                row.email = email;
            }
            if let Some(hash) = update.password_hash {
                row.password_hash = hash;
            }
        }

        tables
            .user(id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }
}

#[async_trait]
impl SessionRepository for MemoryGateway {
    async fn insert_session(
        &self,
        token_hash: &str,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::NotFound(format!("user {}", user_id)));
        }
        if tables.sessions.contains_key(token_hash) {
            return Err(DatabaseError::Conflict("session already exists".to_string()));
        }
        tables.sessions.insert(token_hash.to_string(), SessionRow { issued_at });
        Ok(())
    }

    async fn session_exists(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        Ok(self.tables.read().await.sessions.contains_key(token_hash))
    }

    async fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.sessions.remove(token_hash).is_some())
    }

    async fn delete_sessions_issued_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| session.issued_at >= cutoff);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl FranchiseRepository for MemoryGateway {
    async fn create_franchise(&self, franchise: NewFranchise) -> Result<FranchiseDetail, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.franchises.values().any(|name| *name == franchise.name) {
            return Err(DatabaseError::Conflict(format!("franchise '{}' already exists", franchise.name)));
        }
        if let Some(missing) = franchise.admin_ids.iter().find(|id| !tables.users.contains_key(*id)) {
            return Err(DatabaseError::NotFound(format!("user {}", missing)));
        }

        let id = tables.next_id();
        tables.franchises.insert(id, franchise.name.clone());
        for admin_id in franchise.admin_ids {
            tables.roles.push((admin_id, RoleGrant::franchisee(id)));
        }

        Ok(tables.detail(id, &franchise.name))
    }

    async fn list_franchises(&self, include_admins: bool) -> Result<Vec<Franchise>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .franchises
            .iter()
            .map(|(id, name)| Franchise {
                id: *id,
                name: name.clone(),
                admins: include_admins.then(|| tables.admins_of(*id)),
                stores: tables.stores_of(*id),
            })
            .collect())
    }

    async fn franchises_for_user(&self, user_id: i64) -> Result<Vec<FranchiseDetail>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut ids: Vec<i64> = tables
            .roles
            .iter()
            .filter(|(owner, grant)| *owner == user_id && grant.role == Role::Franchisee)
            .filter_map(|(_, grant)| grant.object_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();

        Ok(ids
            .into_iter()
            .filter_map(|id| tables.franchises.get(&id).map(|name| tables.detail(id, name)))
            .collect())
    }

    async fn delete_franchise(&self, franchise_id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.franchises.remove(&franchise_id).is_none() {
            return Err(DatabaseError::NotFound(format!("franchise {}", franchise_id)));
        }
        tables.stores.retain(|_, store| store.franchise_id != franchise_id);
        tables
            .roles
            .retain(|(_, grant)| !(grant.role == Role::Franchisee && grant.object_id == Some(franchise_id)));
        Ok(())
    }

    async fn create_store(&self, store: NewStore) -> Result<Store, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.franchises.contains_key(&store.franchise_id) {
            return Err(DatabaseError::NotFound(format!("franchise {}", store.franchise_id)));
        }

        let created = Store {
            id: tables.next_id(),
            franchise_id: store.franchise_id,
            name: store.name,
        };
        tables.stores.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_store(&self, franchise_id: i64, store_id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .stores
            .get(&store_id)
            .is_some_and(|store| store.franchise_id == franchise_id);
        if !owned {
            return Err(DatabaseError::NotFound(format!("store {} in franchise {}", store_id, franchise_id)));
        }
        tables.stores.remove(&store_id);
        Ok(())
    }
}

#[async_trait]
impl MenuRepository for MemoryGateway {
    async fn list_menu(&self) -> Result<Vec<MenuItem>, DatabaseError> {
        Ok(self.tables.read().await.menu.values().cloned().collect())
    }

    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, DatabaseError> {
        let mut tables = self.tables.write().await;
        let created = MenuItem {
            id: tables.next_id(),
            title: item.title,
            description: item.description,
            image: item.image,
            price: item.price,
        };
        tables.menu.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_menu_item(&self, id: i64, update: MenuItemUpdate) -> Result<MenuItem, DatabaseError> {
        let mut tables = self.tables.write().await;
        let item = tables
            .menu
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("menu item {}", id)))?;

        if let Some(title) = update.title {
            item.title = title;
        }
        if let Some(description) = update.description {
            item.description = description;
        }
        if let Some(image) = update.image {
            item.image = Some(image);
        }
        if let Some(price) = update.price {
            item.price = price;
        }
        Ok(item.clone())
    }
}

#[async_trait]
impl OrderRepository for MemoryGateway {
    async fn add_order(&self, order: NewOrder) -> Result<Order, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&order.diner_id) {
            return Err(DatabaseError::NotFound(format!("user {}", order.diner_id)));
        }

        let id = tables.next_id();
        let items: Vec<OrderItem> = order
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: tables.next_id(),
                menu_id: item.menu_id,
                description: item.description,
                price: item.price,
            })
            .collect();

        let created = Order {
            id,
            diner_id: order.diner_id,
            franchise_id: order.franchise_id,
            store_id: order.store_id,
            date: Utc::now(),
            total: Order::total_of(&items),
            items,
        };
        tables.orders.insert(id, created.clone());
        Ok(created)
    }

    async fn orders_for_diner(&self, diner_id: i64, page: u32, per_page: u32) -> Result<Vec<Order>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .filter(|order| order.diner_id == diner_id)
            .skip(page_offset(page, per_page) as usize)
            .take(per_page as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
