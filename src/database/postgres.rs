use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use std::collections::BTreeMap;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Franchise, FranchiseAdmin, FranchiseDetail, MenuItem, MenuItemUpdate, NewFranchise, NewMenuItem, NewOrder,
    NewStore, NewUser, Order, OrderItem, Role, RoleGrant, Store, StoreDetail, User, UserRecord, UserUpdate,
};
use crate::database::repository::{
    page_offset, FranchiseRepository, Gateway, MenuRepository, OrderRepository, SessionRepository, UserRepository,
};

/// Postgres-backed gateway
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    diner_id: i64,
    franchise_id: i64,
    store_id: i64,
    ordered_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    menu_id: i64,
    description: String,
    price: Decimal,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn roles_for(&self, user_id: i64) -> Result<Vec<RoleGrant>, DatabaseError> {
        let rows = sqlx::query("SELECT role, object_id FROM user_roles WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<RoleGrant, DatabaseError> {
                let role: String = row.try_get("role")?;
                let role = role.parse::<Role>().map_err(DatabaseError::QueryError)?;
                Ok(RoleGrant { role, object_id: row.try_get("object_id")? })
            })
            .collect()
    }

    async fn insert_roles(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        roles: &[RoleGrant],
    ) -> Result<(), DatabaseError> {
        for grant in roles {
            sqlx::query("INSERT INTO user_roles (user_id, role, object_id) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(grant.role.as_str())
                .bind(grant.object_id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    /// Franchisee admins grouped by franchise id
    async fn admins_by_franchise(&self, franchise_ids: &[i64]) -> Result<BTreeMap<i64, Vec<FranchiseAdmin>>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT ur.object_id, u.id, u.name, u.email
             FROM user_roles ur
             JOIN users u ON u.id = ur.user_id
             WHERE ur.role = 'franchisee' AND ur.object_id = ANY($1)
             ORDER BY u.id",
        )
        .bind(franchise_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: BTreeMap<i64, Vec<FranchiseAdmin>> = BTreeMap::new();
        for row in rows {
            let franchise_id: i64 = row.try_get("object_id")?;
            grouped.entry(franchise_id).or_default().push(FranchiseAdmin {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
            });
        }
        Ok(grouped)
    }

    async fn franchise_detail(&self, franchise_id: i64, name: String) -> Result<FranchiseDetail, DatabaseError> {
        let mut admins = self.admins_by_franchise(&[franchise_id]).await?;

        let stores = sqlx::query(
            "SELECT s.id, s.name, COALESCE(SUM(oi.price), 0) AS total_revenue
             FROM stores s
             LEFT JOIN orders o ON o.store_id = s.id AND o.franchise_id = s.franchise_id
             LEFT JOIN order_items oi ON oi.order_id = o.id
             WHERE s.franchise_id = $1
             GROUP BY s.id, s.name
             ORDER BY s.id",
        )
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> Result<StoreDetail, sqlx::Error> {
            Ok(StoreDetail {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                total_revenue: row.try_get("total_revenue")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(FranchiseDetail {
            id: franchise_id,
            name,
            admins: admins.remove(&franchise_id).unwrap_or_default(),
            stores,
        })
    }
}

#[async_trait]
impl UserRepository for PgGateway {
    async fn add_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::on_unique_violation(e, format!("email '{}' is already registered", user.email)))?;

        Self::insert_roles(&mut tx, id, &user.roles).await?;
        tx.commit().await?;

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            roles: user.roles,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let row = sqlx::query("SELECT id, name, email, password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i64 = row.try_get("id")?;
        let roles = self.roles_for(id).await?;
        Ok(Some(UserRecord {
            user: User {
                id,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                roles,
            },
            password_hash: row.try_get("password_hash")?,
        }))
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(User {
                id,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                roles: self.roles_for(id).await?,
            })),
            None => Ok(None),
        }
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, DatabaseError> {
        let email = update.email.clone();
        let row = sqlx::query(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 password_hash = COALESCE($4, password_hash)
             WHERE id = $1
             RETURNING id, name, email",
        )
        .bind(id)
        .bind(update.name)
        .bind(update.email)
        .bind(update.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::on_unique_violation(e, format!("email '{}' is already registered", email.unwrap_or_default()))
        })?
        .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;

        Ok(User {
            id,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            roles: self.roles_for(id).await?,
        })
    }
}

#[async_trait]
impl SessionRepository for PgGateway {
    async fn insert_session(
        &self,
        token_hash: &str,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, issued_at) VALUES ($1, $2, $3)")
            .bind(token_hash)
            .bind(user_id)
            .bind(issued_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::on_unique_violation(e, "session already exists"))?;
        Ok(())
    }

    async fn session_exists(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sessions WHERE token_hash = $1)")
            .bind(token_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_sessions_issued_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE issued_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FranchiseRepository for PgGateway {
    async fn create_franchise(&self, franchise: NewFranchise) -> Result<FranchiseDetail, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar("INSERT INTO franchises (name) VALUES ($1) RETURNING id")
            .bind(&franchise.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DatabaseError::on_unique_violation(e, format!("franchise '{}' already exists", franchise.name)))?;

        for admin_id in &franchise.admin_ids {
            Self::insert_roles(&mut tx, *admin_id, &[RoleGrant::franchisee(id)]).await?;
        }
        tx.commit().await?;

        self.franchise_detail(id, franchise.name).await
    }

    async fn list_franchises(&self, include_admins: bool) -> Result<Vec<Franchise>, DatabaseError> {
        let franchises = sqlx::query("SELECT id, name FROM franchises ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let stores: Vec<Store> = sqlx::query_as("SELECT id, franchise_id, name FROM stores ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut stores_by_franchise: BTreeMap<i64, Vec<Store>> = BTreeMap::new();
        for store in stores {
            stores_by_franchise.entry(store.franchise_id).or_default().push(store);
        }

        let ids = franchises
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut admins = if include_admins {
            self.admins_by_franchise(&ids).await?
        } else {
            BTreeMap::new()
        };

        franchises
            .iter()
            .map(|row| -> Result<Franchise, DatabaseError> {
                let id: i64 = row.try_get("id")?;
                Ok(Franchise {
                    id,
                    name: row.try_get("name")?,
                    admins: include_admins.then(|| admins.remove(&id).unwrap_or_default()),
                    stores: stores_by_franchise.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn franchises_for_user(&self, user_id: i64) -> Result<Vec<FranchiseDetail>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT f.id, f.name
             FROM franchises f
             JOIN user_roles ur ON ur.object_id = f.id AND ur.role = 'franchisee'
             WHERE ur.user_id = $1
             ORDER BY f.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            details.push(self.franchise_detail(row.try_get("id")?, row.try_get("name")?).await?);
        }
        Ok(details)
    }

    async fn delete_franchise(&self, franchise_id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE role = 'franchisee' AND object_id = $1")
            .bind(franchise_id)
            .execute(&mut *tx)
            .await?;

        // stores go with the franchise through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM franchises WHERE id = $1")
            .bind(franchise_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("franchise {}", franchise_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_store(&self, store: NewStore) -> Result<Store, DatabaseError> {
        sqlx::query_as("INSERT INTO stores (franchise_id, name) VALUES ($1, $2) RETURNING id, franchise_id, name")
            .bind(store.franchise_id)
            .bind(&store.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::on_foreign_key_violation(e, format!("franchise {}", store.franchise_id)))
    }

    async fn delete_store(&self, franchise_id: i64, store_id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1 AND franchise_id = $2")
            .bind(store_id)
            .bind(franchise_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("store {} in franchise {}", store_id, franchise_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl MenuRepository for PgGateway {
    async fn list_menu(&self) -> Result<Vec<MenuItem>, DatabaseError> {
        let items = sqlx::query_as("SELECT id, title, description, image, price FROM menu_items ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, DatabaseError> {
        let item = sqlx::query_as(
            "INSERT INTO menu_items (title, description, image, price)
             VALUES ($1, $2, $3, $4)
             RETURNING id, title, description, image, price",
        )
        .bind(item.title)
        .bind(item.description)
        .bind(item.image)
        .bind(item.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update_menu_item(&self, id: i64, update: MenuItemUpdate) -> Result<MenuItem, DatabaseError> {
        sqlx::query_as(
            "UPDATE menu_items
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 image = COALESCE($4, image),
                 price = COALESCE($5, price)
             WHERE id = $1
             RETURNING id, title, description, image, price",
        )
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.image)
        .bind(update.price)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("menu item {}", id)))
    }
}

#[async_trait]
impl OrderRepository for PgGateway {
    async fn add_order(&self, order: NewOrder) -> Result<Order, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let header: OrderRow = sqlx::query_as(
            "INSERT INTO orders (diner_id, franchise_id, store_id)
             VALUES ($1, $2, $3)
             RETURNING id, diner_id, franchise_id, store_id, ordered_at",
        )
        .bind(order.diner_id)
        .bind(order.franchise_id)
        .bind(order.store_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO order_items (order_id, menu_id, description, price) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(header.id)
            .bind(item.menu_id)
            .bind(&item.description)
            .bind(item.price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id,
                menu_id: item.menu_id,
                description: item.description,
                price: item.price,
            });
        }

        tx.commit().await?;

        Ok(Order {
            id: header.id,
            diner_id: header.diner_id,
            franchise_id: header.franchise_id,
            store_id: header.store_id,
            date: header.ordered_at,
            total: Order::total_of(&items),
            items,
        })
    }

    async fn orders_for_diner(&self, diner_id: i64, page: u32, per_page: u32) -> Result<Vec<Order>, DatabaseError> {
        let headers: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, diner_id, franchise_id, store_id, ordered_at
             FROM orders
             WHERE diner_id = $1
             ORDER BY id
             LIMIT $2 OFFSET $3",
        )
        .bind(diner_id)
        .bind(i64::from(per_page))
        .bind(page_offset(page, per_page) as i64)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, menu_id, description, price FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: BTreeMap<i64, Vec<OrderItem>> = BTreeMap::new();
        for row in rows {
            items_by_order.entry(row.order_id).or_default().push(OrderItem {
                id: row.id,
                menu_id: row.menu_id,
                description: row.description,
                price: row.price,
            });
        }

        Ok(headers
            .into_iter()
            .map(|h| {
                let items = items_by_order.remove(&h.id).unwrap_or_default();
                Order {
                    id: h.id,
                    diner_id: h.diner_id,
                    franchise_id: h.franchise_id,
                    store_id: h.store_id,
                    date: h.ordered_at,
                    total: Order::total_of(&items),
                    items,
                }
            })
            .collect())
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
