use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

// Idempotent bootstrap; executed in order on every startup.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS user_roles (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('admin', 'franchisee', 'diner')),
        object_id BIGINT
    )"#,
    "CREATE INDEX IF NOT EXISTS user_roles_user_id_idx ON user_roles (user_id)",
    "CREATE INDEX IF NOT EXISTS user_roles_object_id_idx ON user_roles (object_id)",
    r#"CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        issued_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS sessions_issued_at_idx ON sessions (issued_at)",
    r#"CREATE TABLE IF NOT EXISTS franchises (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS stores (
        id BIGSERIAL PRIMARY KEY,
        franchise_id BIGINT NOT NULL REFERENCES franchises(id) ON DELETE CASCADE,
        name TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS menu_items (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        image TEXT,
        price NUMERIC(12, 4) NOT NULL CHECK (price >= 0)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS orders (
        id BIGSERIAL PRIMARY KEY,
        diner_id BIGINT NOT NULL REFERENCES users(id),
        franchise_id BIGINT NOT NULL,
        store_id BIGINT NOT NULL,
        ordered_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS orders_diner_id_idx ON orders (diner_id)",
    r#"CREATE TABLE IF NOT EXISTS order_items (
        id BIGSERIAL PRIMARY KEY,
        order_id BIGINT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        menu_id BIGINT NOT NULL,
        description TEXT NOT NULL,
        price NUMERIC(12, 4) NOT NULL
    )"#,
];

/// Creates any missing tables and indexes.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready ({} statements)", SCHEMA.len());
    Ok(())
}
