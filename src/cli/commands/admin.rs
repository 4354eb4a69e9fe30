use anyhow::Context;

use crate::auth::password::hash_password;
use crate::config;
use crate::database::models::{NewUser, RoleGrant};
use crate::database::{schema::ensure_schema, DatabaseManager, PgGateway, UserRepository};

/// Inserts an admin straight into Postgres; there is no HTTP route that grants the role.
pub async fn handle(name: String, email: String, password: String) -> anyhow::Result<()> {
    let config = config::config();
    config.validate()?;

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    ensure_schema(&pool).await?;

    let password_hash = hash_password(&password, config.security.bcrypt_cost).await?;
    let user = PgGateway::new(pool)
        .add_user(NewUser {
            name,
            email,
            password_hash,
            roles: vec![RoleGrant::admin()],
        })
        .await?;

    println!("Created admin {} <{}> with id {}", user.name, user.email, user.id);
    Ok(())
}
