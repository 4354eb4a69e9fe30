use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MenuItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Image reference (file name or URL); uploads are not handled here.
    pub image: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct MenuItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
}
