use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub menu_id: i64,
    pub description: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub diner_id: i64,
    pub franchise_id: i64,
    pub store_id: i64,
    pub date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
}

impl Order {
    pub fn total_of(items: &[OrderItem]) -> Decimal {
        items.iter().map(|item| item.price).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub menu_id: i64,
    pub description: String,
    /// Price as submitted by the client; not re-derived from the menu.
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub diner_id: i64,
    pub franchise_id: i64,
    pub store_id: i64,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub diner_id: i64,
    pub orders: Vec<Order>,
    pub page: u32,
}
