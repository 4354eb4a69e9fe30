use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    pub franchise_id: i64,
    pub name: String,
}

/// Store as reported in franchise detail views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDetail {
    pub id: i64,
    pub name: String,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FranchiseAdmin {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Franchise summary returned by the public listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Franchise {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admins: Option<Vec<FranchiseAdmin>>,
    pub stores: Vec<Store>,
}

/// Franchise with admins and per-store revenue, shown to its franchisees and admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseDetail {
    pub id: i64,
    pub name: String,
    pub admins: Vec<FranchiseAdmin>,
    pub stores: Vec<StoreDetail>,
}

#[derive(Debug, Clone)]
pub struct NewFranchise {
    pub name: String,
    /// Users that receive a franchisee grant on the new franchise.
    pub admin_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub franchise_id: i64,
    pub name: String,
}
