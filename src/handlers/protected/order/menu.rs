// handlers/protected/order/menu.rs - Admin menu mutations

use axum::extract::{Extension, Path, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::auth::{Action, ResourceContext};
use crate::database::models::{MenuItem, MenuItemUpdate, NewMenuItem};
use crate::database::MenuRepository;
use crate::error::ApiError;
use crate::handlers::{require, required_fields};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct MenuItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
}

fn check_price(price: Decimal) -> Result<Decimal, ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::bad_request("price cannot be negative"));
    }
    Ok(price)
}

/// PUT /api/order/menu - Add a menu item and return the whole menu
pub async fn menu_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<MenuItemRequest>,
) -> ApiResult<Vec<MenuItem>> {
    require(&auth, Action::CreateMenuItem, ResourceContext::none())?;
    required_fields(&[
        ("title", payload.title.as_deref()),
        ("description", payload.description.as_deref()),
    ])?;
    let price = payload.price.ok_or_else(|| ApiError::missing_fields(&["price"]))?;

    let item = state
        .db
        .add_menu_item(NewMenuItem {
            title: payload.title.unwrap_or_default(),
            description: payload.description.unwrap_or_default(),
            image: payload.image,
            price: check_price(price)?,
        })
        .await?;
    info!("Menu item {} added", item.id);

    Ok(ApiResponse::success(state.db.list_menu().await?))
}

/// PUT /api/order/menu/:menu_id - Change fields of one menu item
pub async fn menu_item_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(menu_id): Path<i64>,
    ApiJson(payload): ApiJson<MenuItemRequest>,
) -> ApiResult<MenuItem> {
    require(&auth, Action::UpdateMenuItem, ResourceContext::none())?;

    let item = state
        .db
        .update_menu_item(
            menu_id,
            MenuItemUpdate {
                title: payload.title,
                description: payload.description,
                image: payload.image,
                price: payload.price.map(check_price).transpose()?,
            },
        )
        .await?;

    Ok(ApiResponse::success(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_prices_are_rejected() {
        assert!(check_price(Decimal::new(-1, 2)).is_err());
        assert_eq!(check_price(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(check_price(Decimal::new(5, 2)).unwrap(), Decimal::new(5, 2));
    }
}
