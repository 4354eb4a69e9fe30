// handlers/protected/order/mod.rs - Menu administration and diner orders

pub mod menu;
pub mod orders;

pub use menu::{menu_item_put, menu_put};
pub use orders::{order_post, orders_get};
