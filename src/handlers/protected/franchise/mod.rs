// handlers/protected/franchise/mod.rs - Franchise and store management
//
// Creation is admin only. Deleting a franchise or touching its stores is allowed to admins and to
// franchisees holding a grant on that franchise.

pub mod create;
pub mod delete;
pub mod list;
pub mod store;

pub use create::franchise_post;
pub use delete::franchise_delete;
pub use list::{franchise_list_get, user_franchises_get};
pub use store::{store_delete, store_post};
